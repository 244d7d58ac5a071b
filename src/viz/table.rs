//! Text table summarizing eval scores by model and task, using the [`tabled`] crate.

use crate::frame::{DataFrame, FrameError, RowView, Value};
use crate::logs::evals::{
    MODEL, SCORE_HEADLINE_METRIC, SCORE_HEADLINE_STDERR, SCORE_HEADLINE_VALUE, TASK_NAME,
};
use tabled::settings::object::Columns;
use tabled::settings::Alignment;
use tabled::{Table, Tabled};

/// A single row of the evals table
#[derive(Debug, Clone, PartialEq, Eq, Tabled)]
pub struct EvalsTableRow {
    #[tabled(rename = "Model")]
    pub model: String,
    #[tabled(rename = "Task")]
    pub task: String,
    #[tabled(rename = "Metric")]
    pub metric: String,
    /// Score formatted with the table's precision
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Stderr")]
    pub stderr: String,
}

/// Table that summarizes eval scores by model and task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalsTable {
    pub metric_field: String,
    pub score_field: String,
    pub stderr_field: String,
    /// Decimal places of the value and stderr columns.
    pub precision: usize,
}

impl Default for EvalsTable {
    fn default() -> Self {
        Self {
            metric_field: SCORE_HEADLINE_METRIC.to_string(),
            score_field: SCORE_HEADLINE_VALUE.to_string(),
            stderr_field: SCORE_HEADLINE_STDERR.to_string(),
            precision: 3,
        }
    }
}

impl EvalsTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fields(
        mut self,
        metric_field: impl Into<String>,
        score_field: impl Into<String>,
        stderr_field: impl Into<String>,
    ) -> Self {
        self.metric_field = metric_field.into();
        self.score_field = score_field.into();
        self.stderr_field = stderr_field.into();
        self
    }

    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    /// One row per row of `frame`, in frame order. Missing values are left blank.
    pub fn rows(&self, frame: &DataFrame) -> Result<Vec<EvalsTableRow>, FrameError> {
        for field in [
            TASK_NAME,
            MODEL,
            self.metric_field.as_str(),
            self.score_field.as_str(),
            self.stderr_field.as_str(),
        ] {
            frame.column_index(field)?;
        }

        frame
            .rows()
            .map(|row| -> Result<EvalsTableRow, FrameError> {
                Ok(EvalsTableRow {
                    model: row.get(MODEL)?.to_string(),
                    task: row.get(TASK_NAME)?.to_string(),
                    metric: row.get(&self.metric_field)?.to_string(),
                    value: self.format_number(row, &self.score_field)?,
                    stderr: self.format_number(row, &self.stderr_field)?,
                })
            })
            .collect()
    }

    fn format_number(&self, row: RowView<'_>, field: &str) -> Result<String, FrameError> {
        Ok(match row.get(field)? {
            Value::Text(text) => text.clone(),
            _ => row
                .f64(field)?
                .map(|number| format!("{:.*}", self.precision, number))
                .unwrap_or_default(),
        })
    }

    /// Formats `frame` as a text table with centered value and stderr columns.
    pub fn render(&self, frame: &DataFrame) -> Result<String, FrameError> {
        let rows = self.rows(frame)?;
        if rows.is_empty() {
            return Ok("No evals available".to_string());
        }

        let mut table = Table::new(rows);
        table.modify(Columns::new(3..5), Alignment::center());
        Ok(table.to_string())
    }
}
