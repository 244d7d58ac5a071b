//! Heatmap of mean scores, by default with tasks across and models down.

use super::plots::{needs_light_text, save_svg, sequential_color, PlotError, Result, FONT};
use crate::frame::{DataFrame, Value};
use crate::logs::evals::{MODEL, SCORE_HEADLINE_VALUE, TASK_NAME};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;

const MARGIN: i32 = 20;
const LABEL_CHAR_WIDTH: i32 = 7;
const X_LABEL_HEIGHT: i32 = 30;
const MISSING_FILL: RGBColor = RGBColor(0xee, 0xee, 0xee);

/// Mean value of every (x, y) combination.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapGrid {
    pub x_labels: Vec<String>,
    pub y_labels: Vec<String>,
    /// Indexed as `cells[y][x]`.
    cells: Vec<Vec<Option<f64>>>,
}

impl HeatmapGrid {
    pub fn cell(&self, x: usize, y: usize) -> Option<f64> {
        self.cells.get(y).and_then(|row| row.get(x).copied().flatten())
    }

    /// Looks up a cell by its labels.
    pub fn value(&self, x_label: &str, y_label: &str) -> Option<f64> {
        let x = self.x_labels.iter().position(|label| label == x_label)?;
        let y = self.y_labels.iter().position(|label| label == y_label)?;
        self.cell(x, y)
    }

    pub fn is_empty(&self) -> bool {
        self.x_labels.is_empty() || self.y_labels.is_empty()
    }
}

/// Heatmap of a numeric field over two categorical fields.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalsHeatmap {
    pub x_field: String,
    pub y_field: String,
    pub fill_field: String,
    /// Values mapped to the lightest and darkest color.
    pub domain: (f64, f64),
    pub width: u32,
    pub height: u32,
}

impl Default for EvalsHeatmap {
    fn default() -> Self {
        Self {
            x_field: TASK_NAME.to_string(),
            y_field: MODEL.to_string(),
            fill_field: SCORE_HEADLINE_VALUE.to_string(),
            domain: (0.0, 1.0),
            width: 900,
            height: 500,
        }
    }
}

impl EvalsHeatmap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fields(
        mut self,
        x_field: impl Into<String>,
        y_field: impl Into<String>,
        fill_field: impl Into<String>,
    ) -> Self {
        self.x_field = x_field.into();
        self.y_field = y_field.into();
        self.fill_field = fill_field.into();
        self
    }

    pub fn with_domain(mut self, low: f64, high: f64) -> Self {
        self.domain = (low, high);
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Averages the fill field per cell. Labels keep their order of first appearance.
    ///
    /// Rows with a missing label are skipped; missing fill values do not count toward the mean.
    pub fn grid(&self, frame: &DataFrame) -> Result<HeatmapGrid> {
        for field in [&self.x_field, &self.y_field, &self.fill_field] {
            frame.column_index(field)?;
        }

        let mut x_labels: Vec<String> = Vec::new();
        let mut y_labels: Vec<String> = Vec::new();
        let mut sums: Vec<Vec<(f64, usize)>> = Vec::new();

        for row in frame.rows() {
            let (x_value, y_value) = (row.get(&self.x_field)?, row.get(&self.y_field)?);
            if x_value.is_null() || y_value.is_null() {
                continue;
            }

            let x = label_index(&mut x_labels, x_value);
            let y = label_index(&mut y_labels, y_value);
            if y == sums.len() {
                sums.push(Vec::new());
            }
            for row_sums in sums.iter_mut() {
                row_sums.resize(x_labels.len(), (0.0, 0));
            }

            if let Some(value) = row.f64(&self.fill_field)? {
                let (sum, count) = &mut sums[y][x];
                *sum += value;
                *count += 1;
            }
        }

        let cells = sums
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|(sum, count)| (count > 0).then(|| sum / count as f64))
                    .collect()
            })
            .collect();

        Ok(HeatmapGrid {
            x_labels,
            y_labels,
            cells,
        })
    }

    /// Renders the heatmap as an SVG document with each cell annotated by its value.
    pub fn render_svg(&self, frame: &DataFrame) -> Result<String> {
        let grid = self.grid(frame)?;
        if grid.is_empty() {
            return Err(PlotError::InvalidData("No cells to plot".to_string()));
        }

        let (columns, rows) = (grid.x_labels.len() as i32, grid.y_labels.len() as i32);
        let longest_y_label = grid
            .y_labels
            .iter()
            .map(|label| label.chars().count())
            .max()
            .unwrap_or_default() as i32;
        let left = MARGIN + longest_y_label * LABEL_CHAR_WIDTH + 10;
        let top = MARGIN + X_LABEL_HEIGHT;
        let cell_width = (self.width as i32 - left - MARGIN) / columns;
        let cell_height = (self.height as i32 - top - MARGIN) / rows;
        if cell_width < 1 || cell_height < 1 {
            return Err(PlotError::InvalidData(format!(
                "{}x{} cells do not fit into {}x{} pixels",
                columns, rows, self.width, self.height
            )));
        }

        let centered = TextStyle::from((FONT, 12).into_font()).pos(Pos::new(HPos::Center, VPos::Center));
        let right_aligned = TextStyle::from((FONT, 12).into_font()).pos(Pos::new(HPos::Right, VPos::Center));

        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (self.width, self.height)).into_drawing_area();
            root.fill(&WHITE)
                .map_err(|e| PlotError::DrawingArea(e.to_string()))?;

            for (x, label) in grid.x_labels.iter().enumerate() {
                let center = left + x as i32 * cell_width + cell_width / 2;
                root.draw(&Text::new(label.clone(), (center, MARGIN + X_LABEL_HEIGHT / 2), centered.clone()))
                    .map_err(|e| PlotError::Drawing(e.to_string()))?;
            }

            for (y, label) in grid.y_labels.iter().enumerate() {
                let y0 = top + y as i32 * cell_height;
                root.draw(&Text::new(label.clone(), (left - 10, y0 + cell_height / 2), right_aligned.clone()))
                    .map_err(|e| PlotError::Drawing(e.to_string()))?;

                for x in 0..grid.x_labels.len() {
                    let x0 = left + x as i32 * cell_width;
                    let value = grid.cell(x, y);
                    let fill = value.map_or(MISSING_FILL, |value| sequential_color(value, self.domain));

                    root.draw(&Rectangle::new(
                        [(x0, y0), (x0 + cell_width, y0 + cell_height)],
                        fill.filled(),
                    ))
                    .map_err(|e| PlotError::Drawing(e.to_string()))?;

                    if let Some(value) = value {
                        let text_color = if needs_light_text(fill) { WHITE } else { BLACK };
                        root.draw(&Text::new(
                            format!("{:.2}", value),
                            (x0 + cell_width / 2, y0 + cell_height / 2),
                            centered.color(&text_color),
                        ))
                        .map_err(|e| PlotError::Drawing(e.to_string()))?;
                    }
                }
            }

            root.present()
                .map_err(|e| PlotError::Drawing(e.to_string()))?;
        }

        Ok(svg)
    }

    /// Renders the heatmap and saves it as an SVG file.
    pub fn render(&self, frame: &DataFrame, output_path: &Path) -> Result<()> {
        let svg = self.render_svg(frame)?;
        save_svg(&svg, output_path)
    }
}

/// Position of `value`'s label, appending it if it was not seen before.
fn label_index(labels: &mut Vec<String>, value: &Value) -> usize {
    let label = value.to_string();
    match labels.iter().position(|existing| *existing == label) {
        Some(index) => index,
        None => {
            labels.push(label);
            labels.len() - 1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameError;

    fn evals() -> DataFrame {
        let mut frame = DataFrame::new([TASK_NAME, MODEL, SCORE_HEADLINE_VALUE]).unwrap();
        let rows: [(&str, &str, Value); 5] = [
            ("cybench", "openai/gpt-4o", 0.4.into()),
            ("cybench", "openai/gpt-4o", 0.6.into()),
            ("intercode", "anthropic/claude", 0.9.into()),
            ("intercode", "openai/gpt-4o", Value::Null),
            ("cybench", "anthropic/claude", 1i64.into()),
        ];
        for (task, model, value) in rows {
            frame
                .push_row(vec![task.into(), model.into(), value])
                .unwrap();
        }
        frame
    }

    #[test]
    fn grid_averages_cells() {
        let grid = EvalsHeatmap::new().grid(&evals()).unwrap();
        assert_eq!(grid.x_labels, ["cybench", "intercode"]);
        assert_eq!(grid.y_labels, ["openai/gpt-4o", "anthropic/claude"]);

        let mean = grid.value("cybench", "openai/gpt-4o").unwrap();
        assert!((mean - 0.5).abs() < 1e-12);
        assert_eq!(grid.value("intercode", "anthropic/claude"), Some(0.9));
        assert_eq!(grid.value("cybench", "anthropic/claude"), Some(1.0));
        assert_eq!(grid.value("intercode", "openai/gpt-4o"), None);
        assert_eq!(grid.value("unknown", "openai/gpt-4o"), None);
    }

    #[test]
    fn cells_added_before_a_label_appears_are_missing() {
        let mut frame = DataFrame::new([TASK_NAME, MODEL, SCORE_HEADLINE_VALUE]).unwrap();
        frame
            .push_row(vec!["a".into(), "m1".into(), 0.1.into()])
            .unwrap();
        frame
            .push_row(vec!["b".into(), "m2".into(), 0.2.into()])
            .unwrap();

        let grid = EvalsHeatmap::new().grid(&frame).unwrap();
        assert_eq!(grid.cell(1, 0), None);
        assert_eq!(grid.cell(0, 1), None);
        assert_eq!(grid.cell(1, 1), Some(0.2));
    }

    #[test]
    fn missing_fill_field_is_reported() {
        let result = EvalsHeatmap::new()
            .with_fields(TASK_NAME, MODEL, "accuracy")
            .grid(&evals());
        assert!(matches!(
            result,
            Err(PlotError::Frame(FrameError::MissingColumn(column))) if column == "accuracy"
        ));
    }

    #[test]
    fn renders_annotated_cells() {
        let svg = EvalsHeatmap::new().render_svg(&evals()).unwrap();
        for text in ["cybench", "intercode", "openai/gpt-4o", "0.50", "0.90", "1.00"] {
            assert!(svg.contains(text), "missing {}", text);
        }
    }

    #[test]
    fn empty_frame_is_invalid() {
        let result = EvalsHeatmap::new().render_svg(&evals().filter(|_| false));
        assert!(matches!(result, Err(PlotError::InvalidData(_))));
    }
}
