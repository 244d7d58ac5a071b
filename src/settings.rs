use crate::logs::evals::{SCORE_HEADLINE_METRIC, SCORE_HEADLINE_STDERR, SCORE_HEADLINE_VALUE};
use crate::prepare::UrlMapping;
use crate::stats::confidence::{z_alpha, UnsupportedConfidenceLevel, DEFAULT_CONFIDENCE_LEVEL};
use crate::viz::{EvalsBarPlot, EvalsHeatmap, EvalsTable};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;

/// The minimum plot width or height the user is allowed to specify
pub const MIN_PLOT_SIZE: u32 = 200;

/// The maximum plot width or height the user is allowed to specify
pub const MAX_PLOT_SIZE: u32 = 8192;

/// The maximum number of decimal places shown in tables
pub const MAX_TABLE_PRECISION: usize = 10;

/// Errors that can occur when loading or validating report settings
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse settings file: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Confidence(#[from] UnsupportedConfidenceLevel),

    #[error("Score domain [{low}, {high}] must be finite with low < high")]
    InvalidDomain { low: f64, high: f64 },

    #[error("Score and stderr fields must be different columns, both are '{0}'")]
    SameScoreAndStderrField(String),
}

/// Controls how eval reports are built.
///
/// # Remarks
///
/// Settings files are JSON; every key is optional and falls back to the value from
/// [`ReportSettings::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    /// Confidence level of error bars. Must be one of the supported levels.
    pub ci: f64,

    /// Column holding the plotted score.
    pub score_field: String,

    /// Column holding the standard error of the score.
    pub stderr_field: String,

    /// Column holding the name of the score metric.
    pub metric_field: String,

    /// Beginning and end of the score axis, e.g. `[0.0, 1.0]`.
    pub score_domain: (f64, f64),

    /// Width of rendered plots in pixels.
    ///
    /// Range is [`MIN_PLOT_SIZE`] to [`MAX_PLOT_SIZE`].
    pub plot_width: u32,

    /// Height of rendered plots in pixels.
    ///
    /// Range is [`MIN_PLOT_SIZE`] to [`MAX_PLOT_SIZE`].
    pub plot_height: u32,

    /// Decimal places of values in the summary table.
    pub table_precision: usize,

    /// Log directories served by a log viewer. When empty, no `log_viewer` column is added.
    pub url_mappings: Vec<UrlMapping>,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportSettings {
    /// Creates a new `ReportSettings` with default values.
    pub fn new() -> Self {
        ReportSettings {
            ci: DEFAULT_CONFIDENCE_LEVEL,
            score_field: SCORE_HEADLINE_VALUE.to_string(),
            stderr_field: SCORE_HEADLINE_STDERR.to_string(),
            metric_field: SCORE_HEADLINE_METRIC.to_string(),
            score_domain: (0.0, 1.0),
            plot_width: 900,
            plot_height: 500,
            table_precision: 3,
            url_mappings: Vec::new(),
        }
    }

    /// Reads settings from a JSON file and sanitizes them.
    pub fn from_json_file(path: &Path) -> Result<Self, SettingsError> {
        let file = File::open(path)?;
        let mut settings: ReportSettings = serde_json::from_reader(BufReader::new(file))?;
        settings.sanitize();
        Ok(settings)
    }

    /// Sanitizes settings to acceptable values if they are out of range.
    pub fn sanitize(&mut self) {
        self.plot_width = self.plot_width.clamp(MIN_PLOT_SIZE, MAX_PLOT_SIZE);
        self.plot_height = self.plot_height.clamp(MIN_PLOT_SIZE, MAX_PLOT_SIZE);
        self.table_precision = self.table_precision.min(MAX_TABLE_PRECISION);
    }

    /// Checks the settings which cannot be sanitized.
    pub fn validate(&self) -> Result<(), SettingsError> {
        z_alpha(self.ci)?;

        let (low, high) = self.score_domain;
        if !low.is_finite() || !high.is_finite() || low >= high {
            return Err(SettingsError::InvalidDomain { low, high });
        }

        if self.score_field == self.stderr_field {
            return Err(SettingsError::SameScoreAndStderrField(
                self.score_field.clone(),
            ));
        }

        Ok(())
    }

    pub fn bar_plot(&self) -> EvalsBarPlot {
        EvalsBarPlot::new()
            .with_ci(self.ci)
            .with_score_field(&self.score_field)
            .with_stderr_field(&self.stderr_field)
            .with_score_domain(self.score_domain.0, self.score_domain.1)
            .with_size(self.plot_width, self.plot_height)
    }

    pub fn heatmap(&self) -> EvalsHeatmap {
        let defaults = EvalsHeatmap::default();
        EvalsHeatmap::new()
            .with_fields(defaults.x_field, defaults.y_field, &self.score_field)
            .with_domain(self.score_domain.0, self.score_domain.1)
            .with_size(self.plot_width, self.plot_height)
    }

    pub fn table(&self) -> EvalsTable {
        EvalsTable::new()
            .with_fields(&self.metric_field, &self.score_field, &self.stderr_field)
            .with_precision(self.table_precision)
    }
}
