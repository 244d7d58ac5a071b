//! Symmetric confidence bounds around point estimates.

use super::confidence::{z_alpha, UnsupportedConfidenceLevel};
use crate::frame::{DataFrame, FrameError, Value};
use thiserror::Error;

/// Suffix of the derived lower bound column, appended to the estimate field name.
pub const LOWER_SUFFIX: &str = "_ci_lower";

/// Suffix of the derived upper bound column, appended to the estimate field name.
pub const UPPER_SUFFIX: &str = "_ci_upper";

/// Lower and upper bound of a two-sided confidence interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceBounds {
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceBounds {
    /// Bounds `estimate ± z * stderr` for an already resolved critical value.
    pub fn from_critical_value(estimate: f64, stderr: f64, z: f64) -> Self {
        let half_width = z * stderr;
        Self {
            lower: estimate - half_width,
            upper: estimate + half_width,
        }
    }

    /// Bounds for a confidence level, e.g. `0.95`.
    ///
    /// # Examples
    /// ```
    /// use eval_insights::stats::bounds::ConfidenceBounds;
    ///
    /// let bounds = ConfidenceBounds::new(0.72, 0.05, 0.95).unwrap();
    /// assert!((bounds.lower - 0.622).abs() < 1e-9);
    /// assert!((bounds.upper - 0.818).abs() < 1e-9);
    /// ```
    pub fn new(estimate: f64, stderr: f64, ci: f64) -> Result<Self, UnsupportedConfidenceLevel> {
        Ok(Self::from_critical_value(estimate, stderr, z_alpha(ci)?))
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Errors from deriving bound columns
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BoundsError {
    #[error(transparent)]
    Confidence(#[from] UnsupportedConfidenceLevel),

    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// Names of the derived bound columns for an estimate field.
pub fn bound_fields(estimate_field: &str) -> (String, String) {
    (
        format!("{}{}", estimate_field, LOWER_SUFFIX),
        format!("{}{}", estimate_field, UPPER_SUFFIX),
    )
}

/// Adds lower and upper confidence bound columns derived from an estimate and a stderr column.
///
/// The columns are named after the estimate field (see [`bound_fields`]). Rows where either
/// the estimate or the stderr is missing get Null bounds. The confidence level is resolved
/// before any row is touched, so an unsupported level fails even for an empty frame.
///
/// # Returns
/// The names of the lower and upper bound columns.
pub fn with_confidence_bounds(
    frame: &mut DataFrame,
    estimate_field: &str,
    stderr_field: &str,
    ci: f64,
) -> Result<(String, String), BoundsError> {
    let z = z_alpha(ci)?;
    frame.column_index(estimate_field)?;
    frame.column_index(stderr_field)?;

    let (lower_field, upper_field) = bound_fields(estimate_field);
    let bounds = |row: crate::frame::RowView<'_>| -> Result<Option<ConfidenceBounds>, FrameError> {
        Ok(match (row.f64(estimate_field)?, row.f64(stderr_field)?) {
            (Some(estimate), Some(stderr)) => {
                Some(ConfidenceBounds::from_critical_value(estimate, stderr, z))
            }
            _ => None,
        })
    };

    frame.with_column(&lower_field, |row| {
        Ok::<Value, FrameError>(bounds(row)?.map(|b| b.lower).into())
    })?;
    frame.with_column(&upper_field, |row| {
        Ok::<Value, FrameError>(bounds(row)?.map(|b| b.upper).into())
    })?;

    Ok((lower_field, upper_field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn bounds_for_headline_example() {
        let bounds = ConfidenceBounds::new(0.72, 0.05, 0.95).unwrap();
        assert!((bounds.lower - 0.622).abs() < EPSILON);
        assert!((bounds.upper - 0.818).abs() < EPSILON);
        assert!((bounds.width() - 2.0 * 1.960 * 0.05).abs() < EPSILON);
    }

    #[rstest(ci, case(0.5), case(1.0), case(0.96))]
    fn unsupported_level_has_no_bounds(ci: f64) {
        assert!(ConfidenceBounds::new(0.72, 0.05, ci).is_err());
    }

    #[test]
    fn zero_stderr_collapses_interval() {
        let bounds = ConfidenceBounds::new(0.4, 0.0, 0.99).unwrap();
        assert_eq!(bounds.lower, 0.4);
        assert_eq!(bounds.upper, 0.4);
    }

    fn scores() -> DataFrame {
        let mut frame = DataFrame::new(["model", "score", "stderr"]).unwrap();
        frame
            .push_row(vec!["a".into(), 0.72.into(), 0.05.into()])
            .unwrap();
        frame
            .push_row(vec!["b".into(), 0.5.into(), Value::Null])
            .unwrap();
        frame
    }

    #[test]
    fn derives_bound_columns() {
        let mut frame = scores();
        let (lower, upper) = with_confidence_bounds(&mut frame, "score", "stderr", 0.95).unwrap();
        assert_eq!(lower, "score_ci_lower");
        assert_eq!(upper, "score_ci_upper");

        let low = frame.f64_value(0, &lower).unwrap().unwrap();
        let high = frame.f64_value(0, &upper).unwrap().unwrap();
        assert!((low - 0.622).abs() < EPSILON);
        assert!((high - 0.818).abs() < EPSILON);

        assert_eq!(frame.value(1, &lower), Ok(&Value::Null));
        assert_eq!(frame.value(1, &upper), Ok(&Value::Null));
    }

    #[test]
    fn unsupported_level_fails_before_touching_rows() {
        let mut frame = DataFrame::new(["score", "stderr"]).unwrap();
        let result = with_confidence_bounds(&mut frame, "score", "stderr", 0.93);
        assert!(matches!(result, Err(BoundsError::Confidence(_))));
        assert_eq!(frame.columns().len(), 2);
    }

    #[test]
    fn missing_stderr_column_is_reported() {
        let mut frame = scores();
        let result = with_confidence_bounds(&mut frame, "score", "score_stderr", 0.95);
        assert_eq!(
            result,
            Err(BoundsError::Frame(FrameError::MissingColumn(
                "score_stderr".to_string()
            )))
        );
    }
}
