//! Critical values for two-sided confidence intervals.
//!
//! Only a fixed set of confidence levels is supported. The z values are the standard normal
//! quantiles for each level, rounded to three decimals, and are not computed at runtime.
//! Requesting any other level is an error rather than an approximation.

use core::fmt;
use thiserror::Error;

/// Supported confidence levels and their z critical values, in ascending order.
static Z_ALPHA_TABLE: [(f64, f64); 8] = [
    (0.80, 1.282),
    (0.85, 1.440),
    (0.90, 1.645),
    (0.95, 1.960),
    (0.975, 2.241),
    (0.99, 2.576),
    (0.995, 2.807),
    (0.999, 3.291),
];

/// The confidence level used when none is specified.
pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.95;

/// Returned when a confidence level outside of [`supported_confidence_levels`] is requested.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
#[error(
    "Unsupported confidence level {requested}. Please use one of these confidence levels: {levels}",
    levels = SupportedLevels
)]
pub struct UnsupportedConfidenceLevel {
    /// The level which was asked for.
    pub requested: f64,
}

struct SupportedLevels;

impl fmt::Display for SupportedLevels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (index, (level, _)) in Z_ALPHA_TABLE.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", level)?;
        }
        write!(f, "]")
    }
}

/// Returns the z critical value (z_alpha) for a two-sided confidence level.
///
/// The level is matched by exact value, so `0.95` resolves but `0.950001` does not.
///
/// # Arguments
/// * `ci` - Confidence level, e.g. `0.95` for a 95% interval
///
/// # Returns
/// * `Ok(f64)` - The critical value for the level
/// * `Err(UnsupportedConfidenceLevel)` - If the level is not one of the supported levels
///
/// # Examples
/// ```
/// use eval_insights::stats::confidence::z_alpha;
///
/// assert_eq!(z_alpha(0.95).unwrap(), 1.960);
/// assert!(z_alpha(0.93).is_err());
/// ```
pub fn z_alpha(ci: f64) -> Result<f64, UnsupportedConfidenceLevel> {
    Z_ALPHA_TABLE
        .iter()
        .find(|(level, _)| *level == ci)
        .map(|(_, z)| *z)
        .ok_or(UnsupportedConfidenceLevel { requested: ci })
}

/// Returns every supported confidence level in ascending order.
pub fn supported_confidence_levels() -> impl ExactSizeIterator<Item = f64> {
    Z_ALPHA_TABLE.iter().map(|(level, _)| *level)
}
