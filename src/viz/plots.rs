//! Shared plotting infrastructure for the score visualizations
//!
//! Plots are rendered with [`plotters`] into SVG documents. SVG text is emitted as `<text>`
//! elements, so no system fonts are needed to render in headless environments.

use crate::frame::FrameError;
use crate::stats::bounds::BoundsError;
use crate::stats::confidence::UnsupportedConfidenceLevel;
use plotters::style::RGBColor;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during plot generation
#[derive(Error, Debug)]
pub enum PlotError {
    #[error("Failed to create drawing area: {0}")]
    DrawingArea(String),

    #[error("Failed to configure chart: {0}")]
    ChartConfig(String),

    #[error("Failed to draw chart elements: {0}")]
    Drawing(String),

    #[error("Failed to save plot to file: {0}")]
    FileSave(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Confidence(#[from] UnsupportedConfidenceLevel),
}

impl From<BoundsError> for PlotError {
    fn from(error: BoundsError) -> Self {
        match error {
            BoundsError::Confidence(error) => PlotError::Confidence(error),
            BoundsError::Frame(error) => PlotError::Frame(error),
        }
    }
}

pub(crate) type Result<T> = core::result::Result<T, PlotError>;

/// Font family used for all text in plots.
pub(crate) const FONT: &str = "sans-serif";

/// Categorical colors, assigned to series in order of first appearance.
const PALETTE: [RGBColor; 10] = [
    RGBColor(0x4e, 0x79, 0xa7),
    RGBColor(0xf2, 0x8e, 0x2c),
    RGBColor(0xe1, 0x57, 0x59),
    RGBColor(0x76, 0xb7, 0xb2),
    RGBColor(0x59, 0xa1, 0x4f),
    RGBColor(0xed, 0xc9, 0x49),
    RGBColor(0xaf, 0x7a, 0xa1),
    RGBColor(0xff, 0x9d, 0xa7),
    RGBColor(0x9c, 0x75, 0x5f),
    RGBColor(0xba, 0xb0, 0xab),
];

/// Color of the series at `index`. Wraps around after ten series.
pub fn series_color(index: usize) -> RGBColor {
    PALETTE[index % PALETTE.len()]
}

const SEQUENTIAL_LOW: RGBColor = RGBColor(0xf7, 0xfb, 0xff);
const SEQUENTIAL_HIGH: RGBColor = RGBColor(0x08, 0x30, 0x6b);

/// Color for `value` on a light to dark blue scale spanning `domain`.
///
/// Values outside of the domain are clamped to its ends.
pub fn sequential_color(value: f64, domain: (f64, f64)) -> RGBColor {
    let (low, high) = domain;
    let t = if high > low {
        ((value - low) / (high - low)).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let channel = |from: u8, to: u8| (from as f64 + (to as f64 - from as f64) * t).round() as u8;
    RGBColor(
        channel(SEQUENTIAL_LOW.0, SEQUENTIAL_HIGH.0),
        channel(SEQUENTIAL_LOW.1, SEQUENTIAL_HIGH.1),
        channel(SEQUENTIAL_LOW.2, SEQUENTIAL_HIGH.2),
    )
}

/// True if text drawn on `background` should be white rather than black.
pub(crate) fn needs_light_text(background: RGBColor) -> bool {
    let luminance =
        0.299 * background.0 as f64 + 0.587 * background.1 as f64 + 0.114 * background.2 as f64;
    luminance < 128.0
}

/// Writes a rendered SVG document to `output_path`.
pub(crate) fn save_svg(svg: &str, output_path: &Path) -> Result<()> {
    fs::write(output_path, svg)?;
    tracing::info!(path = %output_path.display(), "wrote plot");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn series_colors_wrap_around() {
        assert_eq!(series_color(0), series_color(10));
        assert_ne!(series_color(0), series_color(1));
    }

    #[rstest(value, expected,
        case(0.0, SEQUENTIAL_LOW),
        case(1.0, SEQUENTIAL_HIGH),
        case(-3.0, SEQUENTIAL_LOW),
        case(7.0, SEQUENTIAL_HIGH)
    )]
    fn sequential_scale_is_clamped(value: f64, expected: RGBColor) {
        assert_eq!(sequential_color(value, (0.0, 1.0)), expected);
    }

    #[test]
    fn degenerate_domain_uses_low_color() {
        assert_eq!(sequential_color(0.5, (1.0, 1.0)), SEQUENTIAL_LOW);
    }

    #[test]
    fn text_contrast() {
        assert!(needs_light_text(SEQUENTIAL_HIGH));
        assert!(!needs_light_text(SEQUENTIAL_LOW));
    }

    #[test]
    fn bounds_errors_keep_their_kind() {
        let error: PlotError = BoundsError::Frame(FrameError::MissingColumn("x".into())).into();
        assert!(matches!(error, PlotError::Frame(_)));
    }
}
