use crate::frame::{FrameError, FrameFileError};
use crate::logs::LogReadError;
use crate::prepare::PrepareError;
use crate::scanner::ScanError;
use crate::settings::SettingsError;
use crate::stats::bounds::BoundsError;
use crate::stats::confidence::UnsupportedConfidenceLevel;
use crate::viz::PlotError;
use thiserror::Error;

/// Any error produced by this crate.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Confidence(#[from] UnsupportedConfidenceLevel),

    #[error("Confidence bounds error: {0}")]
    Bounds(#[from] BoundsError),

    #[error("Data frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("Frame file error: {0}")]
    FrameFile(#[from] FrameFileError),

    #[error("Log reading error: {0}")]
    LogRead(#[from] LogReadError),

    #[error("Prepare error: {0}")]
    Prepare(#[from] PrepareError),

    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    #[error("Plot error: {0}")]
    Plot(#[from] PlotError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),
}

pub type Result<T> = core::result::Result<T, Error>;
