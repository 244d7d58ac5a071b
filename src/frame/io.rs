//! Saving and loading data frames.
//!
//! Frames are stored as JSON. Paths ending in `.zst` are compressed with ZStandard.

use super::DataFrame;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;
use zstd::{Decoder, Encoder};

/// ZStandard level used for saved frames.
const COMPRESSION_LEVEL: i32 = 16;

/// Errors that can occur when saving or loading a frame file
#[derive(Error, Debug)]
pub enum FrameFileError {
    #[error("Failed to access frame file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode or decode frame JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to compress or decompress frame file: {0}")]
    Compression(String),
}

type Result<T> = core::result::Result<T, FrameFileError>;

fn is_compressed(path: &Path) -> bool {
    path.extension().is_some_and(|extension| extension == "zst")
}

/// Saves a data frame to `output_path`, compressing it if the path ends in `.zst`.
pub fn save_frame(frame: &DataFrame, output_path: &Path) -> Result<()> {
    let writer = BufWriter::new(File::create(output_path)?);

    if is_compressed(output_path) {
        let mut encoder = Encoder::new(writer, COMPRESSION_LEVEL)
            .map_err(|e| FrameFileError::Compression(format!("Failed to create encoder: {}", e)))?;
        serde_json::to_writer(&mut encoder, frame)?;
        encoder.finish()?.flush()?;
    } else {
        let mut writer = writer;
        serde_json::to_writer(&mut writer, frame)?;
        writer.flush()?;
    }

    tracing::debug!(
        path = %output_path.display(),
        rows = frame.len(),
        "saved data frame"
    );
    Ok(())
}

/// Loads a data frame saved with [`save_frame`].
pub fn load_frame(input_path: &Path) -> Result<DataFrame> {
    let file = File::open(input_path)?;

    if is_compressed(input_path) {
        let mut decoder = Decoder::new(file)
            .map_err(|e| FrameFileError::Compression(format!("Failed to create decoder: {}", e)))?;
        Ok(serde_json::from_reader(&mut decoder)?)
    } else {
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}
