//! Locating and parsing eval log files.
//!
//! Logs are JSON documents, optionally compressed with ZStandard (`*.json.zst`).

use super::model::EvalLog;
use std::fs::{read_dir, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use zstd::Decoder;

/// Errors that can occur when reading eval logs
#[derive(Error, Debug)]
pub enum LogReadError {
    #[error("Failed to read log file or directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decompress zstd log file: {0}")]
    Decompression(String),

    #[error("Failed to parse eval log JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not an eval log file: {0}")]
    UnsupportedFormat(PathBuf),
}

type Result<T> = core::result::Result<T, LogReadError>;

/// An eval log together with the file it was read from.
#[derive(Debug, Clone)]
pub struct EvalLogFile {
    pub path: PathBuf,
    pub log: EvalLog,
}

impl EvalLogFile {
    /// The log path with `/` separators, as stored in the `log` column of data frames.
    pub fn log_path(&self) -> String {
        normalize_separators(&self.path)
    }
}

pub(crate) fn normalize_separators(path: &Path) -> String {
    let path_str = path.to_string_lossy();
    #[cfg(windows)]
    {
        path_str.replace('\\', "/")
    }
    #[cfg(not(windows))]
    {
        path_str.into_owned()
    }
}

enum LogFormat {
    Json,
    CompressedJson,
}

fn log_format(path: &Path) -> Option<LogFormat> {
    let name = path.file_name()?.to_str()?;
    if name.ends_with(".json.zst") {
        Some(LogFormat::CompressedJson)
    } else if name.ends_with(".json") {
        Some(LogFormat::Json)
    } else {
        None
    }
}

/// Finds all eval log files below `directory_path`, sorted by path.
///
/// # Errors
///
/// Returns an error if there are issues accessing the directory or its subdirectories.
pub fn find_eval_logs<P: AsRef<Path>>(directory_path: P) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    walk_directory(directory_path.as_ref(), &mut files)?;
    files.sort();
    Ok(files)
}

fn walk_directory(current_path: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in read_dir(current_path)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            walk_directory(&path, files)?;
        } else if file_type.is_file() && log_format(&path).is_some() {
            files.push(path);
        }
    }

    Ok(())
}

/// Parses a single eval log file.
pub fn read_eval_log(file_path: &Path) -> Result<EvalLog> {
    let format = log_format(file_path)
        .ok_or_else(|| LogReadError::UnsupportedFormat(file_path.to_path_buf()))?;
    let file = File::open(file_path)?;

    let log = match format {
        LogFormat::Json => serde_json::from_reader(BufReader::new(file))?,
        LogFormat::CompressedJson => {
            let mut decoder = Decoder::new(file).map_err(|e| {
                LogReadError::Decompression(format!("Failed to create decoder: {}", e))
            })?;
            serde_json::from_reader(&mut decoder)?
        }
    };

    Ok(log)
}

/// Reads every eval log below `directory_path`.
///
/// Files which cannot be parsed as eval logs (e.g. log directory index files) are skipped
/// with a warning instead of failing the whole directory.
pub fn read_eval_logs<P: AsRef<Path>>(directory_path: P) -> Result<Vec<EvalLogFile>> {
    let paths = find_eval_logs(directory_path.as_ref())?;
    let logs = read_eval_log_files(paths, |_| {});

    tracing::debug!(
        directory = %directory_path.as_ref().display(),
        count = logs.len(),
        "read eval logs"
    );
    Ok(logs)
}

/// Reads the given eval log files, skipping those which fail to parse with a warning.
///
/// `on_file` is called once per path after it has been attempted, whether or not it
/// could be read.
pub fn read_eval_log_files<F>(paths: Vec<PathBuf>, mut on_file: F) -> Vec<EvalLogFile>
where
    F: FnMut(&Path),
{
    let mut logs = Vec::with_capacity(paths.len());
    for path in paths {
        let result = read_eval_log(&path);
        on_file(&path);
        match result {
            Ok(log) => logs.push(EvalLogFile { path, log }),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping unreadable eval log");
            }
        }
    }
    logs
}
