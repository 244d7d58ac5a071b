//! Flattens eval logs into one row per eval.

use super::reader::{read_eval_logs, EvalLogFile};
use crate::frame::{DataFrame, FrameError, Value};
use crate::Result;
use std::path::Path;

pub const EVAL_ID: &str = "eval_id";
pub const RUN_ID: &str = "run_id";
pub const TASK_NAME: &str = "task_name";
pub const MODEL: &str = "model";
pub const STATUS: &str = "status";
pub const CREATED: &str = "created";
pub const TOTAL_SAMPLES: &str = "total_samples";
pub const COMPLETED_SAMPLES: &str = "completed_samples";
pub const SCORE_HEADLINE_NAME: &str = "score_headline_name";
pub const SCORE_HEADLINE_METRIC: &str = "score_headline_metric";
pub const SCORE_HEADLINE_VALUE: &str = "score_headline_value";
pub const SCORE_HEADLINE_STDERR: &str = "score_headline_stderr";
pub const LOG: &str = "log";

/// Columns of the data frame produced by [`evals_df`], in order.
pub const EVALS_COLUMNS: [&str; 13] = [
    EVAL_ID,
    RUN_ID,
    TASK_NAME,
    MODEL,
    STATUS,
    CREATED,
    TOTAL_SAMPLES,
    COMPLETED_SAMPLES,
    SCORE_HEADLINE_NAME,
    SCORE_HEADLINE_METRIC,
    SCORE_HEADLINE_VALUE,
    SCORE_HEADLINE_STDERR,
    LOG,
];

/// Reads every eval log below `logs_dir` into a data frame with one row per eval.
///
/// The headline score is the first score of each eval. Its value is the first metric which is
/// not `stderr`, and its standard error is the `stderr` metric. Evals without results have
/// Null score columns.
pub fn evals_df<P: AsRef<Path>>(logs_dir: P) -> Result<DataFrame> {
    let logs = read_eval_logs(logs_dir)?;
    Ok(evals_frame(&logs)?)
}

/// Builds the evals data frame from logs which were already read.
pub fn evals_frame(logs: &[EvalLogFile]) -> core::result::Result<DataFrame, FrameError> {
    let mut frame = DataFrame::new(EVALS_COLUMNS)?;

    for file in logs {
        let eval = &file.log.eval;
        let results = file.log.results.as_ref();
        let headline = results.and_then(|results| results.headline());
        let metric = headline.and_then(|score| score.primary_metric());
        let stderr = headline.and_then(|score| score.stderr());

        frame.push_row(vec![
            eval.eval_id.as_str().into(),
            non_empty(&eval.run_id),
            eval.task_name().into(),
            eval.model.as_str().into(),
            file.log.status.as_str().into(),
            non_empty(&eval.created),
            results.map(|results| results.total_samples).into(),
            results.map(|results| results.completed_samples).into(),
            headline.map(|score| score.name.as_str()).into(),
            metric.map(|metric| metric.name.as_str()).into(),
            metric.and_then(|metric| metric.value).into(),
            stderr.and_then(|stderr| stderr.value).into(),
            file.log_path().into(),
        ])?;
    }

    Ok(frame)
}

fn non_empty(text: &str) -> Value {
    if text.is_empty() {
        Value::Null
    } else {
        Value::from(text)
    }
}
