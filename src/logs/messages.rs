//! Flattens eval logs into one row per message.
//!
//! The caller chooses which groups of columns to include; `eval_id` and `log` are always
//! present so rows can be traced back to their eval.

use super::evals::{EVAL_ID, LOG, MODEL};
use super::model::{ChatMessage, EvalSample};
use super::reader::{read_eval_logs, EvalLogFile};
use crate::frame::{DataFrame, FrameError, Value};
use crate::Result;
use std::path::Path;

pub const SAMPLE_ID: &str = "sample_id";
pub const ID: &str = "id";
pub const EPOCH: &str = "epoch";
pub const LIMIT: &str = "limit";
pub const MESSAGE_ID: &str = "message_id";
pub const ORDER: &str = "order";
pub const ROLE: &str = "role";
pub const CONTENT: &str = "content";
pub const TOOL_CALL_FUNCTION: &str = "tool_call_function";
pub const TOOL_CALL_ERROR: &str = "tool_call_error";

/// Groups of columns which can be requested from [`messages_df`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnGroup {
    /// `model`
    EvalModel,
    /// `sample_id`, `id`, `epoch`, `limit`
    SampleSummary,
    /// `message_id`, `order`, `role`, `content`, `tool_call_function`, `tool_call_error`
    MessageColumns,
}

impl ColumnGroup {
    /// Every group, in the order they appear in the data frame.
    pub const ALL: [ColumnGroup; 3] = [
        ColumnGroup::EvalModel,
        ColumnGroup::SampleSummary,
        ColumnGroup::MessageColumns,
    ];

    pub const fn columns(&self) -> &'static [&'static str] {
        match self {
            ColumnGroup::EvalModel => &[MODEL],
            ColumnGroup::SampleSummary => &[SAMPLE_ID, ID, EPOCH, LIMIT],
            ColumnGroup::MessageColumns => &[
                MESSAGE_ID,
                ORDER,
                ROLE,
                CONTENT,
                TOOL_CALL_FUNCTION,
                TOOL_CALL_ERROR,
            ],
        }
    }
}

/// Reads every eval log below `logs_dir` into a data frame with one row per message.
pub fn messages_df<P: AsRef<Path>>(logs_dir: P, groups: &[ColumnGroup]) -> Result<DataFrame> {
    let logs = read_eval_logs(logs_dir)?;
    Ok(messages_frame(&logs, groups)?)
}

/// Builds the messages data frame from logs which were already read.
///
/// Groups are emitted in the order given; a group listed twice is only emitted once.
pub fn messages_frame(
    logs: &[EvalLogFile],
    groups: &[ColumnGroup],
) -> core::result::Result<DataFrame, FrameError> {
    let mut unique_groups: Vec<ColumnGroup> = Vec::new();
    for group in groups {
        if !unique_groups.contains(group) {
            unique_groups.push(*group);
        }
    }

    let columns = [EVAL_ID, LOG]
        .into_iter()
        .chain(unique_groups.iter().flat_map(|group| group.columns().iter().copied()));
    let mut frame = DataFrame::new(columns)?;

    for file in logs {
        let log_path = file.log_path();
        for sample in &file.log.samples {
            let sample_id = sample_id(&file.log.eval.eval_id, sample);

            for (index, message) in sample.messages.iter().enumerate() {
                let order = index + 1;
                let mut row: Vec<Value> = vec![
                    file.log.eval.eval_id.as_str().into(),
                    log_path.as_str().into(),
                ];

                for group in &unique_groups {
                    match group {
                        ColumnGroup::EvalModel => row.push(file.log.eval.model.as_str().into()),
                        ColumnGroup::SampleSummary => {
                            row.push(sample_id.as_str().into());
                            row.push(sample.id.to_string().into());
                            row.push(sample.epoch.into());
                            row.push(sample.limit.as_ref().map(|limit| limit.kind.as_str()).into());
                        }
                        ColumnGroup::MessageColumns => {
                            push_message_columns(&mut row, &sample_id, order, message)
                        }
                    }
                }

                frame.push_row(row)?;
            }
        }
    }

    Ok(frame)
}

fn push_message_columns(row: &mut Vec<Value>, sample_id: &str, order: usize, message: &ChatMessage) {
    let message_id = message
        .id
        .clone()
        .unwrap_or_else(|| format!("{}:{}", sample_id, order));
    let functions = message.tool_call_functions();

    row.push(message_id.into());
    row.push(order.into());
    row.push(message.role.as_str().into());
    row.push(message.content.text().into());
    row.push(if functions.is_empty() {
        Value::Null
    } else {
        functions.join(",").into()
    });
    row.push(message.error.as_ref().map(|error| error.message.as_str()).into());
}

/// The sample uuid, or an id made unique across logs from the eval id, sample id and epoch.
fn sample_id(eval_id: &str, sample: &EvalSample) -> String {
    sample
        .uuid
        .clone()
        .unwrap_or_else(|| format!("{}:{}:{}", eval_id, sample.id, sample.epoch))
}
