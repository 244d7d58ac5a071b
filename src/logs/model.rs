use core::fmt;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};

/// Completion status of an eval run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvalStatus {
    Started,
    Success,
    Cancelled,
    Error,
}

impl EvalStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            EvalStatus::Started => "started",
            EvalStatus::Success => "success",
            EvalStatus::Cancelled => "cancelled",
            EvalStatus::Error => "error",
        }
    }
}

/// A complete eval log as written by the evaluation framework
#[derive(Debug, Clone, Deserialize)]
pub struct EvalLog {
    /// Log format version
    #[serde(default)]
    pub version: u32,
    /// Whether the run finished
    pub status: EvalStatus,
    /// Task and model the eval was run with
    pub eval: EvalSpec,
    /// Aggregated scores; absent when the run did not complete
    #[serde(default)]
    pub results: Option<EvalResults>,
    /// Per-sample transcripts; absent when the log was written header-only
    #[serde(default, deserialize_with = "null_as_default")]
    pub samples: Vec<EvalSample>,
}

/// Identifies what was evaluated
#[derive(Debug, Clone, Deserialize)]
pub struct EvalSpec {
    /// Unique id of this eval
    pub eval_id: String,
    /// Id of the run that this eval was part of
    #[serde(default)]
    pub run_id: String,
    /// Creation time (ISO 8601)
    #[serde(default)]
    pub created: String,
    /// Registered task name, possibly with a package prefix (`pkg/task`)
    pub task: String,
    #[serde(default)]
    pub task_id: String,
    /// Model under evaluation (`provider/model`)
    pub model: String,
}

impl EvalSpec {
    /// Task name without the package prefix.
    pub fn task_name(&self) -> &str {
        self.task.rsplit('/').next().unwrap_or(&self.task)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EvalResults {
    #[serde(default)]
    pub total_samples: u32,
    #[serde(default)]
    pub completed_samples: u32,
    /// Scores in the order the scorers were declared; the first is the headline score
    #[serde(default)]
    pub scores: Vec<EvalScore>,
}

impl EvalResults {
    /// The first score, which is used as the headline score.
    pub fn headline(&self) -> Option<&EvalScore> {
        self.scores.first()
    }
}

/// Results of a single scorer
#[derive(Debug, Clone, Deserialize)]
pub struct EvalScore {
    pub name: String,
    #[serde(default)]
    pub scorer: String,
    /// Metrics in document order
    #[serde(default, deserialize_with = "ordered_metrics")]
    pub metrics: Vec<EvalMetric>,
}

/// Name of the metric which holds the standard error of a score.
pub const STDERR_METRIC: &str = "stderr";

impl EvalScore {
    /// The first metric which is not the standard error.
    pub fn primary_metric(&self) -> Option<&EvalMetric> {
        self.metrics
            .iter()
            .find(|metric| metric.name != STDERR_METRIC)
    }

    pub fn stderr(&self) -> Option<&EvalMetric> {
        self.metrics
            .iter()
            .find(|metric| metric.name == STDERR_METRIC)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EvalMetric {
    /// Metric name; filled from the map key when the document omits it
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: Option<f64>,
}

/// Deserializes a JSON object of metrics into a list, keeping the key order of the document.
fn ordered_metrics<'de, D>(deserializer: D) -> Result<Vec<EvalMetric>, D::Error>
where
    D: Deserializer<'de>,
{
    struct MetricsVisitor;

    impl<'de> Visitor<'de> for MetricsVisitor {
        type Value = Vec<EvalMetric>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of metric name to metric")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut metrics = Vec::new();
            while let Some((key, mut metric)) = map.next_entry::<String, EvalMetric>()? {
                if metric.name.is_empty() {
                    metric.name = key;
                }
                metrics.push(metric);
            }
            Ok(metrics)
        }
    }

    deserializer.deserialize_map(MetricsVisitor)
}

/// Treats an explicit `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Sample ids may be integers or strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SampleId {
    Int(i64),
    Text(String),
}

impl fmt::Display for SampleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleId::Int(id) => write!(f, "{}", id),
            SampleId::Text(id) => write!(f, "{}", id),
        }
    }
}

fn default_epoch() -> u32 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct EvalSample {
    pub id: SampleId,
    #[serde(default = "default_epoch")]
    pub epoch: u32,
    /// Globally unique sample id, written by newer log versions
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub messages: Vec<ChatMessage>,
    /// Set when the sample was stopped by a limit (messages, tokens, time...)
    #[serde(default)]
    pub limit: Option<SampleLimit>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SampleLimit {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub limit: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub id: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub content: MessageContent,
    /// Tool calls requested by an assistant message
    #[serde(default, deserialize_with = "null_as_default")]
    pub tool_calls: Vec<ToolCall>,
    /// For tool messages, the id of the call being answered
    #[serde(default)]
    pub tool_call_id: Option<String>,
    /// For tool messages, the function which was called
    #[serde(default)]
    pub function: Option<String>,
    /// For tool messages, the error raised by the tool
    #[serde(default)]
    pub error: Option<ToolCallError>,
}

impl ChatMessage {
    /// Names of the functions called by this message.
    ///
    /// Assistant messages report their requested calls, tool messages the function they answer.
    pub fn tool_call_functions(&self) -> Vec<&str> {
        match self.role {
            Role::Assistant => self
                .tool_calls
                .iter()
                .map(|call| call.function.as_str())
                .collect(),
            Role::Tool => self.function.as_deref().into_iter().collect(),
            Role::System | Role::User => Vec::new(),
        }
    }
}

/// Message content is either plain text or a list of typed parts
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl Default for MessageContent {
    fn default() -> Self {
        MessageContent::Text(String::new())
    }
}

impl MessageContent {
    /// Concatenated text of the content; non-text parts are skipped.
    pub fn text(&self) -> String {
        match self {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|part| part.text.as_deref())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentPart {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolCall {
    #[serde(default)]
    pub id: String,
    pub function: String,
    #[serde(default)]
    pub arguments: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallError {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = r#"{
        "version": 2,
        "status": "success",
        "eval": {
            "eval_id": "e1",
            "run_id": "r1",
            "created": "2025-06-01T10:00:00+00:00",
            "task": "inspect_evals/cybench",
            "model": "openai/gpt-4o"
        },
        "results": {
            "total_samples": 2,
            "completed_samples": 2,
            "scores": [{
                "name": "includes",
                "scorer": "includes",
                "metrics": {
                    "stderr": {"name": "stderr", "value": 0.05},
                    "mean": {"value": 0.72}
                }
            }]
        },
        "samples": [{
            "id": "avatar",
            "epoch": 1,
            "messages": [
                {"role": "user", "content": [{"type": "text", "text": "Find the flag"}], "tool_calls": null},
                {"id": "m2", "role": "assistant", "content": "",
                 "tool_calls": [{"id": "c1", "function": "bash", "arguments": {"cmd": "ls"}}]},
                {"role": "tool", "content": "", "tool_call_id": "c1", "function": "bash",
                 "error": {"type": "timeout", "message": "Command timed out"}}
            ],
            "limit": {"type": "message", "limit": 50}
        }]
    }"#;

    #[test]
    fn parses_log_document() {
        let log: EvalLog = serde_json::from_str(LOG).unwrap();
        assert_eq!(log.status, EvalStatus::Success);
        assert_eq!(log.eval.task_name(), "cybench");

        let results = log.results.unwrap();
        let headline = results.headline().unwrap();
        assert_eq!(headline.metrics.len(), 2);
        // Document order is preserved, so stderr comes first here
        assert_eq!(headline.metrics[0].name, "stderr");
        assert_eq!(headline.primary_metric().unwrap().name, "mean");
        assert_eq!(headline.primary_metric().unwrap().value, Some(0.72));
        assert_eq!(headline.stderr().unwrap().value, Some(0.05));

        let sample = &log.samples[0];
        assert_eq!(sample.id, SampleId::Text("avatar".to_string()));
        assert_eq!(sample.limit.as_ref().unwrap().kind, "message");
        assert_eq!(sample.messages[0].content.text(), "Find the flag");
        assert_eq!(sample.messages[1].tool_call_functions(), vec!["bash"]);
        assert_eq!(sample.messages[2].tool_call_functions(), vec!["bash"]);
        assert_eq!(
            sample.messages[2].error.as_ref().unwrap().message,
            "Command timed out"
        );
    }

    #[test]
    fn optional_sections_may_be_missing() {
        let log: EvalLog = serde_json::from_str(
            r#"{"status": "started", "eval": {"eval_id": "e2", "task": "ctf", "model": "mockllm/model"}}"#,
        )
        .unwrap();
        assert!(log.results.is_none());
        assert!(log.samples.is_empty());
        assert_eq!(log.eval.task_name(), "ctf");
    }
}
