//! Adds organization and display name columns derived from `provider/model` identifiers.

use super::Operation;
use crate::frame::{DataFrame, FrameError, Value};
use crate::logs::evals::MODEL;

pub const MODEL_ORGANIZATION_NAME: &str = "model_organization_name";
pub const MODEL_DISPLAY_NAME: &str = "model_display_name";

/// Providers which serve models of other organizations; the organization is the next segment.
const HOSTING_PROVIDERS: [&str; 9] = [
    "openrouter",
    "together",
    "bedrock",
    "vertex",
    "azureai",
    "groq",
    "fireworks",
    "hf",
    "vllm",
];

/// Known organization names, keyed by provider or organization path segment.
const ORGANIZATIONS: [(&str, &str); 14] = [
    ("openai", "OpenAI"),
    ("anthropic", "Anthropic"),
    ("google", "Google"),
    ("gemini", "Google"),
    ("mistral", "Mistral"),
    ("mistralai", "Mistral"),
    ("grok", "xAI"),
    ("x-ai", "xAI"),
    ("meta-llama", "Meta"),
    ("meta", "Meta"),
    ("deepseek", "DeepSeek"),
    ("deepseek-ai", "DeepSeek"),
    ("qwen", "Alibaba"),
    ("cohere", "Cohere"),
];

/// Organization and display name of a model identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelIdentity {
    pub organization: String,
    pub display_name: String,
}

/// Splits a model identifier such as `openai/gpt-4o` or `openrouter/meta-llama/llama-3-70b`.
///
/// Unknown organizations keep their path segment as the name. Returns `None` for identifiers
/// without a provider.
pub fn model_identity(model: &str) -> Option<ModelIdentity> {
    let segments: Vec<&str> = model.split('/').filter(|s| !s.is_empty()).collect();
    if segments.len() < 2 {
        return None;
    }

    let organization = if HOSTING_PROVIDERS.contains(&segments[0]) && segments.len() > 2 {
        segments[1]
    } else {
        segments[0]
    };
    let organization = ORGANIZATIONS
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(organization))
        .map_or(organization, |(_, name)| *name);

    Some(ModelIdentity {
        organization: organization.to_string(),
        display_name: segments[segments.len() - 1].to_string(),
    })
}

/// Adds `model_organization_name` and `model_display_name` columns based on `model`.
#[derive(Debug, Clone, Default)]
pub struct ModelInfo;

/// Creates the [`ModelInfo`] operation.
pub fn model_info() -> ModelInfo {
    ModelInfo
}

impl Operation for ModelInfo {
    fn name(&self) -> &'static str {
        "model_info"
    }

    fn apply(&self, frame: &mut DataFrame) -> Result<(), FrameError> {
        frame.column_index(MODEL)?;

        let identity = |row: crate::frame::RowView<'_>| -> Result<Option<ModelIdentity>, FrameError> {
            Ok(row.str(MODEL)?.and_then(model_identity))
        };

        frame.with_column(MODEL_ORGANIZATION_NAME, |row| {
            Ok::<Value, FrameError>(identity(row)?.map(|id| id.organization).into())
        })?;
        frame.with_column(MODEL_DISPLAY_NAME, |row| {
            Ok::<Value, FrameError>(identity(row)?.map(|id| id.display_name).into())
        })
    }
}
