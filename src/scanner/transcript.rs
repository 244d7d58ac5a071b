use crate::logs::model::{ChatMessage, Role};

/// Selects which messages of a sample a scanner reads.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MessageFilter {
    #[default]
    All,
    Only(Vec<Role>),
}

impl MessageFilter {
    pub fn includes(&self, role: Role) -> bool {
        match self {
            MessageFilter::All => true,
            MessageFilter::Only(roles) => roles.contains(&role),
        }
    }
}

/// Renders the messages accepted by `filter` as a numbered transcript.
///
/// Messages keep their position in the full conversation as their number (`[M3]`), so
/// explanations given by a model can be traced back to the `order` column of messages
/// data frames. Returns an empty string if no message is accepted.
pub fn render_transcript(messages: &[ChatMessage], filter: &MessageFilter) -> String {
    let mut rendered: Vec<String> = Vec::new();

    for (index, message) in messages.iter().enumerate() {
        if !filter.includes(message.role) {
            continue;
        }

        let mut block = format!("[M{}] {}", index + 1, message.role.as_str().to_uppercase());
        if let (Role::Tool, Some(function)) = (message.role, message.function.as_deref()) {
            block.push_str(&format!(" ({})", function));
        }
        block.push_str(":\n");

        let text = message.content.text();
        if !text.is_empty() {
            block.push_str(&text);
            block.push('\n');
        }

        for call in &message.tool_calls {
            block.push_str(&format!("Tool call: {}({})\n", call.function, call.arguments));
        }

        if let Some(error) = &message.error {
            block.push_str(&format!("Tool error ({}): {}\n", error.kind, error.message));
        }

        rendered.push(block);
    }

    rendered.join("\n")
}
