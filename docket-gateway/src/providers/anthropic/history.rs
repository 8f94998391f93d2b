//! Anthropic message payload types and conversion from neutral chat history.

use serde::{Deserialize, Serialize};

use crate::history::{ChatContentBlock, ChatMessage, ChatRole};

/// Anthropic API message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicMessage {
    pub role: String,
    pub content: Vec<AnthropicContentBlock>,
}

/// Anthropic API content block.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnthropicContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    ToolResult {
        #[serde(rename = "tool_use_id")]
        tool_use_id: String,
        content: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
    },
}

/// Convert provider-neutral history to Anthropic history, with an optional
/// final user text.
pub fn to_anthropic_messages(
    history: Vec<ChatMessage>,
    new_message: Option<&str>,
) -> Vec<AnthropicMessage> {
    let mut messages: Vec<AnthropicMessage> = history.into_iter().map(convert_message).collect();

    if let Some(content) = new_message {
        messages.push(AnthropicMessage {
            role: "user".to_string(),
            content: vec![AnthropicContentBlock::Text {
                text: content.to_string(),
            }],
        });
    }

    messages
}

fn convert_message(message: ChatMessage) -> AnthropicMessage {
    AnthropicMessage {
        role: match message.role {
            ChatRole::User => "user".to_string(),
            ChatRole::Assistant => "assistant".to_string(),
        },
        content: message
            .content
            .into_iter()
            .map(convert_content_block)
            .collect(),
    }
}

fn convert_content_block(block: ChatContentBlock) -> AnthropicContentBlock {
    match block {
        ChatContentBlock::Text { text } => AnthropicContentBlock::Text { text },
        ChatContentBlock::ToolUse { id, name, input } => {
            AnthropicContentBlock::ToolUse { id, name, input }
        }
        ChatContentBlock::ToolResult {
            tool_use_id,
            content,
            is_error,
        } => AnthropicContentBlock::ToolResult {
            tool_use_id,
            content,
            is_error,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_new_message_as_user_turn() {
        let history = vec![ChatMessage::assistant_text("Hello")];
        let messages = to_anthropic_messages(history, Some("Hi there"));

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "assistant");
        assert_eq!(messages[1].role, "user");
    }
}
