//! Provider-neutral chat history types and builders.
//!
//! Conversation turns are transient: they arrive with each request and are
//! only ever persisted as part of a rendered case transcript.

use docket_core::TranscriptMessage;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Role in provider-neutral chat history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

/// Content block in provider-neutral history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        #[serde(rename = "tool_use_id")]
        tool_use_id: String,
        content: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
    },
}

/// Provider-neutral chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: Vec<ChatContentBlock>,
}

impl ChatMessage {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: vec![ChatContentBlock::Text { text: text.into() }],
        }
    }

    pub fn assistant_text(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: vec![ChatContentBlock::Text { text: text.into() }],
        }
    }
}

/// Tool result data for building history messages.
#[derive(Debug, Clone)]
pub struct ToolResultData {
    pub tool_use_id: String,
    pub content: String,
    pub is_error: Option<bool>,
}

/// Build a user tool-result message.
pub fn build_tool_result_message(results: Vec<ToolResultData>) -> ChatMessage {
    let content = results
        .into_iter()
        .map(|result| ChatContentBlock::ToolResult {
            tool_use_id: result.tool_use_id,
            content: result.content,
            is_error: result.is_error,
        })
        .collect();

    ChatMessage {
        role: ChatRole::User,
        content,
    }
}

/// Convert inbound transcript turns into chat history.
///
/// User and assistant turns carry over; anything else (system turns,
/// unknown roles, blank content) is dropped here. System-level context is
/// injected separately by the dispatcher.
pub fn history_from_transcript(turns: &[TranscriptMessage]) -> Vec<ChatMessage> {
    turns
        .iter()
        .filter(|turn| !turn.content.trim().is_empty())
        .filter_map(|turn| match turn.role.to_ascii_lowercase().as_str() {
            "user" => Some(ChatMessage::user_text(turn.content.trim())),
            "assistant" | "bot" => Some(ChatMessage::assistant_text(turn.content.trim())),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_converts_user_and_assistant_turns() {
        let turns = vec![
            TranscriptMessage::new("user", "Hi"),
            TranscriptMessage::new("assistant", "Hello, how can I help?"),
            TranscriptMessage::new("system", "internal"),
            TranscriptMessage::new("user", "   "),
        ];

        let history = history_from_transcript(&turns);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, ChatRole::User);
        assert_eq!(history[1].role, ChatRole::Assistant);
    }

    #[test]
    fn tool_result_message_is_user_role() {
        let message = build_tool_result_message(vec![ToolResultData {
            tool_use_id: "tool_1".to_string(),
            content: "result".to_string(),
            is_error: Some(true),
        }]);

        assert_eq!(message.role, ChatRole::User);
        assert!(matches!(
            &message.content[0],
            ChatContentBlock::ToolResult { is_error: Some(true), .. }
        ));
    }
}
