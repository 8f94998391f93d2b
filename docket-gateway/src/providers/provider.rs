//! Provider trait for abstracting the LLM backend.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::history::{ChatContentBlock, ChatMessage};
use crate::tools::Tool;

/// Unified content block across providers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderContentBlock {
    /// Text content
    Text { text: String },
    /// Tool use request from assistant
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    /// Tool result from user
    ToolResult {
        #[serde(rename = "tool_use_id")]
        tool_use_id: String,
        content: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
    },
}

/// Unified usage information across providers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Unified response type across providers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    pub id: String,
    pub model: String,
    pub content: Vec<ProviderContentBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<ProviderUsage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
}

/// Provider error types
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("API error: {message}")]
    ApiError { message: String },
    #[error("No content in response")]
    NoContent,
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Provider trait for LLM backends
#[async_trait::async_trait]
pub trait Provider: Send + Sync {
    /// Provider name
    fn name(&self) -> &str;

    /// Current model
    fn model(&self) -> &str;

    /// Send a single-turn prompt and get a completion.
    async fn complete(
        &self,
        prompt: &str,
        temperature: Option<f32>,
    ) -> Result<ProviderResponse, ProviderError> {
        self.send_conversation(None, vec![], vec![], Some(prompt), temperature, None)
            .await
    }

    /// Send a conversation and get a response.
    ///
    /// `tool_choice` forces the model to call the named tool; `None` leaves
    /// tool selection to the model.
    async fn send_conversation(
        &self,
        system: Option<String>,
        history: Vec<ChatMessage>,
        tools: Vec<&dyn Tool>,
        new_message: Option<&str>,
        temperature: Option<f32>,
        tool_choice: Option<String>,
    ) -> Result<ProviderResponse, ProviderError>;
}

impl From<&ProviderContentBlock> for ChatContentBlock {
    fn from(block: &ProviderContentBlock) -> Self {
        match block {
            ProviderContentBlock::Text { text } => ChatContentBlock::Text { text: text.clone() },
            ProviderContentBlock::ToolUse { id, name, input } => ChatContentBlock::ToolUse {
                id: id.clone(),
                name: name.clone(),
                input: input.clone(),
            },
            ProviderContentBlock::ToolResult {
                tool_use_id,
                content,
                is_error,
            } => ChatContentBlock::ToolResult {
                tool_use_id: tool_use_id.clone(),
                content: content.clone(),
                is_error: *is_error,
            },
        }
    }
}

/// Extract all text content from a response
pub fn extract_all_text(response: &ProviderResponse) -> String {
    response
        .content
        .iter()
        .filter_map(|block| match block {
            ProviderContentBlock::Text { text } => Some(text.clone()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Extract tool uses from a response
pub fn extract_tool_uses(response: &ProviderResponse) -> Vec<(String, String, Value)> {
    response
        .content
        .iter()
        .filter_map(|block| match block {
            ProviderContentBlock::ToolUse { id, name, input } => {
                Some((id.clone(), name.clone(), input.clone()))
            }
            _ => None,
        })
        .collect()
}

/// Check if the response has tool uses
pub fn has_tool_uses(response: &ProviderResponse) -> bool {
    response
        .content
        .iter()
        .any(|block| matches!(block, ProviderContentBlock::ToolUse { .. }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_text() {
        let response = ProviderResponse {
            id: "msg_001".to_string(),
            model: "test-model".to_string(),
            content: vec![ProviderContentBlock::Text {
                text: "Hello, world!".to_string(),
            }],
            usage: Some(ProviderUsage {
                input_tokens: 10,
                output_tokens: 5,
            }),
            stop_reason: Some("stop".to_string()),
        };

        assert_eq!(extract_all_text(&response), "Hello, world!");
        assert!(!has_tool_uses(&response));
    }

    #[test]
    fn test_extract_tool_uses() {
        let response = ProviderResponse {
            id: "msg_001".to_string(),
            model: "test-model".to_string(),
            content: vec![
                ProviderContentBlock::Text {
                    text: "I'll check that.".to_string(),
                },
                ProviderContentBlock::ToolUse {
                    id: "tool_123".to_string(),
                    name: "lookup_caller_history".to_string(),
                    input: serde_json::json!({"phone_number": "+15551234567"}),
                },
            ],
            usage: None,
            stop_reason: Some("tool_use".to_string()),
        };

        let tools = extract_tool_uses(&response);
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].0, "tool_123");
        assert_eq!(tools[0].1, "lookup_caller_history");
        assert!(has_tool_uses(&response));
    }
}
