//! Anthropic API client.

use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::history::ChatMessage;
use crate::providers::anthropic::history::{AnthropicMessage, to_anthropic_messages};
use crate::providers::provider::{
    Provider, ProviderContentBlock, ProviderError, ProviderResponse, ProviderUsage,
};
use crate::tools::Tool;

/// Anthropic API client
#[derive(Clone)]
pub struct AnthropicClient {
    http_client: reqwest::Client,
    api_key: String,
    model: String,
    max_tokens: u32,
    base_url: String,
}

/// Request body for the Messages API
#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ToolDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<Value>,
}

#[derive(Debug, Serialize)]
struct ToolDefinition {
    name: String,
    description: String,
    input_schema: Value,
}

/// Response from the Messages API
#[derive(Debug, Clone, Deserialize)]
struct MessagesResponse {
    id: String,
    model: String,
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "tool_use")]
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
}

#[derive(Debug, Clone, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

impl AnthropicClient {
    /// Create a new Anthropic client with a bounded request timeout.
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        max_tokens: u32,
        timeout: Duration,
    ) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert("anthropic-version", HeaderValue::from_static("2023-06-01"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            http_client,
            api_key: api_key.into(),
            model: model.into(),
            max_tokens,
            base_url: "https://api.anthropic.com/v1".to_string(),
        }
    }
}

#[async_trait::async_trait]
impl Provider for AnthropicClient {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn send_conversation(
        &self,
        system: Option<String>,
        history: Vec<ChatMessage>,
        tools: Vec<&dyn Tool>,
        new_message: Option<&str>,
        temperature: Option<f32>,
        tool_choice: Option<String>,
    ) -> Result<ProviderResponse, ProviderError> {
        let url = format!("{}/messages", self.base_url);

        let messages = to_anthropic_messages(history, new_message);

        let tool_definitions = if tools.is_empty() {
            None
        } else {
            Some(
                tools
                    .iter()
                    .map(|t| ToolDefinition {
                        name: t.name().to_string(),
                        description: t.description().to_string(),
                        input_schema: t.input_schema(),
                    })
                    .collect(),
            )
        };

        let tool_choice = tool_choice.map(|name| json!({ "type": "tool", "name": name }));

        let request_body = MessagesRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            system,
            messages,
            temperature,
            tools: tool_definitions,
            tool_choice,
        };

        let response = self
            .http_client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                message: format!("HTTP {}: {}", status, error_text),
            });
        }

        let messages_response: MessagesResponse = response.json().await?;

        if messages_response.content.is_empty() {
            return Err(ProviderError::NoContent);
        }

        Ok(convert_response(messages_response))
    }
}

fn convert_response(response: MessagesResponse) -> ProviderResponse {
    let content = response
        .content
        .into_iter()
        .map(|block| match block {
            ContentBlock::Text { text } => ProviderContentBlock::Text { text },
            ContentBlock::ToolUse { id, name, input } => {
                ProviderContentBlock::ToolUse { id, name, input }
            }
        })
        .collect();

    ProviderResponse {
        id: response.id,
        model: response.model,
        content,
        usage: response.usage.map(|u| ProviderUsage {
            input_tokens: u.input_tokens,
            output_tokens: u.output_tokens,
        }),
        stop_reason: response.stop_reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_tool_use_blocks() {
        let response = MessagesResponse {
            id: "msg_1".to_string(),
            model: "test".to_string(),
            content: vec![
                ContentBlock::Text {
                    text: "Checking.".to_string(),
                },
                ContentBlock::ToolUse {
                    id: "tu_1".to_string(),
                    name: "web_search".to_string(),
                    input: json!({"query": "new AI copyright ruling"}),
                },
            ],
            stop_reason: Some("tool_use".to_string()),
            usage: None,
        };

        let converted = convert_response(response);
        assert_eq!(converted.content.len(), 2);
        assert!(matches!(
            &converted.content[1],
            ProviderContentBlock::ToolUse { name, .. } if name == "web_search"
        ));
    }
}
