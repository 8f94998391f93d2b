//! Shared fakes for integration tests.

use docket_gateway::history::ChatMessage;
use docket_gateway::providers::{
    Provider, ProviderContentBlock, ProviderError, ProviderResponse,
};
use docket_gateway::tools::Tool;
use serde_json::{Value, json};

/// Provider fake: answers summaries as text and, when a tool_choice forces
/// the intake recorder, returns a canned structured intake.
pub struct ScriptedProvider {
    pub summary: String,
    pub intake: Value,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            summary: "Caller described being terminated and asked about next steps.".to_string(),
            intake: json!({
                "client_name": "Jane Doe",
                "opposing_party": "Innovate Corp",
                "case_type": "Wrongful Termination",
                "summary_of_facts": "Caller was fired after reporting safety issues.",
                "key_dates": []
            }),
        }
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn send_conversation(
        &self,
        _system: Option<String>,
        _history: Vec<ChatMessage>,
        _tools: Vec<&dyn Tool>,
        _new_message: Option<&str>,
        _temperature: Option<f32>,
        tool_choice: Option<String>,
    ) -> Result<ProviderResponse, ProviderError> {
        let content = match tool_choice {
            Some(name) => vec![ProviderContentBlock::ToolUse {
                id: "tu_1".to_string(),
                name,
                input: self.intake.clone(),
            }],
            None => vec![ProviderContentBlock::Text {
                text: self.summary.clone(),
            }],
        };

        Ok(ProviderResponse {
            id: "msg_1".to_string(),
            model: "scripted-model".to_string(),
            content,
            usage: None,
            stop_reason: None,
        })
    }
}
