//! Scripted provider fake shared by unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::Value;
use tokio::sync::Mutex;

use crate::history::ChatMessage;
use crate::providers::{Provider, ProviderContentBlock, ProviderError, ProviderResponse};
use crate::tools::Tool;

pub(crate) fn text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        id: "msg_fake".to_string(),
        model: "fake-model".to_string(),
        content: vec![ProviderContentBlock::Text {
            text: text.to_string(),
        }],
        usage: None,
        stop_reason: Some("end_turn".to_string()),
    }
}

pub(crate) fn tool_use_response(name: &str, input: Value) -> ProviderResponse {
    ProviderResponse {
        id: "msg_fake".to_string(),
        model: "fake-model".to_string(),
        content: vec![ProviderContentBlock::ToolUse {
            id: "tu_fake".to_string(),
            name: name.to_string(),
            input,
        }],
        usage: None,
        stop_reason: Some("tool_use".to_string()),
    }
}

enum Mode {
    /// Always answer with the same text.
    Text(String),
    /// Always request the same tool call.
    ToolUse { name: String, input: Value },
    /// Answer with text, unless a tool_choice forces the intake recorder.
    Intake { summary: String, intake: Value },
    /// Every call fails.
    Failing,
    /// Pop scripted responses in order; fall back to text when exhausted.
    Script(Mutex<VecDeque<ProviderResponse>>),
}

pub(crate) struct FakeProvider {
    mode: Mode,
    pub calls: AtomicUsize,
}

impl FakeProvider {
    pub fn with_text(text: &str) -> Self {
        Self {
            mode: Mode::Text(text.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn always_tool_use(name: &str, input: Value) -> Self {
        Self {
            mode: Mode::ToolUse {
                name: name.to_string(),
                input,
            },
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_intake(intake: Value) -> Self {
        Self {
            mode: Mode::Intake {
                summary: "A concise, neutral summary of the call.".to_string(),
                intake,
            },
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            mode: Mode::Failing,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn scripted(responses: Vec<ProviderResponse>) -> Self {
        Self {
            mode: Mode::Script(Mutex::new(responses.into())),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Provider for FakeProvider {
    fn name(&self) -> &str {
        "fake"
    }

    fn model(&self) -> &str {
        "fake-model"
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
        self.calls.fetch_add(1, Ordering::SeqCst);

        match &self.mode {
            Mode::Text(text) => Ok(text_response(text)),
            Mode::ToolUse { name, input } => Ok(tool_use_response(name, input.clone())),
            Mode::Intake { summary, intake } => match tool_choice {
                Some(tool) => Ok(tool_use_response(&tool, intake.clone())),
                None => Ok(text_response(summary)),
            },
            Mode::Failing => Err(ProviderError::ApiError {
                message: "backend unavailable".to_string(),
            }),
            Mode::Script(queue) => {
                let mut queue = queue.lock().await;
                Ok(queue
                    .pop_front()
                    .unwrap_or_else(|| text_response("(script exhausted)")))
            }
        }
    }
}
