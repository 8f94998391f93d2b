//! Agent dispatch: one user utterance in, one answer out.
//!
//! A bounded reasoning loop where the model either answers directly or
//! invokes exactly one registered capability per round. This layer never
//! raises: its callers are realtime voice/webhook integrations where an
//! exception means a dropped call turn.

use std::sync::Arc;

use docket_core::TranscriptMessage;
use sqlx::SqlitePool;
use tracing::{error, info, warn};

use crate::history::{ChatMessage, ChatRole, ToolResultData, build_tool_result_message, history_from_transcript};
use crate::providers::{Provider, extract_all_text, extract_tool_uses, has_tool_uses};
use crate::tools::ToolManager;

const APOLOGY: &str =
    "I'm sorry, I ran into a problem handling that. Could you please repeat your question?";

const BASE_SYSTEM_PROMPT: &str = "You are the intake assistant for a law firm. You help callers \
     and staff by answering questions from the firm's document corpus, searching the web for \
     recent legal developments, extracting structured case details from free text, and looking \
     up a caller's existing case history. Answer directly when no tool is needed. Keep answers \
     short and suitable for reading aloud.";

pub struct AgentDispatcher {
    provider: Arc<dyn Provider>,
    tools: ToolManager,
    pool: SqlitePool,
    iteration_cap: usize,
}

impl AgentDispatcher {
    pub fn new(
        provider: Arc<dyn Provider>,
        tools: ToolManager,
        pool: SqlitePool,
        iteration_cap: usize,
    ) -> Self {
        Self {
            provider,
            tools,
            pool,
            iteration_cap: iteration_cap.max(1),
        }
    }

    /// Handle one utterance against the conversation history.
    ///
    /// Always returns a non-empty string: the model's answer, the best
    /// partial answer at the iteration cap, or a user-safe apology.
    pub async fn dispatch(
        &self,
        utterance: &str,
        history: &[TranscriptMessage],
        caller_phone: Option<&str>,
    ) -> String {
        let system = self.build_system_prompt(history, caller_phone).await;

        let mut messages = history_from_transcript(history);
        messages.push(ChatMessage::user_text(utterance));

        let mut last_text = String::new();
        for iteration in 0..self.iteration_cap {
            let response = match self
                .provider
                .send_conversation(
                    Some(system.clone()),
                    messages.clone(),
                    self.tools.get_tools(),
                    None,
                    None,
                    None,
                )
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    error!("Agent dispatch provider call failed: {}", e);
                    return APOLOGY.to_string();
                }
            };

            let text = extract_all_text(&response);
            if !text.trim().is_empty() {
                last_text = text;
            }

            if !has_tool_uses(&response) {
                return non_empty(last_text);
            }

            info!("Tool use requested (iteration {})", iteration + 1);

            messages.push(ChatMessage {
                role: ChatRole::Assistant,
                content: response.content.iter().map(Into::into).collect(),
            });

            let mut results = Vec::new();
            for (id, name, input) in extract_tool_uses(&response) {
                match self.tools.execute(&name, input).await {
                    Ok(content) => results.push(ToolResultData {
                        tool_use_id: id,
                        content,
                        is_error: None,
                    }),
                    // Unknown tools and malformed inputs go back to the
                    // model as corrective input rather than aborting.
                    Err(err) => {
                        warn!("Tool '{}' failed: {}", name, err);
                        results.push(ToolResultData {
                            tool_use_id: id,
                            content: err,
                            is_error: Some(true),
                        });
                    }
                }
            }
            messages.push(build_tool_result_message(results));
        }

        warn!(
            "Agent dispatch hit the iteration cap ({}); returning best partial answer",
            self.iteration_cap
        );
        non_empty(last_text)
    }

    /// Assemble the system prompt: base instructions, any system-role turns
    /// from the inbound history, and proactive caller context when the
    /// phone number is known.
    async fn build_system_prompt(
        &self,
        history: &[TranscriptMessage],
        caller_phone: Option<&str>,
    ) -> String {
        let mut system = String::from(BASE_SYSTEM_PROMPT);

        for turn in history {
            if turn.role.eq_ignore_ascii_case("system") && !turn.content.trim().is_empty() {
                system.push_str("\n\n");
                system.push_str(turn.content.trim());
            }
        }

        if let Some(phone) = caller_phone {
            match crate::tools::case_lookup::caller_history_summary(&self.pool, phone).await {
                Ok(Some(summary)) => {
                    system.push_str("\n\nKnown caller context for ");
                    system.push_str(phone);
                    system.push_str(":\n");
                    system.push_str(&summary);
                }
                Ok(None) => {
                    system.push_str("\n\nThe caller at ");
                    system.push_str(phone);
                    system.push_str(" has no case on file yet.");
                }
                Err(e) => {
                    warn!("Proactive caller lookup failed for {}: {}", phone, e);
                }
            }
        }

        system
    }
}

fn non_empty(text: String) -> String {
    if text.trim().is_empty() {
        "I wasn't able to find an answer to that. Could you rephrase the question?".to_string()
    } else {
        text
    }
}
