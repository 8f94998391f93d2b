//! Call transcript types shared between the webhook boundary and the
//! reconciliation engine.

use serde::{Deserialize, Serialize};

/// One turn of a call transcript as delivered by the voice platform.
///
/// Transient: assembled per request and only persisted as part of the
/// rendered case transcript.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranscriptMessage {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: String,
}

impl TranscriptMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Render a message sequence into a single human-readable block.
///
/// One `"<Role>: <content>"` line per message with non-empty content;
/// whitespace-only content is dropped entirely. The role is capitalized and
/// an unset role becomes "Unknown".
pub fn format_transcript(messages: &[TranscriptMessage]) -> String {
    let mut formatted = String::new();
    for message in messages {
        let content = message.content.trim();
        if content.is_empty() {
            continue;
        }
        formatted.push_str(&capitalize_role(&message.role));
        formatted.push_str(": ");
        formatted.push_str(content);
        formatted.push('\n');
    }
    formatted
}

fn capitalize_role(role: &str) -> String {
    let role = role.trim();
    if role.is_empty() {
        return "Unknown".to_string();
    }
    let mut chars = role.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => "Unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_roles_and_skips_blank_content() {
        let messages = vec![
            TranscriptMessage::new("user", "Hi"),
            TranscriptMessage::new("assistant", ""),
            TranscriptMessage::new("user", "  "),
        ];
        assert_eq!(format_transcript(&messages), "User: Hi\n");
    }

    #[test]
    fn unset_role_becomes_unknown() {
        let messages = vec![TranscriptMessage::new("", "hello?")];
        assert_eq!(format_transcript(&messages), "Unknown: hello?\n");
    }

    #[test]
    fn trims_content_and_keeps_order() {
        let messages = vec![
            TranscriptMessage::new("assistant", " How can I help? "),
            TranscriptMessage::new("user", "I was fired"),
        ];
        assert_eq!(
            format_transcript(&messages),
            "Assistant: How can I help?\nUser: I was fired\n"
        );
    }

    #[test]
    fn empty_sequence_formats_to_empty_string() {
        assert_eq!(format_transcript(&[]), "");
    }
}
