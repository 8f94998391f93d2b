//! Shared configuration and transcript types for the docket intake assistant.

pub mod config;
pub mod transcript;

pub use config::{
    AgentSettings, Config, ConfigError, GatewaySettings, IndexSettings, LlmSettings, Secrets,
    SecretsError, Settings, SettingsError, TranscriptionSettings, WebSearchSettings, load_dotenv,
};
pub use transcript::{TranscriptMessage, format_transcript};
