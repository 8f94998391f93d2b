//! Configuration management for docket.
//!
//! Secrets (API keys) come exclusively from environment variables; settings
//! come from a TOML file under the XDG config directory.
//!
//! # Configuration Sources
//!
//! ## Secrets (Environment Variables)
//! - `ANTHROPIC_API_KEY` - Anthropic API key (required)
//! - `BRAVE_API_KEY` - Brave Search API key (optional)
//!
//! ## Settings (TOML File)
//! Located at `~/.config/docket/config.toml`:
//! ```toml
//! [gateway]
//! host = "127.0.0.1"
//! port = 3100
//!
//! [llm]
//! model = "claude-sonnet-4-5"
//!
//! [index]
//! source_dir = "data"
//! chunk_size = 800
//! chunk_overlap = 150
//! ```

mod secrets;
mod settings;

pub use secrets::{Secrets, SecretsError};
pub use settings::{
    AgentSettings, GatewaySettings, IndexSettings, LlmSettings, Settings, SettingsError,
    TranscriptionSettings, WebSearchSettings,
};

/// Combined configuration containing both secrets and settings.
#[derive(Debug, Clone)]
pub struct Config {
    /// Secrets loaded from environment variables
    pub secrets: Secrets,
    /// Settings loaded from TOML configuration file
    pub settings: Settings,
}

/// Errors that can occur when loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Secrets error: {0}")]
    Secrets(#[from] SecretsError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("Invalid chunking settings: overlap {overlap} must be smaller than chunk size {size}")]
    InvalidChunking { size: usize, overlap: usize },
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Loads secrets from environment variables, then settings from the TOML
    /// file (creating it with defaults if absent), and validates the
    /// combination.
    pub fn load() -> Result<Self, ConfigError> {
        let secrets = Secrets::from_env()?;
        let settings = Settings::load()?;
        Self::validate(secrets, settings)
    }

    fn validate(secrets: Secrets, settings: Settings) -> Result<Self, ConfigError> {
        if settings.index.chunk_overlap >= settings.index.chunk_size {
            return Err(ConfigError::InvalidChunking {
                size: settings.index.chunk_size,
                overlap: settings.index.chunk_overlap,
            });
        }
        Ok(Self { secrets, settings })
    }

    /// Get the HTTP bind address.
    pub fn bind_addr(&self) -> String {
        self.settings.bind_addr()
    }

    /// Get the Anthropic API key.
    pub fn anthropic_api_key(&self) -> &str {
        &self.secrets.anthropic_api_key
    }

    /// Get the Brave Search API key (if configured).
    pub fn brave_api_key(&self) -> Option<&str> {
        self.secrets.brave_api_key.as_deref()
    }

    /// Check if the web search capability can actually run.
    pub fn web_search_available(&self) -> bool {
        self.settings.web_search.enabled && self.secrets.brave_api_key.is_some()
    }
}

/// Load .env file if it exists (for development convenience).
pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_overlap_larger_than_chunk() {
        let secrets = Secrets {
            anthropic_api_key: "sk-test".to_string(),
            brave_api_key: None,
        };
        let mut settings = Settings::default();
        settings.index.chunk_size = 100;
        settings.index.chunk_overlap = 100;

        let result = Config::validate(secrets, settings);
        assert!(matches!(result, Err(ConfigError::InvalidChunking { .. })));
    }

    #[test]
    fn web_search_requires_key_and_flag() {
        let mut settings = Settings::default();
        settings.web_search.enabled = true;

        let config = Config::validate(
            Secrets {
                anthropic_api_key: "sk-test".to_string(),
                brave_api_key: None,
            },
            settings.clone(),
        )
        .unwrap();
        assert!(!config.web_search_available());

        let config = Config::validate(
            Secrets {
                anthropic_api_key: "sk-test".to_string(),
                brave_api_key: Some("brave-key".to_string()),
            },
            settings,
        )
        .unwrap();
        assert!(config.web_search_available());
    }
}
