//! Secrets configuration loaded from environment variables only.
//!
//! Sensitive values like API keys are never written to the settings file;
//! they are read from the environment (with `.env` support for development).

use std::env;

/// Secrets loaded exclusively from environment variables.
#[derive(Debug, Clone)]
pub struct Secrets {
    /// Anthropic API key (env: ANTHROPIC_API_KEY)
    pub anthropic_api_key: String,

    /// Brave Search API key (env: BRAVE_API_KEY)
    pub brave_api_key: Option<String>,
}

/// Errors that can occur when loading secrets
#[derive(Debug, thiserror::Error)]
pub enum SecretsError {
    #[error("ANTHROPIC_API_KEY is not set (required for the intake agent)")]
    MissingAnthropicKey,
}

impl Secrets {
    /// Load secrets from environment variables.
    ///
    /// Also loads a `.env` file if present (development convenience);
    /// production should rely on real environment variables.
    pub fn from_env() -> Result<Self, SecretsError> {
        let _ = dotenvy::dotenv();
        Self::from_env_inner()
    }

    /// Internal method to load from environment without loading .env
    pub(crate) fn from_env_inner() -> Result<Self, SecretsError> {
        let anthropic_api_key = env::var("ANTHROPIC_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or(SecretsError::MissingAnthropicKey)?;

        Ok(Self {
            anthropic_api_key,
            brave_api_key: env::var("BRAVE_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Tests mutate process environment; keep them serialized.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn clear_env() {
        unsafe {
            env::remove_var("ANTHROPIC_API_KEY");
            env::remove_var("BRAVE_API_KEY");
        }
    }

    #[test]
    fn loads_anthropic_key() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        unsafe { env::set_var("ANTHROPIC_API_KEY", "sk-test") }

        let secrets = Secrets::from_env_inner().unwrap();
        assert_eq!(secrets.anthropic_api_key, "sk-test");
        assert!(secrets.brave_api_key.is_none());
    }

    #[test]
    fn loads_optional_brave_key() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        unsafe {
            env::set_var("ANTHROPIC_API_KEY", "sk-test");
            env::set_var("BRAVE_API_KEY", "brave-test");
        }

        let secrets = Secrets::from_env_inner().unwrap();
        assert_eq!(secrets.brave_api_key, Some("brave-test".to_string()));
    }

    #[test]
    fn missing_anthropic_key_is_an_error() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();

        let result = Secrets::from_env_inner();
        assert!(matches!(result, Err(SecretsError::MissingAnthropicKey)));
    }

    #[test]
    fn blank_anthropic_key_is_an_error() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        unsafe { env::set_var("ANTHROPIC_API_KEY", "   ") }

        let result = Secrets::from_env_inner();
        assert!(matches!(result, Err(SecretsError::MissingAnthropicKey)));
    }
}
