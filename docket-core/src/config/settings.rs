//! Settings configuration loaded from TOML files.
//!
//! Non-sensitive configuration stored in TOML format in the XDG config
//! directory (`~/.config/docket/config.toml`). A default file is written on
//! first run so operators have something concrete to edit.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level settings structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub gateway: GatewaySettings,
    pub llm: LlmSettings,
    pub index: IndexSettings,
    pub agent: AgentSettings,
    pub web_search: WebSearchSettings,
    pub transcription: TranscriptionSettings,
}

/// HTTP gateway bind settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewaySettings {
    pub host: String,
    pub port: u16,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3100,
        }
    }
}

/// LLM completion settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Model identifier passed to the Messages API
    pub model: String,
    /// Hard cap on generated tokens per completion
    pub max_tokens: u32,
    /// Per-request timeout for LLM calls
    pub request_timeout_seconds: u64,
    /// Temperature for summaries and grounded answers. Low but non-zero so
    /// phrasing stays fluent without drifting from the source material.
    pub grounded_temperature: f32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-5".to_string(),
            max_tokens: 4096,
            request_timeout_seconds: 120,
            grounded_temperature: 0.2,
        }
    }
}

/// Document index settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    /// Directory scanned for documents on first startup and used for uploads
    pub source_dir: PathBuf,
    /// Chunk store sqlite file. Relative paths resolve under the XDG data
    /// directory; absolute paths are used verbatim.
    pub db_file: PathBuf,
    /// Target window size in characters
    pub chunk_size: usize,
    /// Overlap between consecutive windows in characters
    pub chunk_overlap: usize,
    /// Number of chunks returned by a similarity search
    pub top_k: usize,
    /// Embedding server base URL (Ollama-compatible /api/embed)
    pub embedding_url: String,
    /// Embedding model name
    pub embedding_model: String,
    /// Batch size for embedding requests
    pub embedding_batch: usize,
    /// Expected embedding dimension; checked against the backend when set
    pub embedding_dim: Option<usize>,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("data"),
            db_file: PathBuf::from("index.sqlite3"),
            chunk_size: 800,
            chunk_overlap: 150,
            // Higher than the usual retriever default of 4: legal questions
            // need recall across scattered clauses more than precision.
            top_k: 8,
            embedding_url: "http://localhost:11434".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            embedding_batch: 16,
            embedding_dim: None,
        }
    }
}

impl IndexSettings {
    /// Resolve the chunk store path, placing relative paths under the XDG
    /// data directory.
    pub fn resolved_db_path(&self) -> Result<PathBuf, SettingsError> {
        if self.db_file.is_absolute() {
            return Ok(self.db_file.clone());
        }
        let data_dir = dirs::data_dir().ok_or(SettingsError::NoConfigDir)?;
        Ok(data_dir.join("docket").join(&self.db_file))
    }
}

/// Agent dispatch settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Maximum tool-use round trips per dispatched utterance
    pub max_tool_iterations: usize,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_tool_iterations: 5,
        }
    }
}

impl AgentSettings {
    /// Iteration cap clamped to a sane range.
    pub fn iteration_cap(&self) -> usize {
        self.max_tool_iterations.clamp(1, 8)
    }
}

/// Live web search settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebSearchSettings {
    pub enabled: bool,
    pub provider: String,
    pub timeout_seconds: u64,
    pub min_interval_ms: u64,
    pub max_results: usize,
}

impl Default for WebSearchSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: "brave".to_string(),
            timeout_seconds: 20,
            min_interval_ms: 1100,
            max_results: 5,
        }
    }
}

/// Speech-to-text settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    pub enabled: bool,
    /// OpenAI-compatible transcription endpoint base URL
    pub base_url: String,
    pub model: String,
    pub timeout_seconds: u64,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "http://localhost:8080".to_string(),
            model: "whisper-1".to_string(),
            timeout_seconds: 120,
        }
    }
}

/// Errors that can occur when loading settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse settings file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl Settings {
    /// Load settings from the default config file path.
    ///
    /// Creates the file with defaults if it doesn't exist.
    pub fn load() -> Result<Self, SettingsError> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load settings from a specific path, creating defaults if missing.
    pub fn load_from(path: &PathBuf) -> Result<Self, SettingsError> {
        if !path.exists() {
            let settings = Self::default();
            settings.save_to(path)?;
            return Ok(settings);
        }

        let content = fs::read_to_string(path)?;
        let settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Default config file path: `~/.config/docket/config.toml`
    pub fn config_path() -> Result<PathBuf, SettingsError> {
        let config_dir = dirs::config_dir().ok_or(SettingsError::NoConfigDir)?;
        Ok(config_dir.join("docket").join("config.toml"))
    }

    /// Get the HTTP bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.gateway.host, self.gateway.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let settings = Settings::default();
        assert_eq!(settings.gateway.port, 3100);
        assert_eq!(settings.index.top_k, 8);
        assert!(settings.index.chunk_overlap < settings.index.chunk_size);
        assert_eq!(settings.agent.iteration_cap(), 5);
    }

    #[test]
    fn iteration_cap_is_clamped() {
        let agent = AgentSettings {
            max_tool_iterations: 0,
        };
        assert_eq!(agent.iteration_cap(), 1);

        let agent = AgentSettings {
            max_tool_iterations: 50,
        };
        assert_eq!(agent.iteration_cap(), 8);
    }

    #[test]
    fn load_creates_default_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let settings = Settings::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(settings.gateway.host, "127.0.0.1");

        // Second load reads the file back.
        let reloaded = Settings::load_from(&path).unwrap();
        assert_eq!(reloaded.index.chunk_size, settings.index.chunk_size);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[gateway]\nport = 9000\n").unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.gateway.port, 9000);
        assert_eq!(settings.index.chunk_size, 800);
    }
}
