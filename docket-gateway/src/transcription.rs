//! Speech-to-text client.
//!
//! Thin wrapper over an OpenAI-compatible `/v1/audio/transcriptions`
//! endpoint (a local whisper server in the default deployment). The service
//! is an opaque collaborator: audio in, trimmed text out.

use std::time::Duration;

use docket_core::config::TranscriptionSettings;
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum TranscriptionError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("transcription service error: {0}")]
    Service(String),
}

#[derive(Debug, Clone)]
pub struct TranscriptionClient {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

impl TranscriptionClient {
    pub fn new(settings: &TranscriptionSettings) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            client,
        }
    }

    /// Transcribe one uploaded audio file.
    pub async fn transcribe(
        &self,
        filename: &str,
        audio: Vec<u8>,
    ) -> Result<String, TranscriptionError> {
        let url = format!("{}/v1/audio/transcriptions", self.base_url);

        let part = reqwest::multipart::Part::bytes(audio).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new()
            .text("model", self.model.clone())
            .part("file", part);

        let response = self.client.post(&url).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TranscriptionError::Service(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let payload: TranscriptionResponse = response.json().await?;
        Ok(payload.text.trim().to_string())
    }
}
