use std::time::Duration;

use serde::{Deserialize, Serialize};

pub mod brave;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSearchQuery {
    pub query: String,
    pub count: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSearchResult {
    pub title: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSearchResponse {
    pub provider: String,
    pub results: Vec<WebSearchResult>,
}

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("unsupported web search provider: {0}")]
    UnsupportedProvider(String),
    #[error("missing API key ({0})")]
    MissingApiKey(&'static str),
    #[error("rate limited, retry after {0:?}")]
    RateLimited(Duration),
    #[error("request failed: {0}")]
    RequestFailed(String),
}

#[async_trait::async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &WebSearchQuery) -> Result<WebSearchResponse, SearchError>;
}
