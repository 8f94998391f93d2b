//! Live web search capability.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Value, json};

use crate::tools::Tool;
use crate::web::search::{SearchError, SearchProvider, WebSearchQuery};

#[derive(Debug, Deserialize)]
struct WebSearchInput {
    query: String,
    count: Option<usize>,
}

pub struct WebSearchTool {
    provider: Option<Arc<dyn SearchProvider>>,
    max_results: usize,
}

impl WebSearchTool {
    /// `provider` is `None` when web search is disabled or unconfigured;
    /// the tool then reports that as a result instead of failing dispatch.
    pub fn new(provider: Option<Arc<dyn SearchProvider>>, max_results: usize) -> Self {
        Self {
            provider,
            max_results,
        }
    }

    fn format_error(err: SearchError) -> String {
        match err {
            SearchError::UnsupportedProvider(provider) => {
                format!("web_search provider '{}' is not supported", provider)
            }
            SearchError::MissingApiKey(key_name) => {
                format!("{key_name} is not set (required for web_search)")
            }
            SearchError::RateLimited(delay) => {
                format!("web search rate limited. Wait {:?} before retrying.", delay)
            }
            SearchError::RequestFailed(msg) => format!("web_search request failed: {}", msg),
        }
    }
}

#[async_trait::async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the live internet for recent information, current events, or new case law and \
         regulations that may not be in the internal knowledge base. For example: 'What were \
         the results of the latest Supreme Court ruling on AI copyright?'."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {"type": "string"},
                "count": {"type": "integer", "minimum": 1}
            },
            "required": ["query"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let input: WebSearchInput = serde_json::from_value(args).map_err(|e| e.to_string())?;

        let Some(provider) = &self.provider else {
            return Err("web search is not configured on this deployment".to_string());
        };

        let query = WebSearchQuery {
            query: input.query,
            count: Some(
                input
                    .count
                    .map(|c| c.clamp(1, self.max_results))
                    .unwrap_or(self.max_results),
            ),
        };

        let response = provider
            .search(&query)
            .await
            .map_err(Self::format_error)?;

        serde_json::to_string(&response).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_search_reports_instead_of_panicking() {
        let tool = WebSearchTool::new(None, 5);
        let result = tool.execute(json!({"query": "new regulations"})).await;
        assert!(result.unwrap_err().contains("not configured"));
    }
}
