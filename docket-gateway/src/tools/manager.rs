use std::sync::Arc;

use serde_json::Value;
use sqlx::SqlitePool;

use super::{
    Tool, case_intake::CaseIntakeTool, case_lookup::CaseLookupTool,
    document_search::DocumentSearchTool, web_search::WebSearchTool,
};
use crate::answer::AnswerEngine;
use crate::extraction::IntakeExtractor;
use crate::web::search::SearchProvider;

/// Central manager for the agent's capability registry.
///
/// Owns all tool instances and provides a unified interface for listing and
/// executing them. Dependencies are injected at construction so tests can
/// substitute fakes per-test.
pub struct ToolManager {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolManager {
    /// Create a new ToolManager with all capabilities registered.
    pub fn new(
        answer: Arc<AnswerEngine>,
        extractor: Arc<IntakeExtractor>,
        pool: SqlitePool,
        web_search: Option<Arc<dyn SearchProvider>>,
        web_search_max_results: usize,
    ) -> Self {
        let tools: Vec<Box<dyn Tool>> = vec![
            Box::new(DocumentSearchTool::new(answer)),
            Box::new(WebSearchTool::new(web_search, web_search_max_results)),
            Box::new(CaseIntakeTool::new(extractor)),
            Box::new(CaseLookupTool::new(pool)),
        ];
        Self { tools }
    }

    /// Get all tools as references for use with the provider API
    pub fn get_tools(&self) -> Vec<&dyn Tool> {
        self.tools.iter().map(|t| t.as_ref()).collect()
    }

    /// Execute a tool by name with the given input.
    ///
    /// # Returns
    /// The tool's output as a string, or an error message
    pub async fn execute(&self, name: &str, input: Value) -> Result<String, String> {
        for tool in &self.tools {
            if tool.name() == name {
                return tool.execute(input).await;
            }
        }
        Err(format!("Unknown tool: {}", name))
    }
}
