//! Internal document retrieval capability.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Value, json};

use crate::answer::AnswerEngine;
use crate::tools::Tool;

#[derive(Debug, Deserialize)]
struct DocumentSearchInput {
    query: String,
}

pub struct DocumentSearchTool {
    answer: Arc<AnswerEngine>,
}

impl DocumentSearchTool {
    pub fn new(answer: Arc<AnswerEngine>) -> Self {
        Self { answer }
    }
}

#[async_trait::async_trait]
impl Tool for DocumentSearchTool {
    fn name(&self) -> &str {
        "search_legal_documents"
    }

    fn description(&self) -> &str {
        "Answer questions about internal legal documents, case files, contracts, and other \
         documents stored in the firm's private knowledge base. This is the primary tool for \
         retrieving specific information from the firm's data, like 'What is the termination \
         policy in the Innovate Corp agreement?'."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The question to answer from the firm's document corpus"
                }
            },
            "required": ["query"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let input: DocumentSearchInput = serde_json::from_value(args).map_err(|e| e.to_string())?;
        Ok(self.answer.answer(&input.query).await)
    }
}
