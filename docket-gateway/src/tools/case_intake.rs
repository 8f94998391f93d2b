//! Structured case-intake extraction capability.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Value, json};

use crate::extraction::IntakeExtractor;
use crate::tools::Tool;

#[derive(Debug, Deserialize)]
struct CaseIntakeInput {
    text: String,
}

pub struct CaseIntakeTool {
    extractor: Arc<IntakeExtractor>,
}

impl CaseIntakeTool {
    pub fn new(extractor: Arc<IntakeExtractor>) -> Self {
        Self { extractor }
    }
}

#[async_trait::async_trait]
impl Tool for CaseIntakeTool {
    fn name(&self) -> &str {
        "extract_case_intake"
    }

    fn description(&self) -> &str {
        "Process a new client interview summary or an unstructured block of text about a new \
         case. Extracts key details like client name, opposing party, case type, and a summary \
         of facts into a structured format. Use this when the user says 'create a new case \
         from this text' or 'process this client intake'."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "text": {
                    "type": "string",
                    "description": "The full, unstructured text from a client interview or case summary"
                }
            },
            "required": ["text"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let input: CaseIntakeInput = serde_json::from_value(args).map_err(|e| e.to_string())?;

        let intake = self
            .extractor
            .extract(&input.text)
            .await
            .map_err(|e| format!("Intake extraction failed: {}", e))?;

        serde_json::to_string_pretty(&intake).map_err(|e| e.to_string())
    }
}
