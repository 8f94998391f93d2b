//! Caller-history lookup capability.

use docket_db::{CaseRecord, CaseRepository, DbResult};
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::SqlitePool;

use crate::tools::Tool;

#[derive(Debug, Deserialize)]
struct CaseLookupInput {
    phone_number: String,
}

/// Render the caller's current case into a compact text summary.
///
/// Shared between the agent tool and the dispatcher's proactive
/// caller-context injection. `None` means the number has no case on file.
pub async fn caller_history_summary(
    pool: &SqlitePool,
    phone_number: &str,
) -> DbResult<Option<String>> {
    let Some(record) = CaseRepository::latest_for_phone(pool, phone_number).await? else {
        return Ok(None);
    };

    Ok(Some(render_case(&record)))
}

fn render_case(record: &CaseRecord) -> String {
    let mut lines = vec![format!(
        "Case {} (status: {}), opened {}",
        record.case_id, record.status, record.created_at
    )];

    if let Some(intake) = &record.structured_intake {
        let opposing = intake
            .opposing_party
            .as_deref()
            .unwrap_or("unknown opposing party");
        lines.push(format!(
            "Intake: {} vs {} ({})",
            intake.client_name, opposing, intake.case_type
        ));
    }

    if let Some(summary) = &record.call_summary {
        lines.push(format!("Original call summary: {}", summary));
    }

    if record.follow_up_notes.is_empty() {
        lines.push("No follow-up calls recorded.".to_string());
    } else {
        lines.push(format!(
            "Follow-up calls: {}",
            record.follow_up_notes.len()
        ));
        for note in record.follow_up_notes.iter().rev().take(3) {
            lines.push(format!("  - [{}] {}", note.timestamp, note.summary));
        }
    }

    lines.join("\n")
}

pub struct CaseLookupTool {
    pool: SqlitePool,
}

impl CaseLookupTool {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl Tool for CaseLookupTool {
    fn name(&self) -> &str {
        "lookup_caller_history"
    }

    fn description(&self) -> &str {
        "Look up the existing case history for a caller by their phone number. Requires the \
         caller's phone number. Returns the current case, its status, the original call \
         summary, and recent follow-up notes, or reports that no case is on file."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "phone_number": {
                    "type": "string",
                    "description": "The caller's phone number, e.g. +15551234567"
                }
            },
            "required": ["phone_number"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let input: CaseLookupInput = serde_json::from_value(args).map_err(|e| e.to_string())?;

        match caller_history_summary(&self.pool, &input.phone_number).await {
            Ok(Some(summary)) => Ok(summary),
            Ok(None) => Ok(format!(
                "No case on file for {}. This appears to be a new caller.",
                input.phone_number
            )),
            Err(e) => Err(format!("Case lookup failed: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docket_db::{FollowUpNote, NewCase, test_helpers::create_test_pool};

    #[tokio::test]
    async fn summarizes_case_with_notes() {
        let db = create_test_pool().await.unwrap();
        let record = CaseRepository::insert(
            db.pool(),
            NewCase {
                case_id: CaseRepository::generate_case_id(),
                caller_phone_number: Some("+15551234567".to_string()),
                structured_intake: None,
                call_summary: "Caller reports a contract dispute.".to_string(),
                full_transcript: "User: contract dispute\n".to_string(),
                external_call_id: None,
            },
        )
        .await
        .unwrap();

        CaseRepository::append_note(
            db.pool(),
            &record.case_id,
            FollowUpNote {
                timestamp: "2025-08-01T10:00:00+00:00".to_string(),
                call_ref: None,
                summary: "Asked about next steps.".to_string(),
                transcript: "User: any update?\n".to_string(),
            },
        )
        .await
        .unwrap();

        let summary = caller_history_summary(db.pool(), "+15551234567")
            .await
            .unwrap()
            .unwrap();
        assert!(summary.contains(&record.case_id));
        assert!(summary.contains("Follow-up calls: 1"));
        assert!(summary.contains("Asked about next steps."));
    }

    #[tokio::test]
    async fn unknown_number_reports_no_case() {
        let db = create_test_pool().await.unwrap();
        let tool = CaseLookupTool::new(db.pool().clone());

        let result = tool
            .execute(json!({"phone_number": "+15550000000"}))
            .await
            .unwrap();
        assert!(result.contains("No case on file"));
    }

    #[tokio::test]
    async fn malformed_input_is_an_error() {
        let db = create_test_pool().await.unwrap();
        let tool = CaseLookupTool::new(db.pool().clone());

        let result = tool.execute(json!({"number": 5})).await;
        assert!(result.is_err());
    }
}
