//! Case records and the queries the reconciliation engine depends on.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};

/// Structured intake data extracted from a call transcript.
///
/// The field docs double as extraction guidance for the LLM, so keep them
/// descriptive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseIntake {
    /// Full name of the primary client
    pub client_name: String,
    /// Opposing party or entity, if one was mentioned
    #[serde(default)]
    pub opposing_party: Option<String>,
    /// High-level classification, e.g. "Contract Dispute", "Wrongful Termination"
    pub case_type: String,
    /// Concise summary of the key events and facts
    pub summary_of_facts: String,
    /// Important dates mentioned, MM/DD/YYYY where possible
    #[serde(default)]
    pub key_dates: Vec<String>,
}

/// A follow-up note appended for each subsequent call from the same number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowUpNote {
    /// RFC 3339 UTC timestamp of when the note was recorded
    pub timestamp: String,
    /// External call reference, when the platform provided one
    #[serde(default)]
    pub call_ref: Option<String>,
    pub summary: String,
    pub transcript: String,
}

/// One caller's legal matter.
///
/// `structured_intake` and `follow_up_notes` are stored as JSON text but
/// decoded here at the repository boundary; callers never see the encoded
/// form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseRecord {
    pub id: i64,
    pub case_id: String,
    pub caller_phone_number: Option<String>,
    pub status: String,
    pub assigned_to: Option<String>,
    pub structured_intake: Option<CaseIntake>,
    pub call_summary: Option<String>,
    pub full_transcript: Option<String>,
    pub follow_up_notes: Vec<FollowUpNote>,
    pub external_call_id: Option<String>,
    pub created_at: String,
    pub last_updated_at: String,
}

/// Fields for inserting a freshly reconciled case.
#[derive(Debug, Clone)]
pub struct NewCase {
    pub case_id: String,
    pub caller_phone_number: Option<String>,
    pub structured_intake: Option<CaseIntake>,
    pub call_summary: String,
    pub full_transcript: String,
    pub external_call_id: Option<String>,
}

/// Default status for new cases awaiting a human pass.
pub const STATUS_PENDING_REVIEW: &str = "Pending Review";

#[derive(Debug, sqlx::FromRow)]
struct CaseRow {
    id: i64,
    case_id: String,
    caller_phone_number: Option<String>,
    status: String,
    assigned_to: Option<String>,
    structured_intake: Option<String>,
    call_summary: Option<String>,
    full_transcript: Option<String>,
    follow_up_notes: String,
    external_call_id: Option<String>,
    created_at: String,
    last_updated_at: String,
}

impl From<CaseRow> for CaseRecord {
    fn from(row: CaseRow) -> Self {
        let structured_intake = row.structured_intake.as_deref().and_then(|raw| {
            serde_json::from_str(raw)
                .map_err(|e| {
                    warn!("Case {}: unreadable structured_intake: {}", row.case_id, e);
                })
                .ok()
        });
        let follow_up_notes = serde_json::from_str(&row.follow_up_notes).unwrap_or_else(|e| {
            warn!("Case {}: unreadable follow_up_notes: {}", row.case_id, e);
            Vec::new()
        });

        CaseRecord {
            id: row.id,
            case_id: row.case_id,
            caller_phone_number: row.caller_phone_number,
            status: row.status,
            assigned_to: row.assigned_to,
            structured_intake,
            call_summary: row.call_summary,
            full_transcript: row.full_transcript,
            follow_up_notes,
            external_call_id: row.external_call_id,
            created_at: row.created_at,
            last_updated_at: row.last_updated_at,
        }
    }
}

const CASE_COLUMNS: &str = "id, case_id, caller_phone_number, status, assigned_to, \
     structured_intake, call_summary, full_transcript, follow_up_notes, \
     external_call_id, created_at, last_updated_at";

/// Case repository for database operations
pub struct CaseRepository;

impl CaseRepository {
    /// Generate an opaque case identifier, e.g. `CASE-9F2C41AB`.
    pub fn generate_case_id() -> String {
        let hex = Uuid::new_v4().simple().to_string().to_uppercase();
        format!("CASE-{}", &hex[..8])
    }

    /// Insert a new case with status "Pending Review" and no follow-up notes.
    pub async fn insert(pool: &SqlitePool, new_case: NewCase) -> DbResult<CaseRecord> {
        let now = Utc::now().to_rfc3339();
        let intake_json = match &new_case.structured_intake {
            Some(intake) => Some(serde_json::to_string(intake)?),
            None => None,
        };

        sqlx::query(
            "INSERT INTO cases (case_id, caller_phone_number, status, structured_intake,
                                call_summary, full_transcript, follow_up_notes,
                                external_call_id, created_at, last_updated_at)
             VALUES (?, ?, ?, ?, ?, ?, '[]', ?, ?, ?)",
        )
        .bind(&new_case.case_id)
        .bind(&new_case.caller_phone_number)
        .bind(STATUS_PENDING_REVIEW)
        .bind(&intake_json)
        .bind(&new_case.call_summary)
        .bind(&new_case.full_transcript)
        .bind(&new_case.external_call_id)
        .bind(&now)
        .bind(&now)
        .execute(pool)
        .await?;

        info!("Created new case: {}", new_case.case_id);

        Self::get_by_case_id(pool, &new_case.case_id)
            .await?
            .ok_or_else(|| DbError::CaseNotFound(new_case.case_id.clone()))
    }

    /// Get a case by its opaque case_id.
    pub async fn get_by_case_id(pool: &SqlitePool, case_id: &str) -> DbResult<Option<CaseRecord>> {
        let row = sqlx::query_as::<_, CaseRow>(&format!(
            "SELECT {CASE_COLUMNS} FROM cases WHERE case_id = ?"
        ))
        .bind(case_id)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(CaseRecord::from))
    }

    /// Find a case carrying the given external call reference (idempotency key).
    pub async fn find_by_external_call_id(
        pool: &SqlitePool,
        external_call_id: &str,
    ) -> DbResult<Option<CaseRecord>> {
        let row = sqlx::query_as::<_, CaseRow>(&format!(
            "SELECT {CASE_COLUMNS} FROM cases WHERE external_call_id = ?"
        ))
        .bind(external_call_id)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(CaseRecord::from))
    }

    /// The most recently created case for a phone number, if any.
    ///
    /// "Most recent wins": this is the one record that receives follow-up
    /// notes for the number.
    pub async fn latest_for_phone(
        pool: &SqlitePool,
        caller_phone_number: &str,
    ) -> DbResult<Option<CaseRecord>> {
        let row = sqlx::query_as::<_, CaseRow>(&format!(
            "SELECT {CASE_COLUMNS} FROM cases
             WHERE caller_phone_number = ?
             ORDER BY created_at DESC, id DESC
             LIMIT 1"
        ))
        .bind(caller_phone_number)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(CaseRecord::from))
    }

    /// Append a follow-up note to an existing case.
    ///
    /// Only the notes sequence and `last_updated_at` change; intake, status
    /// and the original summary are left untouched.
    pub async fn append_note(
        pool: &SqlitePool,
        case_id: &str,
        note: FollowUpNote,
    ) -> DbResult<CaseRecord> {
        let record = Self::get_by_case_id(pool, case_id)
            .await?
            .ok_or_else(|| DbError::CaseNotFound(case_id.to_string()))?;

        let mut notes = record.follow_up_notes;
        notes.push(note);
        let notes_json = serde_json::to_string(&notes)?;
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "UPDATE cases SET follow_up_notes = ?, last_updated_at = ? WHERE case_id = ?",
        )
        .bind(&notes_json)
        .bind(&now)
        .bind(case_id)
        .execute(pool)
        .await?;

        info!("Appended follow-up note to case: {}", case_id);

        Self::get_by_case_id(pool, case_id)
            .await?
            .ok_or_else(|| DbError::CaseNotFound(case_id.to_string()))
    }

    /// List all cases, newest first.
    pub async fn list(pool: &SqlitePool) -> DbResult<Vec<CaseRecord>> {
        let rows = sqlx::query_as::<_, CaseRow>(&format!(
            "SELECT {CASE_COLUMNS} FROM cases ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(CaseRecord::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::create_test_pool;

    fn sample_intake() -> CaseIntake {
        CaseIntake {
            client_name: "Jane Doe".to_string(),
            opposing_party: Some("Innovate Corp".to_string()),
            case_type: "Wrongful Termination".to_string(),
            summary_of_facts: "Terminated without notice after reporting safety issues."
                .to_string(),
            key_dates: vec!["03/14/2025".to_string()],
        }
    }

    fn sample_case(phone: &str, external: Option<&str>) -> NewCase {
        NewCase {
            case_id: CaseRepository::generate_case_id(),
            caller_phone_number: Some(phone.to_string()),
            structured_intake: Some(sample_intake()),
            call_summary: "Caller reports a wrongful termination.".to_string(),
            full_transcript: "User: I was fired\n".to_string(),
            external_call_id: external.map(|s| s.to_string()),
        }
    }

    #[test]
    fn case_ids_look_opaque_and_unique() {
        let a = CaseRepository::generate_case_id();
        let b = CaseRepository::generate_case_id();
        assert!(a.starts_with("CASE-"));
        assert_eq!(a.len(), "CASE-".len() + 8);
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn insert_creates_pending_case_with_empty_notes() {
        let db = create_test_pool().await.unwrap();
        let record = CaseRepository::insert(db.pool(), sample_case("+15551234567", None))
            .await
            .unwrap();

        assert_eq!(record.status, STATUS_PENDING_REVIEW);
        assert!(record.follow_up_notes.is_empty());
        assert_eq!(record.structured_intake, Some(sample_intake()));
        assert_eq!(record.created_at, record.last_updated_at);
    }

    #[tokio::test]
    async fn latest_for_phone_prefers_newest() {
        let db = create_test_pool().await.unwrap();
        let first = CaseRepository::insert(db.pool(), sample_case("+15551234567", None))
            .await
            .unwrap();
        let second = CaseRepository::insert(db.pool(), sample_case("+15551234567", None))
            .await
            .unwrap();

        let found = CaseRepository::latest_for_phone(db.pool(), "+15551234567")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.case_id, second.case_id);
        assert_ne!(found.case_id, first.case_id);

        let missing = CaseRepository::latest_for_phone(db.pool(), "+15550000000")
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn append_note_leaves_intake_and_status_alone() {
        let db = create_test_pool().await.unwrap();
        let record = CaseRepository::insert(db.pool(), sample_case("+15551234567", None))
            .await
            .unwrap();

        let note = FollowUpNote {
            timestamp: Utc::now().to_rfc3339(),
            call_ref: Some("call-2".to_string()),
            summary: "Caller asked for an update.".to_string(),
            transcript: "User: Any update?\n".to_string(),
        };
        let updated = CaseRepository::append_note(db.pool(), &record.case_id, note.clone())
            .await
            .unwrap();

        assert_eq!(updated.follow_up_notes, vec![note]);
        assert_eq!(updated.structured_intake, record.structured_intake);
        assert_eq!(updated.status, record.status);
        assert_eq!(updated.call_summary, record.call_summary);
        assert_eq!(updated.created_at, record.created_at);
        assert!(updated.last_updated_at >= record.last_updated_at);
    }

    #[tokio::test]
    async fn external_call_id_lookup_and_uniqueness() {
        let db = create_test_pool().await.unwrap();
        CaseRepository::insert(db.pool(), sample_case("+15551234567", Some("call-1")))
            .await
            .unwrap();

        let found = CaseRepository::find_by_external_call_id(db.pool(), "call-1")
            .await
            .unwrap();
        assert!(found.is_some());

        // The unique constraint backstops the idempotency check.
        let duplicate =
            CaseRepository::insert(db.pool(), sample_case("+15559876543", Some("call-1"))).await;
        assert!(duplicate.is_err());
    }

    #[tokio::test]
    async fn corrupt_notes_decode_to_empty() {
        let db = create_test_pool().await.unwrap();
        let record = CaseRepository::insert(db.pool(), sample_case("+15551234567", None))
            .await
            .unwrap();

        sqlx::query("UPDATE cases SET follow_up_notes = 'not json' WHERE case_id = ?")
            .bind(&record.case_id)
            .execute(db.pool())
            .await
            .unwrap();

        let reread = CaseRepository::get_by_case_id(db.pool(), &record.case_id)
            .await
            .unwrap()
            .unwrap();
        assert!(reread.follow_up_notes.is_empty());
    }
}
