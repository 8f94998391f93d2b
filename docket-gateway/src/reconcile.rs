//! Case reconciliation: the single place where a finished call transcript
//! becomes durable case state.
//!
//! Per caller phone number the state machine is `NO_CASE -> OPEN` on the
//! first transcript and `OPEN -> OPEN` (note appended) on every subsequent
//! one; nothing here ever closes or deletes a case.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use docket_core::{TranscriptMessage, format_transcript};
use docket_db::{CaseRepository, DbResult, FollowUpNote, NewCase};
use sqlx::SqlitePool;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{error, info, warn};

use crate::extraction::IntakeExtractor;
use crate::providers::{Provider, extract_all_text};

const SUMMARY_UNAVAILABLE: &str = "(summary unavailable)";

/// What reconciliation did with a call. Failures surface here rather than
/// as exceptions: the webhook layer must answer success either way, but
/// the outcome stays visible in signatures and logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The external call reference was already processed; no mutation.
    DuplicateCall,
    /// The transcript had zero messages; no mutation.
    EmptyTranscript,
    /// First transcript for this number: a new case was opened.
    Created { case_id: String },
    /// A follow-up note was appended to the caller's existing case.
    Appended { case_id: String },
    /// A database failure prevented persistence (logged).
    Failed,
}

pub struct ReconciliationEngine {
    pool: SqlitePool,
    provider: Arc<dyn Provider>,
    extractor: Arc<IntakeExtractor>,
    summary_temperature: f32,
    /// One async lock per caller phone number. The whole
    /// check-lookup-write sequence runs under it, so two concurrent
    /// transcripts from the same number cannot both take the "no existing
    /// case" branch.
    caller_locks: std::sync::Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl ReconciliationEngine {
    pub fn new(
        pool: SqlitePool,
        provider: Arc<dyn Provider>,
        extractor: Arc<IntakeExtractor>,
        summary_temperature: f32,
    ) -> Self {
        Self {
            pool,
            provider,
            extractor,
            summary_temperature,
            caller_locks: std::sync::Mutex::new(HashMap::new()),
        }
    }

    /// Process one finished call. Never returns an error; database
    /// failures are logged and reported as [`ReconcileOutcome::Failed`].
    pub async fn process_call(
        &self,
        transcript: &[TranscriptMessage],
        caller_phone_number: &str,
        external_call_ref: Option<&str>,
    ) -> ReconcileOutcome {
        let lock = self.lock_for(caller_phone_number);
        let _guard = lock.lock().await;

        match self
            .run(transcript, caller_phone_number, external_call_ref)
            .await
        {
            Ok(outcome) => {
                match &outcome {
                    ReconcileOutcome::DuplicateCall => info!(
                        "Call {:?} already processed; skipping",
                        external_call_ref
                    ),
                    ReconcileOutcome::EmptyTranscript => {
                        info!("Empty transcript for {}; nothing to do", caller_phone_number)
                    }
                    ReconcileOutcome::Created { case_id } => {
                        info!("Opened case {} for {}", case_id, caller_phone_number)
                    }
                    ReconcileOutcome::Appended { case_id } => {
                        info!("Appended note to case {} for {}", case_id, caller_phone_number)
                    }
                    ReconcileOutcome::Failed => {}
                }
                outcome
            }
            Err(e) => {
                error!(
                    "Failed to persist call for {}: {}",
                    caller_phone_number, e
                );
                ReconcileOutcome::Failed
            }
        }
    }

    async fn run(
        &self,
        transcript: &[TranscriptMessage],
        caller_phone_number: &str,
        external_call_ref: Option<&str>,
    ) -> DbResult<ReconcileOutcome> {
        // 1. Idempotency: webhook delivery is at-least-once.
        if let Some(call_ref) = external_call_ref
            && CaseRepository::find_by_external_call_id(&self.pool, call_ref)
                .await?
                .is_some()
        {
            return Ok(ReconcileOutcome::DuplicateCall);
        }

        // 2. Nothing to record.
        if transcript.is_empty() {
            return Ok(ReconcileOutcome::EmptyTranscript);
        }

        // 3. Most recent case wins for this number.
        let existing = CaseRepository::latest_for_phone(&self.pool, caller_phone_number).await?;

        // 4. Render the transcript once; both branches store this form.
        let formatted = format_transcript(transcript);

        // 5. Summarize on both branches.
        let summary = self.summarize(&formatted).await;

        match existing {
            Some(case) => {
                let note = FollowUpNote {
                    timestamp: Utc::now().to_rfc3339(),
                    call_ref: external_call_ref.map(|s| s.to_string()),
                    summary,
                    transcript: formatted,
                };
                let updated = CaseRepository::append_note(&self.pool, &case.case_id, note).await?;
                Ok(ReconcileOutcome::Appended {
                    case_id: updated.case_id,
                })
            }
            None => {
                let case_id = CaseRepository::generate_case_id();
                let structured_intake = match self.extractor.extract(&formatted).await {
                    Ok(intake) => Some(intake),
                    Err(e) => {
                        warn!("Intake extraction failed for {}: {}", case_id, e);
                        None
                    }
                };
                let record = CaseRepository::insert(
                    &self.pool,
                    NewCase {
                        case_id,
                        caller_phone_number: Some(caller_phone_number.to_string()),
                        structured_intake,
                        call_summary: summary,
                        full_transcript: formatted,
                        external_call_id: external_call_ref.map(|s| s.to_string()),
                    },
                )
                .await?;
                Ok(ReconcileOutcome::Created {
                    case_id: record.case_id,
                })
            }
        }
    }

    async fn summarize(&self, formatted_transcript: &str) -> String {
        let prompt = format!(
            "You are a highly skilled paralegal. Based on the following call transcript, \
             provide a concise, neutral summary of the conversation. Focus on the key issues \
             discussed and the main purpose of the call.\n\n\
             Transcript:\n---\n{formatted_transcript}---\n\nSummary:"
        );

        match self
            .provider
            .complete(&prompt, Some(self.summary_temperature))
            .await
        {
            Ok(response) => {
                let text = extract_all_text(&response);
                if text.trim().is_empty() {
                    SUMMARY_UNAVAILABLE.to_string()
                } else {
                    text.trim().to_string()
                }
            }
            Err(e) => {
                warn!("Call summarization failed: {}", e);
                SUMMARY_UNAVAILABLE.to_string()
            }
        }
    }

    fn lock_for(&self, caller_phone_number: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self
            .caller_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        locks
            .entry(caller_phone_number.to_string())
            .or_default()
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeProvider;
    use docket_db::test_helpers::create_test_pool;
    use serde_json::json;

    fn intake_provider() -> Arc<FakeProvider> {
        Arc::new(FakeProvider::with_intake(json!({
            "client_name": "Jane Doe",
            "opposing_party": "Innovate Corp",
            "case_type": "Wrongful Termination",
            "summary_of_facts": "Fired after reporting safety issues.",
            "key_dates": []
        })))
    }

    fn engine(pool: &SqlitePool, provider: Arc<FakeProvider>) -> ReconciliationEngine {
        let extractor = Arc::new(IntakeExtractor::new(provider.clone()));
        ReconciliationEngine::new(pool.clone(), provider, extractor, 0.2)
    }

    fn turns(lines: &[(&str, &str)]) -> Vec<TranscriptMessage> {
        lines
            .iter()
            .map(|(role, content)| TranscriptMessage::new(*role, *content))
            .collect()
    }

    #[tokio::test]
    async fn first_transcript_creates_a_pending_case() {
        let db = create_test_pool().await.unwrap();
        let engine = engine(db.pool(), intake_provider());

        let outcome = engine
            .process_call(
                &turns(&[("user", "I was fired")]),
                "+15551234567",
                Some("call-1"),
            )
            .await;

        let ReconcileOutcome::Created { case_id } = outcome else {
            panic!("expected Created, got {:?}", outcome);
        };

        let record = CaseRepository::get_by_case_id(db.pool(), &case_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.status, "Pending Review");
        assert!(record.follow_up_notes.is_empty());
        assert_eq!(
            record.structured_intake.as_ref().unwrap().client_name,
            "Jane Doe"
        );
        assert_eq!(record.full_transcript.as_deref(), Some("User: I was fired\n"));
        assert_eq!(record.external_call_id.as_deref(), Some("call-1"));
    }

    #[tokio::test]
    async fn second_transcript_appends_exactly_one_note() {
        let db = create_test_pool().await.unwrap();
        let engine = engine(db.pool(), intake_provider());

        let first = engine
            .process_call(&turns(&[("user", "I was fired")]), "+15551234567", None)
            .await;
        let ReconcileOutcome::Created { case_id } = first else {
            panic!("expected Created");
        };
        let before = CaseRepository::get_by_case_id(db.pool(), &case_id)
            .await
            .unwrap()
            .unwrap();

        let second = engine
            .process_call(&turns(&[("user", "Any update?")]), "+15551234567", None)
            .await;
        assert_eq!(
            second,
            ReconcileOutcome::Appended {
                case_id: case_id.clone()
            }
        );

        // One case total, two distinct timestamped entries reachable from it.
        let all = CaseRepository::list(db.pool()).await.unwrap();
        assert_eq!(all.len(), 1);
        let after = &all[0];
        assert_eq!(after.follow_up_notes.len(), 1);
        assert!(after.follow_up_notes[0].transcript.contains("Any update?"));
        assert_eq!(after.structured_intake, before.structured_intake);
        assert_eq!(after.case_id, before.case_id);
        assert_eq!(after.status, before.status);
        assert_eq!(after.call_summary, before.call_summary);
    }

    #[tokio::test]
    async fn duplicate_call_reference_is_a_noop() {
        let db = create_test_pool().await.unwrap();
        let engine = engine(db.pool(), intake_provider());
        let transcript = turns(&[("user", "I was fired")]);

        engine
            .process_call(&transcript, "+15551234567", Some("call-1"))
            .await;
        let before = CaseRepository::list(db.pool()).await.unwrap();

        let outcome = engine
            .process_call(&transcript, "+15551234567", Some("call-1"))
            .await;
        assert_eq!(outcome, ReconcileOutcome::DuplicateCall);

        let after = CaseRepository::list(db.pool()).await.unwrap();
        assert_eq!(after.len(), before.len());
        assert!(after[0].follow_up_notes.is_empty());
        assert_eq!(after[0].last_updated_at, before[0].last_updated_at);
    }

    #[tokio::test]
    async fn empty_transcript_mutates_nothing() {
        let db = create_test_pool().await.unwrap();
        let engine = engine(db.pool(), intake_provider());

        let outcome = engine.process_call(&[], "+15551234567", None).await;
        assert_eq!(outcome, ReconcileOutcome::EmptyTranscript);
        assert!(CaseRepository::list(db.pool()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn extraction_failure_still_opens_the_case() {
        let db = create_test_pool().await.unwrap();
        // Provider answers summaries but produces no structured record.
        let provider = Arc::new(FakeProvider::with_text("Summary text."));
        let engine = engine(db.pool(), provider);

        let outcome = engine
            .process_call(&turns(&[("user", "I was fired")]), "+15551234567", None)
            .await;

        let ReconcileOutcome::Created { case_id } = outcome else {
            panic!("expected Created");
        };
        let record = CaseRepository::get_by_case_id(db.pool(), &case_id)
            .await
            .unwrap()
            .unwrap();
        assert!(record.structured_intake.is_none());
        assert_eq!(record.call_summary.as_deref(), Some("Summary text."));
    }

    #[tokio::test]
    async fn summary_failure_degrades_to_placeholder() {
        let db = create_test_pool().await.unwrap();
        let provider = Arc::new(FakeProvider::failing());
        let engine = engine(db.pool(), provider);

        let outcome = engine
            .process_call(&turns(&[("user", "I was fired")]), "+15551234567", None)
            .await;

        let ReconcileOutcome::Created { case_id } = outcome else {
            panic!("expected Created");
        };
        let record = CaseRepository::get_by_case_id(db.pool(), &case_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.call_summary.as_deref(), Some(SUMMARY_UNAVAILABLE));
    }

    #[tokio::test]
    async fn concurrent_calls_from_one_number_yield_one_case() {
        let db = create_test_pool().await.unwrap();
        let engine = Arc::new(engine(db.pool(), intake_provider()));

        let a = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move {
                engine
                    .process_call(
                        &[TranscriptMessage::new("user", "I was fired")],
                        "+15551234567",
                        Some("call-a"),
                    )
                    .await
            })
        };
        let b = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move {
                engine
                    .process_call(
                        &[TranscriptMessage::new("user", "Following up")],
                        "+15551234567",
                        Some("call-b"),
                    )
                    .await
            })
        };

        let (a, b) = (a.await.unwrap(), b.await.unwrap());
        let created = [&a, &b]
            .iter()
            .filter(|o| matches!(o, ReconcileOutcome::Created { .. }))
            .count();
        let appended = [&a, &b]
            .iter()
            .filter(|o| matches!(o, ReconcileOutcome::Appended { .. }))
            .count();
        assert_eq!((created, appended), (1, 1));
        assert_eq!(CaseRepository::list(db.pool()).await.unwrap().len(), 1);
    }
}
