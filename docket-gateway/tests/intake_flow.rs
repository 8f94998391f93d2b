//! End-to-end reconciliation flow over an in-memory database.

mod common;

use std::sync::Arc;

use common::ScriptedProvider;
use docket_core::TranscriptMessage;
use docket_db::CaseRepository;
use docket_db::test_helpers::create_test_pool;
use docket_gateway::extraction::IntakeExtractor;
use docket_gateway::reconcile::{ReconcileOutcome, ReconciliationEngine};

#[tokio::test]
async fn two_sequential_calls_yield_one_case_with_history() {
    let db = create_test_pool().await.unwrap();
    let provider = Arc::new(ScriptedProvider::new());
    let extractor = Arc::new(IntakeExtractor::new(provider.clone()));
    let engine = ReconciliationEngine::new(db.pool().clone(), provider, extractor, 0.2);

    // First call opens the case.
    let first = engine
        .process_call(
            &[TranscriptMessage::new("user", "I was fired")],
            "+15551234567",
            Some("call-1"),
        )
        .await;
    let ReconcileOutcome::Created { case_id } = first else {
        panic!("expected a new case, got {:?}", first);
    };

    // Second call appends a note instead of opening another case.
    let second = engine
        .process_call(
            &[TranscriptMessage::new("user", "Any update?")],
            "+15551234567",
            Some("call-2"),
        )
        .await;
    assert_eq!(
        second,
        ReconcileOutcome::Appended {
            case_id: case_id.clone()
        }
    );

    let cases = CaseRepository::list(db.pool()).await.unwrap();
    assert_eq!(cases.len(), 1, "one caller must never produce two cases");

    let record = &cases[0];
    assert_eq!(record.case_id, case_id);
    // Two distinct timestamped entries: the original case body and one note.
    assert_eq!(record.full_transcript.as_deref(), Some("User: I was fired\n"));
    assert_eq!(record.follow_up_notes.len(), 1);
    let note = &record.follow_up_notes[0];
    assert_eq!(note.transcript, "User: Any update?\n");
    assert_eq!(note.call_ref.as_deref(), Some("call-2"));
    assert!(note.timestamp >= record.created_at);
    assert!(record.last_updated_at >= record.created_at);

    // Redelivery of either webhook is a no-op.
    let replay = engine
        .process_call(
            &[TranscriptMessage::new("user", "Any update?")],
            "+15551234567",
            Some("call-2"),
        )
        .await;
    assert_eq!(replay, ReconcileOutcome::DuplicateCall);
    let cases = CaseRepository::list(db.pool()).await.unwrap();
    assert_eq!(cases[0].follow_up_notes.len(), 1);
}
