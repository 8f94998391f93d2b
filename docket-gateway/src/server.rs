//! HTTP boundary: agent queries, case intake, document management, audio
//! transcription, and the voice-platform webhook.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use docket_core::TranscriptMessage;
use docket_db::{CaseRepository, DocumentRepository, NewCase};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, warn};

use crate::state::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Agent query request
#[derive(Debug, Deserialize)]
pub struct AgentQueryRequest {
    pub text: String,
    #[serde(default)]
    pub history: Vec<TranscriptMessage>,
    pub caller_phone_number: Option<String>,
}

/// Agent query response
#[derive(Debug, Serialize)]
pub struct AgentQueryResponse {
    pub answer: String,
}

/// Manual case intake request
#[derive(Debug, Deserialize)]
pub struct CaseIntakeRequest {
    pub text: String,
}

/// End-of-call webhook payload from the voice platform.
#[derive(Debug, Deserialize)]
pub struct CallWebhookPayload {
    /// "end-of-call" (default) or "turn" for mid-call conversational turns
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub transcript: Vec<TranscriptMessage>,
    pub caller_phone_number: Option<String>,
    pub external_call_id: Option<String>,
    pub ended_reason: Option<String>,
    /// Present on "turn" events
    pub utterance: Option<String>,
}

/// Run the HTTP server
pub async fn run(state: Arc<AppState>, bind_addr: &str) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("Server listening on {}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Create the router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/agent/query", post(agent_query_handler))
        .route("/cases", get(list_cases_handler))
        .route("/cases/intake", post(case_intake_handler))
        .route("/documents", get(list_documents_handler).post(upload_document_handler))
        .route("/documents/{filename}", delete(delete_document_handler))
        .route("/transcriptions", post(transcription_handler))
        .route("/webhook/call", post(call_webhook_handler))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(tower_http::cors::CorsLayer::permissive())
        .layer(DefaultBodyLimit::max(32 * 1024 * 1024))
}

/// Health check handler
async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Agent query handler - POST /agent/query
///
/// Dispatch never raises, so this route always answers 200 with JSON.
async fn agent_query_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AgentQueryRequest>,
) -> impl IntoResponse {
    info!("Received agent query");

    let answer = state
        .dispatcher
        .dispatch(
            &request.text,
            &request.history,
            request.caller_phone_number.as_deref(),
        )
        .await;

    Json(AgentQueryResponse { answer })
}

/// List cases handler - GET /cases
async fn list_cases_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match CaseRepository::list(state.db.pool()).await {
        Ok(cases) => (StatusCode::OK, Json(json!({ "cases": cases }))).into_response(),
        Err(e) => {
            error!("Failed to list cases: {}", e);
            internal_error("failed to list cases")
        }
    }
}

/// Manual case intake handler - POST /cases/intake
///
/// Runs structured extraction over pasted interview text and opens a case.
async fn case_intake_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CaseIntakeRequest>,
) -> impl IntoResponse {
    let intake = match state.extractor.extract(&request.text).await {
        Ok(intake) => intake,
        Err(e) => {
            warn!("Manual intake extraction failed: {}", e);
            return internal_error("intake extraction failed");
        }
    };

    let new_case = NewCase {
        case_id: CaseRepository::generate_case_id(),
        caller_phone_number: None,
        call_summary: intake.summary_of_facts.clone(),
        structured_intake: Some(intake),
        full_transcript: request.text,
        external_call_id: None,
    };

    match CaseRepository::insert(state.db.pool(), new_case).await {
        Ok(record) => (StatusCode::OK, Json(json!({ "case": record }))).into_response(),
        Err(e) => {
            error!("Failed to insert case: {}", e);
            internal_error("failed to save case")
        }
    }
}

/// List indexed documents handler - GET /documents
async fn list_documents_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match DocumentRepository::list(state.db.pool()).await {
        Ok(documents) => (StatusCode::OK, Json(json!({ "documents": documents }))).into_response(),
        Err(e) => {
            error!("Failed to list documents: {}", e);
            internal_error("failed to list documents")
        }
    }
}

/// Document upload handler - POST /documents (multipart)
async fn upload_document_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let field = match multipart.next_field().await {
        Ok(Some(field)) => field,
        Ok(None) => return bad_request("no file in upload"),
        Err(e) => {
            warn!("Malformed document upload: {}", e);
            return bad_request("malformed multipart upload");
        }
    };

    // Strip any path components from the client-supplied name.
    let filename = field
        .file_name()
        .map(|name| name.to_string())
        .and_then(|name| {
            std::path::Path::new(&name)
                .file_name()
                .map(|base| base.to_string_lossy().to_string())
        });
    let Some(filename) = filename else {
        return bad_request("upload is missing a filename");
    };

    let bytes = match field.bytes().await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Failed to read upload body: {}", e);
            return bad_request("failed to read upload body");
        }
    };

    let source_dir = state.config.settings.index.source_dir.clone();
    if let Err(e) = tokio::fs::create_dir_all(&source_dir).await {
        error!("Failed to create source directory: {}", e);
        return internal_error("failed to store document");
    }
    let target = source_dir.join(&filename);
    if let Err(e) = tokio::fs::write(&target, &bytes).await {
        error!("Failed to write {}: {}", target.display(), e);
        return internal_error("failed to store document");
    }

    match state.index.ingest(&target).await {
        Ok(report) => {
            if let Err(e) = DocumentRepository::record(
                state.db.pool(),
                &report.filename,
                report.chunk_count as i64,
                Some(&target.to_string_lossy()),
            )
            .await
            {
                error!("Failed to record document metadata: {}", e);
            }
            (
                StatusCode::OK,
                Json(json!({
                    "filename": report.filename,
                    "chunk_count": report.chunk_count,
                })),
            )
                .into_response()
        }
        Err(docket_knowledge::IndexError::UnsupportedFile(path)) => {
            warn!("Skipping unsupported upload: {}", path.display());
            (
                StatusCode::OK,
                Json(json!({
                    "filename": filename,
                    "status": "skipped",
                    "reason": "unsupported file type",
                })),
            )
                .into_response()
        }
        Err(e) => {
            error!("Failed to ingest {}: {}", filename, e);
            internal_error("document ingestion failed")
        }
    }
}

/// Document removal handler - DELETE /documents/{filename}
///
/// Removing a filename with no chunks is a no-op, still 200.
async fn delete_document_handler(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> impl IntoResponse {
    let removed_chunks = match state.index.remove(&filename).await {
        Ok(count) => count,
        Err(e) => {
            error!("Failed to remove {} from index: {}", filename, e);
            return internal_error("document removal failed");
        }
    };

    let metadata_removed = match DocumentRepository::delete(state.db.pool(), &filename).await {
        Ok(removed) => removed,
        Err(e) => {
            error!("Failed to delete metadata for {}: {}", filename, e);
            false
        }
    };

    (
        StatusCode::OK,
        Json(json!({
            "filename": filename,
            "removed_chunks": removed_chunks,
            "metadata_removed": metadata_removed,
        })),
    )
        .into_response()
}

/// Audio transcription handler - POST /transcriptions (multipart)
async fn transcription_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let Some(transcriber) = &state.transcriber else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: "transcription is not configured".to_string(),
            }),
        )
            .into_response();
    };

    let field = match multipart.next_field().await {
        Ok(Some(field)) => field,
        _ => return bad_request("no audio file in upload"),
    };
    let filename = field
        .file_name()
        .map(|name| name.to_string())
        .unwrap_or_else(|| "audio.wav".to_string());
    let bytes = match field.bytes().await {
        Ok(bytes) => bytes.to_vec(),
        Err(e) => {
            warn!("Failed to read audio body: {}", e);
            return bad_request("failed to read audio body");
        }
    };

    match transcriber.transcribe(&filename, bytes).await {
        Ok(text) => (StatusCode::OK, Json(json!({ "text": text }))).into_response(),
        Err(e) => {
            warn!("Transcription failed: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: format!("transcription failed: {}", e),
                }),
            )
                .into_response()
        }
    }
}

/// Voice platform webhook - POST /webhook/call
///
/// Always answers 200 with well-formed JSON: the voice platform retries on
/// anything else, and a redelivery storm is worse than a logged failure.
async fn call_webhook_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CallWebhookPayload>, JsonRejection>,
) -> impl IntoResponse {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(e) => {
            warn!("Malformed webhook payload: {}", e);
            return (
                StatusCode::OK,
                Json(json!({ "status": "error", "detail": "malformed payload" })),
            );
        }
    };

    if payload.event == "turn" {
        let utterance = payload.utterance.unwrap_or_default();
        let reply = state
            .dispatcher
            .dispatch(
                &utterance,
                &payload.transcript,
                payload.caller_phone_number.as_deref(),
            )
            .await;
        return (StatusCode::OK, Json(json!({ "status": "ok", "reply": reply })));
    }

    // End-of-call: reconcile in the background and acknowledge immediately.
    let Some(phone) = payload.caller_phone_number else {
        warn!(
            "End-of-call event without a caller phone number (reason: {:?}); skipping",
            payload.ended_reason
        );
        return (StatusCode::OK, Json(json!({ "status": "received" })));
    };

    info!(
        "End-of-call for {} (reason: {:?}, call: {:?})",
        phone, payload.ended_reason, payload.external_call_id
    );

    let state = Arc::clone(&state);
    tokio::spawn(async move {
        state
            .reconciler
            .process_call(
                &payload.transcript,
                &phone,
                payload.external_call_id.as_deref(),
            )
            .await;
    });

    (StatusCode::OK, Json(json!({ "status": "received" })))
}

fn bad_request(message: &str) -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

fn internal_error(message: &str) -> axum::response::Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn webhook_payload_deserializes_platform_shape() {
        let raw = json!({
            "event": "end-of-call",
            "transcript": [
                {"role": "assistant", "content": "How can I help?"},
                {"role": "user", "content": "I was fired"}
            ],
            "caller_phone_number": "+15551234567",
            "external_call_id": "call_abc123",
            "ended_reason": "customer-ended-call"
        });

        let payload: CallWebhookPayload = serde_json::from_value(raw).unwrap();
        assert_eq!(payload.event, "end-of-call");
        assert_eq!(payload.transcript.len(), 2);
        assert_eq!(payload.caller_phone_number.as_deref(), Some("+15551234567"));
        assert_eq!(payload.external_call_id.as_deref(), Some("call_abc123"));
    }

    #[test]
    fn webhook_payload_tolerates_missing_fields() {
        let payload: CallWebhookPayload = serde_json::from_value(json!({})).unwrap();
        assert!(payload.transcript.is_empty());
        assert!(payload.caller_phone_number.is_none());
    }
}
