//! Retrieval-augmented answering over the indexed document corpus.

use std::sync::Arc;

use docket_knowledge::DocumentIndex;
use tracing::warn;

use crate::providers::{Provider, extract_all_text};

/// Answers one free-text question using only the indexed corpus as
/// evidence. Stateless per query.
pub struct AnswerEngine {
    index: Arc<DocumentIndex>,
    provider: Arc<dyn Provider>,
    temperature: f32,
    top_k: usize,
}

impl AnswerEngine {
    pub fn new(
        index: Arc<DocumentIndex>,
        provider: Arc<dyn Provider>,
        temperature: f32,
        top_k: usize,
    ) -> Self {
        Self {
            index,
            provider,
            temperature,
            top_k,
        }
    }

    /// Answer a question from retrieved context.
    ///
    /// This is a user-facing tool result, not an exception boundary: every
    /// failure mode comes back as a descriptive string.
    pub async fn answer(&self, question: &str) -> String {
        let hits = match self.index.search(question, self.top_k).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!("Document retrieval failed: {}", e);
                return "Document retrieval is currently unavailable; please try again shortly."
                    .to_string();
            }
        };

        if hits.is_empty() {
            return "No documents have been indexed yet, so there is nothing to answer from."
                .to_string();
        }

        let context = hits
            .iter()
            .map(|hit| format!("[{}]\n{}", hit.filename, hit.content))
            .collect::<Vec<_>>()
            .join("\n\n");

        let prompt = format!(
            "You are an expert legal assistant. Answer the following question based only on \
             the provided context. If the context does not contain the answer, say so \
             explicitly instead of guessing. Be concise and precise.\n\n\
             Context:\n{context}\n\nQuestion:\n{question}"
        );

        match self.provider.complete(&prompt, Some(self.temperature)).await {
            Ok(response) => {
                let text = extract_all_text(&response);
                if text.trim().is_empty() {
                    "I could not produce an answer from the indexed documents.".to_string()
                } else {
                    text
                }
            }
            Err(e) => {
                warn!("Answer completion failed: {}", e);
                "I could not generate an answer right now; please try again shortly.".to_string()
            }
        }
    }
}
