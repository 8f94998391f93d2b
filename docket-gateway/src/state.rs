//! Shared application state and component wiring.

use std::sync::Arc;
use std::time::Duration;

use docket_core::Config;
use docket_db::DbPool;
use docket_knowledge::DocumentIndex;
use tracing::info;

use crate::agent::AgentDispatcher;
use crate::answer::AnswerEngine;
use crate::extraction::IntakeExtractor;
use crate::providers::Provider;
use crate::reconcile::ReconciliationEngine;
use crate::tools::ToolManager;
use crate::transcription::TranscriptionClient;
use crate::web::search::{SearchProvider, brave::BraveSearchProvider};

/// Shared application state.
///
/// Built once at startup; every component receives its dependencies from
/// here instead of reaching for process-wide singletons.
pub struct AppState {
    pub config: Config,
    pub db: DbPool,
    pub index: Arc<DocumentIndex>,
    pub dispatcher: AgentDispatcher,
    pub reconciler: ReconciliationEngine,
    pub extractor: Arc<IntakeExtractor>,
    pub transcriber: Option<TranscriptionClient>,
}

impl AppState {
    pub fn new(
        config: Config,
        db: DbPool,
        index: Arc<DocumentIndex>,
        provider: Arc<dyn Provider>,
    ) -> Self {
        let answer = Arc::new(AnswerEngine::new(
            Arc::clone(&index),
            Arc::clone(&provider),
            config.settings.llm.grounded_temperature,
            config.settings.index.top_k,
        ));
        let extractor = Arc::new(IntakeExtractor::new(Arc::clone(&provider)));

        let web_search = build_web_search(&config);
        let tools = ToolManager::new(
            answer,
            Arc::clone(&extractor),
            db.pool().clone(),
            web_search,
            config.settings.web_search.max_results,
        );

        let dispatcher = AgentDispatcher::new(
            Arc::clone(&provider),
            tools,
            db.pool().clone(),
            config.settings.agent.iteration_cap(),
        );

        let reconciler = ReconciliationEngine::new(
            db.pool().clone(),
            Arc::clone(&provider),
            Arc::clone(&extractor),
            config.settings.llm.grounded_temperature,
        );

        let transcriber = if config.settings.transcription.enabled {
            Some(TranscriptionClient::new(&config.settings.transcription))
        } else {
            None
        };

        Self {
            config,
            db,
            index,
            dispatcher,
            reconciler,
            extractor,
            transcriber,
        }
    }
}

fn build_web_search(config: &Config) -> Option<Arc<dyn SearchProvider>> {
    if !config.settings.web_search.enabled {
        info!("Web search disabled in settings");
        return None;
    }
    let Some(api_key) = config.brave_api_key() else {
        info!("Web search enabled but BRAVE_API_KEY is not set; capability degraded");
        return None;
    };

    match BraveSearchProvider::new(
        api_key.to_string(),
        Duration::from_secs(config.settings.web_search.timeout_seconds),
        Duration::from_millis(config.settings.web_search.min_interval_ms.max(1000)),
    ) {
        Ok(provider) => Some(Arc::new(provider)),
        Err(e) => {
            info!("Web search provider setup failed: {}; capability degraded", e);
            None
        }
    }
}
