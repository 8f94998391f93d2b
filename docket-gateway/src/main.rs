use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docket_gateway::providers::anthropic::AnthropicClient;
use docket_gateway::server;
use docket_gateway::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    docket_core::load_dotenv();
    let config = docket_core::Config::load()?;
    info!(
        "Configuration loaded (model: {}, index source: {})",
        config.settings.llm.model,
        config.settings.index.source_dir.display()
    );

    // Initialize the relational store
    let db = docket_db::DbPool::new().await?;
    info!("Case database initialized");

    // Initialize the document index. An unreachable embedding backend here
    // aborts startup: retrieval is a launch dependency, not a per-request one.
    let embedder = Arc::new(docket_knowledge::EmbeddingClient::new(
        &config.settings.index,
    ));
    let index = Arc::new(
        docket_knowledge::DocumentIndex::open(config.settings.index.clone(), embedder).await?,
    );
    let reports = index.initialize().await?;
    for report in &reports {
        docket_db::DocumentRepository::record(
            db.pool(),
            &report.filename,
            report.chunk_count as i64,
            None,
        )
        .await?;
    }
    if !reports.is_empty() {
        info!("Seeded index metadata for {} documents", reports.len());
    }

    // Create the LLM provider client
    let provider = Arc::new(AnthropicClient::new(
        config.anthropic_api_key(),
        &config.settings.llm.model,
        config.settings.llm.max_tokens,
        Duration::from_secs(config.settings.llm.request_timeout_seconds),
    ));
    info!("Anthropic client created for model: {}", config.settings.llm.model);

    // Security: Verify localhost-only binding
    if config.settings.gateway.host != "127.0.0.1" && config.settings.gateway.host != "localhost" {
        tracing::warn!(
            "Gateway binding to non-localhost address: {}. This may expose the API to remote access.",
            config.settings.gateway.host
        );
    }

    let bind_addr = config.bind_addr();
    let state = Arc::new(AppState::new(config, db, index, provider));

    info!("Starting docket gateway on {}", bind_addr);
    server::run(state, &bind_addr).await
}
