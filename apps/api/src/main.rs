mod config;
mod errors;
mod insights;
mod llm_client;
mod profile;
mod rejections;
mod routes;
mod session;
mod state;
mod storage;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::rejections::extraction::LlmExtractor;
use crate::routes::build_router;
use crate::session::controller::SessionController;
use crate::state::AppState;
use crate::storage::{BlobStore, FileBlobStore, RedisBlobStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Rebound API v{}", env!("CARGO_PKG_VERSION"));

    let store = build_store(&config).await;

    // Initialize LLM client
    let mut llm = LlmClient::new(config.anthropic_api_key.clone(), config.llm_timeout)?;
    if let Some(url) = &config.anthropic_api_url {
        llm = llm.with_endpoint(url.clone());
    }
    info!(
        "LLM client initialized (model: {}, timeout: {:?})",
        llm_client::MODEL,
        config.llm_timeout
    );

    let session = SessionController::load(store, Arc::new(LlmExtractor(llm))).await;

    let state = AppState {
        session: Arc::new(session),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Redis when configured and reachable, otherwise the local data directory.
async fn build_store(config: &Config) -> Arc<dyn BlobStore> {
    if let Some(redis_url) = &config.redis_url {
        match RedisBlobStore::connect(redis_url).await {
            Ok(store) => return Arc::new(store),
            Err(e) => warn!("Redis unavailable ({e}), falling back to local file storage"),
        }
    }
    info!("Using file storage in {}", config.data_dir.display());
    Arc::new(FileBlobStore::new(config.data_dir.clone()))
}
