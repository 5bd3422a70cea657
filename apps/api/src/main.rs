mod catalog;
mod config;
mod errors;
mod llm_client;
mod matching;
mod routes;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::catalog::CatalogStore;
use crate::config::Config;
use crate::llm_client::build_provider;
use crate::matching::MatchingPipeline;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on invalid or missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting competence matcher v{}", env!("CARGO_PKG_VERSION"));

    // Load every catalog up front; an unreadable catalog is fatal
    let catalogs = CatalogStore::load_all(&config.catalog_dir).with_context(|| {
        format!(
            "Failed to load competence goal catalogs from {}",
            config.catalog_dir.display()
        )
    })?;
    info!("Default catalog language: {}", config.default_language);

    // Initialize the LLM provider chosen by configuration
    let provider = build_provider(&config.provider).context("Failed to build LLM provider")?;
    info!(
        "LLM provider initialized ({}, model: {})",
        provider.name(),
        provider.model()
    );

    let state = AppState {
        pipeline: MatchingPipeline::new(provider),
        catalogs,
        config: config.clone(),
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
