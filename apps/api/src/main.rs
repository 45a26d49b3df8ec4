mod config;
mod errors;
mod llm_client;
mod recommendation;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::ProviderClient;
use crate::recommendation::orchestrator::Recommender;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on malformed values)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting SkillPath API v{}", env!("CARGO_PKG_VERSION"));

    if config.providers.is_empty() {
        warn!("No provider API keys set; every request will receive the mock plan");
    }
    for provider in &config.providers {
        info!(
            "Provider {} configured (model: {}, structured: {})",
            provider.kind,
            provider.model,
            provider.kind.supports_structured_schema()
        );
    }

    // One HTTP client shared by all provider attempts
    let client = Arc::new(ProviderClient::new(config.provider_timeout));
    let recommender = Arc::new(Recommender::new(&config, client));
    info!(
        "Recommender initialized (provider timeout {:?}, request timeout {:?})",
        config.provider_timeout, config.request_timeout
    );

    let state = AppState { recommender };

    // Build router
    let app = build_router(state)
        .layer(CatchPanicLayer::custom(errors::panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // presentation layer is served from another origin

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
