mod config;
mod errors;
mod handlers;
mod models;
mod services;
mod tracker;
mod visualization;

use anyhow::Context;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use crate::{
    config::Config,
    handlers::AppState,
    services::HttpBackend,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize basic tracing subscriber
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;

    let backend = HttpBackend::new(&config.backend.base_url, config.backend.request_timeout())
        .context("Failed to build backend client")?;
    tracing::info!("Analysis backend at {}", config.backend.base_url);

    let state = AppState::new(Arc::new(backend), config.clone());

    // Initial task list; the viewer still starts if the backend is down
    if let Err(e) = state.store.refresh().await {
        tracing::warn!("Initial task list refresh failed: {}", e);
    }

    let tracker = state.tracker.clone();
    let app = handlers::router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(RequestBodyLimitLayer::new(config.server.max_body_size)),
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind server to {}", addr))?;
    tracing::info!("Server running on {}", addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracker.cancel();
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
