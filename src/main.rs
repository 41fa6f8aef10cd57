// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Deck-Tracker API Server
//!
//! Records card-game match results per user and serves win-rate statistics
//! over them.

use deck_tracker::{
    config::{Config, StoreConfig},
    services::SessionRegistry,
    store::Store,
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Deck-Tracker API");

    match &config.store {
        StoreConfig::Local { data_dir } => {
            tracing::info!(data_dir = %data_dir.display(), "Using local document store")
        }
        StoreConfig::Github(github) => tracing::info!(
            owner = %github.owner,
            repo = %github.repo,
            branch = %github.branch,
            "Using remote document store"
        ),
    }
    let store = Store::from_config(&config.store)?;

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        sessions: SessionRegistry::new(store),
    });
    state.spawn_background_tasks();

    // Build router
    let app = deck_tracker::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("deck_tracker=debug,info")),
        )
        .with(format)
        .init();
}
