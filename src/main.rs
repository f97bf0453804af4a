//! Webhallen API - Main entry point
//!
//! A small HTTP service exposing scraped Webhallen product data:
//! - Routes product lookups to the SQLite store
//! - Serves a root greeting and a health check

mod api;
mod config;
mod db;

use anyhow::Result;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::AppConfig;
use crate::db::Database;

/// Shared application state, injected into handlers per-request
pub struct AppState {
    pub db: Database,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,webhallen_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Webhallen API");

    // Load configuration
    let config = AppConfig::from_env();
    tracing::info!("Configuration loaded: {:?}", config);

    // Initialize database
    let db = Database::new(&config.data_dir)?;
    db.migrate()?;
    tracing::info!("Database initialized");

    let state = std::sync::Arc::new(AppState { db });

    let app = api::router(state).layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Webhallen API listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
