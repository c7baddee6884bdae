//! Tally API Server
//!
//! Main entry point for the document numbering service.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tally_api::{AppState, create_router};
use tally_core::numbering::NumberingService;
use tally_db::{HistoryRepository, SequenceRepository, connect_with};
use tally_shared::{AppConfig, StoreBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tally=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    let numbering = match config.numbering.store {
        StoreBackend::Memory => {
            warn!("Using the in-memory sequence store; counters will not survive a restart");
            NumberingService::in_memory(&config.numbering)
                .context("Invalid numbering configuration")?
        }
        StoreBackend::Postgres => {
            let database = config
                .database
                .as_ref()
                .context("database.url is required when numbering.store is postgres")?;
            let db = connect_with(database).await?;
            info!(
                max_connections = database.max_connections,
                "Connected to database"
            );
            NumberingService::new(
                Arc::new(SequenceRepository::new(db.clone())),
                Arc::new(HistoryRepository::new(db)),
                &config.numbering,
            )
            .context("Invalid numbering configuration")?
        }
    };
    info!(
        auto_provision = config.numbering.auto_provision,
        max_attempts = config.numbering.max_attempts,
        "Numbering service configured"
    );

    // Create application state
    let state = AppState {
        numbering: Arc::new(numbering),
    };

    // Create router
    let app = create_router(state).layer(TimeoutLayer::new(Duration::from_secs(
        config.server.request_timeout_secs,
    )));

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
