//! HTTP API layer with Axum routes and extractors.
//!
//! This crate provides:
//! - REST API routes for sequences, allocation, resets and history
//! - Request extractors
//! - Error-to-response mapping

pub mod error;
pub mod extractors;
pub mod routes;

use axum::Router;
use std::sync::Arc;
use tally_core::numbering::NumberingService;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Document numbering operations.
    pub numbering: Arc<NumberingService>,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
