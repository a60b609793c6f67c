//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Update bodies are a handful of timestamp pairs.
const MAX_UPDATE_BODY_BYTES: usize = 64 * 1024;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        .route("/scroll-events", get(handlers::get_scroll_events))
        .route("/lunar-events", get(handlers::get_lunar_events))
        .route("/lunar/current", get(handlers::get_current_phase));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/update-variables", post(handlers::update_variables))
        .nest("/v1", api_v1)
        .layer(DefaultBodyLimit::max(MAX_UPDATE_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
