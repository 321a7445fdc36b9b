//! HTTP surface for the Q&A engine
//!
//! Three thin adapters over [`AnswerEngine`]: a plain-text endpoint sized
//! for chat-bot relays, a JSON endpoint with sources for debugging, and a
//! health check reporting the indexed document count. No business logic
//! lives here.

pub mod handlers;

use axum::routing::get;
use axum::Router;
use paliabot_rag::AnswerEngine;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared application state
pub struct AppState {
    pub engine: Arc<AnswerEngine>,
}

/// Build the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/ask", get(handlers::ask))
        .route("/ask/json", get(handlers::ask_json))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}
