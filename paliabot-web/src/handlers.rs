//! HTTP request handlers

use crate::AppState;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use paliabot_rag::SourceInfo;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

const FALLBACK_MESSAGE: &str = "Sorry, I ran into a problem. Please try again later.";
const MAX_QUESTION_LENGTH: usize = 500;

/// Query parameters for the ask endpoints
#[derive(Deserialize)]
pub struct AskParams {
    /// The question to ask about Palia
    pub q: String,
}

/// JSON answer with sources
#[derive(Serialize)]
pub struct AskJsonResponse {
    pub question: String,
    pub answer: String,
    pub sources: Vec<SourceInfo>,
    pub truncated: bool,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub documents_indexed: usize,
}

fn validate_question(q: &str) -> Result<(), StatusCode> {
    let len = q.trim().chars().count();
    if len == 0 || len > MAX_QUESTION_LENGTH {
        return Err(StatusCode::BAD_REQUEST);
    }
    Ok(())
}

/// Plain-text Q&A endpoint, sized for chat-bot relays like Nightbot.
/// Provider failures become a user-safe apology line, never internals.
pub async fn ask(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AskParams>,
) -> Result<String, StatusCode> {
    validate_question(&params.q)?;
    info!("Question received: {:.100}", params.q);

    match state.engine.query(&params.q).await {
        Ok(answer) => Ok(answer),
        Err(e) => {
            error!("Error processing question: {}", e);
            Ok(FALLBACK_MESSAGE.to_string())
        }
    }
}

/// JSON endpoint for debugging and other integrations.
pub async fn ask_json(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AskParams>,
) -> Result<Json<AskJsonResponse>, StatusCode> {
    validate_question(&params.q)?;
    info!("JSON question received: {:.100}", params.q);

    let answer = state.engine.query(&params.q).await.map_err(|e| {
        error!("Error processing question: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let sources = state
        .engine
        .get_default_sources(&params.q)
        .await
        .map_err(|e| {
            error!("Error fetching sources: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    let truncated = answer.chars().count() >= state.engine.max_response_length();

    Ok(Json(AskJsonResponse {
        question: params.q,
        answer,
        sources,
        truncated,
    }))
}

/// Health check reporting the indexed document count.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        documents_indexed: state.engine.indexed_documents(),
    })
}
