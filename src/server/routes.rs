//! REST endpoints for classification and the chat session.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use super::{ApiError, AppState, run_blocking};
use crate::chat::{ChatEvent, ConversationTurn};
use crate::classifier::{Decision, Label};

#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClassifyResponse {
    pub label: Label,
    pub model_label: Label,
    pub decision: Decision,
}

#[derive(Debug, Deserialize)]
pub struct ChatMessageRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ChatMessageResponse {
    pub turns: Vec<ConversationTurn>,
}

/// Build the REST routes.
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/classify", post(classify))
        .route("/api/chat", get(chat_snapshot))
        .route("/api/chat/start", post(chat_start))
        .route("/api/chat/home", post(chat_home))
        .route("/api/chat/messages", post(chat_message))
        .with_state(state)
}

fn reject(rejection: JsonRejection) -> ApiError {
    ApiError::BadRequest {
        status: rejection.status(),
        message: rejection.body_text(),
    }
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "spam-detector"
    }))
}

// ── Classification ──────────────────────────────────────────────────────

/// POST /classify
///
/// `{"text": "..."}` → `{"label": "spam"|"ham", "model_label": ..., "decision": ...}`
async fn classify(
    State(state): State<AppState>,
    payload: Result<Json<ClassifyRequest>, JsonRejection>,
) -> Result<Json<ClassifyResponse>, ApiError> {
    let Json(request) = payload.map_err(reject)?;
    state.check_size(&request.text)?;

    let classifier = Arc::clone(&state.classifier);
    let verdict = run_blocking(state.request_timeout, move || {
        classifier.classify(&request.text)
    })
    .await?;

    Ok(Json(ClassifyResponse {
        label: verdict.label,
        model_label: verdict.model_label,
        decision: verdict.decision,
    }))
}

// ── Chat ────────────────────────────────────────────────────────────────

/// GET /api/chat
async fn chat_snapshot(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.session.lock().await.snapshot())
}

/// POST /api/chat/start
async fn chat_start(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let (_, snapshot) = state.dispatch(vec![ChatEvent::Start]).await?;
    Ok(Json(snapshot))
}

/// POST /api/chat/home
async fn chat_home(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let (_, snapshot) = state.dispatch(vec![ChatEvent::Home]).await?;
    Ok(Json(snapshot))
}

/// POST /api/chat/messages
///
/// Returns the turns the message produced; empty when the session ignored it
/// (blank text, or not on the chat screen).
async fn chat_message(
    State(state): State<AppState>,
    payload: Result<Json<ChatMessageRequest>, JsonRejection>,
) -> Result<Json<ChatMessageResponse>, ApiError> {
    let Json(request) = payload.map_err(reject)?;
    state.check_size(&request.content)?;

    let (turns, _) = state
        .dispatch(vec![ChatEvent::Submit(request.content)])
        .await?;
    Ok(Json(ChatMessageResponse { turns }))
}
