//! HTTP + WebSocket surface.
//!
//! - `GET  /health`
//! - `POST /classify`            : stateless single-message classification
//! - `GET  /api/chat`            : session snapshot
//! - `POST /api/chat/start|home` : screen transitions
//! - `POST /api/chat/messages`   : submit a chat message
//! - `GET  /ws/chat`             : the same chat session over WebSocket

pub mod routes;
pub mod ws;

use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::chat::{ChatEvent, ChatSession, ConversationTurn, SessionSnapshot};
use crate::classifier::HybridClassifier;
use crate::config::DetectorConfig;
use crate::error::{ClassifyError, ServerError};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub classifier: Arc<HybridClassifier>,
    /// One chat session shared by every client.
    pub session: Arc<Mutex<ChatSession>>,
    pub request_timeout: Duration,
    pub max_input_chars: usize,
}

impl AppState {
    pub fn new(classifier: Arc<HybridClassifier>, config: &DetectorConfig) -> Self {
        Self {
            classifier,
            session: Arc::new(Mutex::new(ChatSession::new())),
            request_timeout: config.request_timeout,
            max_input_chars: config.max_input_chars,
        }
    }

    /// Reject text longer than the configured limit.
    pub fn check_size(&self, text: &str) -> Result<(), ApiError> {
        let len = text.chars().count();
        if len > self.max_input_chars {
            return Err(ApiError::TooLarge {
                len,
                max: self.max_input_chars,
            });
        }
        Ok(())
    }

    /// Queue `events` on the session and drain it on the blocking pool,
    /// under the request timeout.
    ///
    /// A timeout only abandons the wait. The blocking task keeps the session
    /// lock and still applies the events, so a client that got `504` sees the
    /// outcome in the next snapshot (`GET /api/chat` waits for the lock).
    pub async fn dispatch(
        &self,
        events: Vec<ChatEvent>,
    ) -> Result<(Vec<ConversationTurn>, SessionSnapshot), ApiError> {
        let mut session = Arc::clone(&self.session).lock_owned().await;
        let classifier = Arc::clone(&self.classifier);
        run_blocking(self.request_timeout, move || {
            for event in events {
                session.push(event);
            }
            let turns = session.process_pending(&classifier)?;
            Ok((turns, session.snapshot()))
        })
        .await
    }
}

/// Errors surfaced to HTTP/WebSocket clients.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{message}")]
    BadRequest { status: StatusCode, message: String },

    #[error("Message is {len} characters; the limit is {max}")]
    TooLarge { len: usize, max: usize },

    #[error("Classification timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Classify(#[from] ClassifyError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest { status, .. } => *status,
            Self::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::Classify(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(error = %self, "Request failed");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

/// Run CPU-bound classification work off the async runtime.
pub async fn run_blocking<T, F>(timeout: Duration, f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ClassifyError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::time::timeout(timeout, tokio::task::spawn_blocking(f)).await {
        Err(_) => Err(ApiError::Timeout(timeout)),
        Ok(Err(join_err)) => Err(ApiError::Internal(join_err.to_string())),
        Ok(Ok(result)) => result.map_err(ApiError::from),
    }
}

/// Build the full router.
pub fn app_routes(state: AppState) -> Router {
    Router::new()
        .merge(routes::api_routes(state.clone()))
        .merge(ws::ws_routes(state))
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
}

/// Bind `addr` and serve `app` until the server stops.
pub async fn serve(addr: &str, app: Router) -> Result<(), ServerError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.to_string(),
            source,
        })?;
    info!(addr = %addr, "Spam detector server started");
    axum::serve(listener, app).await.map_err(ServerError::Serve)
}
