//! WebSocket chat endpoint.

use axum::{
    Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
    routing::get,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::AppState;
use crate::chat::{ChatEvent, ConversationTurn, SessionSnapshot};

// ── JSON Protocol ───────────────────────────────────────────────────────

/// Message from client → server.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    Start,
    Home,
    Message { content: String },
}

/// Message from server → client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerMessage {
    State(SessionSnapshot),
    Turns { turns: Vec<ConversationTurn> },
    Error { message: String },
}

pub fn ws_routes(state: AppState) -> Router {
    Router::new()
        .route("/ws/chat", get(ws_chat_handler))
        .with_state(state)
}

// ── WebSocket Handler ───────────────────────────────────────────────────

async fn ws_chat_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    info!("Chat client connecting");
    ws.on_upgrade(|socket| handle_chat_socket(socket, state))
}

async fn send_json(socket: &mut WebSocket, msg: &ServerMessage) -> bool {
    match serde_json::to_string(msg) {
        Ok(json) => socket.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            warn!(error = %e, "Failed to serialize chat message");
            true
        }
    }
}

async fn handle_chat_socket(mut socket: WebSocket, state: AppState) {
    info!("Chat client connected");

    let snapshot = state.session.lock().await.snapshot();
    if !send_json(&mut socket, &ServerMessage::State(snapshot)).await {
        return;
    }

    while let Some(result) = socket.recv().await {
        let reply = match result {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(msg) => handle_client_message(&state, msg).await,
                Err(e) => {
                    debug!(error = %e, text = %text.as_str(), "Invalid JSON from chat client");
                    ServerMessage::Error {
                        message: format!("Invalid message: {e}"),
                    }
                }
            },
            Ok(Message::Ping(data)) => {
                if socket.send(Message::Pong(data)).await.is_err() {
                    break;
                }
                continue;
            }
            Ok(Message::Close(_)) => {
                info!("Chat client disconnected");
                break;
            }
            Ok(_) => continue,
            Err(e) => {
                warn!(error = %e, "Chat WebSocket error");
                break;
            }
        };

        if !send_json(&mut socket, &reply).await {
            debug!("Chat client disconnected during send");
            break;
        }
    }

    info!("Chat connection closed");
}

async fn handle_client_message(state: &AppState, msg: ClientMessage) -> ServerMessage {
    let result = match msg {
        ClientMessage::Start => state
            .dispatch(vec![ChatEvent::Start])
            .await
            .map(|(_, snapshot)| ServerMessage::State(snapshot)),
        ClientMessage::Home => state
            .dispatch(vec![ChatEvent::Home])
            .await
            .map(|(_, snapshot)| ServerMessage::State(snapshot)),
        ClientMessage::Message { content } => match state.check_size(&content) {
            Ok(()) => state
                .dispatch(vec![ChatEvent::Submit(content)])
                .await
                .map(|(turns, _)| ServerMessage::Turns { turns }),
            Err(e) => Err(e),
        },
    };

    result.unwrap_or_else(|e| ServerMessage::Error {
        message: e.to_string(),
    })
}
