//! Integration tests for the classification + chat HTTP/WebSocket surface.
//!
//! Each test writes a tiny set of model artifacts to a temp dir, loads them
//! through the real loader, spins up an Axum server on a random port, and
//! exercises the REST / WS contract.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use spam_detector::classifier::artifacts::{
    CHAR_VECTORIZER_FILE, LABEL_ENCODER_FILE, MODEL_FILE, WORD_VECTORIZER_FILE,
};
use spam_detector::classifier::{HybridClassifier, ModelArtifacts};
use spam_detector::config::DetectorConfig;
use spam_detector::server::{AppState, app_routes};

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Word vocabulary: "lunch" (ham-ish), "prize" (spam-ish). The char
/// vectorizer is a single never-seen term so it stays inert.
fn write_artifacts(dir: &std::path::Path) {
    let files = [
        (
            WORD_VECTORIZER_FILE,
            json!({
                "analyzer": "word",
                "ngram_range": [1, 2],
                "vocabulary": {"lunch": 0, "prize": 1},
                "idf": [1.0, 1.0]
            }),
        ),
        (
            CHAR_VECTORIZER_FILE,
            json!({
                "analyzer": "char_wb",
                "ngram_range": [2, 3],
                "vocabulary": {"qq": 0},
                "idf": [1.0]
            }),
        ),
        (
            MODEL_FILE,
            json!({
                "coef": [[-1.0, 2.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]],
                "intercept": [-0.5],
                "classes": [0, 1]
            }),
        ),
        (LABEL_ENCODER_FILE, json!({"classes": ["ham", "spam"]})),
    ];
    for (name, value) in files {
        std::fs::write(dir.join(name), value.to_string()).unwrap();
    }
}

/// Start an Axum server on a random port, return the port.
async fn start_server(max_input_chars: usize) -> u16 {
    let dir = tempfile::tempdir().unwrap();
    write_artifacts(dir.path());
    let artifacts = ModelArtifacts::load(dir.path()).expect("artifacts should load");

    let config = DetectorConfig {
        max_input_chars,
        ..DetectorConfig::default()
    };
    let state = AppState::new(Arc::new(HybridClassifier::new(artifacts)), &config);
    let app = app_routes(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    port
}

async fn classify(port: u16, text: &str) -> Value {
    let resp = reqwest::Client::new()
        .post(format!("http://127.0.0.1:{port}/classify"))
        .json(&json!({ "text": text }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200, "classify {text:?} failed");
    resp.json().await.unwrap()
}

/// Parse a WS text frame into a serde_json::Value.
fn parse_ws_json(msg: &Message) -> Value {
    match msg {
        Message::Text(txt) => serde_json::from_str(txt).expect("invalid JSON from server"),
        other => panic!("expected Text frame, got {:?}", other),
    }
}

// ── Classification ───────────────────────────────────────────────────

#[tokio::test]
async fn health_endpoint() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(1000).await;
        let resp = reqwest::get(format!("http://127.0.0.1:{port}/health"))
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let json: Value = resp.json().await.unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["service"], "spam-detector");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn neutral_message_falls_through_to_model() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(1000).await;
        let json = classify(port, "hello, how are you?").await;
        assert_eq!(json["label"], "ham");
        assert_eq!(json["model_label"], "ham");
        assert_eq!(json["decision"], "model");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn model_can_flag_spam_on_its_own() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(1000).await;
        // One keyword and no supporting signal: rules stay silent.
        let json = classify(port, "what a prize").await;
        assert_eq!(json["decision"], "model");
        assert_eq!(json["label"], "spam");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn link_with_keyword_is_spam() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(1000).await;
        let json = classify(port, "click here http://example.com").await;
        assert_eq!(json["label"], "spam");
        assert_eq!(json["model_label"], "ham");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn positive_keyword_overrides_spam_signals() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(1000).await;
        let json = classify(port, "You are approved! Claim your FREE prize!!").await;
        assert_eq!(json["label"], "ham");
        assert_eq!(json["model_label"], "spam");
        assert_eq!(json["decision"], "positive_keyword");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn empty_text_gets_a_label() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(1000).await;
        let json = classify(port, "").await;
        assert_eq!(json["label"], "ham");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn malformed_json_is_rejected() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(1000).await;
        let client = reqwest::Client::new();

        let resp = client
            .post(format!("http://127.0.0.1:{port}/classify"))
            .header("content-type", "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let json: Value = resp.json().await.unwrap();
        assert!(json["error"].is_string());

        let resp = client
            .post(format!("http://127.0.0.1:{port}/classify"))
            .json(&json!({ "message": "wrong field" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 422);

        let resp = client
            .post(format!("http://127.0.0.1:{port}/classify"))
            .header("content-type", "text/plain")
            .body(r#"{"text": "hello"}"#)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 415);
        let json: Value = resp.json().await.unwrap();
        assert!(json["error"].is_string());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn oversized_text_is_rejected() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(10).await;
        let resp = reqwest::Client::new()
            .post(format!("http://127.0.0.1:{port}/classify"))
            .json(&json!({ "text": "this is far longer than ten characters" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 413);
    })
    .await
    .expect("test timed out");
}

// ── Chat REST ────────────────────────────────────────────────────────

#[tokio::test]
async fn chat_rest_flow() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(1000).await;
        let client = reqwest::Client::new();
        let base = format!("http://127.0.0.1:{port}");

        let snapshot: Value = reqwest::get(format!("{base}/api/chat"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(snapshot["screen"], "welcome");

        // Messages on the welcome screen are ignored.
        let resp: Value = client
            .post(format!("{base}/api/chat/messages"))
            .json(&json!({ "content": "hello" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(resp["turns"].as_array().unwrap().is_empty());

        let snapshot: Value = client
            .post(format!("{base}/api/chat/start"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(snapshot["screen"], "chat");

        let resp: Value = client
            .post(format!("{base}/api/chat/messages"))
            .json(&json!({ "content": "WIN a FREE prize!!" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let turns = resp["turns"].as_array().unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0]["role"], "user");
        assert_eq!(turns[1]["role"], "bot");
        assert_eq!(turns[1]["annotation"], "Prediction: SPAM");

        let snapshot: Value = reqwest::get(format!("{base}/api/chat"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(snapshot["messages"].as_array().unwrap().len(), 2);
        assert_eq!(snapshot["input_counter"], 1);

        let snapshot: Value = client
            .post(format!("{base}/api/chat/home"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(snapshot["screen"], "welcome");
        assert!(snapshot["messages"].as_array().unwrap().is_empty());
    })
    .await
    .expect("test timed out");
}

// ── WebSocket ────────────────────────────────────────────────────────

#[tokio::test]
async fn ws_chat_flow() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(1000).await;

        let (mut ws, _resp) = connect_async(format!("ws://127.0.0.1:{port}/ws/chat"))
            .await
            .expect("WS connect failed");

        // First message is the current session state.
        let json = parse_ws_json(&ws.next().await.unwrap().unwrap());
        assert_eq!(json["type"], "state");
        assert_eq!(json["screen"], "welcome");

        ws.send(Message::Text(json!({"type": "start"}).to_string().into()))
            .await
            .unwrap();
        let json = parse_ws_json(&ws.next().await.unwrap().unwrap());
        assert_eq!(json["type"], "state");
        assert_eq!(json["screen"], "chat");

        ws.send(Message::Text(
            json!({"type": "message", "content": "see you at lunch"})
                .to_string()
                .into(),
        ))
        .await
        .unwrap();
        let json = parse_ws_json(&ws.next().await.unwrap().unwrap());
        assert_eq!(json["type"], "turns");
        let turns = json["turns"].as_array().unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0]["content"], "see you at lunch");
        assert_eq!(turns[1]["annotation"], "Prediction: HAM");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn ws_invalid_json_gets_error_frame() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(1000).await;

        let (mut ws, _) = connect_async(format!("ws://127.0.0.1:{port}/ws/chat"))
            .await
            .unwrap();
        let _state = ws.next().await.unwrap().unwrap();

        ws.send(Message::Text("not json".into())).await.unwrap();
        let json = parse_ws_json(&ws.next().await.unwrap().unwrap());
        assert_eq!(json["type"], "error");
        assert!(json["message"].as_str().unwrap().contains("Invalid message"));

        // Connection stays usable after a bad frame.
        ws.send(Message::Text(json!({"type": "home"}).to_string().into()))
            .await
            .unwrap();
        let json = parse_ws_json(&ws.next().await.unwrap().unwrap());
        assert_eq!(json["type"], "state");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn ws_oversized_message_gets_error_frame() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(5).await;

        let (mut ws, _) = connect_async(format!("ws://127.0.0.1:{port}/ws/chat"))
            .await
            .unwrap();
        let _state = ws.next().await.unwrap().unwrap();

        ws.send(Message::Text(
            json!({"type": "message", "content": "far too long"})
                .to_string()
                .into(),
        ))
        .await
        .unwrap();
        let json = parse_ws_json(&ws.next().await.unwrap().unwrap());
        assert_eq!(json["type"], "error");
    })
    .await
    .expect("test timed out");
}
