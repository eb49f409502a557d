//! Test utilities for resilience-core
//!
//! This module provides a mock Anthropic Messages server that can be used
//! for development and integration tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Json, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::oneshot;

use crate::ai::{MOCK_ANALYSIS_REPLY, MOCK_CHAT_REPLY};

/// How the mock server answers `/v1/messages`
#[derive(Clone)]
enum Behavior {
    /// Analysis JSON for analysis prompts, a sentence otherwise
    Default,
    /// Fixed text for every request
    Reply(String),
    /// Error status for every request
    Fail(StatusCode),
}

/// A request received by the mock server
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub api_key: Option<String>,
    pub anthropic_version: Option<String>,
    pub body: serde_json::Value,
}

#[derive(Clone)]
struct MockState {
    behavior: Behavior,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

/// Mock Anthropic server for testing and development
pub struct MockAnthropicServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockAnthropicServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        Self::spawn(Behavior::Default).await
    }

    /// Start a server that answers every request with `text`
    pub async fn with_reply(text: impl Into<String>) -> Self {
        Self::spawn(Behavior::Reply(text.into())).await
    }

    /// Start a server that fails every request with `status`
    pub async fn failing(status: StatusCode) -> Self {
        Self::spawn(Behavior::Fail(status)).await
    }

    async fn spawn(behavior: Behavior) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            behavior,
            requests: requests.clone(),
        };

        let app = Router::new()
            .route("/v1/models", get(handle_models))
            .route("/v1/messages", post(handle_messages))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            requests,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockAnthropicServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Model listing (health check)
async fn handle_models() -> Json<serde_json::Value> {
    Json(json!({
        "data": [{"id": "claude-sonnet-4-20250514", "type": "model"}],
        "has_more": false
    }))
}

#[derive(Deserialize)]
struct MessagesRequest {
    model: String,
    messages: Vec<RequestMessage>,
}

#[derive(Deserialize)]
struct RequestMessage {
    content: String,
}

/// Messages endpoint
async fn handle_messages(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    };
    state.requests.lock().unwrap().push(RecordedRequest {
        api_key: header("x-api-key"),
        anthropic_version: header("anthropic-version"),
        body: body.clone(),
    });

    let request: MessagesRequest = match serde_json::from_value(body) {
        Ok(r) => r,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    let text = match state.behavior {
        Behavior::Fail(status) => {
            let error = json!({
                "type": "error",
                "error": {"type": "api_error", "message": "mock failure"}
            });
            return (status, Json(error)).into_response();
        }
        Behavior::Reply(text) => text,
        Behavior::Default => {
            // These patterns match the prompt files in prompts/*.md
            let prompt = request
                .messages
                .last()
                .map(|m| m.content.as_str())
                .unwrap_or_default();
            if prompt.contains("\"assessment\"") {
                MOCK_ANALYSIS_REPLY.to_string()
            } else {
                MOCK_CHAT_REPLY.to_string()
            }
        }
    };

    Json(json!({
        "id": "msg_mock",
        "type": "message",
        "role": "assistant",
        "model": request.model,
        "content": [{"type": "text", "text": text}],
        "stop_reason": "end_turn",
        "stop_sequence": null,
        "usage": {"input_tokens": 10, "output_tokens": 20}
    }))
    .into_response()
}
