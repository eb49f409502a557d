//! Financial education chat handler

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::AppState;
use resilience_core::{ChatAdvisor, ChatContext};

/// Body for `POST /chat`
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Summary of a prior analysis, in either shape `ChatContext` accepts
    #[serde(default)]
    pub transactions_summary: Option<ChatContext>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

/// POST /chat - Answer a question, with the upload summary as context
///
/// Never fails once the body parses: backend errors yield a keyword tip.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let advisor = ChatAdvisor::new(state.ai.as_ref(), &state.prompts);
    let response = advisor
        .respond(request.transactions_summary.as_ref(), &request.message)
        .await;

    Json(ChatResponse { response })
}
