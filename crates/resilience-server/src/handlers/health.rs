//! Liveness and AI status handlers

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::{AppState, APP_NAME};
use resilience_core::AIBackend;

/// Response for `GET /`
#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub app: &'static str,
    pub status: &'static str,
}

/// GET / - Service banner
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        app: APP_NAME,
        status: "running",
    })
}

/// AI backend status
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ai_configured: bool,
    pub ai_healthy: bool,
    pub model: Option<String>,
    pub host: Option<String>,
}

/// GET /health - Report whether the AI backend is configured and reachable
///
/// Always 200: analysis works without the backend.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let Some(ai) = state.ai.as_ref() else {
        return Json(HealthResponse {
            ai_configured: false,
            ai_healthy: false,
            model: None,
            host: None,
        });
    };

    Json(HealthResponse {
        ai_configured: true,
        ai_healthy: ai.health_check().await,
        model: Some(ai.model().to_string()),
        host: Some(ai.host().to_string()),
    })
}
