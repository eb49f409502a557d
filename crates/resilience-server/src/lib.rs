//! Resilience Web Server
//!
//! Axum-based REST API for the Resilience financial health analyzer.
//!
//! - `POST /upload` and `POST /upload/json` analyze a CSV statement
//! - `POST /chat` answers educational finance questions
//! - `GET /health` reports AI backend status
//!
//! Requests are stateless. The AI client and prompt library are built once
//! at startup and shared read-only.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use resilience_core::{AIBackend, AIClient, PromptLibrary};

mod handlers;

/// Maximum file upload size (10 MB)
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Request body limit: the upload cap plus room for multipart framing
const MAX_BODY_SIZE: usize = MAX_UPLOAD_SIZE + 64 * 1024;

/// Application name reported by `GET /`
pub const APP_NAME: &str = "Resilience Finance AI";

/// Server configuration
#[derive(Clone, Default)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = any origin)
    pub allowed_origins: Vec<String>,
}

impl ServerConfig {
    /// Read `RESILIENCE_ALLOWED_ORIGINS` (comma-separated)
    pub fn from_env() -> Self {
        let allowed_origins = std::env::var("RESILIENCE_ALLOWED_ORIGINS")
            .map(|v| parse_origins(&v))
            .unwrap_or_default();
        Self { allowed_origins }
    }
}

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Shared application state
pub struct AppState {
    pub config: ServerConfig,
    pub ai: Option<AIClient>,
    pub prompts: PromptLibrary,
}

impl AppState {
    /// Build state from the environment
    pub fn from_env(config: ServerConfig) -> anyhow::Result<Self> {
        let ai = AIClient::from_env();
        if let Some(ref client) = ai {
            info!(
                "AI backend configured: {} (model: {})",
                client.host(),
                client.model()
            );
        } else {
            info!("ℹ️  AI backend not configured (set ANTHROPIC_API_KEY to enable AI insights)");
        }

        let prompts = PromptLibrary::new()?;
        if let Some(dir) = prompts.override_dir() {
            tracing::debug!(path = %dir.display(), "Prompt override directory");
        }

        Ok(Self {
            config,
            ai,
            prompts,
        })
    }
}

/// Create the application router
pub fn create_router_with_state(state: AppState) -> Router {
    let cors = build_cors(&state.config);
    let state = Arc::new(state);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/upload", post(handlers::upload))
        .route("/upload/json", post(handlers::upload_json))
        .route("/chat", post(handlers::chat))
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Build CORS layer
fn build_cors(config: &ServerConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if config.allowed_origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

/// Start the server
pub async fn serve_with_config(host: &str, port: u16, config: ServerConfig) -> anyhow::Result<()> {
    if config.allowed_origins.is_empty() {
        warn!("⚠️  CORS allows any origin (set RESILIENCE_ALLOWED_ORIGINS to restrict)");
    }

    let state = AppState::from_env(config)?;
    check_ai_connection(state.ai.as_ref()).await;

    let app = create_router_with_state(state);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Check and log AI backend connection status
async fn check_ai_connection(ai: Option<&AIClient>) {
    match ai {
        Some(client) => {
            if client.health_check().await {
                info!(
                    "✅ AI backend connected: {} (model: {})",
                    client.host(),
                    client.model()
                );
            } else {
                warn!(
                    "⚠️  AI backend configured but not responding: {} (model: {})",
                    client.host(),
                    client.model()
                );
            }
        }
        None => {
            info!("ℹ️  AI backend not configured, using rule-based analysis only");
        }
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    /// Map a core error: bad uploads are the client's fault, the rest are ours
    pub fn from_core(err: resilience_core::Error) -> Self {
        if err.is_client_input() {
            Self::bad_request(&err.to_string())
        } else {
            err.into()
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            // Keep full error for logging
            internal: Some(err),
        }
    }
}
