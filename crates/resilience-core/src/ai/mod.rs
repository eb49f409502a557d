//! Pluggable language-model backend abstraction
//!
//! # Architecture
//!
//! - `AIBackend` trait: the single completion operation every backend offers
//! - `AIClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `AnthropicBackend`, `MockBackend`
//!
//! Callers treat the backend as unreliable. Every error is recoverable and
//! the analysis and chat paths fall back to deterministic output.
//!
//! # Configuration
//!
//! Environment variables:
//! - `AI_BACKEND`: Backend to use (anthropic, mock). Default: anthropic
//! - `ANTHROPIC_API_KEY`: API key (required for the anthropic backend)
//! - `ANTHROPIC_MODEL`: Model name (default: claude-sonnet-4-20250514)
//! - `ANTHROPIC_BASE_URL`: API base URL (default: https://api.anthropic.com)

pub mod anthropic;
mod mock;
pub mod parsing;
pub mod types;

pub use anthropic::AnthropicBackend;
pub use mock::{MockBackend, MOCK_ANALYSIS_REPLY, MOCK_CHAT_REPLY};
pub use types::{CompletionRequest, Message};

use async_trait::async_trait;

use crate::error::Result;

/// Trait defining the interface for all language-model backends
///
/// Backends should be Send + Sync to allow use across async tasks.
#[async_trait]
pub trait AIBackend: Send + Sync {
    /// Run a completion and return the reply text
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;

    /// Check if the backend is available
    async fn health_check(&self) -> bool;

    /// Get the model name
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete AI client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum AIClient {
    /// Anthropic Messages API
    Anthropic(AnthropicBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl AIClient {
    /// Create an AI client from environment variables
    ///
    /// Checks `AI_BACKEND` to determine which backend to use:
    /// - `anthropic` (default): Uses ANTHROPIC_API_KEY, ANTHROPIC_MODEL and ANTHROPIC_BASE_URL
    /// - `mock`: Creates a mock backend for testing
    ///
    /// Returns None if the required environment variables are not set.
    pub fn from_env() -> Option<Self> {
        let backend = std::env::var("AI_BACKEND").unwrap_or_else(|_| "anthropic".to_string());

        match backend.to_lowercase().as_str() {
            "anthropic" | "claude" => AnthropicBackend::from_env().map(AIClient::Anthropic),
            "mock" => Some(AIClient::Mock(MockBackend::new())),
            _ => {
                tracing::warn!(backend = %backend, "Unknown AI_BACKEND, falling back to anthropic");
                AnthropicBackend::from_env().map(AIClient::Anthropic)
            }
        }
    }

    /// Create an Anthropic backend directly
    pub fn anthropic(base_url: &str, api_key: &str, model: &str) -> Self {
        AIClient::Anthropic(AnthropicBackend::new(base_url, api_key, model))
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        AIClient::Mock(MockBackend::new())
    }
}

// Implement AIBackend for AIClient by delegating to the inner backend
#[async_trait]
impl AIBackend for AIClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        match self {
            AIClient::Anthropic(b) => b.complete(request).await,
            AIClient::Mock(b) => b.complete(request).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            AIClient::Anthropic(b) => b.health_check().await,
            AIClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            AIClient::Anthropic(b) => b.model(),
            AIClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            AIClient::Anthropic(b) => b.host(),
            AIClient::Mock(b) => b.host(),
        }
    }
}
