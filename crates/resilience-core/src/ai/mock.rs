//! Mock backend for testing
//!
//! Useful for unit tests and development without API access.

use async_trait::async_trait;

use super::types::CompletionRequest;
use super::AIBackend;
use crate::error::{Error, Result};

/// Reply for analysis prompts when nothing is scripted
pub const MOCK_ANALYSIS_REPLY: &str = r#"{
  "assessment": "Income comfortably covers spending in this period.",
  "concerns": ["Spending is concentrated in a few categories"],
  "recommendations": ["Consider reviewing your largest category each month"]
}"#;

/// Reply for chat prompts when nothing is scripted
pub const MOCK_CHAT_REPLY: &str = "Consider tracking where each dollar goes for a month before changing anything.\n\nNote: This is educational information only, not financial advice.";

/// Mock AI backend for testing
///
/// Returns predictable replies. Can be scripted with a fixed reply or made
/// to fail for fallback tests.
#[derive(Clone, Default)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    /// Fixed reply for every completion
    pub reply: Option<String>,
    /// Whether every completion should fail
    pub fail: bool,
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self {
            healthy: true,
            ..Default::default()
        }
    }

    /// Create an unhealthy mock backend
    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            ..Default::default()
        }
    }

    /// Mock that answers every completion with `reply`
    pub fn with_reply(reply: impl Into<String>) -> Self {
        Self {
            healthy: true,
            reply: Some(reply.into()),
            fail: false,
        }
    }

    /// Mock whose completions always error
    pub fn failing() -> Self {
        Self {
            healthy: false,
            reply: None,
            fail: true,
        }
    }
}

#[async_trait]
impl AIBackend for MockBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        if self.fail {
            return Err(Error::InvalidData("Mock backend configured to fail".into()));
        }

        if let Some(ref reply) = self.reply {
            return Ok(reply.clone());
        }

        // Analysis prompts ask for a JSON object with an assessment
        let prompt = request.last_user_message().unwrap_or_default();
        if prompt.contains("\"assessment\"") {
            Ok(MOCK_ANALYSIS_REPLY.to_string())
        } else {
            Ok(MOCK_CHAT_REPLY.to_string())
        }
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}
