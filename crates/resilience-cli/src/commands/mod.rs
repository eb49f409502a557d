//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `analyze` - Statement analysis
//! - `chat` - Educational chat
//! - `prompts` - Prompt library management commands
//! - `serve` - Web server command

pub mod analyze;
pub mod chat;
pub mod prompts;
pub mod serve;

// Re-export command functions for main.rs
pub use analyze::*;
pub use chat::*;
pub use prompts::*;
pub use serve::*;

use resilience_core::{AIBackend, AIClient};
use tracing::info;

/// Build the AI client from the environment unless `--no-ai` was given
pub fn ai_client(no_ai: bool) -> Option<AIClient> {
    if no_ai {
        return None;
    }

    let client = AIClient::from_env();
    match &client {
        Some(c) => info!("Using AI backend {} (model: {})", c.host(), c.model()),
        None => info!("AI backend not configured, using rule-based output"),
    }
    client
}
