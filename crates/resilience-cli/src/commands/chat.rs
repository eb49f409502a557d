//! Chat command

use std::path::Path;

use anyhow::{Context, Result};
use resilience_core::{ChatAdvisor, ChatContext, PromptLibrary};

use super::ai_client;

/// Read a chat summary from a JSON file
///
/// Accepts `analyze --json` output or the flat summary shape.
pub fn load_summary(path: &Path) -> Result<ChatContext> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&data)
        .with_context(|| format!("Invalid summary JSON in {}", path.display()))
}

pub async fn cmd_chat(message: &str, summary: Option<&Path>, no_ai: bool) -> Result<()> {
    let context = summary.map(load_summary).transpose()?;
    let prompts = PromptLibrary::new().context("Failed to load prompts")?;
    let ai = ai_client(no_ai);

    let reply = ChatAdvisor::new(ai.as_ref(), &prompts)
        .respond(context.as_ref(), message)
        .await;

    println!("{}", reply);
    Ok(())
}
