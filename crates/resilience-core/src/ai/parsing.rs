//! JSON extraction from model replies
//!
//! Models often wrap the requested JSON in a markdown fence or surround it
//! with prose. Extraction is optimistic (strip fences, slice the outermost
//! braces) and decoding is strict (typed fields or an error).

use serde::Deserialize;
use thiserror::Error;

/// Why an enrichment reply could not be used
#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("Prompt rendering failed: {0}")]
    Prompt(#[source] crate::error::Error),

    #[error("AI backend failed: {0}")]
    Backend(#[from] crate::error::Error),

    #[error("No JSON found in AI response | Raw: {0}")]
    NoJson(String),

    #[error("Invalid JSON from AI: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Structured insights decoded from a model reply
///
/// Every field is optional; absent fields fall back to the rule-based output.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Enrichment {
    #[serde(default)]
    pub assessment: Option<String>,
    #[serde(default)]
    pub concerns: Option<Vec<String>>,
    #[serde(default)]
    pub recommendations: Option<Vec<String>>,
}

/// Strip a markdown code fence, preferring a ```json block
pub fn strip_code_fence(text: &str) -> &str {
    if let Some((_, rest)) = text.split_once("```json") {
        return rest.split("```").next().unwrap_or(rest);
    }
    if let Some((_, rest)) = text.split_once("```") {
        return rest.split("```").next().unwrap_or(rest);
    }
    text
}

/// Slice from the first `{` to the last `}`
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{');
    let end = text.rfind('}');

    match (start, end) {
        (Some(s), Some(e)) if s < e => Some(&text[s..=e]),
        _ => None,
    }
}

/// Extract and decode an enrichment from a raw reply
pub fn parse_enrichment(reply: &str) -> Result<Enrichment, EnrichmentError> {
    let unfenced = strip_code_fence(reply.trim());
    let json_str = extract_json_object(unfenced).ok_or_else(|| no_json(reply))?;
    Ok(serde_json::from_str(json_str)?)
}

fn no_json(reply: &str) -> EnrichmentError {
    // Truncate long responses for the error message
    let trimmed = reply.trim();
    let preview = if trimmed.chars().count() > 200 {
        format!("{}...", trimmed.chars().take(200).collect::<String>())
    } else {
        trimmed.to_string()
    };
    EnrichmentError::NoJson(preview)
}
