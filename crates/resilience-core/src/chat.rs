//! Educational chat replies with a keyword-tip fallback

use std::collections::HashMap;

use tracing::{debug, instrument, warn};

use crate::ai::{AIBackend, AIClient, CompletionRequest};
use crate::error::Result;
use crate::models::{format_currency, ChatContext};
use crate::prompts::{PromptId, PromptLibrary};

/// Token limit for chat replies
pub const CHAT_MAX_TOKENS: u32 = 800;

/// Appended to every fallback reply
pub const DISCLAIMER: &str = "\n\nNote: This is educational information only, not financial advice.";

/// Keyword tips, checked in order against the lower-cased message
///
/// Matching is a plain substring test, so "unsaved" matches "save".
const TIPS: &[(&str, &str)] = &[
    (
        "save",
        "Consider automating savings transfers - research shows people who automate save 2-3x more than those who don't. Start with even 5-10% of income.",
    ),
    (
        "budget",
        "Track expenses for 1 month to understand patterns. The 50/30/20 rule (needs/wants/savings) is a common framework, but adjust based on your situation.",
    ),
    (
        "emergency",
        "Financial experts generally recommend 3-6 months of expenses in accessible savings. Build this before focusing on other goals.",
    ),
    (
        "debt",
        "The avalanche method (highest interest first) saves the most money. The snowball method (smallest balance first) provides psychological wins. Choose what motivates you.",
    ),
];

const GENERIC_REPLY: &str = "I can help explain financial concepts like budgeting, saving, debt management, and emergency funds. What would you like to learn about?";

/// Render a prior analysis summary for the model
pub fn context_block(ctx: &ChatContext) -> String {
    let transactions = ctx
        .transaction_count
        .map(|n| n.to_string())
        .unwrap_or_else(|| "N/A".to_string());

    format!(
        "User's Financial Context:\nTransactions: {}\nIncome: {}\nExpenses: {}\nRisk Score: {}",
        transactions,
        format_currency(ctx.income.unwrap_or(0.0)),
        format_currency(ctx.expenses.unwrap_or(0.0)),
        ctx.score.as_deref().unwrap_or("N/A"),
    )
}

/// Canned reply used when the model is unavailable
pub fn fallback_reply(message: &str) -> String {
    let message = message.to_lowercase();
    let body = TIPS
        .iter()
        .find(|(key, _)| message.contains(key))
        .map(|(_, tip)| *tip)
        .unwrap_or(GENERIC_REPLY);

    format!("{}{}", body, DISCLAIMER)
}

/// Chat collaborators for one request
pub struct ChatAdvisor<'a> {
    /// Optional AI client; None always yields the fallback reply
    pub ai: Option<&'a AIClient>,
    pub prompts: &'a PromptLibrary,
}

impl<'a> ChatAdvisor<'a> {
    pub fn new(ai: Option<&'a AIClient>, prompts: &'a PromptLibrary) -> Self {
        Self { ai, prompts }
    }

    /// Render the chat request
    ///
    /// An absent or empty context contributes nothing to the user turn.
    pub fn build_request(
        &self,
        context: Option<&ChatContext>,
        message: &str,
    ) -> Result<CompletionRequest> {
        let prompt = self.prompts.get(PromptId::FinancialChat)?;

        let context = context
            .filter(|c| !c.is_empty())
            .map(context_block)
            .unwrap_or_default();
        let vars = HashMap::from([("context", context.as_str()), ("message", message)]);

        let mut request = CompletionRequest::new(prompt.render_user(&vars), CHAT_MAX_TOKENS);
        if let Some(system) = prompt.render_system(&vars) {
            request = request.with_system(system);
        }
        Ok(request)
    }

    /// Answer a question, falling back to a keyword tip on any failure
    #[instrument(name = "financial_chat", skip_all, fields(has_context = context.is_some()))]
    pub async fn respond(&self, context: Option<&ChatContext>, message: &str) -> String {
        let Some(ai) = self.ai else {
            debug!("AI not configured, using fallback tips");
            return fallback_reply(message);
        };

        let reply = match self.build_request(context, message) {
            Ok(request) => ai.complete(&request).await,
            Err(e) => Err(e),
        };

        match reply {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, model = ai.model(), "Chat AI failed, using fallback tips");
                fallback_reply(message)
            }
        }
    }
}
