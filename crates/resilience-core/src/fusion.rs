//! Insight fusion - overlays model-written insights on the rule-based result
//!
//! The rule-based result is always computed first and is the fallback for
//! every failure. The letter grade is never taken from the model.

use std::collections::HashMap;

use tracing::{debug, info, instrument, warn};

use crate::ai::parsing::{parse_enrichment, Enrichment, EnrichmentError};
use crate::ai::{AIBackend, AIClient, CompletionRequest};
use crate::error::Result;
use crate::models::{format_currency, Aggregate, DeterministicResult, FusedResult};
use crate::prompts::{PromptId, PromptLibrary};

/// Token limit for the enrichment call
pub const ANALYSIS_MAX_TOKENS: u32 = 1500;

/// Shown in the prompt when the statement had no category column
const NO_CATEGORIES: &str = "Categories not available";

/// Enrichment collaborators for one analysis
pub struct InsightFusion<'a> {
    /// Optional AI client; None always yields the rule-based result
    pub ai: Option<&'a AIClient>,
    pub prompts: &'a PromptLibrary,
}

impl<'a> InsightFusion<'a> {
    pub fn new(ai: Option<&'a AIClient>, prompts: &'a PromptLibrary) -> Self {
        Self { ai, prompts }
    }

    /// Render the enrichment request for an aggregate
    pub fn build_request(
        &self,
        agg: &Aggregate,
        baseline: &DeterministicResult,
    ) -> Result<CompletionRequest> {
        let prompt = self.prompts.get(PromptId::AnalyzeFinances)?;

        let income = format_currency(agg.income);
        let expenses = format_currency(agg.expenses);
        let net = format_currency(agg.net);
        let savings_rate = format!("{:.1}", agg.savings_rate);
        let expense_ratio = format!("{:.1}", agg.expense_ratio);
        let categories = categories_text(agg);

        let vars = HashMap::from([
            ("income", income.as_str()),
            ("expenses", expenses.as_str()),
            ("net", net.as_str()),
            ("savings_rate", savings_rate.as_str()),
            ("expense_ratio", expense_ratio.as_str()),
            ("score", baseline.score.as_str()),
            ("categories", categories.as_str()),
        ]);

        let mut request = CompletionRequest::new(prompt.render_user(&vars), ANALYSIS_MAX_TOKENS);
        if let Some(system) = prompt.render_system(&vars) {
            request = request.with_system(system);
        }
        Ok(request)
    }

    /// Ask the model for insights and decode them
    pub async fn enrich(
        &self,
        ai: &AIClient,
        agg: &Aggregate,
        baseline: &DeterministicResult,
    ) -> std::result::Result<Enrichment, EnrichmentError> {
        let request = self
            .build_request(agg, baseline)
            .map_err(EnrichmentError::Prompt)?;
        let reply = ai.complete(&request).await?;
        debug!(reply_len = reply.len(), "Received enrichment reply");
        parse_enrichment(&reply)
    }

    /// Fuse the rule-based result with model insights
    ///
    /// Never fails: any enrichment problem returns the baseline unchanged
    /// with no assessment.
    #[instrument(name = "financial_analysis", skip_all, fields(score = %baseline.score))]
    pub async fn fuse(&self, agg: &Aggregate, baseline: &DeterministicResult) -> FusedResult {
        let Some(ai) = self.ai else {
            debug!("AI not configured, using rule-based analysis");
            return baseline.clone().into();
        };

        match self.enrich(ai, agg, baseline).await {
            Ok(enrichment) => {
                info!(model = ai.model(), "Enriched analysis with AI insights");
                merge(baseline.clone(), enrichment)
            }
            Err(e) => {
                warn!(
                    error = %e,
                    model = ai.model(),
                    "AI analysis failed, using rule-based analysis"
                );
                baseline.clone().into()
            }
        }
    }
}

/// Overlay a decoded enrichment on the baseline
///
/// Missing lists fall back to the baseline's; a missing assessment becomes
/// an empty string.
pub fn merge(baseline: DeterministicResult, enrichment: Enrichment) -> FusedResult {
    FusedResult {
        score: baseline.score,
        assessment: Some(enrichment.assessment.unwrap_or_default()),
        concerns: enrichment.concerns.unwrap_or(baseline.concerns),
        recommendations: enrichment
            .recommendations
            .unwrap_or(baseline.recommendations),
    }
}

/// Top categories as currency lines
fn categories_text(agg: &Aggregate) -> String {
    if agg.top_categories.is_empty() {
        return NO_CATEGORIES.to_string();
    }

    agg.top_categories
        .iter()
        .map(|c| format!("- {}: {}", c.category, format_currency(c.amount)))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockBackend;
    use crate::models::{CategorySpend, Score};

    fn sample() -> (Aggregate, DeterministicResult) {
        let agg = Aggregate {
            income: 3000.0,
            expenses: 1200.0,
            net: 1800.0,
            savings_rate: 60.0,
            expense_ratio: 40.0,
            top_categories: vec![
                CategorySpend {
                    category: "rent".into(),
                    amount: 1000.0,
                },
                CategorySpend {
                    category: "food".into(),
                    amount: 200.0,
                },
            ],
            transaction_count: 3,
        };
        let baseline = DeterministicResult {
            score: Score::A,
            concerns: vec!["Financial health looks stable".into()],
            recommendations: vec![
                "Continue current savings habits".into(),
                "Consider investing surplus funds".into(),
            ],
        };
        (agg, baseline)
    }

    async fn fuse_with(reply: MockBackend) -> (FusedResult, DeterministicResult) {
        let prompts = PromptLibrary::embedded_only().unwrap();
        let ai = AIClient::Mock(reply);
        let (agg, baseline) = sample();
        let fused = InsightFusion::new(Some(&ai), &prompts)
            .fuse(&agg, &baseline)
            .await;
        (fused, baseline)
    }

    #[test]
    fn test_build_request_renders_summary() {
        let prompts = PromptLibrary::embedded_only().unwrap();
        let (agg, baseline) = sample();
        let request = InsightFusion::new(None, &prompts)
            .build_request(&agg, &baseline)
            .unwrap();

        assert_eq!(request.max_tokens, ANALYSIS_MAX_TOKENS);
        assert!(request.system.is_none());
        let prompt = request.last_user_message().unwrap();
        assert!(prompt.contains("- Income (6 months): $3,000.00"));
        assert!(prompt.contains("- Expenses (6 months): $1,200.00"));
        assert!(prompt.contains("- Net: $1,800.00"));
        assert!(prompt.contains("- Savings Rate: 60.0%"));
        assert!(prompt.contains("- Expense Ratio: 40.0%"));
        assert!(prompt.contains("- Current Risk Score: A"));
        assert!(prompt.contains("- rent: $1,000.00\n- food: $200.00"));
        assert!(prompt.contains("Format as JSON only, no markdown"));
    }

    #[test]
    fn test_categories_not_available() {
        let (mut agg, _) = sample();
        agg.top_categories.clear();
        assert_eq!(categories_text(&agg), "Categories not available");
    }

    #[tokio::test]
    async fn test_fuse_overlays_enrichment() {
        let (fused, _) = fuse_with(MockBackend::with_reply(
            r#"{"assessment": "Healthy.", "concerns": ["x"], "recommendations": ["y"], "score": "F"}"#,
        ))
        .await;

        assert_eq!(fused.score, Score::A);
        assert_eq!(fused.assessment.as_deref(), Some("Healthy."));
        assert_eq!(fused.concerns, vec!["x"]);
        assert_eq!(fused.recommendations, vec!["y"]);
    }

    #[tokio::test]
    async fn test_fuse_fenced_reply_with_prose() {
        let (fused, _) = fuse_with(MockBackend::with_reply(
            "Sure!\n```json\n{\"assessment\": \"Fine\"}\n```\nThanks",
        ))
        .await;

        assert_eq!(fused.assessment.as_deref(), Some("Fine"));
        // Lists missing from the reply keep the baseline's
        assert_eq!(fused.concerns, vec!["Financial health looks stable"]);
        assert_eq!(fused.recommendations.len(), 2);
    }

    #[tokio::test]
    async fn test_fuse_missing_assessment_is_empty() {
        let (fused, _) = fuse_with(MockBackend::with_reply(r#"{"concerns": []}"#)).await;
        assert_eq!(fused.assessment.as_deref(), Some(""));
        assert!(fused.concerns.is_empty());
    }

    #[tokio::test]
    async fn test_fuse_unbalanced_reply_falls_back() {
        let (fused, baseline) =
            fuse_with(MockBackend::with_reply(r#"{"assessment": "cut off"#)).await;
        assert_eq!(fused, FusedResult::from(baseline));
        assert!(fused.assessment.is_none());
    }

    #[tokio::test]
    async fn test_fuse_wrong_types_fall_back() {
        let (fused, baseline) =
            fuse_with(MockBackend::with_reply(r#"{"concerns": "not a list"}"#)).await;
        assert_eq!(fused, FusedResult::from(baseline));
    }

    #[tokio::test]
    async fn test_fuse_backend_failure_falls_back() {
        let (fused, baseline) = fuse_with(MockBackend::failing()).await;
        assert_eq!(fused, FusedResult::from(baseline));
    }

    #[tokio::test]
    async fn test_enrich_reports_backend_stage() {
        let prompts = PromptLibrary::embedded_only().unwrap();
        let ai = AIClient::Mock(MockBackend::failing());
        let (agg, baseline) = sample();

        let err = InsightFusion::new(Some(&ai), &prompts)
            .enrich(&ai, &agg, &baseline)
            .await
            .unwrap_err();
        assert!(matches!(err, EnrichmentError::Backend(_)));
    }

    #[tokio::test]
    async fn test_fuse_without_ai() {
        let prompts = PromptLibrary::embedded_only().unwrap();
        let (agg, baseline) = sample();
        let fused = InsightFusion::new(None, &prompts)
            .fuse(&agg, &baseline)
            .await;
        assert_eq!(fused, FusedResult::from(baseline));
    }

    #[tokio::test]
    async fn test_fuse_default_mock_reply() {
        let (fused, _) = fuse_with(MockBackend::new()).await;
        assert_eq!(fused.score, Score::A);
        assert!(fused.assessment.is_some_and(|a| !a.is_empty()));
    }
}
