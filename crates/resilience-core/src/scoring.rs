//! Rule-based risk scoring
//!
//! The letter grade comes from the expense ratio and savings rate alone.
//! Concerns come from independent rules evaluated in a fixed order; each
//! rule that fires contributes one concern and matching recommendations.
//! Both lists are capped after all rules ran, so earlier rules win.

use crate::models::{Aggregate, DeterministicResult, Score};

/// Most concerns / recommendations reported
pub const MAX_FINDINGS: usize = 3;

/// Months of expenses below which the emergency fund is flagged
const EMERGENCY_FUND_TARGET_MONTHS: f64 = 3.0;

/// Grade an aggregate
pub fn grade(agg: &Aggregate) -> Score {
    let (ratio, savings) = (agg.expense_ratio, agg.savings_rate);

    if ratio < 50.0 && savings > 20.0 {
        Score::A
    } else if ratio < 70.0 && savings > 10.0 {
        Score::B
    } else if ratio < 85.0 {
        Score::C
    } else if ratio < 100.0 {
        Score::D
    } else {
        Score::F
    }
}

/// Score an aggregate and collect concerns and recommendations
pub fn score(agg: &Aggregate) -> DeterministicResult {
    let mut concerns = Vec::new();
    let mut recommendations = Vec::new();

    if agg.expense_ratio > 80.0 {
        concerns.push(format!(
            "High expense ratio: {:.1}% of income spent",
            agg.expense_ratio
        ));
        recommendations.push(
            "Review fixed expenses - look for subscriptions to cancel".to_string(),
        );
    }

    if agg.savings_rate < 10.0 {
        concerns.push(format!("Low savings rate: only {:.1}% saved", agg.savings_rate));
        recommendations.push("Aim to save at least 10-20% of income".to_string());
    }

    if agg.net < 0.0 {
        concerns.push(format!(
            "Negative cash flow: spending ${:.2} more than earning",
            agg.net.abs()
        ));
        recommendations.push("Urgent: reduce expenses or increase income".to_string());
    }

    let months = agg.emergency_fund_months();
    if months < EMERGENCY_FUND_TARGET_MONTHS {
        concerns.push(format!("Low emergency fund: only {:.1} months covered", months));
        recommendations.push("Build 3-6 months emergency fund as priority".to_string());
    }

    if concerns.is_empty() {
        concerns.push("Financial health looks stable".to_string());
        recommendations.push("Continue current savings habits".to_string());
        recommendations.push("Consider investing surplus funds".to_string());
    }

    concerns.truncate(MAX_FINDINGS);
    recommendations.truncate(MAX_FINDINGS);

    DeterministicResult {
        score: grade(agg),
        concerns,
        recommendations,
    }
}
