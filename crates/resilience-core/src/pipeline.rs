//! Statement analysis pipeline: normalize, aggregate, score, fuse

use std::io::Read;

use tracing::info;

use crate::aggregate::aggregate;
use crate::error::Result;
use crate::fusion::InsightFusion;
use crate::models::{round_cents, AnalysisReport, TransactionSet};
use crate::normalize::parse_statement;
use crate::scoring::score;

/// Analyze one CSV statement
///
/// Only normalization can fail; enrichment problems fall back silently.
pub async fn analyze_statement<R: Read>(
    reader: R,
    fusion: &InsightFusion<'_>,
) -> Result<AnalysisReport> {
    let set = parse_statement(reader)?;
    Ok(analyze_transactions(&set, fusion).await)
}

/// Analyze already-normalized transactions
pub async fn analyze_transactions(
    set: &TransactionSet,
    fusion: &InsightFusion<'_>,
) -> AnalysisReport {
    let agg = aggregate(set);
    let baseline = score(&agg);

    info!(
        transactions = agg.transaction_count,
        score = %baseline.score,
        expense_ratio = format!("{:.1}", agg.expense_ratio),
        "Scored statement"
    );

    let analysis = fusion.fuse(&agg, &baseline).await;

    AnalysisReport {
        transactions: agg.transaction_count,
        income: round_cents(agg.income),
        expenses: round_cents(agg.expenses),
        analysis,
    }
}
