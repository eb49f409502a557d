//! Statement analysis command

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use resilience_core::models::format_currency;
use resilience_core::{analyze_statement, AIClient, AnalysisReport, InsightFusion, PromptLibrary};

use super::ai_client;

/// Run the analysis pipeline on a CSV file
pub async fn analyze_file(
    path: &Path,
    ai: Option<&AIClient>,
    prompts: &PromptLibrary,
) -> Result<AnalysisReport> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let fusion = InsightFusion::new(ai, prompts);

    analyze_statement(BufReader::new(file), &fusion)
        .await
        .with_context(|| format!("Failed to analyze {}", path.display()))
}

pub async fn cmd_analyze(path: &Path, json: bool, no_ai: bool) -> Result<()> {
    let prompts = PromptLibrary::new().context("Failed to load prompts")?;
    let ai = ai_client(no_ai);

    let report = analyze_file(path, ai.as_ref(), &prompts).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_report(&report));
    }

    Ok(())
}

/// Human-readable report
pub fn render_report(report: &AnalysisReport) -> String {
    let analysis = &report.analysis;
    let mut out = String::new();

    out.push_str(&format!("📊 Risk Score: {}\n\n", analysis.score));
    out.push_str(&format!("   Transactions: {}\n", report.transactions));
    out.push_str(&format!("   Income:       {}\n", format_currency(report.income)));
    out.push_str(&format!("   Expenses:     {}\n", format_currency(report.expenses)));

    if let Some(ref assessment) = analysis.assessment {
        out.push_str(&format!("\n{}\n", assessment));
    }

    out.push_str("\nConcerns:\n");
    for concern in &analysis.concerns {
        out.push_str(&format!("  • {}\n", concern));
    }

    out.push_str("\nRecommendations:\n");
    for rec in &analysis.recommendations {
        out.push_str(&format!("  • {}\n", rec));
    }

    out
}
