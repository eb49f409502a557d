//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use std::io::Write;

use clap::Parser;
use resilience_core::{AIClient, MockBackend, PromptLibrary, Score};
use tempfile::NamedTempFile;

use crate::cli::{Cli, Commands, PromptsAction};
use crate::commands;

fn write_temp(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn chase_csv() -> NamedTempFile {
    write_temp(
        "Details,Posting Date,Description,Amount,Type,Balance,Check or Slip #
CREDIT,01/02/2024,ACME PAYROLL,2500.00,ACH_CREDIT,2500.00,
DEBIT,01/03/2024,CITY APARTMENTS,-1400.00,ACH_DEBIT,1100.00,
DEBIT,01/05/2024,CORNER MARKET,-350.00,DEBIT_CARD,750.00,",
    )
}

// ========== Analyze Command Tests ==========

#[tokio::test]
async fn test_analyze_file_rule_based() {
    let csv = chase_csv();
    let prompts = PromptLibrary::embedded_only().unwrap();

    let report = commands::analyze_file(csv.path(), None, &prompts)
        .await
        .unwrap();

    assert_eq!(report.transactions, 3);
    assert_eq!(report.income, 2500.0);
    assert_eq!(report.expenses, 1750.0);
    // 70% spent, 30% saved
    assert_eq!(report.analysis.score, Score::C);
    assert!(report.analysis.assessment.is_none());
}

#[tokio::test]
async fn test_analyze_file_with_mock_ai() {
    let csv = chase_csv();
    let prompts = PromptLibrary::embedded_only().unwrap();
    let ai = AIClient::mock();

    let report = commands::analyze_file(csv.path(), Some(&ai), &prompts)
        .await
        .unwrap();

    assert_eq!(report.analysis.score, Score::C);
    assert!(report.analysis.assessment.is_some());
}

#[tokio::test]
async fn test_analyze_missing_file() {
    let prompts = PromptLibrary::embedded_only().unwrap();
    let result = commands::analyze_file(
        std::path::Path::new("/nonexistent/statement.csv"),
        None,
        &prompts,
    )
    .await;

    let err = result.unwrap_err();
    assert!(err.to_string().contains("Failed to open"));
}

#[tokio::test]
async fn test_analyze_file_without_amount_column() {
    let csv = write_temp("Date,Memo\n2024-01-01,lunch");
    let prompts = PromptLibrary::embedded_only().unwrap();

    let err = commands::analyze_file(csv.path(), None, &prompts)
        .await
        .unwrap_err();
    assert!(format!("{:#}", err).contains("no amount column"));
}

#[tokio::test]
async fn test_cmd_analyze_json_no_ai() {
    let csv = chase_csv();
    let result = commands::cmd_analyze(csv.path(), true, true).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_render_report() {
    let csv = chase_csv();
    let prompts = PromptLibrary::embedded_only().unwrap();
    let report = commands::analyze_file(csv.path(), None, &prompts)
        .await
        .unwrap();

    let text = commands::render_report(&report);
    assert!(text.contains("Risk Score: C"));
    assert!(text.contains("$2,500.00"));
    assert!(text.contains("$1,750.00"));
    assert!(text.contains("Concerns:"));
}

// ========== Chat Command Tests ==========

#[test]
fn test_load_summary_from_analyze_output() {
    let file = write_temp(
        r#"{"transactions": 3, "income": 2500.0, "expenses": 1750.0,
            "analysis": {"score": "C", "concerns": [], "recommendations": []}}"#,
    );

    let ctx = commands::load_summary(file.path()).unwrap();
    assert_eq!(ctx.transaction_count, Some(3));
    assert_eq!(ctx.income, Some(2500.0));
    assert_eq!(ctx.score.as_deref(), Some("C"));
}

#[test]
fn test_load_summary_invalid_json() {
    let file = write_temp("not json");
    let err = commands::load_summary(file.path()).unwrap_err();
    assert!(err.to_string().contains("Invalid summary JSON"));
}

#[tokio::test]
async fn test_cmd_chat_no_ai() {
    let result = commands::cmd_chat("How do I build an emergency fund?", None, true).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_chat_advisor_with_failing_backend() {
    let prompts = PromptLibrary::embedded_only().unwrap();
    let ai = AIClient::Mock(MockBackend::failing());

    let reply = resilience_core::ChatAdvisor::new(Some(&ai), &prompts)
        .respond(None, "Should I budget?")
        .await;
    assert!(reply.starts_with("Track expenses for 1 month"));
}

#[test]
fn test_ai_client_disabled_by_flag() {
    assert!(commands::ai_client(true).is_none());
}

// ========== Argument Parsing Tests ==========

#[test]
fn test_parse_analyze_args() {
    let cli = Cli::try_parse_from([
        "resilience",
        "analyze",
        "--file",
        "s.csv",
        "--json",
        "--no-ai",
    ])
    .unwrap();
    match cli.command {
        Commands::Analyze { file, json, no_ai } => {
            assert_eq!(file.to_str(), Some("s.csv"));
            assert!(json);
            assert!(no_ai);
        }
        _ => panic!("expected analyze"),
    }
}

#[test]
fn test_parse_serve_defaults() {
    let cli = Cli::try_parse_from(["resilience", "serve"]).unwrap();
    match cli.command {
        Commands::Serve { port, host } => {
            assert_eq!(port, 8000);
            assert_eq!(host, "127.0.0.1");
        }
        _ => panic!("expected serve"),
    }
}

#[test]
fn test_parse_prompts_show() {
    let cli =
        Cli::try_parse_from(["resilience", "-v", "prompts", "show", "financial_chat"]).unwrap();
    assert!(cli.verbose);
    match cli.command {
        Commands::Prompts {
            action: Some(PromptsAction::Show { prompt_id }),
        } => assert_eq!(prompt_id, "financial_chat"),
        _ => panic!("expected prompts show"),
    }
}

// ========== Prompts Command Tests ==========

#[test]
fn test_cmd_prompts_show_unknown_is_ok() {
    assert!(commands::cmd_prompts_show("no_such_prompt").is_ok());
}

#[test]
fn test_cmd_prompts_path() {
    assert!(commands::cmd_prompts_path().is_ok());
}
