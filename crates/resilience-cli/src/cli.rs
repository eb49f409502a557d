//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Resilience - Grade the financial health of a bank statement
#[derive(Parser)]
#[command(name = "resilience")]
#[command(about = "Financial health analyzer for bank CSV exports", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Analyze a CSV statement
    Analyze {
        /// CSV file to analyze
        #[arg(short, long)]
        file: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Skip the language model and use rule-based analysis only
        #[arg(long)]
        no_ai: bool,
    },

    /// Ask an educational finance question
    Chat {
        /// Question to ask
        #[arg(short, long)]
        message: String,

        /// JSON file with a prior analysis (e.g. `analyze --json` output)
        #[arg(short, long)]
        summary: Option<PathBuf>,

        /// Skip the language model and use keyword tips only
        #[arg(long)]
        no_ai: bool,
    },

    /// Manage AI prompts (list, show, path)
    Prompts {
        #[command(subcommand)]
        action: Option<PromptsAction>,
    },
}

#[derive(Subcommand)]
pub enum PromptsAction {
    /// List all available prompts and their override status
    List,

    /// Show the content of a specific prompt
    Show {
        /// Prompt ID (e.g., analyze_finances, financial_chat)
        prompt_id: String,
    },

    /// Show the path where prompt overrides should be placed
    Path,
}
