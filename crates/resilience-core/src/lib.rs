//! Resilience Core Library
//!
//! Shared functionality for the Resilience financial health analyzer:
//! - Column normalization for arbitrary bank CSV exports
//! - Cash-flow aggregation and rule-based letter-grade scoring
//! - Language-model enrichment with rule-based fallback
//! - Educational chat with keyword-tip fallback
//! - Prompt library for customizable AI prompts

pub mod aggregate;
pub mod ai;
pub mod chat;
pub mod error;
pub mod fusion;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod prompts;
pub mod scoring;

/// Test utilities including mock Anthropic server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use aggregate::aggregate;
pub use ai::{AIBackend, AIClient, AnthropicBackend, CompletionRequest, Message, MockBackend};
pub use chat::{fallback_reply, ChatAdvisor};
pub use error::{Error, Result};
pub use fusion::InsightFusion;
pub use models::{
    Aggregate, AnalysisReport, CanonicalTransaction, CategorySpend, ChatContext,
    DeterministicResult, FusedResult, Score, TransactionSet,
};
pub use normalize::{map_columns, normalize, parse_statement, read_table, ColumnMap, RawTable};
pub use pipeline::{analyze_statement, analyze_transactions};
pub use prompts::{Prompt, PromptId, PromptInfo, PromptLibrary};
pub use scoring::score;
