//! Domain models for Resilience

use serde::{Deserialize, Serialize};

/// A transaction reduced to the canonical fields
///
/// `amount` is signed: positive is money in, negative is money out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalTransaction {
    pub date: Option<String>,
    pub description: Option<String>,
    pub amount: f64,
    pub category: Option<String>,
}

impl CanonicalTransaction {
    /// Create a transaction with only an amount
    pub fn new(amount: f64) -> Self {
        Self {
            date: None,
            description: None,
            amount,
            category: None,
        }
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn is_outflow(&self) -> bool {
        self.amount < 0.0
    }
}

/// Normalized transactions from one statement
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionSet {
    pub transactions: Vec<CanonicalTransaction>,
    /// Whether the source table had a category column at all
    pub has_category: bool,
}

impl TransactionSet {
    pub fn new(transactions: Vec<CanonicalTransaction>, has_category: bool) -> Self {
        Self {
            transactions,
            has_category,
        }
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CanonicalTransaction> {
        self.transactions.iter()
    }
}

/// Outflow total for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySpend {
    pub category: String,
    pub amount: f64,
}

/// Cash-flow statistics for a statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    pub income: f64,
    pub expenses: f64,
    pub net: f64,
    /// Net as a percentage of income
    pub savings_rate: f64,
    /// Expenses as a percentage of income
    pub expense_ratio: f64,
    /// At most three categories, largest outflow first
    pub top_categories: Vec<CategorySpend>,
    pub transaction_count: usize,
}

/// Letter-grade risk score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Score {
    A,
    B,
    C,
    D,
    F,
}

impl Score {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        }
    }
}

impl std::str::FromStr for Score {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "C" => Ok(Self::C),
            "D" => Ok(Self::D),
            "F" => Ok(Self::F),
            _ => Err(format!("Unknown score: {}", s)),
        }
    }
}

impl std::fmt::Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Rule-based score, concerns and recommendations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeterministicResult {
    pub score: Score,
    pub concerns: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Deterministic result overlaid with a validated model reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedResult {
    pub score: Score,
    /// Absent when enrichment was unavailable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessment: Option<String>,
    pub concerns: Vec<String>,
    pub recommendations: Vec<String>,
}

impl From<DeterministicResult> for FusedResult {
    fn from(result: DeterministicResult) -> Self {
        Self {
            score: result.score,
            assessment: None,
            concerns: result.concerns,
            recommendations: result.recommendations,
        }
    }
}

/// Result of analyzing one uploaded statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub transactions: usize,
    /// Rounded to cents
    pub income: f64,
    /// Rounded to cents
    pub expenses: f64,
    pub analysis: FusedResult,
}

/// Summary of a prior analysis supplied with a chat message
///
/// Accepts either the flat shape (`transaction_count`, `income`, `expenses`,
/// `score`) or an upload response echoed back (`transactions`, `income`,
/// `expenses`, `analysis.score`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawChatContext")]
pub struct ChatContext {
    pub transaction_count: Option<u64>,
    pub income: Option<f64>,
    pub expenses: Option<f64>,
    pub score: Option<String>,
}

impl ChatContext {
    /// True when no field was supplied
    pub fn is_empty(&self) -> bool {
        self.transaction_count.is_none()
            && self.income.is_none()
            && self.expenses.is_none()
            && self.score.is_none()
    }
}

impl From<&AnalysisReport> for ChatContext {
    fn from(report: &AnalysisReport) -> Self {
        Self {
            transaction_count: Some(report.transactions as u64),
            income: Some(report.income),
            expenses: Some(report.expenses),
            score: Some(report.analysis.score.to_string()),
        }
    }
}

#[derive(Deserialize)]
struct RawChatContext {
    #[serde(default, alias = "transaction_count")]
    transactions: Option<u64>,
    #[serde(default)]
    income: Option<f64>,
    #[serde(default)]
    expenses: Option<f64>,
    #[serde(default)]
    score: Option<String>,
    #[serde(default)]
    analysis: Option<RawAnalysisScore>,
}

#[derive(Deserialize)]
struct RawAnalysisScore {
    #[serde(default)]
    score: Option<String>,
}

impl From<RawChatContext> for ChatContext {
    fn from(raw: RawChatContext) -> Self {
        Self {
            transaction_count: raw.transactions,
            income: raw.income,
            expenses: raw.expenses,
            score: raw.score.or_else(|| raw.analysis.and_then(|a| a.score)),
        }
    }
}

/// Format an amount as dollars with thousands separators (`$1,234.50`)
///
/// Negative amounts keep the sign after the dollar sign (`$-12.00`).
pub fn format_currency(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("${}{}.{}", sign, grouped, cents)
}

/// Round to two decimal places
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
