//! Cash-flow aggregation over normalized transactions

use std::collections::BTreeMap;

use crate::models::{Aggregate, CategorySpend, TransactionSet};

/// Number of periods a statement is assumed to cover when estimating
/// monthly expenses
pub const EXPENSE_PERIODS: f64 = 3.0;

/// How many categories are reported
const TOP_CATEGORY_LIMIT: usize = 3;

/// Compute income, expenses and ratios for a statement
pub fn aggregate(set: &TransactionSet) -> Aggregate {
    let income: f64 = set
        .iter()
        .map(|tx| tx.amount)
        .filter(|&a| a > 0.0)
        .sum();
    let expenses: f64 = set
        .iter()
        .map(|tx| tx.amount)
        .filter(|&a| a < 0.0)
        .sum::<f64>()
        .abs();
    let net = income - expenses;

    let (savings_rate, expense_ratio) = if income > 0.0 {
        (net / income * 100.0, expenses / income * 100.0)
    } else {
        (0.0, 100.0)
    };

    Aggregate {
        income,
        expenses,
        net,
        savings_rate,
        expense_ratio,
        top_categories: top_categories(set),
        transaction_count: set.len(),
    }
}

/// Largest outflow categories, descending, ties alphabetical
fn top_categories(set: &TransactionSet) -> Vec<CategorySpend> {
    if !set.has_category {
        return Vec::new();
    }

    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for tx in set.iter().filter(|tx| tx.is_outflow()) {
        if let Some(category) = tx.category.as_deref() {
            *totals.entry(category).or_default() += tx.amount.abs();
        }
    }

    // BTreeMap iterates alphabetically and sort_by is stable
    let mut ranked: Vec<CategorySpend> = totals
        .into_iter()
        .map(|(category, amount)| CategorySpend {
            category: category.to_string(),
            amount,
        })
        .collect();
    ranked.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    ranked.truncate(TOP_CATEGORY_LIMIT);
    ranked
}

impl Aggregate {
    /// Months of expenses covered by net cash flow
    ///
    /// Zero when there are no expenses.
    pub fn emergency_fund_months(&self) -> f64 {
        let monthly = self.expenses / EXPENSE_PERIODS;
        if monthly > 0.0 {
            self.net / monthly
        } else {
            0.0
        }
    }
}
