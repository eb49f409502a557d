//! Column normalization for arbitrary bank CSV exports
//!
//! Bank exports disagree on column names and on how money moves are laid out.
//! Headers are matched against an ordered list of rules; the first matching
//! header (left to right) wins for each canonical field.
//!
//! Amount layouts, in priority order:
//! 1. Separate debit and credit columns (`amount = credit - debit`)
//! 2. A single "amount" or "transaction" column
//! 3. The first column whose cells are all numeric

use std::io::Read;

use csv::{ReaderBuilder, Trim};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{CanonicalTransaction, TransactionSet};

/// A CSV table before normalization
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Cell at `row`/`col`, trimmed, `None` if empty or missing
    fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    /// Whether a column has at least one value and every value is a plain number
    fn is_numeric_column(&self, col: usize) -> bool {
        let mut seen = false;
        for row in 0..self.rows.len() {
            if let Some(value) = self.cell(row, col) {
                if parse_number(value).is_none() {
                    return false;
                }
                seen = true;
            }
        }
        seen
    }
}

/// Read a CSV file into a raw table
pub fn read_table<R: Read>(reader: R) -> Result<RawTable> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::Headers)
        .from_reader(reader);

    let headers = rdr.headers()?.iter().map(|h| h.to_string()).collect();
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(|v| v.to_string()).collect());
    }

    Ok(RawTable { headers, rows })
}

/// Canonical fields a header can be mapped onto
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Date,
    Description,
    Debit,
    Credit,
    Amount,
}

/// One header matching rule
struct HeaderRule {
    field: Field,
    /// Case-insensitive substrings, any of which selects the header
    needles: &'static [&'static str],
    /// A header taken by this rule can't be taken by a later rule
    exclusive: bool,
}

impl HeaderRule {
    fn matches(&self, header: &str) -> bool {
        let header = header.to_lowercase();
        self.needles.iter().any(|n| header.contains(n))
    }
}

const HEADER_RULES: &[HeaderRule] = &[
    HeaderRule {
        field: Field::Date,
        needles: &["date", "posted"],
        exclusive: true,
    },
    HeaderRule {
        field: Field::Description,
        needles: &["desc", "merchant", "name"],
        exclusive: true,
    },
    HeaderRule {
        field: Field::Debit,
        needles: &["debit"],
        exclusive: false,
    },
    HeaderRule {
        field: Field::Credit,
        needles: &["credit"],
        exclusive: false,
    },
    HeaderRule {
        field: Field::Amount,
        needles: &["amount", "transaction"],
        exclusive: false,
    },
];

/// Header positions chosen for each canonical field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    pub date: Option<usize>,
    pub description: Option<usize>,
    pub debit: Option<usize>,
    pub credit: Option<usize>,
    pub amount: Option<usize>,
    pub category: Option<usize>,
}

impl ColumnMap {
    fn set(&mut self, field: Field, col: usize) {
        let slot = match field {
            Field::Date => &mut self.date,
            Field::Description => &mut self.description,
            Field::Debit => &mut self.debit,
            Field::Credit => &mut self.credit,
            Field::Amount => &mut self.amount,
        };
        *slot = Some(col);
    }

    fn is_text_column(&self, col: usize) -> bool {
        self.date == Some(col) || self.description == Some(col)
    }
}

/// Map headers onto canonical fields
pub fn map_columns(headers: &[String]) -> ColumnMap {
    let mut map = ColumnMap::default();
    let mut claimed: Vec<usize> = Vec::new();

    for rule in HEADER_RULES {
        let found = headers
            .iter()
            .enumerate()
            .find(|(i, h)| !claimed.contains(i) && rule.matches(h))
            .map(|(i, _)| i);

        if let Some(col) = found {
            map.set(rule.field, col);
            if rule.exclusive {
                claimed.push(col);
            }
        }
    }

    map.category = headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case("category"));

    map
}

/// How the signed amount is derived from a row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountLayout {
    /// `credit - debit`, blanks count as zero
    DebitCredit { debit: usize, credit: usize },
    /// One signed amount column
    Single(usize),
    /// No amount header; first all-numeric column
    Inferred(usize),
}

/// Choose the amount layout for a table
pub fn resolve_amount_layout(map: &ColumnMap, table: &RawTable) -> Result<AmountLayout> {
    if let (Some(debit), Some(credit)) = (map.debit, map.credit) {
        // A combined header like "Debit/Credit" fills both slots and nets to zero
        if debit == credit {
            warn!(
                column = %table.headers[debit],
                "Same column matched debit and credit, amounts will be zero"
            );
        }
        return Ok(AmountLayout::DebitCredit { debit, credit });
    }

    if let Some(col) = map.amount {
        return Ok(AmountLayout::Single(col));
    }

    (0..table.headers.len())
        .find(|&col| !map.is_text_column(col) && table.is_numeric_column(col))
        .map(AmountLayout::Inferred)
        .ok_or_else(|| Error::Schema("no amount column found".into()))
}

/// Normalize a raw table into canonical transactions
///
/// Rows without a usable amount are dropped. A table with no data rows
/// yields an empty set whatever its headers.
pub fn normalize(table: &RawTable) -> Result<TransactionSet> {
    let map = map_columns(&table.headers);
    let has_category = map.category.is_some();

    if table.rows.is_empty() {
        return Ok(TransactionSet::new(Vec::new(), has_category));
    }

    let layout = resolve_amount_layout(&map, table)?;
    debug!(?layout, ?map, "Resolved statement columns");

    let text = |row: usize, col: Option<usize>| {
        col.and_then(|c| table.cell(row, c)).map(|s| s.to_string())
    };

    let mut transactions = Vec::with_capacity(table.rows.len());
    let mut dropped = 0usize;

    for row in 0..table.rows.len() {
        let amount = match layout {
            AmountLayout::DebitCredit { debit, credit } => {
                let debit = table.cell(row, debit).and_then(parse_amount).unwrap_or(0.0);
                let credit = table
                    .cell(row, credit)
                    .and_then(parse_amount)
                    .unwrap_or(0.0);
                Some(credit - debit)
            }
            AmountLayout::Single(col) => table.cell(row, col).and_then(parse_amount),
            AmountLayout::Inferred(col) => table.cell(row, col).and_then(parse_number),
        };

        let Some(amount) = amount else {
            dropped += 1;
            continue;
        };

        transactions.push(CanonicalTransaction {
            date: text(row, map.date),
            description: text(row, map.description),
            amount,
            category: text(row, map.category),
        });
    }

    debug!(
        kept = transactions.len(),
        dropped, "Normalized statement rows"
    );

    Ok(TransactionSet::new(transactions, has_category))
}

/// Read and normalize a CSV statement
pub fn parse_statement<R: Read>(reader: R) -> Result<TransactionSet> {
    let table = read_table(reader)?;
    normalize(&table)
}

/// Parse an amount string, handling currency symbols, commas and parentheses
fn parse_amount(s: &str) -> Option<f64> {
    let cleaned: String = s
        .trim()
        .replace(['$', ',', ' '], "")
        .replace('(', "-")
        .replace(')', "");

    parse_number(&cleaned)
}

/// Parse a plain finite number
fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("$1,234.56"), Some(1234.56));
        assert_eq!(parse_amount("-123.45"), Some(-123.45));
        assert_eq!(parse_amount("(100.00)"), Some(-100.00));
        assert_eq!(parse_amount("pending"), None);
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("NaN"), None);
    }

    #[test]
    fn test_map_columns_first_match_wins() {
        let map = map_columns(&headers(&["Posted", "Trade Date", "Name", "Merchant", "Amount"]));
        assert_eq!(map.date, Some(0));
        assert_eq!(map.description, Some(2));
        assert_eq!(map.amount, Some(4));
    }

    #[test]
    fn test_map_columns_case_insensitive() {
        let map = map_columns(&headers(&["DATE", "DESCRIPTION", "AMOUNT", "CATEGORY"]));
        assert_eq!(map.date, Some(0));
        assert_eq!(map.description, Some(1));
        assert_eq!(map.amount, Some(2));
        assert_eq!(map.category, Some(3));
    }

    #[test]
    fn test_transaction_date_is_not_the_amount() {
        // Chase layout: "Transaction Date" also contains "transaction"
        let map = map_columns(&headers(&[
            "Transaction Date",
            "Post Date",
            "Description",
            "Category",
            "Type",
            "Amount",
            "Memo",
        ]));
        assert_eq!(map.date, Some(0));
        assert_eq!(map.description, Some(2));
        assert_eq!(map.amount, Some(5));
        assert_eq!(map.category, Some(3));
    }

    #[test]
    fn test_canonical_table_is_unchanged() {
        let csv = "date,description,amount,category
1/1,Paycheck,3000,
1/5,Landlord,-1000,rent
1/10,Grocer,-200.5,food";

        let set = parse_statement(csv.as_bytes()).unwrap();
        assert!(set.has_category);
        assert_eq!(
            set.transactions,
            vec![
                CanonicalTransaction::new(3000.0)
                    .with_date("1/1")
                    .with_description("Paycheck"),
                CanonicalTransaction::new(-1000.0)
                    .with_date("1/5")
                    .with_description("Landlord")
                    .with_category("rent"),
                CanonicalTransaction::new(-200.5)
                    .with_date("1/10")
                    .with_description("Grocer")
                    .with_category("food"),
            ]
        );
    }

    #[test]
    fn test_debit_credit_takes_precedence() {
        let csv = "Date,Description,Debit,Credit,Transaction Amount
01/02/2024,Coffee,4.50,,999
01/03/2024,Refund,,20.00,999";

        let set = parse_statement(csv.as_bytes()).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.transactions[0].amount, -4.50);
        assert_eq!(set.transactions[1].amount, 20.00);
    }

    #[test]
    fn test_debit_credit_non_numeric_counts_as_zero() {
        let csv = "Posted Date,Description,Debit,Credit
01/02/2024,Hold,n/a,
01/03/2024,Deposit,,1000";

        let set = parse_statement(csv.as_bytes()).unwrap();
        // Neither row is dropped
        assert_eq!(set.len(), 2);
        assert_eq!(set.transactions[0].amount, 0.0);
        assert_eq!(set.transactions[1].amount, 1000.0);
    }

    #[test]
    fn test_combined_debit_credit_header_nets_to_zero() {
        let csv = "Date,Description,Debit/Credit
01/01/2024,Paycheck,3000
01/02/2024,Rent,-1000";

        let map = map_columns(&headers(&["Date", "Description", "Debit/Credit"]));
        assert_eq!(map.debit, Some(2));
        assert_eq!(map.credit, Some(2));

        let set = parse_statement(csv.as_bytes()).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.iter().all(|t| t.amount == 0.0));
    }

    #[test]
    fn test_capital_one_layout() {
        let csv = "Transaction Date,Posted Date,Card No.,Description,Category,Debit,Credit
2024-01-15,2024-01-16,1234,NETFLIX.COM,Entertainment,15.99,
2024-01-20,2024-01-21,1234,PAYMENT,Payment,,500.00";

        let set = parse_statement(csv.as_bytes()).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.transactions[0].date.as_deref(), Some("2024-01-15"));
        assert_eq!(set.transactions[0].description.as_deref(), Some("NETFLIX.COM"));
        assert_eq!(set.transactions[0].amount, -15.99);
        assert_eq!(set.transactions[0].category.as_deref(), Some("Entertainment"));
        assert_eq!(set.transactions[1].amount, 500.0);
    }

    #[test]
    fn test_single_amount_drops_non_numeric_rows() {
        let csv = "Date,Memo,Amount
01/01/2024,a,$1,234.56
01/02/2024,b,pending
01/03/2024,c,
01/04/2024,d,(25.00)";

        // Unquoted "$1,234.56" splits across columns; quote it like banks do
        let csv = csv.replace("$1,234.56", "\"$1,234.56\"");
        let set = parse_statement(csv.as_bytes()).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.transactions[0].amount, 1234.56);
        assert_eq!(set.transactions[1].amount, -25.00);
        assert!(!set.has_category);
    }

    #[test]
    fn test_fallback_to_first_numeric_column() {
        let csv = "When,Payee,Ref,Value
Jan 1,Employer,A1,2500
Jan 2,Store,B2,-40.25";

        let set = parse_statement(csv.as_bytes()).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.transactions[0].amount, 2500.0);
        assert_eq!(set.transactions[1].amount, -40.25);
        // "Payee" matches no description needle
        assert!(set.transactions[0].description.is_none());
    }

    #[test]
    fn test_fallback_skips_partially_numeric_columns() {
        let table = RawTable {
            headers: headers(&["Ref", "Value"]),
            rows: vec![
                vec!["12".into(), "1.5".into()],
                vec!["X9".into(), "".into()],
            ],
        };
        let map = map_columns(&table.headers);
        assert_eq!(
            resolve_amount_layout(&map, &table).unwrap(),
            AmountLayout::Inferred(1)
        );
    }

    #[test]
    fn test_no_amount_column_is_schema_error() {
        let csv = "Date,Description
01/01/2024,Coffee";

        let err = parse_statement(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
        assert!(err.is_client_input());
    }

    #[test]
    fn test_empty_table_is_empty_set() {
        let set = parse_statement("".as_bytes()).unwrap();
        assert!(set.is_empty());

        let set = parse_statement("Date,Description\n".as_bytes()).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_short_rows_are_tolerated() {
        let csv = "Date,Description,Amount,Category
01/01/2024,Coffee,-3.50
01/02/2024,Salary,2000,Income";

        let set = parse_statement(csv.as_bytes()).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.transactions[0].category.is_none());
        assert_eq!(set.transactions[1].category.as_deref(), Some("Income"));
    }
}
