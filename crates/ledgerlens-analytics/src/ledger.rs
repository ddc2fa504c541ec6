//! Transaction ledger parsing and summaries.
//!
//! The ledger is a CSV file with a header row naming at least the `amount`
//! and `type` columns. Rows typed `credit` count as income, rows typed
//! `debit` as expenses; other rows are carried but not summed.

use std::fmt;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{AnalyticsError, Result};

/// Ledger written when no ledger exists yet.
pub const SAMPLE_LEDGER: &str = "\
date,description,amount,type
2025-10-01,Online sale,320,credit
2025-10-02,Inventory purchase,120,debit
2025-10-03,Marketing ad,60,debit
2025-10-04,Online sale,400,credit
2025-10-05,Utility bill,80,debit
";

/// Direction of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Money in.
    Credit,
    /// Money out.
    Debit,
    /// Anything else; ignored by the totals.
    Other,
}

impl EntryKind {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "credit" => Self::Credit,
            "debit" => Self::Debit,
            _ => Self::Other,
        }
    }
}

/// A single ledger row.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// Booking date as written in the file.
    pub date: String,
    /// Free-text description.
    pub description: String,
    /// Amount, unsigned.
    pub amount: f64,
    /// Credit or debit.
    pub kind: EntryKind,
}

/// Aggregate income and expenses of a ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Totals {
    /// Sum of credit amounts.
    pub income: f64,
    /// Sum of debit amounts.
    pub expenses: f64,
}

impl Totals {
    /// Sum a set of transactions.
    #[must_use]
    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        transactions
            .iter()
            .fold(Self::default(), |mut totals, tx| {
                match tx.kind {
                    EntryKind::Credit => totals.income += tx.amount,
                    EntryKind::Debit => totals.expenses += tx.amount,
                    EntryKind::Other => {}
                }
                totals
            })
    }

    /// Income minus expenses.
    #[must_use]
    pub fn net(&self) -> f64 {
        self.income - self.expenses
    }

    /// Canonical summary string, e.g. `Income=720.00, Expenses=260.00, Net=460.00`.
    #[must_use]
    pub fn summary(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Totals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Income={:.2}, Expenses={:.2}, Net={:.2}",
            self.income,
            self.expenses,
            self.net()
        )
    }
}

/// Figures recovered from a summary string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryFigures {
    /// Income.
    pub income: f64,
    /// Expenses.
    pub expenses: f64,
    /// Net.
    pub net: f64,
}

const NUMBER: &str = r"(-?[0-9]+(?:\.[0-9]+)?)";

static SUMMARY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    let pattern = format!(
        r"(?i)Income\s*=\s*{NUMBER}\s*,\s*Expenses\s*=\s*{NUMBER}\s*,\s*Net\s*=\s*{NUMBER}"
    );
    Regex::new(&pattern).unwrap_or_else(|_| panic!("static regex SUMMARY_PATTERN failed to compile"))
});

/// Extract income, expenses and net from a summary string.
///
/// Matching is case-insensitive and tolerates whitespace around `=` and `,`.
/// Returns `None` when the pattern does not occur.
#[must_use]
pub fn parse_summary(summary: &str) -> Option<SummaryFigures> {
    let caps = SUMMARY_PATTERN.captures(summary)?;
    let number = |i: usize| caps.get(i)?.as_str().parse::<f64>().ok();
    Some(SummaryFigures {
        income: number(1)?,
        expenses: number(2)?,
        net: number(3)?,
    })
}

/// Parse ledger CSV text into transactions.
///
/// # Errors
///
/// Returns `AnalyticsError::Ledger` if the header lacks a required column or
/// a row has an unparseable amount.
pub fn parse_ledger(text: &str) -> Result<Vec<Transaction>> {
    let mut lines = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());

    let (_, header) = lines
        .next()
        .ok_or_else(|| AnalyticsError::Ledger("empty ledger".to_string()))?;
    let header: Vec<String> = split_record(header.trim_start_matches('\u{feff}'))
        .into_iter()
        .map(|h| h.trim().to_ascii_lowercase())
        .collect();

    let column = |name: &str| header.iter().position(|h| h == name);
    let amount_col = column("amount")
        .ok_or_else(|| AnalyticsError::Ledger("missing column: amount".to_string()))?;
    let type_col = column("type")
        .ok_or_else(|| AnalyticsError::Ledger("missing column: type".to_string()))?;
    let date_col = column("date");
    let description_col = column("description");

    let mut transactions = Vec::new();
    for (index, line) in lines {
        let fields = split_record(line);
        let field = |col: Option<usize>| {
            col.and_then(|c| fields.get(c))
                .map(|f| f.trim().to_string())
                .unwrap_or_default()
        };

        let raw_amount = field(Some(amount_col));
        let amount = raw_amount.parse::<f64>().map_err(|_| {
            AnalyticsError::Ledger(format!("line {}: invalid amount '{raw_amount}'", index + 1))
        })?;

        transactions.push(Transaction {
            date: field(date_col),
            description: field(description_col),
            amount,
            kind: EntryKind::parse(&field(Some(type_col))),
        });
    }

    Ok(transactions)
}

/// Split one CSV record, honouring double-quoted fields and `""` escapes.
fn split_record(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, in_quotes) {
            ('"', true) if chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            ('"', _) => in_quotes = !in_quotes,
            (',', false) => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

/// Write the sample ledger if `path` does not exist yet.
///
/// # Errors
///
/// Returns an error if the file or its parent directory cannot be created.
pub async fn ensure_ledger(path: &Path) -> Result<()> {
    if tokio::fs::try_exists(path).await? {
        return Ok(());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, SAMPLE_LEDGER).await?;
    tracing::info!(path = %path.display(), "Seeded sample ledger");
    Ok(())
}

/// Read the ledger at `path` (seeding it if missing) and compute its totals.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub async fn load_totals(path: &Path) -> Result<Totals> {
    ensure_ledger(path).await?;
    let text = tokio::fs::read_to_string(path).await?;
    let transactions = parse_ledger(&text)?;
    Ok(Totals::from_transactions(&transactions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn sample_ledger_summary() {
        let transactions = parse_ledger(SAMPLE_LEDGER).unwrap();
        assert_eq!(transactions.len(), 5);
        assert_eq!(transactions[1].description, "Inventory purchase");

        let totals = Totals::from_transactions(&transactions);
        assert_eq!(
            totals.summary(),
            "Income=720.00, Expenses=260.00, Net=460.00"
        );
    }

    #[test]
    fn type_is_case_insensitive_and_unknown_types_are_ignored() {
        let csv = "date,description,amount,type\n\
                   2025-01-01,a,10,CREDIT\n\
                   2025-01-02,b,4.5,Debit\n\
                   2025-01-03,c,99,transfer\n";
        let totals = Totals::from_transactions(&parse_ledger(csv).unwrap());
        assert!((totals.income - 10.0).abs() < f64::EPSILON);
        assert!((totals.expenses - 4.5).abs() < f64::EPSILON);
        assert_eq!(totals.summary(), "Income=10.00, Expenses=4.50, Net=5.50");
    }

    #[test]
    fn negative_net_is_formatted_with_sign() {
        let totals = Totals {
            income: 50.0,
            expenses: 75.25,
        };
        assert_eq!(totals.summary(), "Income=50.00, Expenses=75.25, Net=-25.25");
    }

    #[test]
    fn quoted_fields_and_column_order() {
        let csv = "type,amount,description\n\
                   credit,100,\"Sale, \"\"bulk\"\" order\"\n";
        let transactions = parse_ledger(csv).unwrap();
        assert_eq!(transactions[0].description, "Sale, \"bulk\" order");
        assert_eq!(transactions[0].date, "");
        assert_eq!(transactions[0].kind, EntryKind::Credit);
    }

    #[test]
    fn invalid_ledgers_are_rejected() {
        assert!(matches!(parse_ledger(""), Err(AnalyticsError::Ledger(_))));
        assert!(matches!(
            parse_ledger("date,description,type\n2025-01-01,x,credit\n"),
            Err(AnalyticsError::Ledger(_))
        ));
        let err = parse_ledger("amount,type\nabc,credit\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn summary_parsing() {
        let figures = parse_summary("Income=720.00, Expenses=260.00, Net=460.00").unwrap();
        assert!((figures.income - 720.0).abs() < f64::EPSILON);
        assert!((figures.expenses - 260.0).abs() < f64::EPSILON);
        assert!((figures.net - 460.0).abs() < f64::EPSILON);

        let loose = parse_summary("prefix income = 5 ,EXPENSES=7.5,  net=-2.5 suffix").unwrap();
        assert!((loose.net + 2.5).abs() < f64::EPSILON);

        assert!(parse_summary("no figures here").is_none());
        assert!(parse_summary("").is_none());
    }

    #[tokio::test]
    async fn missing_ledger_is_seeded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("transactions.csv");

        let totals = load_totals(&path).await.unwrap();
        assert_eq!(totals.summary(), "Income=720.00, Expenses=260.00, Net=460.00");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), SAMPLE_LEDGER);
    }

    #[tokio::test]
    async fn existing_ledger_is_not_overwritten() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("transactions.csv");
        std::fs::write(&path, "amount,type\n1,credit\n").unwrap();

        let totals = load_totals(&path).await.unwrap();
        assert_eq!(totals.summary(), "Income=1.00, Expenses=0.00, Net=1.00");
    }
}
