//! Domain types stored in the database.
//!
//! These types represent the persisted reports produced by analysis routes.

use chrono::{DateTime, Utc};
use ledgerlens_core::ReportId;
use serde::{Deserialize, Serialize};

/// A generated report stored in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Unique identifier for the report.
    pub report_id: ReportId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Route that produced the report (e.g. `/api/analyze`).
    pub route: String,
    /// Client address of the request that produced the report.
    #[serde(default)]
    pub ip: Option<String>,
    /// Hex blake3 digest of the API key used.
    #[serde(default)]
    pub api_key_hash: Option<String>,
    /// Canonical numeric summary of the ledger.
    pub summary: String,
    /// Generated narrative content.
    pub content: String,
    /// Total income parsed from the summary.
    #[serde(default)]
    pub income: Option<f64>,
    /// Total expenses parsed from the summary.
    #[serde(default)]
    pub expenses: Option<f64>,
    /// Net result parsed from the summary.
    #[serde(default)]
    pub net: Option<f64>,
}

impl Report {
    /// Returns `true` if any of the parsed numbers is missing.
    #[must_use]
    pub const fn is_missing_numbers(&self) -> bool {
        self.income.is_none() || self.expenses.is_none() || self.net.is_none()
    }
}
