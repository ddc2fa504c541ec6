//! Database schema definitions and column families.
//!
//! This module defines the column families used in `RocksDB` storage.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Primary report records, keyed by `created_at_millis || report_id`.
    pub const REPORTS: &str = "reports";

    /// Index: report time keys by id, keyed by `report_id`.
    pub const REPORTS_BY_ID: &str = "reports_by_id";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![cf::REPORTS, cf::REPORTS_BY_ID]
}
