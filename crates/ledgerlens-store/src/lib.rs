//! `RocksDB` storage layer for ledgerlens.
//!
//! This crate provides persistent storage for generated reports using `RocksDB`
//! with column families for efficient indexing.
//!
//! # Architecture
//!
//! The storage uses the following column families:
//!
//! - `reports`: Primary report records, keyed by `created_at_millis || report_id`
//! - `reports_by_id`: Index from `report_id` to the primary key
//!
//! # Example
//!
//! ```no_run
//! use ledgerlens_store::{RocksStore, Store};
//!
//! let store = RocksStore::open("/tmp/ledgerlens-db").unwrap();
//!
//! // Ten most recent reports, newest first
//! let recent = store.list_recent(10).unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod rocks;
pub mod schema;
pub mod types;

pub use error::{Result, StoreError};
pub use rocks::RocksStore;
pub use types::Report;

use chrono::{DateTime, Utc};
use ledgerlens_core::ReportId;

/// The storage trait defining all database operations.
///
/// This trait abstracts the storage layer, allowing for different implementations
/// (e.g., `RocksDB`, in-memory for testing).
pub trait Store: Send + Sync {
    /// Insert or update a report record.
    ///
    /// This also maintains the id index.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_report(&self, report: &Report) -> Result<()>;

    /// Get a report by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_report(&self, report_id: &ReportId) -> Result<Option<Report>>;

    /// List the most recent reports, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_recent(&self, limit: usize) -> Result<Vec<Report>>;

    /// List reports created at or after `since`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_since(&self, since: DateTime<Utc>) -> Result<Vec<Report>>;

    /// List all reports, oldest first.
    ///
    /// Use with caution in production; prefer filtered queries.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_all(&self) -> Result<Vec<Report>>;
}
