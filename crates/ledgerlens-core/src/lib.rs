//! Core types and utilities for ledgerlens.
//!
//! This crate provides the foundational types used throughout the ledgerlens backend:
//!
//! - **Identifiers**: Strongly-typed IDs for deferred jobs and persisted reports
//! - **Error types**: Common error definitions shared across crates
//!
//! # Example
//!
//! ```
//! use ledgerlens_core::{JobId, ReportId};
//!
//! // Generate a job ID for a caller
//! let job_id = JobId::generate("ops-team", "analyze");
//!
//! // Round-trip through its hex form
//! let parsed = JobId::from_hex(&job_id.to_hex()).unwrap();
//! assert_eq!(job_id, parsed);
//!
//! // Generate a report ID
//! let report_id = ReportId::generate();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod ids;

pub use error::{CoreError, Result};
pub use ids::{IdError, JobId, ReportId};
