//! Common error types for ledgerlens.
//!
//! This module provides shared error types that are used across multiple crates.

use crate::ids::JobId;
use thiserror::Error;

/// A result type using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core errors that can occur throughout the ledgerlens system.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A job with the specified ID was not found.
    #[error("job not found: {0}")]
    JobNotFound(JobId),

    /// An invalid identifier was provided.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] crate::ids::IdError),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}
