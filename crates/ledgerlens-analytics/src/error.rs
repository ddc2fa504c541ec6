//! Error types for analytics and deferred jobs.
//!
//! This module defines all errors that can occur while reading the ledger,
//! generating text, exporting reports and running jobs.

use ledgerlens_core::JobId;
use thiserror::Error;

use crate::jobs::JobStatus;

/// A result type using `AnalyticsError`.
pub type Result<T> = std::result::Result<T, AnalyticsError>;

/// Errors that can occur in analytics operations.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// The uploaded or stored ledger could not be parsed.
    #[error("invalid ledger: {0}")]
    Ledger(String),

    /// The text-generation backend failed or timed out.
    #[error("text generation unavailable: {0}")]
    CollaboratorUnavailable(String),

    /// The requested job was not found.
    #[error("job not found: {0}")]
    JobNotFound(JobId),

    /// A job state transition was rejected.
    #[error("invalid job transition for {job_id}: cannot transition from {from:?} to {to:?}")]
    InvalidTransition {
        /// The job being transitioned.
        job_id: JobId,
        /// The current status.
        from: JobStatus,
        /// The requested status.
        to: JobStatus,
    },

    /// The job queue no longer accepts work.
    #[error("job queue is closed")]
    QueueClosed,

    /// Storage layer error.
    #[error("storage error: {0}")]
    Store(#[from] ledgerlens_store::StoreError),

    /// Filesystem error while reading the ledger or writing exports.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AnalyticsError {
    /// Returns the appropriate HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::Ledger(_) => 400,
            Self::JobNotFound(_) => 404,
            Self::InvalidTransition { .. } => 409,
            Self::CollaboratorUnavailable(_) | Self::QueueClosed => 503,
            Self::Store(_) | Self::Io(_) | Self::Internal(_) => 500,
        }
    }
}
