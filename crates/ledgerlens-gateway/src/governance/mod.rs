//! Request governance: authentication, rate limiting and auditing.

pub mod audit;
pub mod headers;
pub mod pipeline;
pub mod rate_limit;

pub use audit::{
    AuditRecord, AuditSink, AuditTarget, FileAuditSink, MemoryAuditSink, NullAuditSink,
    TracingAuditSink,
};
pub use headers::with_security_headers;
pub use pipeline::{govern, Admission, API_KEY_HEADER};
pub use rate_limit::RateLimiter;
