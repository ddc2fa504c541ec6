//! Audit trail for governed requests.
//!
//! Every request that passes through the governor (bypassed paths excluded)
//! produces exactly one [`AuditRecord`]. Recording never fails the request:
//! sinks report their own failures through `tracing::error!`.
//!
//! Destinations:
//!
//! - [`FileAuditSink`] appends JSON lines to a file
//! - [`TracingAuditSink`] emits structured events on the `audit` target
//! - [`MemoryAuditSink`] keeps records in memory
//! - [`NullAuditSink`] discards everything

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

/// One governed request, as written to the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// When the response was produced.
    pub ts: DateTime<Utc>,
    /// HTTP method.
    pub method: String,
    /// Request path, without the query string.
    pub path: String,
    /// Response status code.
    pub status: u16,
    /// Client address.
    pub ip: String,
    /// Last four characters of the presented key, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_suffix: Option<String>,
}

/// Destination for audit records.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Append a record. Failures are logged, never returned.
    async fn record(&self, record: &AuditRecord);

    /// The last `n` records, oldest first. Sinks without readable history
    /// return an empty list.
    async fn tail(&self, n: usize) -> Vec<AuditRecord>;
}

#[async_trait]
impl<S: AuditSink + ?Sized> AuditSink for Arc<S> {
    async fn record(&self, record: &AuditRecord) {
        (**self).record(record).await;
    }

    async fn tail(&self, n: usize) -> Vec<AuditRecord> {
        (**self).tail(n).await
    }
}

// =============================================================================
// File
// =============================================================================

/// Appends one JSON object per line to a file.
///
/// Writes are serialized through an async mutex so lines never interleave.
#[derive(Debug)]
pub struct FileAuditSink {
    path: PathBuf,
    file: tokio::sync::Mutex<File>,
}

impl FileAuditSink {
    /// Open (or create) the audit file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file or its parent directory cannot be
    /// created.
    pub async fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        Ok(Self {
            path,
            file: tokio::sync::Mutex::new(file),
        })
    }

    /// Location of the audit file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AuditSink for FileAuditSink {
    async fn record(&self, record: &AuditRecord) {
        let mut line = match serde_json::to_vec(record) {
            Ok(line) => line,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode audit record");
                return;
            }
        };
        line.push(b'\n');

        let mut file = self.file.lock().await;
        let written = async {
            file.write_all(&line).await?;
            file.flush().await
        }
        .await;
        if let Err(e) = written {
            tracing::error!(error = %e, path = %self.path.display(), "Failed to append audit record");
        }
    }

    async fn tail(&self, n: usize) -> Vec<AuditRecord> {
        // Hold the writer lock so a half-written line is never read
        let _guard = self.file.lock().await;
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(error = %e, path = %self.path.display(), "Failed to read audit log");
                return Vec::new();
            }
        };

        let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
        lines[lines.len().saturating_sub(n)..]
            .iter()
            .filter_map(|line| match serde_json::from_str(line) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping malformed audit line");
                    None
                }
            })
            .collect()
    }
}

// =============================================================================
// Tracing
// =============================================================================

/// Emits each record as a structured event on the `audit` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, record: &AuditRecord) {
        tracing::info!(
            target: "audit",
            ts = %record.ts.to_rfc3339(),
            method = %record.method,
            path = %record.path,
            status = record.status,
            ip = %record.ip,
            key_suffix = record.key_suffix.as_deref().unwrap_or(""),
            "request"
        );
    }

    async fn tail(&self, _n: usize) -> Vec<AuditRecord> {
        Vec::new()
    }
}

// =============================================================================
// Memory
// =============================================================================

/// Keeps every record in memory.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all records so far.
    #[must_use]
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().clone()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, record: &AuditRecord) {
        self.records.lock().push(record.clone());
    }

    async fn tail(&self, n: usize) -> Vec<AuditRecord> {
        let records = self.records.lock();
        records[records.len().saturating_sub(n)..].to_vec()
    }
}

// =============================================================================
// Null
// =============================================================================

/// Discards every record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAuditSink;

#[async_trait]
impl AuditSink for NullAuditSink {
    async fn record(&self, _record: &AuditRecord) {}

    async fn tail(&self, _n: usize) -> Vec<AuditRecord> {
        Vec::new()
    }
}

// =============================================================================
// Selection
// =============================================================================

/// Where audit records go, parsed from the `AUDIT_LOG` setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditTarget {
    /// Auditing disabled.
    Off,
    /// Structured tracing events.
    Tracing,
    /// JSON lines appended to a file.
    File(PathBuf),
}

impl AuditTarget {
    /// Interpret a setting value: `off`/`none`/empty, `tracing`, or a path.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "" => Self::Off,
            s if s.eq_ignore_ascii_case("off") || s.eq_ignore_ascii_case("none") => Self::Off,
            s if s.eq_ignore_ascii_case("tracing") => Self::Tracing,
            path => Self::File(PathBuf::from(path)),
        }
    }

    /// Build the sink for this target.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if a file target cannot be opened.
    pub async fn open(&self) -> std::io::Result<Arc<dyn AuditSink>> {
        Ok(match self {
            Self::Off => Arc::new(NullAuditSink),
            Self::Tracing => Arc::new(TracingAuditSink),
            Self::File(path) => Arc::new(FileAuditSink::open(path).await?),
        })
    }
}
