//! Key encoding utilities for `RocksDB`.
//!
//! Report keys start with the big-endian creation time in milliseconds so a
//! forward scan yields reports in chronological order and a seek to a time
//! prefix starts a range query.

use chrono::{DateTime, Utc};
use ledgerlens_core::ReportId;

/// Length of an encoded report key.
pub const REPORT_KEY_LEN: usize = 24;

/// Encode a time prefix for seeking to the first report at or after `at`.
#[must_use]
pub fn time_prefix(at: &DateTime<Utc>) -> Vec<u8> {
    let millis = u64::try_from(at.timestamp_millis()).unwrap_or(0);
    millis.to_be_bytes().to_vec()
}

/// Encode a report key: `created_at_millis || report_id`.
#[must_use]
pub fn report_key(created_at: &DateTime<Utc>, report_id: &ReportId) -> Vec<u8> {
    let mut key = Vec::with_capacity(REPORT_KEY_LEN);
    key.extend_from_slice(&time_prefix(created_at));
    key.extend_from_slice(report_id.as_bytes());
    key
}

/// Encode a report id key (just the report ID bytes).
#[must_use]
pub fn report_id_key(report_id: &ReportId) -> Vec<u8> {
    report_id.as_bytes().to_vec()
}

/// Extract the report ID from a report key.
///
/// # Panics
///
/// Panics if the key is not at least 24 bytes.
#[must_use]
pub fn extract_report_id(key: &[u8]) -> ReportId {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&key[8..REPORT_KEY_LEN]);
    ReportId::from_uuid(uuid::Uuid::from_bytes(bytes))
}
