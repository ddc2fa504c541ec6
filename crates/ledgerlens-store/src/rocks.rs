//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store` trait.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use ledgerlens_core::ReportId;
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, Direction, IteratorMode,
    MultiThreaded, Options, WriteBatch,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::types::Report;
use crate::Store;

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Scan the primary column family, decoding every report.
    fn scan(&self, mode: IteratorMode<'_>, limit: Option<usize>) -> Result<Vec<Report>> {
        let cf_reports = self.cf(cf::REPORTS)?;

        let mut reports = Vec::new();
        for item in self.db.iterator_cf(&cf_reports, mode) {
            if limit.is_some_and(|max| reports.len() >= max) {
                break;
            }
            let (_, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            reports.push(Self::deserialize(&value)?);
        }

        Ok(reports)
    }
}

impl Store for RocksStore {
    fn put_report(&self, report: &Report) -> Result<()> {
        let cf_reports = self.cf(cf::REPORTS)?;
        let cf_by_id = self.cf(cf::REPORTS_BY_ID)?;

        let report_key = keys::report_key(&report.created_at, &report.report_id);
        let id_key = keys::report_id_key(&report.report_id);
        let value = Self::serialize(report)?;

        // A changed created_at moves the primary key; drop the stale one
        let old_key = self
            .db
            .get_cf(&cf_by_id, &id_key)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let mut batch = WriteBatch::default();
        if let Some(old) = old_key {
            if old != report_key {
                batch.delete_cf(&cf_reports, &old);
            }
        }
        batch.put_cf(&cf_reports, &report_key, &value);
        batch.put_cf(&cf_by_id, &id_key, &report_key);

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        tracing::debug!(report_id = %report.report_id, route = %report.route, "Stored report");
        Ok(())
    }

    fn get_report(&self, report_id: &ReportId) -> Result<Option<Report>> {
        let cf_reports = self.cf(cf::REPORTS)?;
        let cf_by_id = self.cf(cf::REPORTS_BY_ID)?;

        let Some(report_key) = self
            .db
            .get_cf(&cf_by_id, keys::report_id_key(report_id))
            .map_err(|e| StoreError::Database(e.to_string()))?
        else {
            return Ok(None);
        };

        self.db
            .get_cf(&cf_reports, report_key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn list_recent(&self, limit: usize) -> Result<Vec<Report>> {
        self.scan(IteratorMode::End, Some(limit))
    }

    fn list_since(&self, since: DateTime<Utc>) -> Result<Vec<Report>> {
        let prefix = keys::time_prefix(&since);
        self.scan(IteratorMode::From(&prefix, Direction::Forward), None)
    }

    fn list_all(&self) -> Result<Vec<Report>> {
        self.scan(IteratorMode::Start, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    fn create_test_store() -> (RocksStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = RocksStore::open(dir.path()).unwrap();
        (store, dir)
    }

    fn create_test_report(route: &str, created_at: DateTime<Utc>, net: Option<f64>) -> Report {
        Report {
            report_id: ReportId::generate(),
            created_at,
            route: route.to_string(),
            ip: Some("10.0.0.1".to_string()),
            api_key_hash: None,
            summary: "Income=720.00, Expenses=260.00, Net=460.00".to_string(),
            content: "three insights".to_string(),
            income: net.map(|_| 720.0),
            expenses: net.map(|_| 260.0),
            net,
        }
    }

    #[test]
    fn report_put_get_and_overwrite() {
        let (store, _dir) = create_test_store();
        let report = create_test_report("/api/analyze", Utc::now(), Some(460.0));

        // Create
        store.put_report(&report).unwrap();

        // Read
        let retrieved = store.get_report(&report.report_id).unwrap().unwrap();
        assert_eq!(retrieved, report);

        // Update
        let mut updated = report.clone();
        updated.content = "revised".to_string();
        store.put_report(&updated).unwrap();
        assert_eq!(
            store.get_report(&report.report_id).unwrap().unwrap().content,
            "revised"
        );
        assert_eq!(store.list_all().unwrap().len(), 1);

        // Missing
        assert!(store.get_report(&ReportId::generate()).unwrap().is_none());
    }

    #[test]
    fn moving_created_at_replaces_primary_key() {
        let (store, _dir) = create_test_store();
        let mut report = create_test_report("/api/report", Utc::now(), None);
        store.put_report(&report).unwrap();

        report.created_at += Duration::seconds(5);
        store.put_report(&report).unwrap();

        let all = store.list_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].created_at, report.created_at);
    }

    #[test]
    fn list_recent_is_newest_first_and_limited() {
        let (store, _dir) = create_test_store();
        let now = Utc::now();
        for i in 0..5 {
            let report =
                create_test_report(&format!("/r{i}"), now - Duration::minutes(5 - i), None);
            store.put_report(&report).unwrap();
        }

        let recent = store.list_recent(3).unwrap();
        let routes: Vec<_> = recent.iter().map(|r| r.route.as_str()).collect();
        assert_eq!(routes, vec!["/r4", "/r3", "/r2"]);

        assert_eq!(store.list_recent(0).unwrap().len(), 0);
        assert_eq!(store.list_recent(50).unwrap().len(), 5);
    }

    #[test]
    fn list_since_is_chronological_and_bounded() {
        let (store, _dir) = create_test_store();
        let now = Utc::now();
        let old = create_test_report("/old", now - Duration::days(40), Some(1.0));
        let mid = create_test_report("/mid", now - Duration::days(10), Some(2.0));
        let new = create_test_report("/new", now - Duration::days(1), Some(3.0));
        for r in [&new, &old, &mid] {
            store.put_report(r).unwrap();
        }

        let window = store.list_since(now - Duration::days(30)).unwrap();
        let routes: Vec<_> = window.iter().map(|r| r.route.as_str()).collect();
        assert_eq!(routes, vec!["/mid", "/new"]);
    }
}
