//! The history store: load-time expiry, insert-time eviction, write-through
//! persistence.

use super::config::HistoryConfig;
use super::retention::{prune_expired, push_front_bounded};
use super::types::{AnalysisResult, HistorySnapshot, LoadOutcome, ScanRecord};
use crate::core::storage::SlotStore;
use crate::error::{HistoryError, Result, SerializationError};
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

/// Bounded, self-expiring scan history persisted to a single slot
///
/// Call [`initialize`](Self::initialize) once before relying on the
/// contents. Every mutation writes the whole collection back through the
/// [`SlotStore`] before returning.
///
/// # Known limitation
/// Mutations update memory first and persist second. If the write fails
/// the error is returned, but memory and storage stay diverged until the
/// next successful mutation.
pub struct HistoryStore<S: SlotStore> {
    storage: S,
    config: HistoryConfig,
    records: Vec<ScanRecord>,
    ready: bool,
}

/// Builder for history store configuration
pub struct HistoryStoreBuilder {
    config: HistoryConfig,
}

impl HistoryStoreBuilder {
    /// Create a builder with default settings
    pub fn new() -> Self {
        Self {
            config: HistoryConfig::default(),
        }
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: HistoryConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the persistence slot key
    pub fn storage_key(mut self, key: impl Into<String>) -> Self {
        self.config.storage_key = key.into();
        self
    }

    /// Set the retention window
    pub fn retention(mut self, retention: Duration) -> Self {
        self.config.retention = retention;
        self
    }

    /// Set the insert-time capacity
    pub fn max_entries(mut self, max_entries: usize) -> Self {
        self.config.max_entries = max_entries;
        self
    }

    /// Build the store over the given backend
    pub fn build<S: SlotStore>(self, storage: S) -> Result<HistoryStore<S>> {
        self.config.validate()?;
        Ok(HistoryStore {
            storage,
            config: self.config,
            records: Vec::new(),
            ready: false,
        })
    }
}

impl Default for HistoryStoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: SlotStore> HistoryStore<S> {
    /// Create a store with the default configuration
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            config: HistoryConfig::default(),
            records: Vec::new(),
            ready: false,
        }
    }

    /// Load persisted history and drop expired records
    ///
    /// Never fails: unreadable or malformed data is logged and treated as
    /// an empty history. Marks the store ready.
    pub fn initialize(&mut self) -> LoadOutcome {
        self.initialize_at(Utc::now())
    }

    /// Same as [`initialize`](Self::initialize), measuring age against `now`
    pub fn initialize_at(&mut self, now: DateTime<Utc>) -> LoadOutcome {
        if self.ready {
            tracing::warn!(
                key = %self.config.storage_key,
                "scan history already initialized, ignoring repeated load"
            );
            return LoadOutcome {
                retained: self.records.len(),
                ..LoadOutcome::default()
            };
        }

        let mut outcome = LoadOutcome::default();

        match self.read_slot() {
            Ok(Some((mut records, undecodable))) => {
                if undecodable > 0 {
                    tracing::warn!(
                        key = %self.config.storage_key,
                        undecodable,
                        "dropping unreadable scans from history"
                    );
                }
                let expired =
                    undecodable + prune_expired(&mut records, now, self.config.retention);
                if expired > 0 {
                    tracing::info!(
                        key = %self.config.storage_key,
                        expired,
                        "pruned expired scans from history"
                    );
                    match self.write_slot(&records) {
                        Ok(()) => outcome.rewritten = true,
                        Err(e) => tracing::warn!(
                            key = %self.config.storage_key,
                            error = %e,
                            "failed to write pruned history back to storage"
                        ),
                    }
                }
                outcome.expired = expired;
                self.records = records;
            }
            Ok(None) => {
                tracing::debug!(key = %self.config.storage_key, "no stored scan history");
            }
            Err(HistoryError::Serialization(e)) => {
                tracing::warn!(
                    key = %self.config.storage_key,
                    error = %e,
                    "failed to parse scan history, starting empty"
                );
                outcome.malformed = true;
                self.records.clear();
            }
            Err(e) => {
                tracing::error!(
                    key = %self.config.storage_key,
                    error = %e,
                    "failed to read scan history, starting empty"
                );
                self.records.clear();
            }
        }

        outcome.retained = self.records.len();
        self.ready = true;
        tracing::debug!(
            retained = outcome.retained,
            expired = outcome.expired,
            "scan history ready"
        );
        outcome
    }

    /// Record a new scan at the front of the history
    ///
    /// Records beyond the capacity are evicted oldest-first. Returns the
    /// created record.
    pub fn add_scan(
        &mut self,
        input_label: impl Into<String>,
        result: AnalysisResult,
    ) -> Result<ScanRecord> {
        self.warn_if_not_ready("add");

        let record = ScanRecord::new(input_label, result, Utc::now());
        let before = self.records.len();
        push_front_bounded(&mut self.records, record.clone(), self.config.max_entries);
        let evicted = before + 1 - self.records.len();

        tracing::debug!(id = %record.id, evicted, "added scan to history");
        self.persist()?;

        Ok(record)
    }

    /// Remove the record with the given id
    ///
    /// The collection is persisted whether or not a record matched.
    /// Returns `true` if a record was removed.
    pub fn remove_scan(&mut self, id: &str) -> Result<bool> {
        self.warn_if_not_ready("remove");

        let before = self.records.len();
        self.records.retain(|record| record.id != id);
        let removed = self.records.len() != before;

        tracing::debug!(id, removed, "removed scan from history");
        self.persist()?;

        Ok(removed)
    }

    /// Drop every record and delete the persistence slot
    pub fn clear_history(&mut self) -> Result<()> {
        self.warn_if_not_ready("clear");

        let count = self.records.len();
        self.records.clear();

        tracing::debug!(count, "cleared scan history");
        self.storage.delete(&self.config.storage_key)?;
        Ok(())
    }

    /// Copy of the current records, newest first
    pub fn history(&self) -> Vec<ScanRecord> {
        self.records.clone()
    }

    /// Borrowed read-only view of the current records
    pub fn records(&self) -> &[ScanRecord] {
        &self.records
    }

    /// Look up a single record
    pub fn get_scan(&self, id: &str) -> Option<ScanRecord> {
        self.records.iter().find(|record| record.id == id).cloned()
    }

    /// Whether the initial load has completed
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// History plus ready flag, as seen by UI collaborators
    pub fn snapshot(&self) -> HistorySnapshot {
        HistorySnapshot {
            history: self.history(),
            ready: self.ready,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    /// The underlying persistence backend
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Read the slot, decoding each element on its own
    ///
    /// Only a document that is not a JSON array is an error. Elements that
    /// do not form a record are skipped and counted.
    fn read_slot(&self) -> Result<Option<(Vec<ScanRecord>, usize)>> {
        let Some(bytes) = self.storage.get(&self.config.storage_key)? else {
            return Ok(None);
        };
        let elements: Vec<Value> =
            serde_json::from_slice(&bytes).map_err(SerializationError::Decode)?;

        let total = elements.len();
        let records: Vec<ScanRecord> = elements
            .into_iter()
            .filter_map(|element| serde_json::from_value(element).ok())
            .collect();
        let undecodable = total - records.len();
        Ok(Some((records, undecodable)))
    }

    fn write_slot(&self, records: &[ScanRecord]) -> Result<()> {
        let bytes = serde_json::to_vec(records).map_err(SerializationError::Encode)?;
        self.storage.set(&self.config.storage_key, &bytes)?;
        Ok(())
    }

    fn persist(&self) -> Result<()> {
        self.write_slot(&self.records).inspect_err(|e| {
            tracing::warn!(
                key = %self.config.storage_key,
                error = %e,
                "failed to persist scan history; in-memory history is ahead of storage"
            );
        })
    }

    fn warn_if_not_ready(&self, operation: &str) {
        if !self.ready {
            tracing::warn!(operation, "scan history modified before it finished loading");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::storage::InMemoryStore;
    use crate::error::StorageError;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    const KEY: &str = "nutriview-scan-history";

    fn seeded_store(records: &[ScanRecord]) -> Arc<InMemoryStore> {
        let storage = Arc::new(InMemoryStore::new());
        storage
            .set(KEY, &serde_json::to_vec(records).unwrap())
            .unwrap();
        storage
    }

    fn stored_records(storage: &InMemoryStore) -> Option<Vec<ScanRecord>> {
        storage
            .get(KEY)
            .unwrap()
            .map(|bytes| serde_json::from_slice(&bytes).unwrap())
    }

    fn labels(records: &[ScanRecord]) -> Vec<&str> {
        records.iter().map(|r| r.input_label.as_str()).collect()
    }

    /// Backend whose writes can be switched off to simulate a full disk
    struct FlakyStore {
        inner: InMemoryStore,
        fail_writes: AtomicBool,
    }

    impl SlotStore for FlakyStore {
        fn get(&self, key: &str) -> std::result::Result<Option<Vec<u8>>, StorageError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &[u8]) -> std::result::Result<(), StorageError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(StorageError::QueryFailed("quota exceeded".to_string()));
            }
            self.inner.set(key, value)
        }

        fn delete(&self, key: &str) -> std::result::Result<(), StorageError> {
            self.inner.delete(key)
        }
    }

    #[test]
    fn initialize_on_empty_storage_is_ready_and_empty() {
        let mut store = HistoryStore::new(InMemoryStore::new());
        assert!(!store.is_ready());

        let outcome = store.initialize();

        assert!(store.is_ready());
        assert!(store.is_empty());
        assert_eq!(outcome, LoadOutcome::default());
        // Nothing is written when nothing was stored
        assert!(store.storage().is_empty());
    }

    #[test]
    fn initialize_drops_expired_and_rewrites_slot() {
        let now = Utc::now();
        let records = vec![
            ScanRecord::new("fresh", json!({}), now - Duration::days(2)),
            ScanRecord::new("stale", json!({}), now - Duration::weeks(9)),
            ScanRecord::new("recent", json!({}), now - Duration::weeks(7)),
        ];
        let storage = seeded_store(&records);
        let mut store = HistoryStore::new(storage.clone());

        let outcome = store.initialize_at(now);

        assert_eq!(outcome.retained, 2);
        assert_eq!(outcome.expired, 1);
        assert!(outcome.rewritten);
        assert_eq!(labels(store.records()), vec!["fresh", "recent"]);
        let persisted = stored_records(&storage).unwrap();
        assert_eq!(persisted, store.history());
    }

    #[test]
    fn initialize_without_expired_does_not_rewrite() {
        let now = Utc::now();
        let storage = seeded_store(&[ScanRecord::new("fresh", json!({}), now)]);
        let mut store = HistoryStore::new(storage);

        let outcome = store.initialize_at(now);

        assert_eq!(outcome.retained, 1);
        assert!(!outcome.rewritten);
    }

    #[test]
    fn initialize_with_malformed_data_starts_empty() {
        let storage = InMemoryStore::new();
        storage.set(KEY, b"{not json").unwrap();
        let mut store = HistoryStore::new(storage);

        let outcome = store.initialize();

        assert!(outcome.malformed);
        assert!(store.is_ready());
        assert!(store.is_empty());
    }

    #[test]
    fn initialize_with_wrong_shape_starts_empty() {
        let storage = InMemoryStore::new();
        storage.set(KEY, br#"{"id": "not-an-array"}"#).unwrap();
        let mut store = HistoryStore::new(storage);

        let outcome = store.initialize();

        assert!(outcome.malformed);
        assert!(store.is_empty());
    }

    #[test]
    fn initialize_keeps_more_than_capacity() {
        let now = Utc::now();
        let records: Vec<_> = (0..51)
            .map(|i| ScanRecord::new(format!("item {i}"), json!(i), now))
            .collect();
        let mut store = HistoryStore::new(seeded_store(&records));

        store.initialize_at(now);

        assert_eq!(store.len(), 51);
    }

    #[test]
    fn repeated_initialize_is_ignored() {
        let mut store = HistoryStore::new(InMemoryStore::new());
        store.initialize();
        store.add_scan("apple", json!({})).unwrap();

        let outcome = store.initialize();

        assert_eq!(outcome.retained, 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn add_scan_prepends_and_persists() {
        let mut store = HistoryStore::new(InMemoryStore::new());
        store.initialize();

        let first = store.add_scan("apple", json!({"grade": "A"})).unwrap();
        let second = store.add_scan("chips", json!({"grade": "E"})).unwrap();

        assert_eq!(store.records()[0].id, second.id);
        assert_eq!(store.records()[1].id, first.id);
        assert_eq!(stored_records(store.storage()).unwrap(), store.history());
    }

    #[test]
    fn add_scan_enforces_capacity() {
        let mut store = HistoryStoreBuilder::new()
            .max_entries(3)
            .build(InMemoryStore::new())
            .unwrap();
        store.initialize();

        for label in ["a", "b", "c", "d", "e"] {
            store.add_scan(label, json!(null)).unwrap();
            assert!(store.len() <= 3);
        }

        assert_eq!(labels(store.records()), vec!["e", "d", "c"]);
        assert_eq!(stored_records(store.storage()).unwrap().len(), 3);
    }

    #[test]
    fn add_scan_after_oversized_load_trims_to_capacity() {
        let now = Utc::now();
        let records: Vec<_> = (0..51)
            .map(|i| ScanRecord::new(format!("item {i}"), json!(i), now))
            .collect();
        let mut store = HistoryStoreBuilder::new()
            .build(seeded_store(&records))
            .unwrap();
        store.initialize_at(now);

        let added = store.add_scan("newest", json!(null)).unwrap();

        assert_eq!(store.len(), 50);
        assert_eq!(store.records()[0].id, added.id);
        assert_eq!(store.records()[49].input_label, "item 48");
    }

    #[test]
    fn remove_scan_keeps_order_of_others() {
        let mut store = HistoryStore::new(InMemoryStore::new());
        store.initialize();
        store.add_scan("a", json!(null)).unwrap();
        let b = store.add_scan("b", json!(null)).unwrap();
        store.add_scan("c", json!(null)).unwrap();

        let removed = store.remove_scan(&b.id).unwrap();

        assert!(removed);
        assert_eq!(labels(store.records()), vec!["c", "a"]);
        assert_eq!(stored_records(store.storage()).unwrap(), store.history());
    }

    #[test]
    fn remove_unknown_id_still_persists() {
        let now = Utc::now();
        let storage = seeded_store(&[ScanRecord::new("kept", json!(null), now)]);
        let mut store = HistoryStore::new(storage.clone());
        store.initialize_at(now);
        storage.delete(KEY).unwrap();

        let removed = store.remove_scan("no-such-id").unwrap();

        assert!(!removed);
        assert_eq!(store.len(), 1);
        assert_eq!(stored_records(&storage).unwrap(), store.history());
    }

    #[test]
    fn clear_history_deletes_slot() {
        let mut store = HistoryStore::new(InMemoryStore::new());
        store.initialize();
        store.add_scan("a", json!(null)).unwrap();

        store.clear_history().unwrap();

        assert!(store.is_empty());
        assert!(!store.storage().contains(KEY).unwrap());
    }

    #[test]
    fn get_scan_finds_by_id() {
        let mut store = HistoryStore::new(InMemoryStore::new());
        store.initialize();
        let added = store.add_scan("yogurt", json!({"sugar": 12})).unwrap();

        assert_eq!(store.get_scan(&added.id), Some(added));
        assert!(store.get_scan("missing").is_none());
    }

    #[test]
    fn snapshot_is_detached_from_store() {
        let mut store = HistoryStore::new(InMemoryStore::new());
        store.initialize();
        store.add_scan("a", json!(null)).unwrap();

        let mut snapshot = store.snapshot();
        snapshot.history.clear();

        assert!(snapshot.ready);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn write_failure_propagates_after_memory_update() {
        let mut store = HistoryStore::new(FlakyStore {
            inner: InMemoryStore::new(),
            fail_writes: AtomicBool::new(false),
        });
        store.initialize();
        store.add_scan("saved", json!(null)).unwrap();
        store.storage().fail_writes.store(true, Ordering::SeqCst);

        let result = store.add_scan("unsaved", json!(null));

        assert!(matches!(result, Err(HistoryError::Storage(_))));
        assert_eq!(labels(store.records()), vec!["unsaved", "saved"]);
        let persisted: Vec<ScanRecord> =
            serde_json::from_slice(&store.storage().get(KEY).unwrap().unwrap()).unwrap();
        assert_eq!(labels(&persisted), vec!["saved"]);
    }

    #[test]
    fn failed_write_back_does_not_fail_initialize() {
        let now = Utc::now();
        let inner = InMemoryStore::new();
        let stale = vec![ScanRecord::new("stale", json!(null), now - Duration::weeks(10))];
        inner.set(KEY, &serde_json::to_vec(&stale).unwrap()).unwrap();
        let mut store = HistoryStore::new(FlakyStore {
            inner,
            fail_writes: AtomicBool::new(true),
        });

        let outcome = store.initialize_at(now);

        assert!(store.is_ready());
        assert_eq!(outcome.expired, 1);
        assert!(!outcome.rewritten);
        assert!(store.is_empty());
    }

    #[test]
    fn builder_rejects_invalid_config() {
        let result = HistoryStoreBuilder::new()
            .max_entries(0)
            .build(InMemoryStore::new());

        assert!(matches!(result, Err(HistoryError::Config(_))));
    }

    #[test]
    fn custom_storage_key_is_used() {
        let mut store = HistoryStoreBuilder::new()
            .storage_key("other-history")
            .build(InMemoryStore::new())
            .unwrap();
        store.initialize();
        store.add_scan("a", json!(null)).unwrap();

        assert!(store.storage().contains("other-history").unwrap());
        assert!(!store.storage().contains(KEY).unwrap());
    }

    #[test]
    fn builder_applies_every_setting() {
        let store = HistoryStoreBuilder::new()
            .storage_key("pantry")
            .retention(Duration::days(7))
            .max_entries(5)
            .build(InMemoryStore::new())
            .unwrap();

        assert_eq!(store.config().storage_key, "pantry");
        assert_eq!(store.config().retention, Duration::days(7));
        assert_eq!(store.config().max_entries, 5);
    }

    #[test]
    fn one_unreadable_record_does_not_discard_the_rest() {
        let now = Utc::now();
        let valid: Vec<_> = ["a", "b", "c"]
            .iter()
            .map(|label| ScanRecord::new(*label, json!({}), now))
            .collect();
        let mut document = serde_json::to_value(&valid).unwrap();
        let elements = document.as_array_mut().unwrap();
        elements.insert(
            1,
            json!({"id": "x", "inputLabel": "legacy", "result": {}, "scannedAt": null}),
        );
        elements.push(json!({"inputLabel": "no id or time"}));
        let storage = Arc::new(InMemoryStore::new());
        storage
            .set(KEY, &serde_json::to_vec(&document).unwrap())
            .unwrap();
        let mut store = HistoryStore::new(storage.clone());

        let outcome = store.initialize_at(now);

        assert!(!outcome.malformed);
        assert_eq!(outcome.retained, 3);
        assert_eq!(outcome.expired, 2);
        assert!(outcome.rewritten);
        assert_eq!(store.history(), valid);
        assert_eq!(stored_records(&storage).unwrap(), valid);

        store.add_scan("d", json!({})).unwrap();
        assert_eq!(stored_records(&storage).unwrap().len(), 4);
    }

    #[test]
    fn non_array_document_is_malformed() {
        let storage = InMemoryStore::new();
        storage.set(KEY, b"null").unwrap();
        let mut store = HistoryStore::new(storage);

        let outcome = store.initialize();

        assert!(outcome.malformed);
        assert!(store.is_empty());
    }
}
