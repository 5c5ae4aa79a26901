//! Load-time expiry and insert-time capacity rules.

use super::types::ScanRecord;
use chrono::{DateTime, Duration, Utc};

/// Whether a record has aged out of the retention window
///
/// A record whose timestamp cannot be parsed has no meaningful age and is
/// treated as expired.
pub fn is_expired(record: &ScanRecord, now: DateTime<Utc>, retention: Duration) -> bool {
    match record.scanned_at_utc() {
        Some(scanned_at) => now.signed_duration_since(scanned_at) >= retention,
        None => true,
    }
}

/// Drop expired records, preserving order. Returns how many were dropped.
pub fn prune_expired(
    records: &mut Vec<ScanRecord>,
    now: DateTime<Utc>,
    retention: Duration,
) -> usize {
    let before = records.len();
    records.retain(|record| !is_expired(record, now, retention));
    before - records.len()
}

/// Prepend a record and drop everything past `max_entries`
pub fn push_front_bounded(records: &mut Vec<ScanRecord>, record: ScanRecord, max_entries: usize) {
    records.insert(0, record);
    records.truncate(max_entries);
}
