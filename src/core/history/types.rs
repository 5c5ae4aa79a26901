//! Types for scan history storage.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque analysis payload produced by the nutrition analyzer
///
/// The store never inspects it; it is persisted exactly as given.
pub type AnalysisResult = serde_json::Value;

/// One entry in the scan history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRecord {
    pub id: String,
    /// Short caller-supplied description of what was scanned
    pub input_label: String,
    pub result: AnalysisResult,
    /// ISO-8601 creation time, UTC with millisecond precision
    pub scanned_at: String,
}

impl ScanRecord {
    /// Create a record stamped with a fresh id and the given time
    pub fn new(input_label: impl Into<String>, result: AnalysisResult, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            input_label: input_label.into(),
            result,
            scanned_at: format_timestamp(now),
        }
    }

    /// Parse `scanned_at`, or `None` if it is not a valid timestamp
    pub fn scanned_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.scanned_at)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }
}

/// Format a timestamp the way records persist it (`2024-01-01T00:00:00.000Z`)
pub fn format_timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Read-only view handed to UI collaborators
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistorySnapshot {
    /// Records, newest first
    pub history: Vec<ScanRecord>,
    /// Whether the initial load has completed
    pub ready: bool,
}

/// What happened during the initial load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadOutcome {
    /// Records kept in the collection
    pub retained: usize,
    /// Records dropped because they aged out of the retention window
    pub expired: usize,
    /// The stored document could not be parsed and was ignored
    pub malformed: bool,
    /// The pruned collection was written back to storage
    pub rewritten: bool,
}
