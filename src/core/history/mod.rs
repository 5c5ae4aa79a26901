//! # Scan History Module
//!
//! Keeps a bounded, time-decayed history of nutrition scans.
//!
//! ## Lifecycle
//! - **Load** - read the slot once, drop records older than the retention
//!   window, write the pruned set back if anything was dropped
//! - **Add** - prepend, evict past capacity, persist
//! - **Remove** - filter by id, persist
//! - **Clear** - empty the collection and delete the slot

mod config;
mod retention;
mod store;
mod types;

pub use config::{HistoryConfig, DEFAULT_MAX_ENTRIES, DEFAULT_STORAGE_KEY, RETENTION_WINDOW_MS};
pub use retention::{is_expired, prune_expired};
pub use store::{HistoryStore, HistoryStoreBuilder};
pub use types::{format_timestamp, AnalysisResult, HistorySnapshot, LoadOutcome, ScanRecord};
