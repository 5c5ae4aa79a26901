//! # Core Module
//!
//! The UI-agnostic history engine.
//!
//! ## Modules
//! - `history` - The history store and its retention rules
//! - `storage` - Key-value persistence backends

pub mod history;
pub mod storage;

// Re-export commonly used types
pub use history::{HistoryConfig, HistorySnapshot, HistoryStore, LoadOutcome, ScanRecord};
pub use storage::{InMemoryStore, SlotStore, SqliteStore};
