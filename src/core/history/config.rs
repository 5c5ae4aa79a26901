//! Store configuration.

use crate::error::HistoryError;
use chrono::Duration;

/// Storage key the history lives under
pub const DEFAULT_STORAGE_KEY: &str = "nutriview-scan-history";

/// Maximum number of records kept after an insert
pub const DEFAULT_MAX_ENTRIES: usize = 50;

/// Retention window in milliseconds (8 weeks)
pub const RETENTION_WINDOW_MS: i64 = 8 * 7 * 24 * 60 * 60 * 1000;

/// Configuration for a history store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Key of the persistence slot
    pub storage_key: String,
    /// Records at least this old are dropped at load time
    pub retention: Duration,
    /// Capacity enforced on every insert
    pub max_entries: usize,
}

impl HistoryConfig {
    /// Check that the configuration can drive a store
    pub fn validate(&self) -> Result<(), HistoryError> {
        if self.storage_key.trim().is_empty() {
            return Err(HistoryError::Config(
                "storage key must not be empty".to_string(),
            ));
        }
        if self.max_entries == 0 {
            return Err(HistoryError::Config(
                "max entries must be at least 1".to_string(),
            ));
        }
        if self.retention <= Duration::zero() {
            return Err(HistoryError::Config(format!(
                "retention must be positive, got {}ms",
                self.retention.num_milliseconds()
            )));
        }
        Ok(())
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            retention: Duration::milliseconds(RETENTION_WINDOW_MS),
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}
