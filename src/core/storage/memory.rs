//! In-memory slot backend for testing.

use super::SlotStore;
use crate::error::StorageError;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory slot backend
///
/// Useful for testing and scenarios where persistence isn't needed.
/// Share one instance between stores with `Arc<InMemoryStore>` to simulate
/// reopening the same durable slot.
pub struct InMemoryStore {
    slots: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryStore {
    /// Create a new, empty in-memory store
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// Number of occupied slots
    pub fn len(&self) -> usize {
        self.slots.read().map(|s| s.len()).unwrap_or(0)
    }

    /// Whether no slot is occupied
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SlotStore for InMemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let slots = self
            .slots
            .read()
            .map_err(|_| StorageError::Poisoned { backend: "memory" })?;

        Ok(slots.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let mut slots = self
            .slots
            .write()
            .map_err(|_| StorageError::Poisoned { backend: "memory" })?;

        slots.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut slots = self
            .slots
            .write()
            .map_err(|_| StorageError::Poisoned { backend: "memory" })?;

        slots.remove(key);
        Ok(())
    }
}
