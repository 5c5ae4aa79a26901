//! Persistence port definition.

use crate::error::StorageError;

/// A durable key-value byte store addressed by string keys
///
/// Writes are expected to be synchronous: once `set` or `delete` returns
/// `Ok`, a subsequent `get` must observe the change.
pub trait SlotStore: Send + Sync {
    /// Read the bytes stored under `key`, or `None` if the slot is absent
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Replace the bytes stored under `key`
    fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError>;

    /// Remove the slot entirely
    ///
    /// Deleting an absent key is not an error.
    fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Check whether a slot exists
    fn contains(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.get(key)?.is_some())
    }
}

impl<T: SlotStore + ?Sized> SlotStore for Box<T> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        (**self).delete(key)
    }
}

impl<T: SlotStore + ?Sized> SlotStore for std::sync::Arc<T> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        (**self).delete(key)
    }
}
