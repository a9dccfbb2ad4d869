use std::sync::Arc;

use crate::error::StorageError;

/// A string-keyed map of string values.
///
/// This is the only thing the history store knows about persistence.
/// Implementations may be in-memory, file-backed, or anything else with the
/// same contract. Removing an absent key is not an error.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Every key currently present, in backend order.
    fn list_keys(&self) -> Result<Vec<String>, StorageError>;

    /// Write `value` only if the key currently holds `expected` (`None` means
    /// absent). Returns `StorageError::PreconditionFailed` otherwise.
    ///
    /// The default is a plain read followed by a write and is not atomic.
    /// Backends with an internal lock override it.
    fn compare_and_set(
        &self,
        key: &str,
        expected: Option<&str>,
        value: &str,
    ) -> Result<(), StorageError> {
        let current = self.get(key)?;
        if current.as_deref() != expected {
            return Err(StorageError::PreconditionFailed {
                key: key.to_string(),
            });
        }
        self.set(key, value)
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }

    fn list_keys(&self) -> Result<Vec<String>, StorageError> {
        (**self).list_keys()
    }

    fn compare_and_set(
        &self,
        key: &str,
        expected: Option<&str>,
        value: &str,
    ) -> Result<(), StorageError> {
        (**self).compare_and_set(key, expected, value)
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Box<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }

    fn list_keys(&self) -> Result<Vec<String>, StorageError> {
        (**self).list_keys()
    }

    fn compare_and_set(
        &self,
        key: &str,
        expected: Option<&str>,
        value: &str,
    ) -> Result<(), StorageError> {
        (**self).compare_and_set(key, expected, value)
    }
}
