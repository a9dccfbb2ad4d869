#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use cardia_core::models::{AssessmentRecord, RiskLevel, RiskResult};
use cardia_history::{AssessmentHistoryStore, HistoryConfig};
use cardia_storage::{KeyValueStore, MemoryStore, StorageError};

pub fn record(score: f64) -> AssessmentRecord {
    let risk = if score < 0.3 {
        RiskLevel::Low
    } else if score < 0.7 {
        RiskLevel::Moderate
    } else {
        RiskLevel::High
    };
    AssessmentRecord::new(55, 1, 130, 250, RiskResult::new(risk, score, score >= 0.5))
}

pub fn memory_store(
    entries: &[(&str, &str)],
) -> (Arc<MemoryStore>, AssessmentHistoryStore<Arc<MemoryStore>>) {
    memory_store_with(entries, HistoryConfig::default())
}

pub fn memory_store_with(
    entries: &[(&str, &str)],
    config: HistoryConfig,
) -> (Arc<MemoryStore>, AssessmentHistoryStore<Arc<MemoryStore>>) {
    let backend = Arc::new(MemoryStore::with_entries(entries.iter().copied()));
    let store = AssessmentHistoryStore::with_config(Arc::clone(&backend), config);
    (backend, store)
}

pub fn ids(records: &[AssessmentRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.id().unwrap_or_default().to_string())
        .collect()
}

/// Storage that fails every call.
pub struct BrokenStore;

impl KeyValueStore for BrokenStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Unavailable("quota exceeded".into()))
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("quota exceeded".into()))
    }

    fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("quota exceeded".into()))
    }

    fn list_keys(&self) -> Result<Vec<String>, StorageError> {
        Err(StorageError::Unavailable("quota exceeded".into()))
    }
}

/// Memory storage that lets another writer sneak in one write just before
/// the first write issued through it, like a second browser tab would.
pub struct InterleavingStore {
    pub inner: MemoryStore,
    competing: Mutex<Option<(String, String)>>,
}

impl InterleavingStore {
    pub fn new(inner: MemoryStore, key: &str, value: &str) -> Self {
        Self {
            inner,
            competing: Mutex::new(Some((key.to_string(), value.to_string()))),
        }
    }

    fn interleave(&self) {
        if let Some((key, value)) = self.competing.lock().unwrap().take() {
            self.inner.set(&key, &value).unwrap();
        }
    }
}

impl KeyValueStore for InterleavingStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.interleave();
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.remove(key)
    }

    fn list_keys(&self) -> Result<Vec<String>, StorageError> {
        self.inner.list_keys()
    }

    fn compare_and_set(
        &self,
        key: &str,
        expected: Option<&str>,
        value: &str,
    ) -> Result<(), StorageError> {
        self.interleave();
        self.inner.compare_and_set(key, expected, value)
    }
}
