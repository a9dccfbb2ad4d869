mod common;

use std::sync::Arc;

use cardia_history::{AssessmentHistoryStore, HistoryConfig, HistoryError};
use cardia_storage::{KeyValueStore, MemoryStore, StorageError};
use serde_json::json;

use common::{InterleavingStore, ids, record};

const KEY: &str = "assessmentHistory_jane@x.com";

fn other_tab_write() -> String {
    json!([{
        "id": "from-other-tab", "timestamp": "2024-01-01T00:00:00Z",
        "age": 40, "sex": 0, "trestbps": 110, "chol": 180,
        "result": { "risk": "low", "score": 0.05, "hasDisease": false }
    }])
    .to_string()
}

#[test]
fn unguarded_writes_lose_the_competing_record() {
    let backend = Arc::new(InterleavingStore::new(MemoryStore::new(), KEY, &other_tab_write()));
    let store = AssessmentHistoryStore::new(Arc::clone(&backend));

    store.save_assessment("jane@x.com", record(0.6).with_id("ours"));

    assert_eq!(ids(&store.assessment_history("jane@x.com")), vec!["ours"]);
}

#[test]
fn optimistic_writes_retry_and_keep_both_records() {
    let backend = Arc::new(InterleavingStore::new(MemoryStore::new(), KEY, &other_tab_write()));
    let config = HistoryConfig {
        optimistic_writes: true,
        ..HistoryConfig::default()
    };
    let store = AssessmentHistoryStore::with_config(Arc::clone(&backend), config);

    store.save_assessment("jane@x.com", record(0.6).with_id("ours"));

    assert_eq!(
        ids(&store.assessment_history("jane@x.com")),
        vec!["ours", "from-other-tab"]
    );
}

/// Storage whose partition changes on every write attempt.
struct AlwaysContended {
    inner: MemoryStore,
}

impl KeyValueStore for AlwaysContended {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
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
        _expected: Option<&str>,
        _value: &str,
    ) -> Result<(), StorageError> {
        Err(StorageError::PreconditionFailed {
            key: key.to_string(),
        })
    }
}

#[test]
fn optimistic_writes_give_up_after_configured_attempts() {
    let config = HistoryConfig {
        optimistic_writes: true,
        max_write_attempts: 2,
        ..HistoryConfig::default()
    };
    let store = AssessmentHistoryStore::with_config(
        AlwaysContended {
            inner: MemoryStore::new(),
        },
        config,
    );

    let err = store
        .try_save_assessment("jane@x.com", record(0.6))
        .unwrap_err();
    assert!(matches!(err, HistoryError::Conflict { attempts: 2, .. }));

    // The lenient form logs and reports nothing saved.
    assert_eq!(store.save_assessment("jane@x.com", record(0.6)), None);
}

#[test]
fn concurrent_threads_with_optimistic_writes_lose_nothing() {
    let config = HistoryConfig {
        optimistic_writes: true,
        max_write_attempts: 64,
        ..HistoryConfig::default()
    };
    let store = Arc::new(AssessmentHistoryStore::with_config(MemoryStore::new(), config));

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for i in 0..10 {
                    store.save_assessment("jane@x.com", record(0.5).with_id(format!("t{t}-{i}")));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.assessment_history("jane@x.com").len(), 40);
}
