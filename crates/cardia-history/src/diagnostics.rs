use serde::Serialize;
use serde_json::Value;

use cardia_core::storage_keys;
use cardia_storage::KeyValueStore;

use crate::partition::RawPartition;
use crate::store::AssessmentHistoryStore;

/// State of one stored partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PartitionStatus {
    Ok { records: usize },
    Missing,
    InvalidJson { error: String },
    NotArray { found: String },
    Unreadable { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct PartitionDump {
    pub key: String,
    #[serde(flatten)]
    pub status: PartitionStatus,
    pub entries: Vec<Value>,
}

/// Everything an operator needs to see why a user's history looks wrong.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HistoryDiagnostics {
    pub current_email: Option<String>,
    pub keys: Vec<String>,
    pub partition_keys: Vec<String>,
    pub legacy_keys: Vec<String>,
    pub partitions: Vec<PartitionDump>,
}

impl<S: KeyValueStore> AssessmentHistoryStore<S> {
    /// Snapshot the current identity, every key, and the contents of every
    /// current-scheme partition, and log it. Never writes.
    pub fn debug_history(&self) -> HistoryDiagnostics {
        let current_email = self.current_email();
        let keys = self.storage().list_keys().unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to list storage keys");
            Vec::new()
        });

        let partition_keys: Vec<String> = keys
            .iter()
            .filter(|key| storage_keys::is_history_key(key))
            .cloned()
            .collect();
        let legacy_keys: Vec<String> = keys
            .iter()
            .filter(|key| storage_keys::is_legacy_key(key))
            .cloned()
            .collect();

        tracing::info!(
            current_email = current_email.as_deref(),
            keys = keys.len(),
            partitions = partition_keys.len(),
            legacy = legacy_keys.len(),
            "history diagnostics"
        );

        let partitions = partition_keys
            .iter()
            .map(|key| {
                let dump = self.dump_partition(key);
                tracing::info!(key = %dump.key, status = ?dump.status, "partition");
                dump
            })
            .collect();

        HistoryDiagnostics {
            current_email,
            keys,
            partition_keys,
            legacy_keys,
            partitions,
        }
    }

    fn dump_partition(&self, key: &str) -> PartitionDump {
        let raw = match self.storage().get(key) {
            Ok(raw) => raw,
            Err(e) => {
                return PartitionDump {
                    key: key.to_string(),
                    status: PartitionStatus::Unreadable {
                        error: e.to_string(),
                    },
                    entries: Vec::new(),
                };
            }
        };

        let (status, entries) = match RawPartition::parse(raw.as_deref()) {
            RawPartition::Entries(entries) => (
                PartitionStatus::Ok {
                    records: entries.len(),
                },
                entries,
            ),
            RawPartition::Missing => (PartitionStatus::Missing, Vec::new()),
            RawPartition::InvalidJson(e) => (
                PartitionStatus::InvalidJson {
                    error: e.to_string(),
                },
                Vec::new(),
            ),
            RawPartition::NotArray(found) => (
                PartitionStatus::NotArray {
                    found: found.to_string(),
                },
                Vec::new(),
            ),
        };

        PartitionDump {
            key: key.to_string(),
            status,
            entries,
        }
    }
}
