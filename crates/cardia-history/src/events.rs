use serde::Serialize;
use tracing::info;

/// What a history mutation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    IdentitySet,
    RecordSaved,
    RecordDeleted,
    PartitionCleared,
    LegacyMigrated,
    PartitionHealed,
    PartitionsConsolidated,
    PartitionRelocated,
}

impl HistoryAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IdentitySet => "identity_set",
            Self::RecordSaved => "record_saved",
            Self::RecordDeleted => "record_deleted",
            Self::PartitionCleared => "partition_cleared",
            Self::LegacyMigrated => "legacy_migrated",
            Self::PartitionHealed => "partition_healed",
            Self::PartitionsConsolidated => "partitions_consolidated",
            Self::PartitionRelocated => "partition_relocated",
        }
    }
}

/// A structured event for every write the history store performs.
///
/// Emitted through `tracing` under the `cardia::audit` target so operators
/// can route mutations separately from diagnostic logging.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEvent {
    pub action: HistoryAction,
    pub key: String,
    pub identity: Option<String>,
    pub record_id: Option<String>,
    pub count: Option<usize>,
}

impl HistoryEvent {
    pub fn new(action: HistoryAction, key: impl Into<String>) -> Self {
        Self {
            action,
            key: key.into(),
            identity: None,
            record_id: None,
            count: None,
        }
    }

    pub fn identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    pub fn record_id(mut self, id: impl Into<String>) -> Self {
        self.record_id = Some(id.into());
        self
    }

    pub fn count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    pub fn emit(&self) {
        info!(
            target: "cardia::audit",
            action = self.action.as_str(),
            key = %self.key,
            identity = self.identity.as_deref(),
            record_id = self.record_id.as_deref(),
            count = self.count,
            "history event"
        );
    }
}
