use serde::{Deserialize, Serialize};

use cardia_core::identity::GUEST_IDENTITY;

/// Behavior switches for [`AssessmentHistoryStore`](crate::AssessmentHistoryStore).
///
/// The defaults reproduce what browser clients have always done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Make the `try_*` operations reject empty arguments and corrupt
    /// partitions instead of treating them as no-ops and empty lists.
    /// The plain operations are lenient regardless.
    pub strict: bool,

    /// Write partitions with compare-and-set and retry on conflict, so two
    /// writers on the same partition cannot silently drop each other's
    /// records. Off by default: clients historically did an unguarded
    /// read-modify-write.
    pub optimistic_writes: bool,

    /// Attempts per write when `optimistic_writes` is on. Zero is treated as one.
    pub max_write_attempts: u32,

    /// Owner for migrated legacy data when neither the key nor the current
    /// identity says whose it is.
    pub placeholder_identity: String,

    /// Delete a legacy key once every item in it has been migrated.
    /// Off by default, so running migration twice duplicates records.
    pub remove_migrated_keys: bool,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            strict: false,
            optimistic_writes: false,
            max_write_attempts: 3,
            placeholder_identity: GUEST_IDENTITY.to_string(),
            remove_migrated_keys: false,
        }
    }
}
