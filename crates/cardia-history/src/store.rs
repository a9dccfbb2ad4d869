use jiff::Timestamp;
use serde_json::Value;

use cardia_core::identity;
use cardia_core::models::AssessmentRecord;
use cardia_core::models::{heal, record_id};
use cardia_core::storage_keys;
use cardia_storage::{KeyValueStore, StorageError};

use crate::config::HistoryConfig;
use crate::error::HistoryError;
use crate::events::{HistoryAction, HistoryEvent};
use crate::partition::{self, RawPartition};

/// Per-identity assessment history over a key-value store.
///
/// Each identity (a lower-cased email) owns one partition, stored under
/// `assessmentHistory_<identity>` as a JSON array with the most recently
/// saved record first.
///
/// Writes are read-modify-write on the whole partition. Without
/// [`HistoryConfig::optimistic_writes`] two writers racing on one partition
/// can lose a record.
pub struct AssessmentHistoryStore<S> {
    storage: S,
    config: HistoryConfig,
}

/// Result of a partition update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Update {
    Written,
    Unchanged,
}

impl<S: KeyValueStore> AssessmentHistoryStore<S> {
    pub fn new(storage: S) -> Self {
        Self::with_config(storage, HistoryConfig::default())
    }

    pub fn with_config(storage: S, config: HistoryConfig) -> Self {
        Self { storage, config }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Current identity
    // -----------------------------------------------------------------------

    /// Remember `email` (lower-cased) as the current identity.
    /// Does nothing for an empty string.
    pub fn save_current_email(&self, email: &str) {
        if let Err(e) = self.write_current_email(email, false) {
            tracing::error!(error = %e, "failed to save current email");
        }
    }

    pub fn try_save_current_email(&self, email: &str) -> Result<(), HistoryError> {
        self.write_current_email(email, self.config.strict)
    }

    fn write_current_email(&self, email: &str, strict: bool) -> Result<(), HistoryError> {
        let Some(identity) = self.require_identity(email, strict)? else {
            return Ok(());
        };
        self.storage
            .set(storage_keys::CURRENT_USER_EMAIL, &identity)?;
        HistoryEvent::new(HistoryAction::IdentitySet, storage_keys::CURRENT_USER_EMAIL)
            .identity(identity)
            .emit();
        Ok(())
    }

    /// The current identity, or `None` if none is stored or storage fails.
    pub fn current_email(&self) -> Option<String> {
        self.try_current_email().unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to read current email");
            None
        })
    }

    pub fn try_current_email(&self) -> Result<Option<String>, HistoryError> {
        Ok(self
            .storage
            .get(storage_keys::CURRENT_USER_EMAIL)?
            .filter(|email| !email.is_empty()))
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Every decodable record for `email`, most recently saved first.
    ///
    /// Empty when the email is empty, nothing is stored, the stored value is
    /// corrupt, or storage fails.
    pub fn assessment_history(&self, email: &str) -> Vec<AssessmentRecord> {
        self.load_history(email, false).unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to load assessment history");
            Vec::new()
        })
    }

    pub fn try_assessment_history(
        &self,
        email: &str,
    ) -> Result<Vec<AssessmentRecord>, HistoryError> {
        self.load_history(email, self.config.strict)
    }

    fn load_history(&self, email: &str, strict: bool) -> Result<Vec<AssessmentRecord>, HistoryError> {
        let Some(identity) = self.require_identity(email, strict)? else {
            return Ok(Vec::new());
        };
        let key = storage_keys::history(&identity);
        let (_, partition) = self.read_partition(&key)?;
        let entries = self.usable_entries(&key, partition, strict)?;
        Ok(partition::decode_records(&key, entries))
    }

    /// Every key in the current partition scheme.
    pub fn partition_keys(&self) -> Result<Vec<String>, HistoryError> {
        Ok(self
            .storage
            .list_keys()?
            .into_iter()
            .filter(|key| storage_keys::is_history_key(key))
            .collect())
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Insert `assessment` at the head of `email`'s history, filling in a
    /// missing id and timestamp first. Returns the record as stored.
    ///
    /// Does nothing (and returns `None`) for an empty email or on failure.
    pub fn save_assessment(
        &self,
        email: &str,
        assessment: AssessmentRecord,
    ) -> Option<AssessmentRecord> {
        self.insert_record(email, assessment, false)
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "failed to save assessment");
                None
            })
    }

    pub fn try_save_assessment(
        &self,
        email: &str,
        assessment: AssessmentRecord,
    ) -> Result<Option<AssessmentRecord>, HistoryError> {
        self.insert_record(email, assessment, self.config.strict)
    }

    fn insert_record(
        &self,
        email: &str,
        mut assessment: AssessmentRecord,
        strict: bool,
    ) -> Result<Option<AssessmentRecord>, HistoryError> {
        let Some(identity) = self.require_identity(email, strict)? else {
            return Ok(None);
        };
        let now = Timestamp::now();
        if assessment.id().is_none() {
            assessment.id = Some(record_id::generate(now));
        }
        if assessment.timestamp.is_none() {
            assessment.timestamp = Some(now);
        }

        let value = serde_json::to_value(&assessment)?;
        self.insert_head(&identity, value, strict)?;
        Ok(Some(assessment))
    }

    /// Insert an untyped record, as read from legacy storage or an external
    /// caller, at the head of `email`'s history. The record is stored as-is
    /// apart from id and timestamp healing; it does not have to decode as an
    /// [`AssessmentRecord`].
    ///
    /// Anything other than a JSON object counts as a missing assessment and
    /// is ignored. Returns the stored record's id.
    pub fn save_assessment_value(&self, email: &str, assessment: Value) -> Option<String> {
        self.insert_value(email, assessment, false)
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "failed to save assessment");
                None
            })
    }

    pub fn try_save_assessment_value(
        &self,
        email: &str,
        assessment: Value,
    ) -> Result<Option<String>, HistoryError> {
        self.insert_value(email, assessment, self.config.strict)
    }

    pub(crate) fn insert_value(
        &self,
        email: &str,
        assessment: Value,
        strict: bool,
    ) -> Result<Option<String>, HistoryError> {
        let Some(identity) = self.require_identity(email, strict)? else {
            return Ok(None);
        };
        let Value::Object(mut record) = assessment else {
            tracing::error!(identity = %identity, "assessment is missing or not an object, nothing saved");
            return if strict {
                Err(HistoryError::MissingArgument("assessment"))
            } else {
                Ok(None)
            };
        };

        heal::heal(&mut record, Timestamp::now());
        let id = heal::id_of(&record).map(str::to_string);
        self.insert_head(&identity, Value::Object(record), strict)?;
        Ok(id)
    }

    fn insert_head(&self, identity: &str, entry: Value, strict: bool) -> Result<(), HistoryError> {
        let key = storage_keys::history(identity);
        let id = partition::entry_id(&entry).map(str::to_string);

        self.update_partition(&key, strict, |entries| {
            entries.insert(0, entry.clone());
            true
        })?;

        let mut event = HistoryEvent::new(HistoryAction::RecordSaved, &key).identity(identity);
        if let Some(id) = id {
            event = event.record_id(id);
        }
        event.emit();
        Ok(())
    }

    /// Remove the record with `id` from `email`'s history, keeping the order
    /// of the rest. Removing an id that is not there is a no-op.
    pub fn delete_history_item(&self, email: &str, id: &str) {
        if let Err(e) = self.remove_record(email, id, false) {
            tracing::error!(error = %e, "failed to delete history item");
        }
    }

    /// Returns whether a record was removed.
    pub fn try_delete_history_item(&self, email: &str, id: &str) -> Result<bool, HistoryError> {
        self.remove_record(email, id, self.config.strict)
    }

    fn remove_record(&self, email: &str, id: &str, strict: bool) -> Result<bool, HistoryError> {
        let Some(identity) = self.require_identity(email, strict)? else {
            return Ok(false);
        };
        if id.is_empty() {
            tracing::error!(identity = %identity, "no record id given, nothing deleted");
            return if strict {
                Err(HistoryError::MissingArgument("id"))
            } else {
                Ok(false)
            };
        }

        let key = storage_keys::history(&identity);
        let outcome = self.update_partition(&key, strict, |entries| {
            let before = entries.len();
            entries.retain(|entry| partition::entry_id(entry) != Some(id));
            entries.len() != before
        })?;

        if outcome == Update::Unchanged {
            tracing::debug!(key = %key, id, "no record with that id");
            return Ok(false);
        }
        HistoryEvent::new(HistoryAction::RecordDeleted, &key)
            .identity(identity)
            .record_id(id)
            .emit();
        Ok(true)
    }

    /// Drop `email`'s whole partition.
    pub fn clear_assessment_history(&self, email: &str) {
        if let Err(e) = self.remove_partition(email, false) {
            tracing::error!(error = %e, "failed to clear assessment history");
        }
    }

    pub fn try_clear_assessment_history(&self, email: &str) -> Result<(), HistoryError> {
        self.remove_partition(email, self.config.strict)
    }

    fn remove_partition(&self, email: &str, strict: bool) -> Result<(), HistoryError> {
        let Some(identity) = self.require_identity(email, strict)? else {
            return Ok(());
        };
        let key = storage_keys::history(&identity);
        self.storage.remove(&key)?;
        HistoryEvent::new(HistoryAction::PartitionCleared, &key)
            .identity(identity)
            .emit();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Shared plumbing
    // -----------------------------------------------------------------------

    /// Normalize a caller-supplied email. An empty one is logged and yields
    /// `None`, or an error when `strict`.
    pub(crate) fn require_identity(
        &self,
        email: &str,
        strict: bool,
    ) -> Result<Option<String>, HistoryError> {
        match identity::normalize(email) {
            Some(identity) => Ok(Some(identity)),
            None if strict => Err(HistoryError::MissingArgument("email")),
            None => {
                tracing::error!("no email given, history operation skipped");
                Ok(None)
            }
        }
    }

    /// Read a partition, returning the raw stored text alongside the parse.
    pub(crate) fn read_partition(
        &self,
        key: &str,
    ) -> Result<(Option<String>, RawPartition), HistoryError> {
        let raw = self.storage.get(key)?;
        let partition = RawPartition::parse(raw.as_deref());
        Ok((raw, partition))
    }

    /// The entries of a parsed partition. Corrupt values are an error when
    /// `strict`, and an empty list otherwise.
    pub(crate) fn usable_entries(
        &self,
        key: &str,
        partition: RawPartition,
        strict: bool,
    ) -> Result<Vec<Value>, HistoryError> {
        if strict && let Some(reason) = partition.corruption() {
            return Err(HistoryError::Corrupt {
                key: key.to_string(),
                reason,
            });
        }
        partition.warn_if_corrupt(key);
        Ok(match partition {
            RawPartition::Entries(entries) => entries,
            _ => Vec::new(),
        })
    }

    /// Apply `mutate` to the partition at `key` and write the result back.
    ///
    /// `mutate` returns whether it changed anything; nothing is written when
    /// it did not. With optimistic writes the partition is re-read and
    /// `mutate` re-applied after each conflicting write, so it must be
    /// repeatable.
    pub(crate) fn update_partition<F>(
        &self,
        key: &str,
        strict: bool,
        mut mutate: F,
    ) -> Result<Update, HistoryError>
    where
        F: FnMut(&mut Vec<Value>) -> bool,
    {
        let attempts = if self.config.optimistic_writes {
            self.config.max_write_attempts.max(1)
        } else {
            1
        };

        for attempt in 1..=attempts {
            let (raw, partition) = self.read_partition(key)?;
            let mut entries = self.usable_entries(key, partition, strict)?;
            if !mutate(&mut entries) {
                return Ok(Update::Unchanged);
            }
            let encoded = serde_json::to_string(&entries)?;

            if !self.config.optimistic_writes {
                self.storage.set(key, &encoded)?;
                return Ok(Update::Written);
            }

            match self
                .storage
                .compare_and_set(key, raw.as_deref(), &encoded)
            {
                Ok(()) => return Ok(Update::Written),
                Err(StorageError::PreconditionFailed { .. }) => {
                    tracing::debug!(key, attempt, "partition changed underneath write, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        tracing::warn!(key, attempts, "giving up on contended partition write");
        Err(HistoryError::Conflict {
            key: key.to_string(),
            attempts,
        })
    }
}
