//! One-time migration from legacy history key schemes.
//!
//! Older clients stored history under keys such as
//! `heart_assessment_history_<email>` or `heart_history_<email>`. Migration
//! replays every item from those keys into the current scheme.

use serde::Serialize;

use cardia_core::identity;
use cardia_core::storage_keys;
use cardia_storage::KeyValueStore;

use crate::error::HistoryError;
use crate::events::{HistoryAction, HistoryEvent};
use crate::partition::{RawPartition, json_type};
use crate::store::AssessmentHistoryStore;

/// Which link of the fallback chain picked the owner of a legacy key.
///
/// Owner inference is a heuristic; this records how much to trust it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerInference {
    /// The key's last `_` segment looked like an email.
    KeySuffix,
    /// The key named no one; the current identity was used.
    CurrentIdentity,
    /// Nothing to go on; the configured placeholder was used.
    Placeholder,
}

/// Outcome for one legacy key.
#[derive(Debug, Clone, Serialize)]
pub struct MigratedKey {
    pub key: String,
    pub owner: String,
    pub inference: OwnerInference,
    pub migrated: usize,
    pub skipped: usize,
    pub removed: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MigrationReport {
    pub keys: Vec<MigratedKey>,
    /// Legacy keys that could not be processed, with the reason.
    pub failed: Vec<(String, String)>,
}

impl MigrationReport {
    pub fn migrated_items(&self) -> usize {
        self.keys.iter().map(|k| k.migrated).sum()
    }
}

impl<S: KeyValueStore> AssessmentHistoryStore<S> {
    /// Move history out of every legacy key into the current scheme.
    /// Returns `true` if at least one item was migrated.
    pub fn migrate_old_history(&self) -> bool {
        match self.try_migrate_old_history() {
            Ok(report) => report.migrated_items() > 0,
            Err(e) => {
                tracing::error!(error = %e, "legacy history migration failed");
                false
            }
        }
    }

    /// Migrate every legacy key. Only a failure to list keys is an error;
    /// problems with individual keys are logged, recorded in the report, and
    /// skipped.
    pub fn try_migrate_old_history(&self) -> Result<MigrationReport, HistoryError> {
        let mut report = MigrationReport::default();

        let legacy_keys: Vec<String> = self
            .storage()
            .list_keys()?
            .into_iter()
            .filter(|key| storage_keys::is_legacy_key(key))
            .collect();

        if legacy_keys.is_empty() {
            tracing::debug!("no legacy history keys found");
            return Ok(report);
        }

        for key in legacy_keys {
            match self.migrate_key(&key) {
                Ok(Some(migrated)) => report.keys.push(migrated),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "skipping legacy key");
                    report.failed.push((key, e.to_string()));
                }
            }
        }

        tracing::info!(
            keys = report.keys.len(),
            items = report.migrated_items(),
            failed = report.failed.len(),
            "legacy history migration finished"
        );
        Ok(report)
    }

    fn migrate_key(&self, key: &str) -> Result<Option<MigratedKey>, HistoryError> {
        let raw = self.storage().get(key)?;
        let entries = match RawPartition::parse(raw.as_deref()) {
            RawPartition::Entries(entries) if !entries.is_empty() => entries,
            RawPartition::Entries(_) | RawPartition::Missing => {
                tracing::debug!(key, "legacy key is empty");
                return Ok(None);
            }
            corrupt => {
                let reason = corrupt.corruption().unwrap_or_default();
                return Err(HistoryError::Corrupt {
                    key: key.to_string(),
                    reason,
                });
            }
        };

        let (owner, inference) = self.infer_owner(key);
        tracing::info!(key, owner = %owner, ?inference, items = entries.len(), "migrating legacy history");

        // Replayed last-to-first: each save inserts at the head, so this
        // keeps the legacy array's order.
        let mut migrated = 0;
        let mut skipped = 0;
        for entry in entries.into_iter().rev() {
            if !entry.is_object() {
                tracing::warn!(key, found = json_type(&entry), "skipping non-object legacy entry");
                skipped += 1;
                continue;
            }
            match self.insert_value(&owner, entry, false) {
                Ok(Some(_)) => migrated += 1,
                Ok(None) => skipped += 1,
                Err(e) => {
                    tracing::warn!(key, error = %e, "failed to migrate legacy entry");
                    skipped += 1;
                }
            }
        }

        let mut removed = false;
        if self.config().remove_migrated_keys && skipped == 0 {
            self.storage().remove(key)?;
            removed = true;
        }

        HistoryEvent::new(HistoryAction::LegacyMigrated, key)
            .identity(owner.clone())
            .count(migrated)
            .emit();

        Ok(Some(MigratedKey {
            key: key.to_string(),
            owner,
            inference,
            migrated,
            skipped,
            removed,
        }))
    }

    /// Owner for a legacy key: the email embedded in the key, else the
    /// current identity, else the placeholder.
    pub fn infer_owner(&self, key: &str) -> (String, OwnerInference) {
        if let Some(owner) = storage_keys::legacy_owner_hint(key).and_then(identity::normalize) {
            return (owner, OwnerInference::KeySuffix);
        }
        if let Some(current) = self.current_email() {
            return (current, OwnerInference::CurrentIdentity);
        }
        (
            self.config().placeholder_identity.to_lowercase(),
            OwnerInference::Placeholder,
        )
    }
}
