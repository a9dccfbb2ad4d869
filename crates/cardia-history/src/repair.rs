//! Repair tools for partitions that have drifted: missing or duplicate ids,
//! numeric timestamps, and history split across several keys for one
//! identity.

use std::collections::HashSet;

use jiff::Timestamp;
use serde::Serialize;
use serde_json::Value;

use cardia_core::models::heal;
use cardia_core::storage_keys;
use cardia_storage::KeyValueStore;

use crate::error::HistoryError;
use crate::events::{HistoryAction, HistoryEvent};
use crate::partition::{self, RawPartition};
use crate::store::{AssessmentHistoryStore, Update};

/// What a repair did to the target partition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepairReport {
    pub partition: String,
    pub records: usize,
    pub ids_assigned: usize,
    pub timestamps_assigned: usize,
    pub timestamps_normalized: usize,
    pub duplicates_reassigned: usize,
    pub duplicates_dropped: usize,
    /// Keys whose records were merged into the partition.
    pub merged_from: Vec<String>,
    /// Keys deleted after their records were merged.
    pub removed_keys: Vec<String>,
    pub written: bool,
}

impl RepairReport {
    fn for_partition(key: &str) -> Self {
        Self {
            partition: key.to_string(),
            ..Self::default()
        }
    }

    fn changed(&self) -> bool {
        self.ids_assigned
            + self.timestamps_assigned
            + self.timestamps_normalized
            + self.duplicates_reassigned
            + self.duplicates_dropped
            > 0
            || !self.merged_from.is_empty()
    }
}

/// Heal every object entry, giving fresh ids to any that repeat an earlier
/// entry's id.
fn heal_entries(entries: &mut [Value], now: Timestamp, report: &mut RepairReport) {
    let mut seen = HashSet::new();
    for entry in entries.iter_mut() {
        let Value::Object(record) = entry else {
            continue;
        };
        if let Some(id) = heal::id_of(record)
            && !seen.insert(id.to_string())
        {
            let fresh = heal::reassign_id(record, now);
            seen.insert(fresh);
            report.duplicates_reassigned += 1;
        }
        let healed = heal::heal(record, now);
        report.ids_assigned += usize::from(healed.id_assigned);
        report.timestamps_assigned += usize::from(healed.timestamp_assigned);
        report.timestamps_normalized += usize::from(healed.timestamp_normalized);
        if healed.id_assigned
            && let Some(id) = heal::id_of(record)
        {
            seen.insert(id.to_string());
        }
    }
}

/// Append `incoming` after `entries`, dropping any whose id is already
/// present. Entries without an id are always kept; healing gives them one.
fn merge_dedup(entries: &mut Vec<Value>, incoming: &[Value]) -> usize {
    let mut seen: HashSet<String> = entries
        .iter()
        .filter_map(partition::entry_id)
        .map(str::to_string)
        .collect();
    let mut dropped = 0;
    for entry in incoming {
        match partition::entry_id(entry) {
            Some(id) if !seen.insert(id.to_string()) => dropped += 1,
            _ => entries.push(entry.clone()),
        }
    }
    dropped
}

impl<S: KeyValueStore> AssessmentHistoryStore<S> {
    /// Fix `email`'s partition in place: assign missing ids and timestamps,
    /// rewrite numeric timestamps as strings, and re-id duplicates.
    /// Writes only if something changed.
    pub fn heal_partition(&self, email: &str) -> RepairReport {
        self.heal_in_place(email, false).unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to heal partition");
            RepairReport::default()
        })
    }

    pub fn try_heal_partition(&self, email: &str) -> Result<RepairReport, HistoryError> {
        self.heal_in_place(email, self.config().strict)
    }

    fn heal_in_place(&self, email: &str, strict: bool) -> Result<RepairReport, HistoryError> {
        let Some(identity) = self.require_identity(email, strict)? else {
            return Ok(RepairReport::default());
        };
        let key = storage_keys::history(&identity);
        let now = Timestamp::now();

        let mut report = RepairReport::for_partition(&key);
        let outcome = self.update_partition(&key, strict, |entries| {
            report = RepairReport::for_partition(&key);
            heal_entries(entries, now, &mut report);
            report.records = entries.len();
            report.changed()
        })?;
        report.written = outcome == Update::Written;

        if report.written {
            HistoryEvent::new(HistoryAction::PartitionHealed, &key)
                .identity(identity)
                .count(report.records)
                .emit();
        }
        Ok(report)
    }

    /// Gather everything that belongs to `email` into its canonical
    /// partition.
    ///
    /// Sources are current-scheme partitions whose identity differs only in
    /// case, and legacy keys naming the same email. Legacy keys naming no one
    /// are included when `email` is the current identity. Existing records
    /// come first, then each source in key order; later duplicates of an id
    /// are dropped. Merged source keys are deleted afterwards.
    pub fn consolidate_history(&self, email: &str) -> RepairReport {
        self.consolidate(email, false).unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to consolidate history");
            RepairReport::default()
        })
    }

    pub fn try_consolidate_history(&self, email: &str) -> Result<RepairReport, HistoryError> {
        self.consolidate(email, self.config().strict)
    }

    fn consolidate(&self, email: &str, strict: bool) -> Result<RepairReport, HistoryError> {
        let Some(identity) = self.require_identity(email, strict)? else {
            return Ok(RepairReport::default());
        };
        let target = storage_keys::history(&identity);
        let is_current = self.current_email().as_deref() == Some(identity.as_str());

        let mut sources = Vec::new();
        for key in self.storage().list_keys()? {
            if key == target {
                continue;
            }
            let belongs = if let Some(owner) = storage_keys::history_identity(&key) {
                owner.to_lowercase() == identity
            } else if storage_keys::is_legacy_key(&key) {
                match storage_keys::legacy_owner_hint(&key) {
                    Some(owner) => owner.to_lowercase() == identity,
                    None => is_current,
                }
            } else {
                false
            };
            if !belongs {
                continue;
            }

            let (_, raw) = self.read_partition(&key)?;
            match raw {
                RawPartition::Entries(entries) => sources.push((key, entries)),
                RawPartition::Missing => {}
                corrupt => {
                    tracing::warn!(
                        key = %key,
                        reason = %corrupt.corruption().unwrap_or_default(),
                        "not consolidating corrupt source"
                    );
                }
            }
        }

        let now = Timestamp::now();
        let mut report = RepairReport::for_partition(&target);
        let outcome = self.update_partition(&target, strict, |entries| {
            report = RepairReport::for_partition(&target);
            for (key, incoming) in &sources {
                report.duplicates_dropped += merge_dedup(entries, incoming);
                report.merged_from.push(key.clone());
            }
            heal_entries(entries, now, &mut report);
            report.records = entries.len();
            report.changed()
        })?;
        report.written = outcome == Update::Written;

        for (key, _) in &sources {
            self.storage().remove(key)?;
            report.removed_keys.push(key.clone());
        }

        if report.written || !report.removed_keys.is_empty() {
            HistoryEvent::new(HistoryAction::PartitionsConsolidated, &target)
                .identity(identity)
                .count(report.merged_from.len())
                .emit();
        }
        Ok(report)
    }

    /// Move `from`'s whole history after `to`'s records, dropping duplicate
    /// ids, then delete `from`'s partition.
    ///
    /// Does nothing when the identities are equal, either is empty, or the
    /// source holds nothing usable. A corrupt source is left in place.
    pub fn relocate_history(&self, from: &str, to: &str) -> RepairReport {
        self.relocate(from, to, false).unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to relocate history");
            RepairReport::default()
        })
    }

    pub fn try_relocate_history(&self, from: &str, to: &str) -> Result<RepairReport, HistoryError> {
        self.relocate(from, to, self.config().strict)
    }

    fn relocate(&self, from: &str, to: &str, strict: bool) -> Result<RepairReport, HistoryError> {
        let (Some(from_id), Some(to_id)) = (
            self.require_identity(from, strict)?,
            self.require_identity(to, strict)?,
        ) else {
            return Ok(RepairReport::default());
        };
        let source = storage_keys::history(&from_id);
        let target = storage_keys::history(&to_id);
        if source == target {
            return Ok(RepairReport::for_partition(&target));
        }

        let (_, raw) = self.read_partition(&source)?;
        let incoming = match raw {
            RawPartition::Entries(entries) => entries,
            RawPartition::Missing => return Ok(RepairReport::for_partition(&target)),
            corrupt => {
                let reason = corrupt.corruption().unwrap_or_default();
                if strict {
                    return Err(HistoryError::Corrupt { key: source, reason });
                }
                tracing::warn!(key = %source, reason = %reason, "not relocating corrupt partition");
                return Ok(RepairReport::for_partition(&target));
            }
        };

        let now = Timestamp::now();
        let mut report = RepairReport::for_partition(&target);
        let outcome = self.update_partition(&target, strict, |entries| {
            report = RepairReport::for_partition(&target);
            report.duplicates_dropped = merge_dedup(entries, &incoming);
            report.merged_from.push(source.clone());
            heal_entries(entries, now, &mut report);
            report.records = entries.len();
            report.changed()
        })?;
        report.written = outcome == Update::Written;

        self.storage().remove(&source)?;
        report.removed_keys.push(source.clone());

        HistoryEvent::new(HistoryAction::PartitionRelocated, &target)
            .identity(to_id)
            .count(incoming.len())
            .emit();
        Ok(report)
    }
}
