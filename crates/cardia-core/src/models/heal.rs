//! Write-time healing of raw records.
//!
//! Works on JSON objects rather than [`AssessmentRecord`](super::AssessmentRecord)
//! so that records the typed model cannot decode (legacy shapes, missing
//! `result`) are still stored intact.

use jiff::Timestamp;
use serde_json::{Map, Value};

use super::{record_id, timestamp};

/// What [`heal`] changed on one record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Healed {
    pub id_assigned: bool,
    pub timestamp_assigned: bool,
    pub timestamp_normalized: bool,
}

impl Healed {
    pub fn changed(&self) -> bool {
        self.id_assigned || self.timestamp_assigned || self.timestamp_normalized
    }
}

/// The record's id, if it has a usable one.
pub fn id_of(record: &Map<String, Value>) -> Option<&str> {
    record
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
}

/// Fill in a missing id and timestamp, and rewrite numeric (epoch millis)
/// and offset-less timestamps into canonical string form. Strings with an
/// explicit offset are left as written.
///
/// A timestamp that cannot be parsed at all is replaced with `now`; storing
/// it unchanged would leave a record no reader can date.
pub fn heal(record: &mut Map<String, Value>, now: Timestamp) -> Healed {
    let mut healed = Healed::default();

    if id_of(record).is_none() {
        record.insert("id".to_string(), Value::String(record_id::generate(now)));
        healed.id_assigned = true;
    }

    match record.get("timestamp") {
        None | Some(Value::Null) => {
            record.insert(
                "timestamp".to_string(),
                Value::String(timestamp::canonical(now)),
            );
            healed.timestamp_assigned = true;
        }
        Some(Value::String(s)) if timestamp::is_zoned(s) => {}
        Some(raw) => {
            let parsed = timestamp::parse_value(raw);
            let canonical = timestamp::canonical(*parsed.as_ref().unwrap_or(&now));
            record.insert("timestamp".to_string(), Value::String(canonical));
            match parsed {
                Ok(_) => healed.timestamp_normalized = true,
                Err(_) => healed.timestamp_assigned = true,
            }
        }
    }

    healed
}

/// Give a fresh id to the record, for resolving duplicates.
pub fn reassign_id(record: &mut Map<String, Value>, now: Timestamp) -> String {
    let id = record_id::generate(now);
    record.insert("id".to_string(), Value::String(id.clone()));
    id
}
