use serde_json::Value;

use cardia_core::models::AssessmentRecord;

/// A partition value as found in storage, before any interpretation.
#[derive(Debug)]
pub(crate) enum RawPartition {
    Missing,
    Entries(Vec<Value>),
    InvalidJson(serde_json::Error),
    NotArray(&'static str),
}

impl RawPartition {
    pub(crate) fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::Missing;
        };
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Array(entries)) => Self::Entries(entries),
            Ok(other) => Self::NotArray(json_type(&other)),
            Err(e) => Self::InvalidJson(e),
        }
    }

    /// Why this value cannot be used as a partition, if it cannot.
    pub(crate) fn corruption(&self) -> Option<String> {
        match self {
            Self::InvalidJson(e) => Some(format!("invalid JSON: {e}")),
            Self::NotArray(found) => Some(format!("valid JSON but not an array (found {found})")),
            Self::Missing | Self::Entries(_) => None,
        }
    }

    pub(crate) fn warn_if_corrupt(&self, key: &str) {
        match self {
            Self::InvalidJson(e) => {
                tracing::warn!(key, error = %e, "stored history is not valid JSON, treating as empty");
            }
            Self::NotArray(found) => {
                tracing::warn!(key, found, "stored history is valid JSON but not an array, treating as empty");
            }
            Self::Missing | Self::Entries(_) => {}
        }
    }
}

pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Decode entries into records, skipping any that do not fit the model.
/// Skipped entries stay in storage untouched.
pub(crate) fn decode_records(key: &str, entries: Vec<Value>) -> Vec<AssessmentRecord> {
    entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value(entry) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(key, index, error = %e, "skipping undecodable history entry");
                None
            }
        })
        .collect()
}

/// The id of a raw entry, if it is an object with a non-empty string id.
pub(crate) fn entry_id(entry: &Value) -> Option<&str> {
    entry
        .as_object()
        .and_then(cardia_core::models::heal::id_of)
}
