use std::fmt;

use serde::{Deserialize, Serialize};

/// A clinical input as entered on the assessment form.
///
/// Older clients stored these as strings, newer ones as numbers. The store
/// keeps whichever it was given and never coerces between them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClinicalValue {
    Number(serde_json::Number),
    Text(String),
}

impl ClinicalValue {
    /// Numeric view, parsing text when it holds a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64(),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for ClinicalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i32> for ClinicalValue {
    fn from(value: i32) -> Self {
        Self::Number(value.into())
    }
}

impl From<i64> for ClinicalValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<u32> for ClinicalValue {
    fn from(value: u32) -> Self {
        Self::Number(value.into())
    }
}

impl From<f64> for ClinicalValue {
    /// Non-finite values have no JSON number form and are kept as text.
    fn from(value: f64) -> Self {
        match serde_json::Number::from_f64(value) {
            Some(n) => Self::Number(n),
            None => Self::Text(value.to_string()),
        }
    }
}

impl From<&str> for ClinicalValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ClinicalValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}
