use serde::{Deserialize, Serialize};

use super::clinical::ClinicalValue;
use super::result::RiskResult;

/// One completed risk assessment, as persisted in a history partition.
///
/// `id` and `timestamp` are optional here because callers usually leave them
/// unset; the store fills both in before anything is written. Fields the
/// store does not know about are carried in `extra` and written back
/// unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(
        default,
        with = "super::timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<jiff::Timestamp>,

    // Clinical inputs
    pub age: ClinicalValue,
    pub sex: ClinicalValue,
    pub trestbps: ClinicalValue,
    pub chol: ClinicalValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cp: Option<ClinicalValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fbs: Option<ClinicalValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restecg: Option<ClinicalValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thalach: Option<ClinicalValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exang: Option<ClinicalValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oldpeak: Option<ClinicalValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slope: Option<ClinicalValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca: Option<ClinicalValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thal: Option<ClinicalValue>,

    // Lifestyle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub food_habits: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub junk_food_consumption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleeping_hours: Option<String>,

    pub result: RiskResult,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl AssessmentRecord {
    /// A record with the four required clinical inputs and a result.
    /// Everything else starts empty.
    pub fn new(
        age: impl Into<ClinicalValue>,
        sex: impl Into<ClinicalValue>,
        trestbps: impl Into<ClinicalValue>,
        chol: impl Into<ClinicalValue>,
        result: RiskResult,
    ) -> Self {
        Self {
            id: None,
            timestamp: None,
            age: age.into(),
            sex: sex.into(),
            trestbps: trestbps.into(),
            chol: chol.into(),
            cp: None,
            fbs: None,
            restecg: None,
            thalach: None,
            exang: None,
            oldpeak: None,
            slope: None,
            ca: None,
            thal: None,
            food_habits: None,
            junk_food_consumption: None,
            sleeping_hours: None,
            result,
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: jiff::Timestamp) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// The record's id, treating an empty string as absent.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }
}
