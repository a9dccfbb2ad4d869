use std::fmt;

use serde::{Deserialize, Serialize};

/// Risk band reported by the prediction service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The opaque prediction outcome attached to an assessment.
///
/// `score` is whatever the caller received: some pages store a fraction
/// (0.0 to 1.0), others a percentage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskResult {
    pub risk: RiskLevel,
    pub score: f64,
    pub has_disease: bool,
}

impl RiskResult {
    pub fn new(risk: RiskLevel, score: f64, has_disease: bool) -> Self {
        Self {
            risk,
            score,
            has_disease,
        }
    }
}
