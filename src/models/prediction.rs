// src/models/prediction.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskStatus {
    #[serde(rename = "HIGH_RISK")]
    HighRisk,
    #[serde(rename = "LOW_RISK")]
    LowRisk,
}

impl RiskStatus {
    /// Strictly greater than the threshold is high risk; a score equal to the
    /// threshold stays low risk.
    pub fn classify(risk_score: f64, threshold: f64) -> Self {
        if risk_score > threshold {
            RiskStatus::HighRisk
        } else {
            RiskStatus::LowRisk
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskStatus::HighRisk => "HIGH_RISK",
            RiskStatus::LowRisk => "LOW_RISK",
        }
    }
}

impl std::fmt::Display for RiskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A scored patient. Created once per patient per batch run and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub patient_id: String,
    pub risk_score: f64,
    pub risk_status: RiskStatus,
    pub scored_at: DateTime<Utc>,
}

impl PredictionRecord {
    pub fn new(patient_id: String, risk_score: f64, threshold: f64, scored_at: DateTime<Utc>) -> Self {
        Self {
            patient_id,
            risk_score,
            risk_status: RiskStatus::classify(risk_score, threshold),
            scored_at,
        }
    }

    pub fn is_high_risk(&self) -> bool {
        self.risk_status == RiskStatus::HighRisk
    }
}

/// Notification payload for one high-risk patient. Dispatched, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub patient_id: String,
    pub risk_score: f64,
    pub risk_status: RiskStatus,
}

impl Alert {
    pub fn message(&self) -> String {
        format!(
            "Heart health alert: patient {} scored {:.3} ({})",
            self.patient_id, self.risk_score, self.risk_status
        )
    }
}

impl From<&PredictionRecord> for Alert {
    fn from(record: &PredictionRecord) -> Self {
        Self {
            patient_id: record.patient_id.clone(),
            risk_score: record.risk_score,
            risk_status: record.risk_status,
        }
    }
}
