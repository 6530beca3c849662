// src/error.rs
use serde::Serialize;
use thiserror::Error;

/// Errors raised while shaping, scoring, persisting or alerting on a batch.
///
/// `MalformedField` and `ScoringUnavailable` are row-local: the batch runner
/// records them against the patient and moves on. Everything else stops the
/// batch (or, for `Dispatch`, is reported without touching persisted results).
#[derive(Debug, Error)]
pub enum RiskError {
    #[error("malformed field '{field}' (value {value:?}): {reason}")]
    MalformedField {
        field: String,
        value: String,
        reason: String,
    },

    #[error("scoring unavailable: {0}")]
    ScoringUnavailable(String),

    #[error("feature schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("alert dispatch failed for patient {patient_id}: {reason}")]
    Dispatch { patient_id: String, reason: String },

    #[error("result sink write failed: {0}")]
    SinkWrite(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("input error: {0}")]
    Input(String),
}

impl RiskError {
    pub fn malformed(field: &str, value: &str, reason: impl Into<String>) -> Self {
        RiskError::MalformedField {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            RiskError::MalformedField { .. } => ErrorKind::MalformedField,
            RiskError::ScoringUnavailable(_) => ErrorKind::ScoringUnavailable,
            RiskError::SchemaMismatch(_) => ErrorKind::SchemaMismatch,
            RiskError::Dispatch { .. } => ErrorKind::Dispatch,
            RiskError::SinkWrite(_) => ErrorKind::SinkWrite,
            RiskError::InvalidConfig(_) => ErrorKind::InvalidConfig,
            RiskError::Input(_) => ErrorKind::Input,
        }
    }

    /// Row-local errors skip the offending patient; the rest of the batch continues.
    pub fn is_row_local(&self) -> bool {
        matches!(
            self,
            RiskError::MalformedField { .. } | RiskError::ScoringUnavailable(_)
        )
    }
}

/// Error category, used as the key of per-batch error summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ErrorKind {
    MalformedField,
    ScoringUnavailable,
    SchemaMismatch,
    Dispatch,
    SinkWrite,
    InvalidConfig,
    Input,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MalformedField => "MalformedFieldError",
            ErrorKind::ScoringUnavailable => "ScoringUnavailableError",
            ErrorKind::SchemaMismatch => "SchemaMismatchError",
            ErrorKind::Dispatch => "DispatchError",
            ErrorKind::SinkWrite => "SinkWriteError",
            ErrorKind::InvalidConfig => "InvalidConfigError",
            ErrorKind::Input => "InputError",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub type RiskResult<T> = std::result::Result<T, RiskError>;
