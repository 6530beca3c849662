// src/models/mod.rs
pub mod patient;
pub mod prediction;
pub mod run;

pub use patient::PatientRecord;
pub use prediction::{Alert, PredictionRecord, RiskStatus};
pub use run::BatchRun;
