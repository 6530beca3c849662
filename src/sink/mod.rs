// src/sink/mod.rs
pub mod csv_sink;

use std::path::PathBuf;

use crate::error::RiskResult;
use crate::models::{BatchRun, PredictionRecord};

pub use csv_sink::CsvResultSink;

/// Where a batch run's predictions ended up.
#[derive(Debug, Clone, PartialEq)]
pub struct SinkArtifact {
    pub path: PathBuf,
    pub rows: usize,
}

/// Append-only store of batch outputs: one new artifact per run, never an
/// update in place. Failures are `RiskError::SinkWrite`.
pub trait ResultSink {
    fn write_batch(&self, run: &BatchRun, records: &[PredictionRecord]) -> RiskResult<SinkArtifact>;
}
