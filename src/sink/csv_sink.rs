// src/sink/csv_sink.rs
use chrono::SecondsFormat;
use log::{info, warn};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{RiskError, RiskResult};
use crate::models::{BatchRun, PredictionRecord};
use crate::sink::{ResultSink, SinkArtifact};

pub const PREDICTIONS_HEADER: [&str; 4] = ["patient_id", "risk_score", "risk_status", "scored_at"];

/// Writes each batch run to its own CSV file under `dir`:
/// `heart_attack_predictions_<YYYYmmdd_HHMMSS>_<run8>.csv`.
///
/// The artifact is published with a hard link, which fails rather than
/// replace an existing file, so a run can never overwrite a prior artifact
/// and concurrent runs land in distinct files.
#[derive(Debug, Clone)]
pub struct CsvResultSink {
    dir: PathBuf,
}

impl CsvResultSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn artifact_path(&self, run: &BatchRun) -> PathBuf {
        self.dir.join(format!(
            "heart_attack_predictions_{}_{}.csv",
            run.started_at.format("%Y%m%d_%H%M%S"),
            run.short_id()
        ))
    }

    /// Staging name for an artifact still being written.
    fn partial_path(path: &Path) -> PathBuf {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        path.with_file_name(format!(".{}.partial", name))
    }
}

fn sink_err(path: &Path, e: impl std::fmt::Display) -> RiskError {
    RiskError::SinkWrite(format!("{}: {}", path.display(), e))
}

fn write_rows<W: Write>(writer: W, records: &[PredictionRecord]) -> csv::Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(PREDICTIONS_HEADER)?;
    for record in records {
        let row = [
            record.patient_id.clone(),
            format!("{:.6}", record.risk_score),
            record.risk_status.to_string(),
            record.scored_at.to_rfc3339_opts(SecondsFormat::Micros, true),
        ];
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

impl ResultSink for CsvResultSink {
    /// Rows go to a hidden `.partial` file first; the artifact name only
    /// appears once every row is flushed, and is never replaced.
    fn write_batch(&self, run: &BatchRun, records: &[PredictionRecord]) -> RiskResult<SinkArtifact> {
        fs::create_dir_all(&self.dir).map_err(|e| sink_err(&self.dir, e))?;

        let path = self.artifact_path(run);
        if path.exists() {
            return Err(sink_err(&path, "artifact already exists"));
        }
        let partial = Self::partial_path(&path);
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&partial)
            .map_err(|e| sink_err(&partial, e))?;

        let written = write_rows(&file, records)
            .map_err(|e| sink_err(&partial, e))
            .and_then(|()| file.sync_all().map_err(|e| sink_err(&partial, e)))
            .and_then(|()| fs::hard_link(&partial, &path).map_err(|e| sink_err(&path, e)));

        if let Err(e) = fs::remove_file(&partial) {
            warn!("Could not remove staging file {}: {}", partial.display(), e);
        }
        written?;

        info!(
            "Predictions saved to {} ({} rows)",
            path.display(),
            records.len()
        );
        Ok(SinkArtifact {
            path,
            rows: records.len(),
        })
    }
}
