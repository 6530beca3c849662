// src/batch/runner.rs
use chrono::{DateTime, Utc};
use indicatif::ProgressBar;
use log::{debug, error, info, warn};
use std::time::Instant;

use crate::batch::report::{BatchOutcome, RowFailure};
use crate::error::{RiskError, RiskResult};
use crate::features::{FeatureSchema, FieldLayout, Preprocessor};
use crate::models::{BatchRun, PatientRecord, PredictionRecord};
use crate::scoring::{validate_probability, Scorer};
use crate::utils::config::ScoringConfig;

/// Hands out `scored_at` timestamps that never go backwards within a batch,
/// even if the wall clock is stepped while the batch runs.
#[derive(Debug, Default)]
struct BatchClock {
    last: Option<DateTime<Utc>>,
}

impl BatchClock {
    fn now(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let ts = match self.last {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last = Some(ts);
        ts
    }
}

/// Scores one batch of aggregated patient records.
///
/// Rows are processed in input order. A malformed field or an unavailable
/// scorer skips only that patient; a schema mismatch aborts the batch.
pub struct BatchRunner<'a> {
    schema: &'a FeatureSchema,
    preprocessor: Preprocessor,
    config: ScoringConfig,
    progress: Option<ProgressBar>,
    detailed_progress: bool,
}

impl<'a> BatchRunner<'a> {
    pub fn new(
        schema: &'a FeatureSchema,
        layout: FieldLayout,
        config: ScoringConfig,
    ) -> RiskResult<Self> {
        config.validate()?;
        let preprocessor = Preprocessor::new(layout, schema);
        Ok(Self {
            schema,
            preprocessor,
            config,
            progress: None,
            detailed_progress: false,
        })
    }

    /// Attach a progress bar; `detailed` puts the current patient id in its message.
    pub fn with_progress(mut self, progress: Option<ProgressBar>, detailed: bool) -> Self {
        self.progress = progress;
        self.detailed_progress = detailed;
        self
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn schema(&self) -> &FeatureSchema {
        self.schema
    }

    pub async fn run<S: Scorer>(
        &self,
        scorer: &S,
        records: &[PatientRecord],
    ) -> RiskResult<BatchOutcome> {
        let start_time = Instant::now();
        let run = BatchRun::start();
        info!(
            "🫀 Starting batch run {} with {} record(s), scorer '{}', schema {}",
            run.run_id,
            records.len(),
            scorer.name(),
            self.schema.version()
        );

        if let Some(expected) = scorer.expected_features() {
            self.schema.ensure_matches(expected, scorer.name())?;
            debug!("Scorer '{}' feature order matches schema", scorer.name());
        }

        let limit = records.len().min(self.config.max_rows_per_batch);
        let (batch, deferred) = records.split_at(limit);
        if !deferred.is_empty() {
            warn!(
                "Input has {} rows; scoring the first {} and deferring {} to a later run",
                records.len(),
                limit,
                deferred.len()
            );
        }

        if let Some(pb) = &self.progress {
            pb.set_length(batch.len() as u64);
        }

        let mut clock = BatchClock::default();
        let mut predictions = Vec::with_capacity(batch.len());
        let mut failures = Vec::new();

        for record in batch {
            let patient_id = self.preprocessor.patient_id(record);
            if self.detailed_progress {
                if let Some(pb) = &self.progress {
                    pb.set_message(format!("Scoring {}", patient_id));
                }
            }

            match self.score_record(scorer, record).await {
                Ok(score) => {
                    let prediction = PredictionRecord::new(
                        patient_id,
                        score,
                        self.config.threshold,
                        clock.now(),
                    );
                    if prediction.is_high_risk() {
                        warn!(
                            "⚠️  {} is {} (score={:.3} > {:.3})",
                            prediction.patient_id,
                            prediction.risk_status,
                            score,
                            self.config.threshold
                        );
                    } else {
                        info!(
                            "Risk score for {}: {:.3} ({})",
                            prediction.patient_id, score, prediction.risk_status
                        );
                    }
                    predictions.push(prediction);
                }
                Err(e) if e.is_row_local() => {
                    warn!("Skipping patient {} (row {}): {}", patient_id, record.row_number, e);
                    failures.push(RowFailure {
                        patient_id,
                        row_number: record.row_number,
                        kind: e.kind(),
                        message: e.to_string(),
                    });
                }
                Err(e) => {
                    error!(
                        "Batch run {} aborted at patient {} (row {}): {}",
                        run.run_id, patient_id, record.row_number, e
                    );
                    if let Some(pb) = &self.progress {
                        pb.abandon_with_message("Batch aborted");
                    }
                    return Err(e);
                }
            }

            if let Some(pb) = &self.progress {
                pb.inc(1);
            }
        }

        if let Some(pb) = &self.progress {
            pb.finish_with_message(format!(
                "Scored {} patient(s), {} skipped",
                predictions.len(),
                failures.len()
            ));
        }

        let high_risk: Vec<PredictionRecord> = predictions
            .iter()
            .filter(|p| p.is_high_risk())
            .cloned()
            .collect();

        info!(
            "✅ Batch run {} finished in {:.2?}: {} scored, {} high risk, {} failed, {} deferred",
            run.run_id,
            start_time.elapsed(),
            predictions.len(),
            high_risk.len(),
            failures.len(),
            deferred.len()
        );

        Ok(BatchOutcome {
            run,
            schema_version: self.schema.version().to_string(),
            input_rows: records.len(),
            deferred_rows: deferred.len(),
            predictions,
            high_risk,
            failures,
        })
    }

    async fn score_record<S: Scorer>(&self, scorer: &S, record: &PatientRecord) -> RiskResult<f64> {
        let vector = self.preprocessor.transform(record, self.schema)?;
        vector.ensure_aligned(self.schema)?;

        let score = match tokio::time::timeout(self.config.scoring_timeout, scorer.score(&vector))
            .await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(RiskError::ScoringUnavailable(format!(
                    "'{}' did not answer within {:.1}s",
                    scorer.name(),
                    self.config.scoring_timeout.as_secs_f64()
                )))
            }
        };
        validate_probability(score)
    }
}
