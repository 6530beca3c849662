// src/batch/report.rs
use serde::Serialize;
use std::collections::BTreeMap;

use crate::alerts::DispatchReport;
use crate::error::{ErrorKind, RiskError};
use crate::models::{Alert, BatchRun, PredictionRecord};
use crate::sink::SinkArtifact;

/// A patient skipped because of a row-local error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowFailure {
    pub patient_id: String,
    pub row_number: usize,
    pub kind: ErrorKind,
    pub message: String,
}

/// Everything one batch invocation produced. Owned by the caller once the
/// runner returns; nothing else outlives the batch.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub run: BatchRun,
    pub schema_version: String,
    /// Rows in the input artifact.
    pub input_rows: usize,
    /// Rows over the batch limit, left for a later run.
    pub deferred_rows: usize,
    /// Successful predictions, in input order.
    pub predictions: Vec<PredictionRecord>,
    /// The HIGH_RISK subset of `predictions`, for the alert dispatcher.
    pub high_risk: Vec<PredictionRecord>,
    pub failures: Vec<RowFailure>,
}

impl BatchOutcome {
    /// Rows the runner attempted (scored or failed).
    pub fn processed_rows(&self) -> usize {
        self.predictions.len() + self.failures.len()
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.high_risk.iter().map(Alert::from).collect()
    }

    /// patient id -> error kind, in input order.
    pub fn error_report(&self) -> Vec<(String, ErrorKind)> {
        self.failures
            .iter()
            .map(|f| (f.patient_id.clone(), f.kind))
            .collect()
    }

    pub fn error_counts(&self) -> BTreeMap<ErrorKind, usize> {
        let mut counts = BTreeMap::new();
        for failure in &self.failures {
            *counts.entry(failure.kind).or_insert(0) += 1;
        }
        counts
    }
}

/// JSON summary of a finished scoring job.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub run_id: String,
    pub schema_version: String,
    pub input_rows: usize,
    pub processed_rows: usize,
    pub deferred_rows: usize,
    pub alerts_triggered: usize,
    pub alert_details: Vec<Alert>,
    pub all_scores: Vec<f64>,
    pub errors: Vec<RowFailure>,
    pub error_counts: BTreeMap<ErrorKind, usize>,
    pub alerts_failed: usize,
    pub artifact: Option<String>,
    /// Set when the predictions could not be persisted.
    pub sink_error: Option<String>,
}

impl BatchSummary {
    pub fn new(
        outcome: &BatchOutcome,
        artifact: Option<&SinkArtifact>,
        dispatch: Option<&DispatchReport>,
    ) -> Self {
        Self {
            run_id: outcome.run.run_id.to_string(),
            schema_version: outcome.schema_version.clone(),
            input_rows: outcome.input_rows,
            processed_rows: outcome.processed_rows(),
            deferred_rows: outcome.deferred_rows,
            alerts_triggered: outcome.high_risk.len(),
            alert_details: outcome.alerts(),
            all_scores: outcome.predictions.iter().map(|p| p.risk_score).collect(),
            errors: outcome.failures.clone(),
            error_counts: outcome.error_counts(),
            alerts_failed: dispatch.map(|d| d.failed.len()).unwrap_or(0),
            artifact: artifact.map(|a| a.path.display().to_string()),
            sink_error: None,
        }
    }

    pub fn with_sink_error(mut self, error: Option<&RiskError>) -> Self {
        self.sink_error = error.map(|e| e.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn outcome() -> BatchOutcome {
        let now = Utc::now();
        let predictions = vec![
            PredictionRecord::new("P1".into(), 0.6, 0.45, now),
            PredictionRecord::new("P3".into(), 0.2, 0.45, now),
        ];
        BatchOutcome {
            run: BatchRun::start(),
            schema_version: "abc".into(),
            input_rows: 5,
            deferred_rows: 1,
            high_risk: vec![predictions[0].clone()],
            predictions,
            failures: vec![
                RowFailure {
                    patient_id: "P2".into(),
                    row_number: 2,
                    kind: ErrorKind::MalformedField,
                    message: "bad bp".into(),
                },
                RowFailure {
                    patient_id: "P4".into(),
                    row_number: 4,
                    kind: ErrorKind::ScoringUnavailable,
                    message: "timeout".into(),
                },
            ],
        }
    }

    #[test]
    fn test_outcome_accessors() {
        let outcome = outcome();
        assert_eq!(outcome.processed_rows(), 4);
        assert_eq!(
            outcome.error_report(),
            vec![
                ("P2".to_string(), ErrorKind::MalformedField),
                ("P4".to_string(), ErrorKind::ScoringUnavailable)
            ]
        );
        assert_eq!(outcome.error_counts().get(&ErrorKind::MalformedField), Some(&1));
        assert_eq!(outcome.alerts().len(), 1);
    }

    #[test]
    fn test_summary_json() {
        let outcome = outcome();
        let summary = BatchSummary::new(&outcome, None, None);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["input_rows"], 5);
        assert_eq!(json["processed_rows"], 4);
        assert_eq!(json["deferred_rows"], 1);
        assert_eq!(json["alerts_triggered"], 1);
        assert_eq!(json["alert_details"][0]["risk_status"], "HIGH_RISK");
        assert_eq!(json["all_scores"], serde_json::json!([0.6, 0.2]));
        assert_eq!(json["errors"][0]["kind"], "MalformedField");
        assert_eq!(json["error_counts"]["ScoringUnavailable"], 1);
        assert!(json["artifact"].is_null());
        assert!(json["sink_error"].is_null());

        let failed = BatchSummary::new(&outcome, None, None)
            .with_sink_error(Some(&RiskError::SinkWrite("disk full".into())));
        assert_eq!(
            failed.sink_error.as_deref(),
            Some("result sink write failed: disk full")
        );
    }
}
