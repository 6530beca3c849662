// src/batch/orchestrator.rs
use log::{error, info, warn};

use crate::alerts::{AlertChannel, AlertDispatcher, DispatchReport};
use crate::batch::report::{BatchOutcome, BatchSummary};
use crate::batch::runner::BatchRunner;
use crate::error::RiskResult;
use crate::models::PatientRecord;
use crate::scoring::Scorer;
use crate::sink::{ResultSink, SinkArtifact};

/// A scored batch: its results, the outcome of persisting them, and how
/// alert delivery went.
#[derive(Debug)]
pub struct JobOutcome {
    pub outcome: BatchOutcome,
    /// `Err(SinkWrite)` when the predictions could not be persisted.
    pub persisted: RiskResult<SinkArtifact>,
    pub dispatch: DispatchReport,
}

impl JobOutcome {
    pub fn summary(&self) -> BatchSummary {
        BatchSummary::new(
            &self.outcome,
            self.persisted.as_ref().ok(),
            Some(&self.dispatch),
        )
        .with_sink_error(self.persisted.as_ref().err())
    }

    /// The artifact, or the sink error that must fail the job.
    pub fn into_artifact(self) -> RiskResult<SinkArtifact> {
        self.persisted
    }
}

/// Score a batch, persist every prediction, then alert on the high-risk ones.
///
/// Alerts go out even when the sink write fails. The sink result travels in
/// `JobOutcome::persisted` together with the row failures and the dispatch
/// report; callers must treat an `Err` there as a failed job. Only
/// batch-fatal runner errors come back as `Err`.
pub async fn run_scoring_job<S, K, C>(
    runner: &BatchRunner<'_>,
    scorer: &S,
    records: &[PatientRecord],
    sink: &K,
    dispatcher: &AlertDispatcher<C>,
) -> RiskResult<JobOutcome>
where
    S: Scorer,
    K: ResultSink,
    C: AlertChannel,
{
    let outcome = runner.run(scorer, records).await?;

    let persisted = sink.write_batch(&outcome.run, &outcome.predictions);
    if let Err(e) = &persisted {
        error!(
            "Could not persist {} prediction(s) for run {}: {}",
            outcome.predictions.len(),
            outcome.run.run_id,
            e
        );
    }

    let dispatch = dispatcher.dispatch(&outcome.high_risk).await;
    if !dispatch.all_sent() {
        warn!(
            "{} of {} alert(s) could not be delivered",
            dispatch.failed.len(),
            dispatch.attempted()
        );
    }

    if let Ok(artifact) = &persisted {
        info!(
            "📊 Run {}: {} of {} row(s) scored, {} alert(s) triggered, results in {}",
            outcome.run.run_id,
            outcome.predictions.len(),
            outcome.input_rows,
            outcome.high_risk.len(),
            artifact.path.display()
        );
    }

    Ok(JobOutcome {
        outcome,
        persisted,
        dispatch,
    })
}
