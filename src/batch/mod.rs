// src/batch/mod.rs
pub mod orchestrator;
pub mod report;
pub mod runner;

pub use orchestrator::{run_scoring_job, JobOutcome};
pub use report::{BatchOutcome, BatchSummary, RowFailure};
pub use runner::BatchRunner;
