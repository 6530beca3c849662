// src/main.rs
use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use heart_risk_lib::{
    alerts::{AlertDispatcher, ConfiguredChannel, LogAlertChannel, WebhookAlertChannel},
    batch::{run_scoring_job, BatchRunner},
    features::{FeatureSchema, FieldLayout},
    scoring::{ConfiguredScorer, EndpointScorer, LogisticModel},
    sink::CsvResultSink,
    utils::{
        config::{parse_url, JobConfig, ScorerSource, ScoringConfig},
        env::load_env,
        input::{read_patient_records_file, resolve_input_file},
        progress_config::ProgressConfig,
    },
};

/// Scores the latest aggregated patient batch and alerts on high-risk patients.
/// Every option falls back to its environment variable, then to the default.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Alert when a risk score is strictly above this
    #[arg(long)]
    threshold: Option<f64>,

    /// Maximum rows scored per run; the rest are deferred
    #[arg(long)]
    max_rows: Option<usize>,

    /// Per-patient scoring timeout in seconds
    #[arg(long)]
    timeout_secs: Option<f64>,

    /// Feature list file (one feature name per line)
    #[arg(long)]
    feature_list: Option<PathBuf>,

    /// Aggregated input CSV, or a directory holding part files
    #[arg(long)]
    input: Option<PathBuf>,

    /// Directory the predictions CSV is written to
    #[arg(long)]
    predictions_dir: Option<PathBuf>,

    /// HTTP model endpoint (text/csv in, probability out)
    #[arg(long, conflicts_with = "model")]
    endpoint: Option<String>,

    /// Local logistic model JSON
    #[arg(long)]
    model: Option<PathBuf>,

    /// Webhook receiving one JSON message per high-risk patient
    #[arg(long)]
    webhook: Option<String>,

    /// Webhook delivery timeout in seconds
    #[arg(long)]
    alert_timeout_secs: Option<f64>,

    /// Disable the progress bar
    #[arg(long)]
    no_progress: bool,
}

fn apply_args(args: Args, job: &mut JobConfig, scoring: &mut ScoringConfig) -> Result<bool> {
    if let Some(threshold) = args.threshold {
        scoring.threshold = threshold;
    }
    if let Some(max_rows) = args.max_rows {
        scoring.max_rows_per_batch = max_rows;
    }
    if let Some(secs) = args.timeout_secs {
        scoring.scoring_timeout =
            Duration::try_from_secs_f64(secs).context("--timeout-secs must be a non-negative number")?;
    }
    if let Some(path) = args.feature_list {
        job.feature_list_path = path;
    }
    if let Some(path) = args.input {
        job.input_path = path;
    }
    if let Some(dir) = args.predictions_dir {
        job.predictions_dir = dir;
    }
    if let Some(url) = args.endpoint {
        job.scorer = Some(ScorerSource::Endpoint(parse_url("--endpoint", &url)?));
    } else if let Some(path) = args.model {
        job.scorer = Some(ScorerSource::LocalModel(path));
    }
    if let Some(url) = args.webhook {
        job.alert_webhook = Some(parse_url("--webhook", &url)?);
    }
    if let Some(secs) = args.alert_timeout_secs {
        let timeout = Duration::try_from_secs_f64(secs)
            .context("--alert-timeout-secs must be a non-negative number")?;
        if timeout.is_zero() {
            anyhow::bail!("--alert-timeout-secs must be greater than zero");
        }
        job.alert_timeout = timeout;
    }
    Ok(!args.no_progress)
}

fn build_scorer(source: &ScorerSource, timeout: Duration) -> Result<ConfiguredScorer> {
    let scorer = match source {
        ScorerSource::Endpoint(url) => ConfiguredScorer::Endpoint(
            EndpointScorer::new(url.clone(), timeout).context("Failed to build endpoint scorer")?,
        ),
        ScorerSource::LocalModel(path) => ConfiguredScorer::Local(
            LogisticModel::load(path)
                .with_context(|| format!("Failed to load model from {}", path.display()))?,
        ),
    };
    Ok(scorer)
}

fn build_channel(job: &JobConfig) -> Result<ConfiguredChannel> {
    let channel = match &job.alert_webhook {
        Some(url) => ConfiguredChannel::Webhook(
            WebhookAlertChannel::new(url.clone(), job.alert_timeout)
                .context("Failed to build webhook alert channel")?,
        ),
        None => ConfiguredChannel::Log(LogAlertChannel),
    };
    Ok(channel)
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
    info!("Starting heart-attack risk scoring job");
    let start_time = Instant::now();

    load_env();
    let args = Args::parse();

    let mut job = JobConfig::from_env().context("Invalid job configuration")?;
    let mut scoring = ScoringConfig::from_env();
    let mut progress = ProgressConfig::from_env();
    progress.enabled &= apply_args(args, &mut job, &mut scoring)?;

    job.log_config();
    scoring.log_config();

    let schema = FeatureSchema::load(&job.feature_list_path).context("Failed to load feature schema")?;
    info!(
        "Feature schema {} with {} features",
        schema.version(),
        schema.len()
    );

    let scorer = build_scorer(job.require_scorer()?, scoring.scoring_timeout)?;
    let dispatcher = AlertDispatcher::new(build_channel(&job)?);
    let sink = CsvResultSink::new(&job.predictions_dir);

    let input_file = resolve_input_file(&job.input_path).context("Failed to locate input")?;
    let records = read_patient_records_file(&input_file).context("Failed to read patient records")?;
    if records.is_empty() {
        warn!("Input {} has no patient rows", input_file.display());
    }

    let bar_len = records.len().min(scoring.max_rows_per_batch);
    let runner = BatchRunner::new(&schema, FieldLayout::default(), scoring)
        .context("Invalid scoring configuration")?
        .with_progress(progress.create_bar(bar_len), progress.should_show_detailed());

    let finished = run_scoring_job(&runner, &scorer, &records, &sink, &dispatcher)
        .await
        .context("Scoring job failed")?;

    let summary = finished.summary();
    println!(
        "{}",
        serde_json::to_string_pretty(&summary).context("Failed to serialize batch summary")?
    );
    info!(
        "Job completed in {:.2?}: {} scored, {} alert(s), {} error(s)",
        start_time.elapsed(),
        finished.outcome.predictions.len(),
        summary.alerts_triggered,
        summary.errors.len()
    );

    let artifact = finished
        .into_artifact()
        .context("Failed to persist predictions")?;
    info!("Predictions written to {}", artifact.path.display());
    Ok(())
}
