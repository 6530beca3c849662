// src/bin/aggregate_vitals.rs
use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use std::time::Instant;

use heart_risk_lib::aggregation::{aggregate_weekly, read_daily_vitals, write_final_dataset, Demographics};

/// Folds a week of simulated vitals into one row per patient and joins the
/// historical demographics, producing the scoring job's input.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Historical dataset with demographics
    #[arg(long, default_value = "raw/historical/heart_attack_prediction_dataset.csv")]
    historical: PathBuf,

    /// Simulated daily vitals
    #[arg(long, default_value = "raw/simulated/simulated_vitals.csv")]
    vitals: PathBuf,

    /// Output directory; the dataset is written as a single part file
    #[arg(long, default_value = "processed/final_health_dataset_csv")]
    output_dir: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
    let start_time = Instant::now();
    let args = Args::parse();

    let vitals_file = File::open(&args.vitals)
        .with_context(|| format!("Failed to open {}", args.vitals.display()))?;
    let readings = read_daily_vitals(BufReader::new(vitals_file))?;
    info!("Read {} daily reading(s) from {}", readings.len(), args.vitals.display());

    let hist_file = File::open(&args.historical)
        .with_context(|| format!("Failed to open {}", args.historical.display()))?;
    let demographics = Demographics::read(BufReader::new(hist_file))?;
    info!(
        "Read demographics for {} patient(s) ({} columns kept)",
        demographics.len(),
        demographics.columns().len()
    );

    let weekly = aggregate_weekly(&readings);

    fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create {}", args.output_dir.display()))?;
    let out_path = args.output_dir.join("part-00000.csv");
    let out_file = File::create(&out_path)
        .with_context(|| format!("Failed to create {}", out_path.display()))?;
    let rows = write_final_dataset(BufWriter::new(out_file), &weekly, &demographics)?;

    info!(
        "Final dataset written to {} ({} rows) in {:.2?}",
        out_path.display(),
        rows,
        start_time.elapsed()
    );
    Ok(())
}
