// src/bin/generate_vitals.rs
use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use heart_risk_lib::aggregation::{simulate_week, write_daily_vitals, vitals::DEFAULT_PATIENT_IDS};

/// Writes a week of simulated daily vitals per patient.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Output CSV
    #[arg(long, default_value = "simulated_vitals.csv")]
    output: PathBuf,

    /// Patient ids to simulate (defaults to the built-in cohort)
    #[arg(long, value_delimiter = ',')]
    patients: Vec<String>,

    /// Seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
    let args = Args::parse();

    let patients: Vec<String> = if args.patients.is_empty() {
        DEFAULT_PATIENT_IDS.iter().map(|s| s.to_string()).collect()
    } else {
        args.patients
    };

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let start_ts = Utc::now().timestamp();

    let readings: Vec<_> = patients
        .iter()
        .flat_map(|pid| simulate_week(&mut rng, pid, start_ts))
        .collect();

    let file = File::create(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;
    write_daily_vitals(BufWriter::new(file), &readings)?;

    info!(
        "Generated {} reading(s) for {} patient(s) in {}",
        readings.len(),
        patients.len(),
        args.output.display()
    );
    Ok(())
}
