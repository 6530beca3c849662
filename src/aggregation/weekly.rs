// src/aggregation/weekly.rs
use log::{debug, info, warn};
use std::collections::{BTreeMap, HashMap};
use std::io::{Read, Write};

use crate::aggregation::vitals::DailyVitals;
use crate::error::{RiskError, RiskResult};
use crate::features::TARGET_COLUMN;
use crate::models::patient::PATIENT_ID_FIELD;

/// Historical columns replaced by the fresh weekly vitals.
pub const STALE_HISTORICAL_COLUMNS: [&str; 5] = [
    "Heart Rate",
    "Blood Pressure",
    "Sleep Hours Per Day",
    "Physical Activity Days Per Week",
    TARGET_COLUMN,
];

/// Column order of the weekly block at the front of each output row.
pub const WEEKLY_COLUMNS: [&str; 5] = [
    PATIENT_ID_FIELD,
    "Heart Rate",
    "Sleep Hours Per Day",
    "Physical Activity Days Per Week",
    "Blood Pressure",
];

/// One patient's week of vitals folded into the fields the model expects.
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyVitals {
    pub patient_id: String,
    pub heart_rate: f64,
    pub sleep_hours: f64,
    pub activity_days: f64,
    pub bp_systolic: i64,
    pub bp_diastolic: i64,
}

impl WeeklyVitals {
    /// `"<systolic>/<diastolic>"`, as the scoring job reads it.
    pub fn blood_pressure(&self) -> String {
        format!("{}/{}", self.bp_systolic, self.bp_diastolic)
    }

    fn to_fields(&self) -> [String; 5] {
        [
            self.patient_id.clone(),
            self.heart_rate.to_string(),
            self.sleep_hours.to_string(),
            self.activity_days.to_string(),
            self.blood_pressure(),
        ]
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Groups readings by patient: averages heart rate and blood pressure
/// (whole numbers), averages sleep (2 dp) and sums the daily activity flags.
/// Output is sorted by patient id.
pub fn aggregate_weekly(readings: &[DailyVitals]) -> Vec<WeeklyVitals> {
    #[derive(Default)]
    struct Acc {
        n: usize,
        heart_rate: f64,
        systolic: f64,
        diastolic: f64,
        sleep: f64,
        activity: f64,
    }

    let mut groups: BTreeMap<&str, Acc> = BTreeMap::new();
    for r in readings {
        let acc = groups.entry(r.patient_id.as_str()).or_default();
        acc.n += 1;
        acc.heart_rate += r.heart_rate;
        acc.systolic += r.bp_systolic;
        acc.diastolic += r.bp_diastolic;
        acc.sleep += r.sleep_hours;
        acc.activity += r.physical_activity;
    }

    groups
        .into_iter()
        .map(|(patient_id, acc)| {
            let n = acc.n as f64;
            WeeklyVitals {
                patient_id: patient_id.to_string(),
                heart_rate: round_to(acc.heart_rate / n, 0),
                sleep_hours: round_to(acc.sleep / n, 2),
                activity_days: acc.activity,
                bp_systolic: round_to(acc.systolic / n, 0) as i64,
                bp_diastolic: round_to(acc.diastolic / n, 0) as i64,
            }
        })
        .collect()
}

/// Historical per-patient attributes (age, cholesterol, diet, ...) keyed by
/// patient id, with the stale vitals and the target column removed.
#[derive(Debug, Clone, Default)]
pub struct Demographics {
    columns: Vec<String>,
    rows: HashMap<String, Vec<String>>,
}

impl Demographics {
    pub fn read<R: Read>(reader: R) -> RiskResult<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);
        let headers = csv_reader
            .headers()
            .map_err(|e| RiskError::Input(format!("cannot read historical header: {}", e)))?
            .clone();

        let id_idx = headers
            .iter()
            .position(|h| h == PATIENT_ID_FIELD)
            .ok_or_else(|| {
                RiskError::Input(format!(
                    "historical data has no '{}' column",
                    PATIENT_ID_FIELD
                ))
            })?;
        let kept: Vec<usize> = headers
            .iter()
            .enumerate()
            .filter(|(i, h)| *i != id_idx && !STALE_HISTORICAL_COLUMNS.contains(h))
            .map(|(i, _)| i)
            .collect();
        let columns = kept.iter().map(|&i| headers[i].to_string()).collect();

        let mut rows = HashMap::new();
        for (idx, result) in csv_reader.records().enumerate() {
            let record = result
                .map_err(|e| RiskError::Input(format!("historical row {}: {}", idx + 1, e)))?;
            let Some(id) = record.get(id_idx).filter(|id| !id.is_empty()) else {
                debug!("Historical row {} has no patient id; skipped", idx + 1);
                continue;
            };
            let values: Vec<String> = kept
                .iter()
                .map(|&i| record.get(i).unwrap_or("").to_string())
                .collect();
            if rows.contains_key(id) {
                warn!("Duplicate historical row for {}; keeping the first", id);
                continue;
            }
            rows.insert(id.to_string(), values);
        }

        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn get(&self, patient_id: &str) -> Option<&[String]> {
        self.rows.get(patient_id).map(|v| v.as_slice())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Writes the scoring input: one row per weekly aggregate, left-joined with
/// the demographics (blank when a patient has no history). Returns the
/// number of rows written.
pub fn write_final_dataset<W: Write>(
    writer: W,
    weekly: &[WeeklyVitals],
    demographics: &Demographics,
) -> RiskResult<usize> {
    let write_err = |e: csv::Error| RiskError::Input(format!("cannot write final dataset: {}", e));
    let mut csv_writer = csv::Writer::from_writer(writer);

    let header: Vec<&str> = WEEKLY_COLUMNS
        .iter()
        .copied()
        .chain(demographics.columns().iter().map(|c| c.as_str()))
        .collect();
    csv_writer.write_record(&header).map_err(write_err)?;

    let blank = vec![String::new(); demographics.columns().len()];
    let mut unmatched = 0;
    for week in weekly {
        let history = match demographics.get(&week.patient_id) {
            Some(values) => values,
            None => {
                unmatched += 1;
                blank.as_slice()
            }
        };
        let row: Vec<String> = week
            .to_fields()
            .into_iter()
            .chain(history.iter().cloned())
            .collect();
        csv_writer.write_record(&row).map_err(write_err)?;
    }
    csv_writer
        .flush()
        .map_err(|e| RiskError::Input(format!("cannot flush final dataset: {}", e)))?;

    if unmatched > 0 {
        warn!("{} patient(s) have no historical demographics", unmatched);
    }
    info!(
        "Wrote {} aggregated patient row(s) with {} column(s)",
        weekly.len(),
        header.len()
    );
    Ok(weekly.len())
}
