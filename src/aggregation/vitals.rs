// src/aggregation/vitals.rs
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use crate::error::{RiskError, RiskResult};

/// Days of readings simulated per patient.
pub const READINGS_PER_PATIENT: usize = 7;

/// Patient ids the simulator uses when none are given.
pub const DEFAULT_PATIENT_IDS: [&str; 20] = [
    "BMW7812", "CZE1114", "BNI9906", "JLN3497", "GFO8847", "ZOO7941", "WYV0966", "XXM0972",
    "XCQ5937", "FTJ5456", "HSD6283", "YSP0073", "FPS0415", "YYU9565", "VTW9069", "DCY3282",
    "DXB2434", "COP0566", "XBI0592", "RQX1211",
];

/// One day of wearable readings for a patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyVitals {
    #[serde(rename = "Patient ID")]
    pub patient_id: String,
    #[serde(rename = "Heart Rate")]
    pub heart_rate: f64,
    #[serde(rename = "BP_Systolic")]
    pub bp_systolic: f64,
    #[serde(rename = "BP_Diastolic")]
    pub bp_diastolic: f64,
    #[serde(rename = "Sleep Hours Per Day")]
    pub sleep_hours: f64,
    /// 1 when the patient was active that day, else 0.
    #[serde(rename = "Physical Activity Per day")]
    pub physical_activity: f64,
    /// Unix seconds.
    #[serde(rename = "Timestamp")]
    pub timestamp: i64,
}

/// A week of random readings for `patient_id`, one second apart from `start_ts`.
pub fn simulate_week<R: Rng + ?Sized>(
    rng: &mut R,
    patient_id: &str,
    start_ts: i64,
) -> Vec<DailyVitals> {
    (0..READINGS_PER_PATIENT)
        .map(|i| DailyVitals {
            patient_id: patient_id.to_string(),
            heart_rate: rng.gen_range(60..=110) as f64,
            bp_systolic: rng.gen_range(100..=170) as f64,
            bp_diastolic: rng.gen_range(60..=120) as f64,
            sleep_hours: (rng.gen_range(3.0..9.0_f64) * 10.0).round() / 10.0,
            physical_activity: rng.gen_range(0..=1) as f64,
            timestamp: start_ts + i as i64,
        })
        .collect()
}

pub fn write_daily_vitals<W: Write>(writer: W, readings: &[DailyVitals]) -> RiskResult<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for reading in readings {
        csv_writer
            .serialize(reading)
            .map_err(|e| RiskError::Input(format!("cannot write vitals row: {}", e)))?;
    }
    csv_writer
        .flush()
        .map_err(|e| RiskError::Input(format!("cannot flush vitals: {}", e)))
}

pub fn read_daily_vitals<R: Read>(reader: R) -> RiskResult<Vec<DailyVitals>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    csv_reader
        .deserialize()
        .enumerate()
        .map(|(idx, row)| {
            row.map_err(|e| RiskError::Input(format!("vitals row {}: {}", idx + 1, e)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_simulated_values_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let week = simulate_week(&mut rng, "BMW7812", 1_700_000_000);
        assert_eq!(week.len(), READINGS_PER_PATIENT);
        for (i, day) in week.iter().enumerate() {
            assert_eq!(day.patient_id, "BMW7812");
            assert!((60.0..=110.0).contains(&day.heart_rate));
            assert!((100.0..=170.0).contains(&day.bp_systolic));
            assert!((60.0..=120.0).contains(&day.bp_diastolic));
            assert!((3.0..=9.0).contains(&day.sleep_hours));
            assert_eq!((day.sleep_hours * 10.0).round(), day.sleep_hours * 10.0);
            assert!(day.physical_activity == 0.0 || day.physical_activity == 1.0);
            assert_eq!(day.timestamp, 1_700_000_000 + i as i64);
        }
    }

    #[test]
    fn test_vitals_csv_columns() {
        let mut rng = StdRng::seed_from_u64(1);
        let week = simulate_week(&mut rng, "CZE1114", 0);
        let mut buf = Vec::new();
        write_daily_vitals(&mut buf, &week).unwrap();

        let text = String::from_utf8(buf.clone()).unwrap();
        assert_eq!(
            text.lines().next().unwrap(),
            "Patient ID,Heart Rate,BP_Systolic,BP_Diastolic,Sleep Hours Per Day,Physical Activity Per day,Timestamp"
        );
        assert_eq!(read_daily_vitals(buf.as_slice()).unwrap(), week);
    }

    #[test]
    fn test_bad_vitals_row_is_input_error() {
        let data = "Patient ID,Heart Rate,BP_Systolic,BP_Diastolic,Sleep Hours Per Day,Physical Activity Per day,Timestamp\nP1,fast,120,80,7,1,0\n";
        assert!(matches!(
            read_daily_vitals(data.as_bytes()),
            Err(RiskError::Input(_))
        ));
    }
}
