// src/utils/input.rs
use log::{debug, info, warn};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::{RiskError, RiskResult};
use crate::models::PatientRecord;

/// Resolves the aggregation job's output. A directory (the job writes part
/// files under a prefix) resolves to its most recently modified `.csv` file.
pub fn resolve_input_file(path: &Path) -> RiskResult<PathBuf> {
    if path.is_file() {
        return Ok(path.to_path_buf());
    }
    if !path.is_dir() {
        return Err(RiskError::Input(format!(
            "input path {} does not exist",
            path.display()
        )));
    }

    let entries = fs::read_dir(path)
        .map_err(|e| RiskError::Input(format!("cannot list {}: {}", path.display(), e)))?;

    let mut newest: Option<(SystemTime, PathBuf)> = None;
    for entry in entries.flatten() {
        let candidate = entry.path();
        let is_csv = candidate
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);
        if !is_csv || !candidate.is_file() {
            continue;
        }
        let modified = entry
            .metadata()
            .and_then(|m| m.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        debug!("Found candidate input file {}", candidate.display());
        let newer = match &newest {
            Some((ts, p)) => modified > *ts || (modified == *ts && candidate > *p),
            None => true,
        };
        if newer {
            newest = Some((modified, candidate));
        }
    }

    newest.map(|(_, p)| p).ok_or_else(|| {
        RiskError::Input(format!("no CSV file found under {}", path.display()))
    })
}

/// Reads patient rows from CSV with a header row. Short rows are allowed;
/// their missing trailing columns are simply absent from the record.
///
/// A field that is not valid UTF-8 does not fail the file: it is decoded
/// lossily and flagged on its record, so only that patient is rejected later.
pub fn read_patient_records<R: Read>(reader: R) -> RiskResult<Vec<PatientRecord>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .byte_headers()
        .map_err(|e| RiskError::Input(format!("cannot read CSV header: {}", e)))?
        .iter()
        .map(|h| String::from_utf8_lossy(h).into_owned())
        .collect();

    let mut records = Vec::new();
    for (idx, result) in csv_reader.byte_records().enumerate() {
        let row = result.map_err(|e| RiskError::Input(format!("CSV row {}: {}", idx + 1, e)))?;
        let mut undecodable = Vec::new();
        let fields: Vec<(String, String)> = headers
            .iter()
            .zip(row.iter())
            .map(|(h, raw)| {
                let value = match std::str::from_utf8(raw) {
                    Ok(v) => v.to_string(),
                    Err(_) => {
                        undecodable.push(h.clone());
                        String::from_utf8_lossy(raw).into_owned()
                    }
                };
                (h.clone(), value)
            })
            .collect();
        if !undecodable.is_empty() {
            warn!(
                "CSV row {} has invalid UTF-8 in {:?}",
                idx + 1,
                undecodable
            );
        }
        records.push(PatientRecord::from_pairs(idx + 1, fields).with_undecodable(undecodable));
    }
    Ok(records)
}

pub fn read_patient_records_file(path: &Path) -> RiskResult<Vec<PatientRecord>> {
    let file = fs::File::open(path)
        .map_err(|e| RiskError::Input(format!("cannot open {}: {}", path.display(), e)))?;
    let records = read_patient_records(std::io::BufReader::new(file))?;
    info!(
        "Read {} patient record(s) from {}",
        records.len(),
        path.display()
    );
    Ok(records)
}
