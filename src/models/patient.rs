// src/models/patient.rs
use std::collections::HashMap;

/// Column carrying the patient identifier in aggregated records.
pub const PATIENT_ID_FIELD: &str = "Patient ID";

/// One raw aggregated patient row: field name -> value, exactly as delivered
/// by the aggregation job. Values stay strings until the preprocessor shapes them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientRecord {
    /// 1-based position of the row in its input artifact.
    pub row_number: usize,
    fields: HashMap<String, String>,
    /// Fields whose raw bytes were not valid UTF-8; their values are lossy.
    undecodable: Vec<String>,
}

impl PatientRecord {
    pub fn new(row_number: usize, fields: HashMap<String, String>) -> Self {
        Self {
            row_number,
            fields,
            undecodable: Vec::new(),
        }
    }

    /// Build a record from `(field, value)` pairs.
    pub fn from_pairs<K, V, I>(row_number: usize, pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let fields = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::new(row_number, fields)
    }

    /// Marks fields that were decoded lossily from invalid UTF-8.
    pub fn with_undecodable(mut self, fields: Vec<String>) -> Self {
        self.undecodable = fields;
        self
    }

    pub fn undecodable_fields(&self) -> &[String] {
        &self.undecodable
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(|s| s.as_str())
    }

    /// Like `get`, but blank values count as absent.
    pub fn get_non_blank(&self, field: &str) -> Option<&str> {
        self.get(field).map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Patient identifier from `id_field`, falling back to `Row{n}` when the
    /// row has none.
    pub fn patient_id(&self, id_field: &str) -> String {
        self.get_non_blank(id_field)
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("Row{}", self.row_number))
    }
}
