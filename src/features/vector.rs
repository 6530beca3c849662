// src/features/vector.rs
use crate::error::{RiskError, RiskResult};
use crate::features::schema::FeatureSchema;

/// Numeric representation of one patient, aligned 1:1 with the schema that
/// produced it. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    schema_version: String,
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn new(schema: &FeatureSchema, values: Vec<f64>) -> RiskResult<Self> {
        if values.len() != schema.len() {
            return Err(RiskError::SchemaMismatch(format!(
                "feature vector has {} values but schema {} has {} features",
                values.len(),
                schema.version(),
                schema.len()
            )));
        }
        Ok(Self {
            schema_version: schema.version().to_string(),
            values,
        })
    }

    pub fn schema_version(&self) -> &str {
        &self.schema_version
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Checks the vector still lines up with `schema` (same version, same length).
    pub fn ensure_aligned(&self, schema: &FeatureSchema) -> RiskResult<()> {
        if self.schema_version != schema.version() {
            return Err(RiskError::SchemaMismatch(format!(
                "feature vector built for schema {} but the batch runs schema {}",
                self.schema_version,
                schema.version()
            )));
        }
        if self.values.len() != schema.len() {
            return Err(RiskError::SchemaMismatch(format!(
                "feature vector has {} values, schema expects {}",
                self.values.len(),
                schema.len()
            )));
        }
        Ok(())
    }

    /// Single CSV line, no header, in schema order.
    pub fn to_csv_line(&self) -> String {
        self.values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}
