// src/features/schema.rs
use log::{debug, info};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::Path;

use crate::error::{RiskError, RiskResult};

/// Training target column; never part of the feature list handed to the model.
pub const TARGET_COLUMN: &str = "Heart Attack Risk";

/// The ordered feature names the trained model consumes.
///
/// Written once by training (one name per line) and read at the start of every
/// batch run. The version is a fingerprint of the ordered names, so a renamed,
/// added, removed or reordered feature always yields a different version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    version: String,
    features: Vec<String>,
}

impl FeatureSchema {
    pub fn new<I, S>(names: I) -> RiskResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let features: Vec<String> = names.into_iter().map(Into::into).collect();

        if features.is_empty() {
            return Err(RiskError::SchemaMismatch(
                "feature schema contains no features".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(features.len());
        for name in &features {
            if name.trim().is_empty() {
                return Err(RiskError::SchemaMismatch(
                    "feature schema contains a blank feature name".to_string(),
                ));
            }
            if !seen.insert(name.as_str()) {
                return Err(RiskError::SchemaMismatch(format!(
                    "feature '{}' appears more than once in the schema",
                    name
                )));
            }
        }

        let version = fingerprint(&features);
        Ok(Self { version, features })
    }

    /// Parse the persisted feature list: one name per line, blanks skipped,
    /// target column removed.
    pub fn from_feature_list(text: &str) -> RiskResult<Self> {
        let names: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter(|line| *line != TARGET_COLUMN)
            .collect();
        Self::new(names)
    }

    pub fn load(path: &Path) -> RiskResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            RiskError::Input(format!(
                "cannot read feature list {}: {}",
                path.display(),
                e
            ))
        })?;
        let schema = Self::from_feature_list(&text)?;
        info!(
            "Loaded {} expected features from training (schema version {}).",
            schema.len(),
            schema.version
        );
        debug!("Feature schema order: {:?}", schema.features);
        Ok(schema)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn features(&self) -> &[String] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.features.iter().position(|f| f == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Fails with `SchemaMismatch` unless `names` is exactly this schema, in order.
    pub fn ensure_matches(&self, names: &[String], source: &str) -> RiskResult<()> {
        if names == self.features.as_slice() {
            return Ok(());
        }
        if names.len() != self.features.len() {
            return Err(RiskError::SchemaMismatch(format!(
                "{} expects {} features but the schema has {}",
                source,
                names.len(),
                self.features.len()
            )));
        }
        let (idx, (theirs, ours)) = names
            .iter()
            .zip(self.features.iter())
            .enumerate()
            .find(|(_, (a, b))| a != b)
            .unwrap_or((0, (&names[0], &self.features[0])));
        Err(RiskError::SchemaMismatch(format!(
            "{} feature #{} is '{}' but the schema has '{}'",
            source, idx, theirs, ours
        )))
    }
}

fn fingerprint(features: &[String]) -> String {
    let mut hasher = Sha256::new();
    for name in features {
        hasher.update(name.as_bytes());
        hasher.update(b"\n");
    }
    let digest = hex::encode(hasher.finalize());
    digest[..16].to_string()
}
