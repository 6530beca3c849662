// src/scoring/logistic.rs
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{RiskError, RiskResult};
use crate::features::FeatureVector;
use crate::scoring::Scorer;

/// Local logistic model exported as JSON, for runs without a model endpoint.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LogisticModel {
    pub version: String,
    pub feature_names: Vec<String>,
    pub weights: Vec<f64>,
    pub intercept: f64,
}

impl LogisticModel {
    pub fn from_json(json: &str) -> RiskResult<Self> {
        let model: LogisticModel = serde_json::from_str(json)
            .map_err(|e| RiskError::InvalidConfig(format!("cannot parse model JSON: {}", e)))?;
        model.validate()?;
        Ok(model)
    }

    pub fn load(path: &Path) -> RiskResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            RiskError::Input(format!("cannot read model {}: {}", path.display(), e))
        })?;
        let model = Self::from_json(&json)?;
        info!(
            "Loaded local logistic model v{} with {} features from {}",
            model.version,
            model.feature_names.len(),
            path.display()
        );
        Ok(model)
    }

    fn validate(&self) -> RiskResult<()> {
        if self.weights.len() != self.feature_names.len() {
            return Err(RiskError::InvalidConfig(format!(
                "model v{} has {} weights for {} features",
                self.version,
                self.weights.len(),
                self.feature_names.len()
            )));
        }
        if !self.intercept.is_finite() || self.weights.iter().any(|w| !w.is_finite()) {
            return Err(RiskError::InvalidConfig(format!(
                "model v{} contains non-finite coefficients",
                self.version
            )));
        }
        Ok(())
    }

    pub fn predict(&self, features: &[f64]) -> RiskResult<f64> {
        if features.len() != self.weights.len() {
            return Err(RiskError::SchemaMismatch(format!(
                "model v{} expects {} features, got {}",
                self.version,
                self.weights.len(),
                features.len()
            )));
        }
        let logit: f64 = self.intercept
            + self
                .weights
                .iter()
                .zip(features)
                .map(|(w, f)| w * f)
                .sum::<f64>();
        Ok(1.0 / (1.0 + (-logit).exp()))
    }
}

impl Scorer for LogisticModel {
    fn name(&self) -> &str {
        "local-logistic"
    }

    fn expected_features(&self) -> Option<&[String]> {
        Some(self.feature_names.as_slice())
    }

    async fn score(&self, vector: &FeatureVector) -> RiskResult<f64> {
        self.predict(vector.values())
    }
}
