// src/scoring/mod.rs
pub mod endpoint;
pub mod logistic;

use std::future::Future;

use crate::error::{RiskError, RiskResult};
use crate::features::FeatureVector;

pub use endpoint::EndpointScorer;
pub use logistic::LogisticModel;

/// The trained-model capability the batch runner needs: one vector in, one
/// probability out. Implementations report endpoint or transport problems as
/// `RiskError::ScoringUnavailable`.
pub trait Scorer {
    fn name(&self) -> &str;

    /// Feature names the model was trained on, when the scorer knows them.
    /// The batch runner checks these against the run's schema before scoring.
    fn expected_features(&self) -> Option<&[String]> {
        None
    }

    fn score(&self, vector: &FeatureVector) -> impl Future<Output = RiskResult<f64>> + Send;
}

/// Rejects anything that is not a probability.
pub fn validate_probability(score: f64) -> RiskResult<f64> {
    if !score.is_finite() || !(0.0..=1.0).contains(&score) {
        return Err(RiskError::ScoringUnavailable(format!(
            "model returned {} which is not a probability in [0, 1]",
            score
        )));
    }
    Ok(score)
}

/// Scorer chosen at startup from configuration.
#[derive(Debug)]
pub enum ConfiguredScorer {
    Endpoint(EndpointScorer),
    Local(LogisticModel),
}

impl Scorer for ConfiguredScorer {
    fn name(&self) -> &str {
        match self {
            ConfiguredScorer::Endpoint(s) => s.name(),
            ConfiguredScorer::Local(m) => m.name(),
        }
    }

    fn expected_features(&self) -> Option<&[String]> {
        match self {
            ConfiguredScorer::Endpoint(s) => s.expected_features(),
            ConfiguredScorer::Local(m) => m.expected_features(),
        }
    }

    async fn score(&self, vector: &FeatureVector) -> RiskResult<f64> {
        match self {
            ConfiguredScorer::Endpoint(s) => s.score(vector).await,
            ConfiguredScorer::Local(m) => m.score(vector).await,
        }
    }
}
