// src/scoring/endpoint.rs
use log::debug;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::Duration;
use url::Url;

use crate::error::{RiskError, RiskResult};
use crate::features::FeatureVector;
use crate::scoring::{validate_probability, Scorer};

/// Remote trained-model endpoint.
///
/// Request: the feature vector as one headerless CSV line (`text/csv`).
/// Response: the probability as plain text. One attempt per call, no retries.
#[derive(Debug, Clone)]
pub struct EndpointScorer {
    url: Url,
    client: Client,
}

impl EndpointScorer {
    pub fn new(url: Url, timeout: Duration) -> RiskResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RiskError::InvalidConfig(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self { url, client })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl Scorer for EndpointScorer {
    fn name(&self) -> &str {
        self.url.as_str()
    }

    async fn score(&self, vector: &FeatureVector) -> RiskResult<f64> {
        let payload = vector.to_csv_line();
        debug!("Invoking model endpoint {} with {} features", self.url, vector.len());

        let response = self
            .client
            .post(self.url.clone())
            .header(CONTENT_TYPE, "text/csv")
            .body(payload)
            .send()
            .await
            .map_err(|e| {
                RiskError::ScoringUnavailable(format!("request to {} failed: {}", self.url, e))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RiskError::ScoringUnavailable(format!(
                "model endpoint returned status: {}",
                status
            )));
        }

        let body = response.text().await.map_err(|e| {
            RiskError::ScoringUnavailable(format!("failed to read endpoint response: {}", e))
        })?;
        parse_score_body(&body)
    }
}

/// Parses the endpoint's text response. Only the first value counts, so a
/// trailing newline or comma-separated extras are tolerated.
pub fn parse_score_body(body: &str) -> RiskResult<f64> {
    let first = body
        .trim()
        .split(|c: char| c == ',' || c == '\n' || c.is_whitespace())
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| RiskError::ScoringUnavailable("empty response from model endpoint".into()))?;

    let score: f64 = first.parse().map_err(|_| {
        RiskError::ScoringUnavailable(format!("malformed response from model endpoint: {:?}", body))
    })?;
    validate_probability(score)
}
