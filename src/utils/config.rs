// src/utils/config.rs
use log::{info, warn};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::error::{RiskError, RiskResult};
use crate::utils::env::{env_opt, env_or};

pub const DEFAULT_THRESHOLD: f64 = 0.45;
pub const DEFAULT_MAX_ROWS_PER_BATCH: usize = 50;
pub const DEFAULT_SCORING_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_ALERT_TIMEOUT_SECS: u64 = 5;

/// Knobs the batch runner reads. Passed in explicitly; never read from
/// process state inside the runner.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    /// Scores strictly above this are HIGH_RISK and alerted.
    pub threshold: f64,
    pub max_rows_per_batch: usize,
    /// Per-call limit on a single scoring request.
    pub scoring_timeout: Duration,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            max_rows_per_batch: DEFAULT_MAX_ROWS_PER_BATCH,
            scoring_timeout: Duration::from_secs(DEFAULT_SCORING_TIMEOUT_SECS),
        }
    }
}

impl ScoringConfig {
    pub fn from_env() -> Self {
        let default_timeout = DEFAULT_SCORING_TIMEOUT_SECS as f64;
        let mut timeout_secs = env_or("SCORING_TIMEOUT_SECS", default_timeout);
        if !timeout_secs.is_finite() || timeout_secs < 0.0 {
            warn!(
                "SCORING_TIMEOUT_SECS must be a non-negative number of seconds; using {}",
                default_timeout
            );
            timeout_secs = default_timeout;
        }

        Self {
            threshold: env_or("RISK_THRESHOLD", DEFAULT_THRESHOLD),
            max_rows_per_batch: env_or("MAX_ROWS_PER_BATCH", DEFAULT_MAX_ROWS_PER_BATCH),
            scoring_timeout: Duration::from_secs_f64(timeout_secs),
        }
    }

    pub fn validate(&self) -> RiskResult<()> {
        if !self.threshold.is_finite() || !(0.0..=1.0).contains(&self.threshold) {
            return Err(RiskError::InvalidConfig(format!(
                "threshold must be within [0, 1], got {}",
                self.threshold
            )));
        }
        if self.max_rows_per_batch == 0 {
            return Err(RiskError::InvalidConfig(
                "max_rows_per_batch must be at least 1".to_string(),
            ));
        }
        if self.scoring_timeout.is_zero() {
            return Err(RiskError::InvalidConfig(
                "scoring_timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn log_config(&self) {
        info!("⚙️  Scoring configuration:");
        info!("   Alert threshold: > {:.3}", self.threshold);
        info!("   Max rows per batch: {}", self.max_rows_per_batch);
        info!("   Scoring timeout: {:.1}s", self.scoring_timeout.as_secs_f64());
    }
}

/// Which model the job scores against.
#[derive(Debug, Clone, PartialEq)]
pub enum ScorerSource {
    Endpoint(Url),
    LocalModel(PathBuf),
}

/// Locations and collaborators for one scoring job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobConfig {
    pub feature_list_path: PathBuf,
    pub input_path: PathBuf,
    pub predictions_dir: PathBuf,
    pub scorer: Option<ScorerSource>,
    pub alert_webhook: Option<Url>,
    /// Per-request limit on webhook alert delivery.
    pub alert_timeout: Duration,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            feature_list_path: PathBuf::from("preprocess/feature_list.txt"),
            input_path: PathBuf::from("processed/final_health_dataset_csv/"),
            predictions_dir: PathBuf::from("predictions"),
            scorer: None,
            alert_webhook: None,
            alert_timeout: Duration::from_secs(DEFAULT_ALERT_TIMEOUT_SECS),
        }
    }
}

impl JobConfig {
    pub fn from_env() -> RiskResult<Self> {
        let defaults = Self::default();

        let scorer = match (env_opt("SCORER_ENDPOINT_URL"), env_opt("MODEL_PATH")) {
            (Some(url), model) => {
                if model.is_some() {
                    warn!("Both SCORER_ENDPOINT_URL and MODEL_PATH set; using the endpoint");
                }
                Some(ScorerSource::Endpoint(parse_url("SCORER_ENDPOINT_URL", &url)?))
            }
            (None, Some(path)) => Some(ScorerSource::LocalModel(PathBuf::from(path))),
            (None, None) => None,
        };

        let alert_webhook = env_opt("ALERT_WEBHOOK_URL")
            .map(|url| parse_url("ALERT_WEBHOOK_URL", &url))
            .transpose()?;

        let default_timeout = DEFAULT_ALERT_TIMEOUT_SECS as f64;
        let mut alert_timeout_secs = env_or("ALERT_TIMEOUT_SECS", default_timeout);
        if !alert_timeout_secs.is_finite() || alert_timeout_secs <= 0.0 {
            warn!(
                "ALERT_TIMEOUT_SECS must be a positive number of seconds; using {}",
                default_timeout
            );
            alert_timeout_secs = default_timeout;
        }

        Ok(Self {
            feature_list_path: env_opt("FEATURE_LIST_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.feature_list_path),
            input_path: env_opt("INPUT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.input_path),
            predictions_dir: env_opt("PREDICTIONS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.predictions_dir),
            scorer,
            alert_webhook,
            alert_timeout: Duration::from_secs_f64(alert_timeout_secs),
        })
    }

    /// The configured scorer, or `InvalidConfig` when none was given.
    pub fn require_scorer(&self) -> RiskResult<&ScorerSource> {
        self.scorer.as_ref().ok_or_else(|| {
            RiskError::InvalidConfig(
                "no scorer configured: set SCORER_ENDPOINT_URL or MODEL_PATH".to_string(),
            )
        })
    }

    pub fn log_config(&self) {
        info!("📁 Job configuration:");
        info!("   Feature list: {}", self.feature_list_path.display());
        info!("   Input: {}", self.input_path.display());
        info!("   Predictions dir: {}", self.predictions_dir.display());
        match &self.scorer {
            Some(ScorerSource::Endpoint(url)) => info!("   Scorer: endpoint {}", url),
            Some(ScorerSource::LocalModel(path)) => {
                info!("   Scorer: local model {}", path.display())
            }
            None => warn!("   Scorer: not configured"),
        }
        match &self.alert_webhook {
            Some(url) => info!(
                "   Alerts: webhook {} (timeout {:.1}s)",
                url,
                self.alert_timeout.as_secs_f64()
            ),
            None => info!("   Alerts: log channel"),
        }
    }
}

pub fn parse_url(key: &str, raw: &str) -> RiskResult<Url> {
    Url::parse(raw).map_err(|e| RiskError::InvalidConfig(format!("{} is not a valid URL ({}): {}", key, raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_default_config() {
        let config = ScoringConfig::default();
        assert_eq!(config.threshold, 0.45);
        assert_eq!(config.max_rows_per_batch, 50);
        assert_eq!(config.scoring_timeout, Duration::from_secs(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_scoring_env_config() {
        env::set_var("RISK_THRESHOLD", "0.6");
        env::set_var("MAX_ROWS_PER_BATCH", "5");
        env::set_var("SCORING_TIMEOUT_SECS", "2.5");

        let config = ScoringConfig::from_env();
        assert_eq!(config.threshold, 0.6);
        assert_eq!(config.max_rows_per_batch, 5);
        assert_eq!(config.scoring_timeout, Duration::from_millis(2500));

        env::remove_var("RISK_THRESHOLD");
        env::remove_var("MAX_ROWS_PER_BATCH");
        env::remove_var("SCORING_TIMEOUT_SECS");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = ScoringConfig::default();
        config.threshold = 1.5;
        assert!(matches!(config.validate(), Err(RiskError::InvalidConfig(_))));

        let mut config = ScoringConfig::default();
        config.max_rows_per_batch = 0;
        assert!(config.validate().is_err());

        let mut config = ScoringConfig::default();
        config.scoring_timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_job_env_config() {
        env::set_var("FEATURE_LIST_PATH", "/tmp/features.txt");
        env::set_var("MODEL_PATH", "/tmp/model.json");
        env::set_var("ALERT_WEBHOOK_URL", "http://localhost:9000/alerts");
        env::remove_var("SCORER_ENDPOINT_URL");

        let config = JobConfig::from_env().unwrap();
        assert_eq!(config.feature_list_path, PathBuf::from("/tmp/features.txt"));
        assert_eq!(
            config.scorer,
            Some(ScorerSource::LocalModel(PathBuf::from("/tmp/model.json")))
        );
        assert_eq!(
            config.alert_webhook.as_ref().map(|u| u.as_str()),
            Some("http://localhost:9000/alerts")
        );

        assert_eq!(config.alert_timeout, Duration::from_secs(5));

        env::set_var("SCORER_ENDPOINT_URL", "http://localhost:8080/invocations");
        env::set_var("ALERT_TIMEOUT_SECS", "1.5");
        let config = JobConfig::from_env().unwrap();
        assert_eq!(
            config.scorer,
            Some(ScorerSource::Endpoint(
                Url::parse("http://localhost:8080/invocations").unwrap()
            ))
        );
        assert_eq!(config.alert_timeout, Duration::from_millis(1500));

        env::set_var("ALERT_TIMEOUT_SECS", "-3");
        let config = JobConfig::from_env().unwrap();
        assert_eq!(config.alert_timeout, Duration::from_secs(5));

        env::set_var("ALERT_WEBHOOK_URL", "not a url");
        assert!(matches!(
            JobConfig::from_env(),
            Err(RiskError::InvalidConfig(_))
        ));

        env::remove_var("FEATURE_LIST_PATH");
        env::remove_var("MODEL_PATH");
        env::remove_var("ALERT_WEBHOOK_URL");
        env::remove_var("SCORER_ENDPOINT_URL");
        env::remove_var("ALERT_TIMEOUT_SECS");
    }

    #[test]
    fn test_require_scorer() {
        let config = JobConfig::default();
        assert!(matches!(
            config.require_scorer(),
            Err(RiskError::InvalidConfig(_))
        ));
    }
}
