// src/alerts/dispatcher.rs
use log::{info, warn};
use serde::Serialize;

use crate::alerts::channels::AlertChannel;
use crate::error::RiskError;
use crate::models::{Alert, PredictionRecord};

/// Outcome of one dispatch pass.
#[derive(Debug, Default, Serialize)]
pub struct DispatchReport {
    pub sent: Vec<String>,
    /// (patient_id, error message)
    pub failed: Vec<(String, String)>,
}

impl DispatchReport {
    pub fn attempted(&self) -> usize {
        self.sent.len() + self.failed.len()
    }

    pub fn all_sent(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Sends one notification per high-risk prediction.
///
/// Delivery is at-least-once across runs: re-running a batch re-sends its
/// alerts. Each alert is attempted exactly once per call and failures are
/// reported, never retried.
pub struct AlertDispatcher<C: AlertChannel> {
    channel: C,
}

impl<C: AlertChannel> AlertDispatcher<C> {
    pub fn new(channel: C) -> Self {
        Self { channel }
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub async fn dispatch(&self, high_risk: &[PredictionRecord]) -> DispatchReport {
        let mut report = DispatchReport::default();

        for record in high_risk.iter().filter(|r| r.is_high_risk()) {
            let alert = Alert::from(record);
            match self.channel.publish(&alert).await {
                Ok(()) => {
                    info!(
                        "High-risk alert sent for {} (score={:.3}) via {}",
                        alert.patient_id,
                        alert.risk_score,
                        self.channel.name()
                    );
                    report.sent.push(alert.patient_id);
                }
                Err(e) => {
                    let e = match e {
                        d @ RiskError::Dispatch { .. } => d,
                        other => RiskError::Dispatch {
                            patient_id: alert.patient_id.clone(),
                            reason: other.to_string(),
                        },
                    };
                    warn!("Alert notification failed: {}", e);
                    report.failed.push((alert.patient_id, e.to_string()));
                }
            }
        }

        if report.attempted() > 0 {
            info!(
                "Alert dispatch complete: {} sent, {} failed",
                report.sent.len(),
                report.failed.len()
            );
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RiskResult;
    use chrono::Utc;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingChannel {
        published: Mutex<Vec<Alert>>,
        fail_for: Option<&'static str>,
    }

    impl AlertChannel for RecordingChannel {
        fn name(&self) -> &str {
            "recording"
        }

        async fn publish(&self, alert: &Alert) -> RiskResult<()> {
            if self.fail_for == Some(alert.patient_id.as_str()) {
                return Err(RiskError::Dispatch {
                    patient_id: alert.patient_id.clone(),
                    reason: "channel unreachable".into(),
                });
            }
            self.published.lock().unwrap().push(alert.clone());
            Ok(())
        }
    }

    fn prediction(id: &str, score: f64) -> PredictionRecord {
        PredictionRecord::new(id.to_string(), score, 0.45, Utc::now())
    }

    #[tokio::test]
    async fn test_one_alert_per_high_risk_patient() {
        let dispatcher = AlertDispatcher::new(RecordingChannel::default());
        let records = vec![prediction("P1", 0.60), prediction("P2", 0.91)];

        let report = dispatcher.dispatch(&records).await;
        assert_eq!(report.sent, vec!["P1", "P2"]);
        assert!(report.all_sent());

        let published = dispatcher.channel().published.lock().unwrap();
        assert_eq!(published.len(), 2);
        assert_eq!(published[0].patient_id, "P1");
        assert_eq!(published[0].risk_score, 0.60);
    }

    #[tokio::test]
    async fn test_low_risk_records_are_not_alerted() {
        let dispatcher = AlertDispatcher::new(RecordingChannel::default());
        let records = vec![prediction("P1", 0.45), prediction("P2", 0.10)];

        let report = dispatcher.dispatch(&records).await;
        assert_eq!(report.attempted(), 0);
        assert!(dispatcher.channel().published.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failure_is_reported_and_others_still_sent() {
        let dispatcher = AlertDispatcher::new(RecordingChannel {
            fail_for: Some("P1"),
            ..Default::default()
        });
        let records = vec![prediction("P1", 0.60), prediction("P2", 0.70)];

        let report = dispatcher.dispatch(&records).await;
        assert_eq!(report.sent, vec!["P2"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "P1");
        assert!(report.failed[0].1.contains("channel unreachable"));
    }

    #[tokio::test]
    async fn test_redispatch_resends() {
        let dispatcher = AlertDispatcher::new(RecordingChannel::default());
        let records = vec![prediction("P1", 0.60)];
        dispatcher.dispatch(&records).await;
        dispatcher.dispatch(&records).await;
        assert_eq!(dispatcher.channel().published.lock().unwrap().len(), 2);
    }
}
