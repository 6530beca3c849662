// src/alerts/channels.rs
use log::warn;
use reqwest::Client;
use std::future::Future;
use std::time::Duration;
use url::Url;

use crate::error::{RiskError, RiskResult};
use crate::models::Alert;

/// External publish capability: one structured message per alert.
pub trait AlertChannel {
    fn name(&self) -> &str;

    fn publish(&self, alert: &Alert) -> impl Future<Output = RiskResult<()>> + Send;
}

/// Writes each alert to the process log. Used when no webhook is configured.
#[derive(Debug, Clone, Default)]
pub struct LogAlertChannel;

impl AlertChannel for LogAlertChannel {
    fn name(&self) -> &str {
        "log"
    }

    async fn publish(&self, alert: &Alert) -> RiskResult<()> {
        warn!("🚨 {}", alert.message());
        Ok(())
    }
}

/// POSTs `{patient_id, risk_score, risk_status}` as JSON to a webhook.
#[derive(Debug, Clone)]
pub struct WebhookAlertChannel {
    url: Url,
    client: Client,
}

impl WebhookAlertChannel {
    pub fn new(url: Url, timeout: Duration) -> RiskResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RiskError::InvalidConfig(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self { url, client })
    }
}

impl AlertChannel for WebhookAlertChannel {
    fn name(&self) -> &str {
        self.url.as_str()
    }

    async fn publish(&self, alert: &Alert) -> RiskResult<()> {
        let response = self
            .client
            .post(self.url.clone())
            .json(alert)
            .send()
            .await
            .map_err(|e| RiskError::Dispatch {
                patient_id: alert.patient_id.clone(),
                reason: format!("webhook {} unreachable: {}", self.url, e),
            })?;

        if !response.status().is_success() {
            return Err(RiskError::Dispatch {
                patient_id: alert.patient_id.clone(),
                reason: format!("webhook returned status: {}", response.status()),
            });
        }
        Ok(())
    }
}

/// Channel chosen at startup from configuration.
#[derive(Debug, Clone)]
pub enum ConfiguredChannel {
    Log(LogAlertChannel),
    Webhook(WebhookAlertChannel),
}

impl AlertChannel for ConfiguredChannel {
    fn name(&self) -> &str {
        match self {
            ConfiguredChannel::Log(c) => c.name(),
            ConfiguredChannel::Webhook(c) => c.name(),
        }
    }

    async fn publish(&self, alert: &Alert) -> RiskResult<()> {
        match self {
            ConfiguredChannel::Log(c) => c.publish(alert).await,
            ConfiguredChannel::Webhook(c) => c.publish(alert).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RiskStatus;
    use crate::test_support::serve_once;
    use tokio::net::TcpListener;

    fn alert() -> Alert {
        Alert {
            patient_id: "P1".into(),
            risk_score: 0.6,
            risk_status: RiskStatus::HighRisk,
        }
    }

    #[tokio::test]
    async fn test_log_channel_always_succeeds() {
        let channel = ConfiguredChannel::Log(LogAlertChannel);
        assert_eq!(channel.name(), "log");
        assert!(channel.publish(&alert()).await.is_ok());
    }

    #[tokio::test]
    async fn test_webhook_posts_alert_json() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(serve_once(listener, "200 OK", ""));

        let url = Url::parse(&format!("http://{}/alerts", addr)).unwrap();
        let channel = ConfiguredChannel::Webhook(
            WebhookAlertChannel::new(url, Duration::from_secs(5)).unwrap(),
        );
        channel.publish(&alert()).await.unwrap();

        let sent: serde_json::Value = serde_json::from_str(&server.await.unwrap()).unwrap();
        assert_eq!(
            sent,
            serde_json::json!({"patient_id": "P1", "risk_score": 0.6, "risk_status": "HIGH_RISK"})
        );
    }

    #[tokio::test]
    async fn test_webhook_error_status_is_dispatch_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(serve_once(listener, "500 Internal Server Error", "down"));

        let url = Url::parse(&format!("http://{}/alerts", addr)).unwrap();
        let channel = WebhookAlertChannel::new(url, Duration::from_secs(5)).unwrap();
        let err = channel.publish(&alert()).await.unwrap_err();
        assert!(err.to_string().contains("500"));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_webhook_is_dispatch_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = Url::parse(&format!("http://{}/alerts", addr)).unwrap();
        let channel = WebhookAlertChannel::new(url, Duration::from_secs(2)).unwrap();
        let err = channel.publish(&alert()).await.unwrap_err();
        match err {
            RiskError::Dispatch { patient_id, .. } => assert_eq!(patient_id, "P1"),
            other => panic!("expected Dispatch, got {:?}", other),
        }
    }

    #[test]
    fn test_alert_wire_format() {
        let json = serde_json::to_value(alert()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"patient_id": "P1", "risk_score": 0.6, "risk_status": "HIGH_RISK"})
        );
    }
}
