use super::forecast::Forecast;
use crate::config::AlertConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertLevel {
    None,
    Positive,
    Negative,
}

/// Thresholds are inclusive: touching a boundary raises the alert.
pub fn classify(aggregate: f64, thresholds: &AlertConfig) -> AlertLevel {
    if aggregate >= thresholds.positive_threshold {
        AlertLevel::Positive
    } else if aggregate <= thresholds.negative_threshold {
        AlertLevel::Negative
    } else {
        AlertLevel::None
    }
}

pub fn alert_message(forecast: &Forecast, thresholds: &AlertConfig) -> Option<String> {
    let (kind, relation, threshold) = match forecast.alert {
        AlertLevel::None => return None,
        AlertLevel::Positive => ("Positive", "at or above", thresholds.positive_threshold),
        AlertLevel::Negative => ("Negative", "at or below", thresholds.negative_threshold),
    };
    Some(format!(
        "{} sentiment alert: average forecast sentiment {:.3} over the next {} days is {} the threshold {:.2}.",
        kind,
        forecast.aggregate,
        forecast.horizon.days(),
        relation,
        threshold,
    ))
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, target: &str, message: &str) -> Result<()>;
}

/// Posts `{"text": ...}` to a Slack incoming-webhook URL.
pub struct SlackWebhook {
    client: Client,
}

impl SlackWebhook {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build webhook client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Notifier for SlackWebhook {
    async fn notify(&self, target: &str, message: &str) -> Result<()> {
        let payload = serde_json::json!({ "text": message });
        let resp = self.client.post(target).json(&payload).send().await
            .context("webhook request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("webhook rejected alert ({}): {}", status, body);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ForecastHorizon;

    fn thresholds() -> AlertConfig {
        AlertConfig { positive_threshold: 0.35, negative_threshold: -0.35 }
    }

    fn forecast(aggregate: f64) -> Forecast {
        Forecast {
            history: vec![],
            points: vec![],
            horizon: ForecastHorizon::HalfMonth,
            aggregate,
            alert: classify(aggregate, &thresholds()),
        }
    }

    #[test]
    fn test_classify_boundaries() {
        let t = thresholds();
        assert_eq!(classify(0.35, &t), AlertLevel::Positive);
        assert_eq!(classify(0.349, &t), AlertLevel::None);
        assert_eq!(classify(-0.35, &t), AlertLevel::Negative);
        assert_eq!(classify(0.0, &t), AlertLevel::None);
    }

    #[test]
    fn test_alert_message_only_when_crossed() {
        assert!(alert_message(&forecast(0.1), &thresholds()).is_none());

        let msg = alert_message(&forecast(-0.5), &thresholds()).unwrap();
        assert!(msg.starts_with("Negative sentiment alert"));
        assert!(msg.contains("next 15 days"));
        assert!(msg.contains("-0.500"));
    }
}
