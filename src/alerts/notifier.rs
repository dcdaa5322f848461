//! Channel senders for alert notifications

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::model::{Alert, Severity};

/// Slack attachment colour per severity
pub fn slack_color(severity: Severity) -> &'static str {
    match severity {
        Severity::Low => "#36a64f",
        Severity::Medium => "#ffa500",
        Severity::High => "#ff6b6b",
        Severity::Critical => "#8b0000",
    }
}

/// Discord embed colour per severity, same palette as Slack
pub fn discord_color(severity: Severity) -> u32 {
    match severity {
        Severity::Low => 0x36a64f,
        Severity::Medium => 0xffa500,
        Severity::High => 0xff6b6b,
        Severity::Critical => 0x8b0000,
    }
}

pub fn alert_title(severity: Severity) -> String {
    format!("Uptime Alert - {}", severity.as_str().to_uppercase())
}

pub fn slack_payload(alert: &Alert, now: DateTime<Utc>) -> serde_json::Value {
    serde_json::json!({
        "attachments": [{
            "color": slack_color(alert.severity),
            "title": alert_title(alert.severity),
            "text": alert.message,
            "ts": now.timestamp(),
        }]
    })
}

pub fn discord_payload(alert: &Alert, now: DateTime<Utc>) -> serde_json::Value {
    serde_json::json!({
        "embeds": [{
            "title": alert_title(alert.severity),
            "description": alert.message,
            "color": discord_color(alert.severity),
            "timestamp": now.to_rfc3339(),
        }]
    })
}

/// Sends single-attempt notifications over each transport
#[derive(Debug, Clone)]
pub struct Notifier {
    client: reqwest::Client,
    timeout: Duration,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    /// Create a notifier with the default 10s webhook timeout
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(10))
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }

    pub async fn send_slack(
        &self,
        alert: &Alert,
        url: &str,
        now: DateTime<Utc>,
    ) -> Result<(), NotifierError> {
        self.send_webhook(alert, url, &slack_payload(alert, now)).await
    }

    pub async fn send_discord(
        &self,
        alert: &Alert,
        url: &str,
        now: DateTime<Utc>,
    ) -> Result<(), NotifierError> {
        self.send_webhook(alert, url, &discord_payload(alert, now)).await
    }

    /// Email delivery is handed to the log until a mail transport is configured
    pub async fn send_email(&self, alert: &Alert, recipient: &str) -> Result<(), NotifierError> {
        if !recipient.contains('@') {
            return Err(NotifierError::Email(format!(
                "invalid recipient address '{}'",
                recipient
            )));
        }

        tracing::info!(
            alert_id = alert.id,
            recipient = %recipient,
            subject = %format!("[{}] Uptime Alert", alert.severity.as_str().to_uppercase()),
            "Email notification: {}",
            alert.message
        );
        Ok(())
    }

    /// POST a JSON payload to a webhook
    async fn send_webhook(
        &self,
        alert: &Alert,
        url: &str,
        payload: &serde_json::Value,
    ) -> Result<(), NotifierError> {
        let response = self
            .client
            .post(url)
            .timeout(self.timeout)
            .json(payload)
            .send()
            .await
            .map_err(|e| NotifierError::Webhook(format!("Failed to send webhook: {}", e)))?;

        if !response.status().is_success() {
            return Err(NotifierError::Webhook(format!(
                "Webhook returned status {}",
                response.status()
            )));
        }

        tracing::debug!(
            alert_id = alert.id,
            url = %url,
            "Webhook notification sent"
        );

        Ok(())
    }
}

/// Notifier errors
#[derive(Debug, thiserror::Error)]
pub enum NotifierError {
    #[error("Webhook error: {0}")]
    Webhook(String),

    #[error("Email error: {0}")]
    Email(String),
}
