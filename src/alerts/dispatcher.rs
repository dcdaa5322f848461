//! Notification fan-out with per-channel failure isolation

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;

use super::notifier::Notifier;
use crate::clock::Clock;
use crate::model::{Alert, AlertId, Channel, NotificationSettings};
use crate::store::MonitorStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum ChannelStatus {
    Sent,
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct ChannelOutcome {
    pub channel: Channel,
    #[serde(flatten)]
    pub status: ChannelStatus,
}

/// What happened on each requested channel for one alert
#[derive(Debug, Clone, Serialize)]
pub struct DispatchReport {
    pub alert_id: AlertId,
    pub outcomes: Vec<ChannelOutcome>,
}

impl DispatchReport {
    pub fn outcome(&self, channel: Channel) -> Option<&ChannelStatus> {
        self.outcomes
            .iter()
            .find(|o| o.channel == channel)
            .map(|o| &o.status)
    }

    pub fn sent(&self) -> usize {
        self.count(|s| matches!(s, ChannelStatus::Sent))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, ChannelStatus::Failed(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, ChannelStatus::Skipped(_)))
    }

    fn count(&self, pred: impl Fn(&ChannelStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }
}

/// Sends an alert on every requested channel. Never returns an error.
#[derive(Clone)]
pub struct NotificationDispatcher {
    notifier: Notifier,
    store: Arc<dyn MonitorStore>,
    clock: Arc<dyn Clock>,
}

impl NotificationDispatcher {
    pub fn new(notifier: Notifier, store: Arc<dyn MonitorStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            notifier,
            store,
            clock,
        }
    }

    pub async fn dispatch(
        &self,
        alert: &Alert,
        channels: &BTreeSet<Channel>,
        settings: Option<&NotificationSettings>,
    ) -> DispatchReport {
        let mut outcomes = Vec::with_capacity(channels.len());

        for &channel in channels {
            let status = match settings {
                None => ChannelStatus::Skipped("no notification settings".to_string()),
                Some(settings) => self.send(alert, channel, settings).await,
            };

            match &status {
                ChannelStatus::Sent => {
                    tracing::info!(alert_id = alert.id, channel = %channel, "Notification sent");
                }
                ChannelStatus::Skipped(reason) => {
                    tracing::info!(
                        alert_id = alert.id,
                        channel = %channel,
                        reason = %reason,
                        "Notification skipped"
                    );
                }
                ChannelStatus::Failed(reason) => {
                    tracing::error!(
                        alert_id = alert.id,
                        channel = %channel,
                        error = %reason,
                        "Notification failed"
                    );
                }
            }

            outcomes.push(ChannelOutcome { channel, status });
        }

        DispatchReport {
            alert_id: alert.id,
            outcomes,
        }
    }

    async fn send(
        &self,
        alert: &Alert,
        channel: Channel,
        settings: &NotificationSettings,
    ) -> ChannelStatus {
        let now = self.clock.now();
        let result = match channel {
            Channel::Email => {
                if !settings.email_enabled {
                    return ChannelStatus::Skipped("email disabled".to_string());
                }
                let recipient = match self.store.get_user_email(alert.user_id).await {
                    Ok(Some(email)) if email.contains('@') => email,
                    Ok(Some(email)) => {
                        return ChannelStatus::Skipped(format!("invalid email address '{}'", email))
                    }
                    Ok(None) => return ChannelStatus::Skipped("no email address".to_string()),
                    Err(e) => return ChannelStatus::Failed(e.to_string()),
                };
                self.notifier.send_email(alert, &recipient).await
            }
            Channel::Slack | Channel::Discord => {
                let Some(url) = settings.webhook_url(channel) else {
                    return ChannelStatus::Skipped(format!("no {} webhook configured", channel));
                };
                if channel == Channel::Slack {
                    self.notifier.send_slack(alert, url, now).await
                } else {
                    self.notifier.send_discord(alert, url, now).await
                }
            }
        };

        match result {
            Ok(()) => ChannelStatus::Sent,
            Err(e) => ChannelStatus::Failed(e.to_string()),
        }
    }
}
