//! Per-user notification preferences

use serde::{Deserialize, Serialize};

use super::{Channel, UserId};

/// Per-user notification preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSettings {
    pub user_id: UserId,
    #[serde(default = "default_email_enabled")]
    pub email_enabled: bool,
    #[serde(default)]
    pub slack_webhook_url: Option<String>,
    #[serde(default)]
    pub discord_webhook_url: Option<String>,
}

fn default_email_enabled() -> bool {
    true
}

impl NotificationSettings {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            email_enabled: default_email_enabled(),
            slack_webhook_url: None,
            discord_webhook_url: None,
        }
    }

    /// Configured webhook for a channel, ignoring blank values
    pub fn webhook_url(&self, channel: Channel) -> Option<&str> {
        let url = match channel {
            Channel::Slack => self.slack_webhook_url.as_deref(),
            Channel::Discord => self.discord_webhook_url.as_deref(),
            Channel::Email => None,
        };
        url.map(str::trim).filter(|u| !u.is_empty())
    }
}
