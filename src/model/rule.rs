//! Alert rule definitions

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{RuleId, Severity, TargetId, UserId};
use crate::config::ConfigError;

/// Condition family a rule evaluates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    /// Threshold = number of most recent checks that must all fail
    ConsecutiveFailures,
    /// Threshold = minimum uptime percentage over the window
    UptimePercentage,
    /// Threshold = maximum response time in milliseconds
    ResponseTime,
}

impl RuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleType::ConsecutiveFailures => "consecutive_failures",
            RuleType::UptimePercentage => "uptime_percentage",
            RuleType::ResponseTime => "response_time",
        }
    }

    /// Severity assigned to alerts raised by this rule type
    pub fn severity(&self) -> Severity {
        match self {
            RuleType::ConsecutiveFailures => Severity::High,
            RuleType::UptimePercentage | RuleType::ResponseTime => Severity::Medium,
        }
    }
}

impl FromStr for RuleType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "consecutive_failures" => Ok(RuleType::ConsecutiveFailures),
            "uptime_percentage" => Ok(RuleType::UptimePercentage),
            "response_time" => Ok(RuleType::ResponseTime),
            other => Err(ConfigError::UnknownRuleType(other.to_string())),
        }
    }
}

/// Notification transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    Slack,
    Discord,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::Slack => "slack",
            Channel::Discord => "discord",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "email" => Ok(Channel::Email),
            "slack" => Ok(Channel::Slack),
            "discord" => Ok(Channel::Discord),
            _ => Err(ConfigError::UnknownChannel(s.to_string())),
        }
    }
}

/// A condition over a target's check history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRule {
    pub id: RuleId,
    pub target_id: TargetId,
    pub user_id: UserId,
    pub name: String,
    pub rule_type: RuleType,
    pub threshold: i64,
    pub channels: BTreeSet<Channel>,
    pub is_active: bool,
}

impl AlertRule {
    pub fn new(
        id: RuleId,
        target_id: TargetId,
        user_id: UserId,
        rule_type: RuleType,
        threshold: i64,
    ) -> Self {
        Self {
            id,
            target_id,
            user_id,
            name: format!("{} rule {}", rule_type.as_str(), id),
            rule_type,
            threshold,
            channels: BTreeSet::new(),
            is_active: true,
        }
    }

    pub fn with_channel(mut self, channel: Channel) -> Self {
        self.channels.insert(channel);
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.is_active = active;
        self
    }

    /// Check the threshold range and channel set before evaluation
    pub fn validate(&self) -> Result<(), ConfigError> {
        let in_range = match self.rule_type {
            RuleType::ConsecutiveFailures => self.threshold >= 1,
            RuleType::UptimePercentage => (0..=100).contains(&self.threshold),
            RuleType::ResponseTime => self.threshold >= 0,
        };
        if !in_range {
            return Err(ConfigError::InvalidThreshold {
                rule_id: self.id,
                rule_type: self.rule_type.as_str(),
                threshold: self.threshold,
            });
        }
        if self.is_active && self.channels.is_empty() {
            return Err(ConfigError::NoChannels(self.id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_parse() {
        assert_eq!("Slack".parse::<Channel>().unwrap(), Channel::Slack);
        assert_eq!(" email ".parse::<Channel>().unwrap(), Channel::Email);
        assert!("sms".parse::<Channel>().is_err());
    }

    #[test]
    fn test_validate_thresholds() {
        let rule = AlertRule::new(1, 1, 1, RuleType::ConsecutiveFailures, 0)
            .with_channel(Channel::Email);
        assert!(rule.validate().is_err());

        let rule = AlertRule::new(2, 1, 1, RuleType::UptimePercentage, 101)
            .with_channel(Channel::Email);
        assert!(rule.validate().is_err());

        let rule = AlertRule::new(3, 1, 1, RuleType::ResponseTime, 500)
            .with_channel(Channel::Discord);
        assert!(rule.validate().is_ok());
    }

    #[test]
    fn test_validate_requires_channels_when_active() {
        let rule = AlertRule::new(1, 1, 1, RuleType::ResponseTime, 500);
        assert!(matches!(rule.validate(), Err(ConfigError::NoChannels(1))));

        let rule = rule.with_active(false);
        assert!(rule.validate().is_ok());
    }

    #[test]
    fn test_severity_policy() {
        assert_eq!(RuleType::ConsecutiveFailures.severity(), Severity::High);
        assert_eq!(RuleType::UptimePercentage.severity(), Severity::Medium);
        assert_eq!(RuleType::ResponseTime.severity(), Severity::Medium);
    }
}
