//! Alert records

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AlertId, RuleId, TargetId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Triggered,
    Acknowledged,
    Resolved,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Triggered => "triggered",
            AlertStatus::Acknowledged => "acknowledged",
            AlertStatus::Resolved => "resolved",
        }
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, AlertStatus::Resolved)
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "triggered" => Ok(AlertStatus::Triggered),
            "acknowledged" => Ok(AlertStatus::Acknowledged),
            "resolved" => Ok(AlertStatus::Resolved),
            other => Err(format!("unknown alert status '{}'", other)),
        }
    }
}

/// A persisted rule firing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: AlertId,
    pub rule_id: RuleId,
    pub target_id: TargetId,
    pub user_id: UserId,
    pub severity: Severity,
    pub message: String,
    pub status: AlertStatus,
    pub triggered_at: DateTime<Utc>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Alert fields supplied at creation; the store assigns the id
#[derive(Debug, Clone)]
pub struct NewAlert {
    pub rule_id: RuleId,
    pub target_id: TargetId,
    pub user_id: UserId,
    pub severity: Severity,
    pub message: String,
    pub triggered_at: DateTime<Utc>,
}

impl NewAlert {
    /// Materialize in the initial `triggered` state
    pub fn into_alert(self, id: AlertId) -> Alert {
        Alert {
            id,
            rule_id: self.rule_id,
            target_id: self.target_id,
            user_id: self.user_id,
            severity: self.severity,
            message: self.message,
            status: AlertStatus::Triggered,
            triggered_at: self.triggered_at,
            acknowledged_at: None,
            resolved_at: None,
        }
    }
}
