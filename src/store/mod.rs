//! Data store boundary
//!
//! The engine only talks to persistence through [`MonitorStore`]. Channel
//! lists are kept in their serialized column form by adapters and decoded
//! into typed sets here, before the engine sees them.

pub mod memory;
pub mod seed;

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::model::{
    Alert, AlertId, AlertRule, Channel, CheckResult, NewAlert, NotificationSettings, RuleId,
    Target, TargetId, UserId,
};

pub use memory::{MemoryStore, StoredRule, UserRecord};
pub use seed::{load_seed_file, SeedDocument, SeedError, SeedStats};

/// How much history to fetch for a target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryWindow {
    /// The N most recent checks
    Latest(usize),
    /// Every check at or after the given instant
    Since(DateTime<Utc>),
}

/// A rule row as read from storage; malformed rows surface as errors
pub type RuleEntry = Result<AlertRule, ConfigError>;

/// Audit trail entry, written best-effort after mutations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub user_id: UserId,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<i64>,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait MonitorStore: Send + Sync {
    async fn list_active_targets(&self) -> Result<Vec<Target>, StoreError>;

    async fn get_target(&self, id: TargetId) -> Result<Option<Target>, StoreError>;

    async fn insert_check_result(&self, result: CheckResult) -> Result<(), StoreError>;

    /// Checks for a target, most recent first
    async fn list_recent_checks(
        &self,
        target_id: TargetId,
        window: HistoryWindow,
    ) -> Result<Vec<CheckResult>, StoreError>;

    async fn list_active_rules_for_target(
        &self,
        target_id: TargetId,
    ) -> Result<Vec<RuleEntry>, StoreError>;

    async fn insert_alert(&self, alert: NewAlert) -> Result<Alert, StoreError>;

    async fn get_alert(&self, id: AlertId) -> Result<Option<Alert>, StoreError>;

    async fn update_alert(&self, alert: &Alert) -> Result<(), StoreError>;

    /// Most recent unresolved alert raised by a rule
    async fn find_open_alert(&self, rule_id: RuleId) -> Result<Option<Alert>, StoreError>;

    async fn get_notification_settings(
        &self,
        user_id: UserId,
    ) -> Result<Option<NotificationSettings>, StoreError>;

    async fn get_user_email(&self, user_id: UserId) -> Result<Option<String>, StoreError>;

    async fn record_audit_event(&self, event: AuditEvent) -> Result<(), StoreError>;
}

/// Store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Data store unavailable: {0}")]
    Unavailable(String),

    #[error("Alert {0} not found")]
    AlertNotFound(AlertId),
}

/// Decode a serialized channel column such as `["email","slack"]`
pub fn parse_channels(raw: &str) -> Result<BTreeSet<Channel>, ConfigError> {
    let names: Vec<String> =
        serde_json::from_str(raw).map_err(|e| ConfigError::MalformedChannels {
            raw: raw.to_string(),
            reason: e.to_string(),
        })?;

    names.iter().map(|name| name.parse()).collect()
}

/// Encode a channel set into its column form
pub fn encode_channels(channels: &BTreeSet<Channel>) -> String {
    let names: Vec<&str> = channels.iter().map(Channel::as_str).collect();
    serde_json::to_string(&names).unwrap_or_else(|_| "[]".to_string())
}
