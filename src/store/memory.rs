//! In-memory store adapter

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::{
    encode_channels, parse_channels, AuditEvent, HistoryWindow, MonitorStore, RuleEntry,
    StoreError,
};
use crate::model::{
    Alert, AlertId, AlertRule, CheckResult, NewAlert, NotificationSettings, RuleId, Target,
    TargetId, UserId,
};

/// Rule row in column form: rule type and channels are still strings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRule {
    pub id: RuleId,
    pub target_id: TargetId,
    pub user_id: UserId,
    pub name: String,
    pub rule_type: String,
    pub threshold: i64,
    /// JSON array, e.g. `["email","slack"]`
    pub notification_channels: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl StoredRule {
    fn decode(&self) -> RuleEntry {
        Ok(AlertRule {
            id: self.id,
            target_id: self.target_id,
            user_id: self.user_id,
            name: self.name.clone(),
            rule_type: self.rule_type.parse()?,
            threshold: self.threshold,
            channels: parse_channels(&self.notification_channels)?,
            is_active: self.is_active,
        })
    }
}

impl From<&AlertRule> for StoredRule {
    fn from(rule: &AlertRule) -> Self {
        Self {
            id: rule.id,
            target_id: rule.target_id,
            user_id: rule.user_id,
            name: rule.name.clone(),
            rule_type: rule.rule_type.as_str().to_string(),
            threshold: rule.threshold,
            notification_channels: encode_channels(&rule.channels),
            is_active: rule.is_active,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// DashMap-backed store used by the service binary and tests
pub struct MemoryStore {
    users: DashMap<UserId, UserRecord>,
    targets: DashMap<TargetId, Target>,
    /// Append-only, insertion order per target
    checks: DashMap<TargetId, Vec<CheckResult>>,
    rules: DashMap<RuleId, StoredRule>,
    alerts: DashMap<AlertId, Alert>,
    settings: DashMap<UserId, NotificationSettings>,
    audit: Mutex<Vec<AuditEvent>>,
    next_alert_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            targets: DashMap::new(),
            checks: DashMap::new(),
            rules: DashMap::new(),
            alerts: DashMap::new(),
            settings: DashMap::new(),
            audit: Mutex::new(Vec::new()),
            next_alert_id: AtomicI64::new(1),
        }
    }

    pub fn add_user(&self, user: UserRecord) {
        self.users.insert(user.id, user);
    }

    pub fn add_target(&self, target: Target) {
        self.targets.insert(target.id, target);
    }

    pub fn add_rule(&self, rule: &AlertRule) {
        self.rules.insert(rule.id, StoredRule::from(rule));
    }

    pub fn add_stored_rule(&self, rule: StoredRule) {
        self.rules.insert(rule.id, rule);
    }

    pub fn set_notification_settings(&self, settings: NotificationSettings) {
        self.settings.insert(settings.user_id, settings);
    }

    /// Every check recorded for a target, oldest first
    pub fn checks_for(&self, target_id: TargetId) -> Vec<CheckResult> {
        self.checks
            .get(&target_id)
            .map(|c| c.value().clone())
            .unwrap_or_default()
    }

    /// Alerts raised by a rule, ordered by id
    pub fn alerts_for_rule(&self, rule_id: RuleId) -> Vec<Alert> {
        let mut alerts: Vec<Alert> = self
            .alerts
            .iter()
            .filter(|a| a.rule_id == rule_id)
            .map(|a| a.value().clone())
            .collect();
        alerts.sort_by_key(|a| a.id);
        alerts
    }

    pub fn audit_events(&self) -> Vec<AuditEvent> {
        self.audit.lock().clone()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MonitorStore for MemoryStore {
    async fn list_active_targets(&self) -> Result<Vec<Target>, StoreError> {
        let mut targets: Vec<Target> = self
            .targets
            .iter()
            .filter(|t| t.is_active)
            .map(|t| t.value().clone())
            .collect();
        targets.sort_by_key(|t| t.id);
        Ok(targets)
    }

    async fn get_target(&self, id: TargetId) -> Result<Option<Target>, StoreError> {
        Ok(self.targets.get(&id).map(|t| t.value().clone()))
    }

    async fn insert_check_result(&self, result: CheckResult) -> Result<(), StoreError> {
        self.checks.entry(result.target_id).or_default().push(result);
        Ok(())
    }

    async fn list_recent_checks(
        &self,
        target_id: TargetId,
        window: HistoryWindow,
    ) -> Result<Vec<CheckResult>, StoreError> {
        let Some(checks) = self.checks.get(&target_id) else {
            return Ok(Vec::new());
        };

        // Newest insertion first, then a stable sort keeps that order for equal timestamps
        let mut recent: Vec<CheckResult> = checks.iter().rev().cloned().collect();
        drop(checks);
        recent.sort_by(|a, b| b.checked_at.cmp(&a.checked_at));

        match window {
            HistoryWindow::Latest(limit) => recent.truncate(limit),
            HistoryWindow::Since(since) => recent.retain(|c| c.checked_at >= since),
        }
        Ok(recent)
    }

    async fn list_active_rules_for_target(
        &self,
        target_id: TargetId,
    ) -> Result<Vec<RuleEntry>, StoreError> {
        let mut rows: Vec<StoredRule> = self
            .rules
            .iter()
            .filter(|r| r.target_id == target_id && r.is_active)
            .map(|r| r.value().clone())
            .collect();
        rows.sort_by_key(|r| r.id);
        Ok(rows.iter().map(StoredRule::decode).collect())
    }

    async fn insert_alert(&self, alert: NewAlert) -> Result<Alert, StoreError> {
        let id = self.next_alert_id.fetch_add(1, Ordering::SeqCst);
        let alert = alert.into_alert(id);
        self.alerts.insert(id, alert.clone());
        Ok(alert)
    }

    async fn get_alert(&self, id: AlertId) -> Result<Option<Alert>, StoreError> {
        Ok(self.alerts.get(&id).map(|a| a.value().clone()))
    }

    async fn update_alert(&self, alert: &Alert) -> Result<(), StoreError> {
        match self.alerts.get_mut(&alert.id) {
            Some(mut existing) => {
                *existing = alert.clone();
                Ok(())
            }
            None => Err(StoreError::AlertNotFound(alert.id)),
        }
    }

    async fn find_open_alert(&self, rule_id: RuleId) -> Result<Option<Alert>, StoreError> {
        Ok(self
            .alerts
            .iter()
            .filter(|a| a.rule_id == rule_id && a.status.is_open())
            .max_by_key(|a| a.id)
            .map(|a| a.value().clone()))
    }

    async fn get_notification_settings(
        &self,
        user_id: UserId,
    ) -> Result<Option<NotificationSettings>, StoreError> {
        Ok(self.settings.get(&user_id).map(|s| s.value().clone()))
    }

    async fn get_user_email(&self, user_id: UserId) -> Result<Option<String>, StoreError> {
        Ok(self
            .users
            .get(&user_id)
            .and_then(|u| u.email.clone())
            .filter(|e| !e.trim().is_empty()))
    }

    async fn record_audit_event(&self, event: AuditEvent) -> Result<(), StoreError> {
        self.audit.lock().push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Channel, RuleType, Severity};
    use crate::config::ConfigError;
    use chrono::{Duration, Utc};

    fn check(target_id: TargetId, at: chrono::DateTime<Utc>, ok: bool) -> CheckResult {
        if ok {
            CheckResult::responded(target_id, at, 200, 200, 12)
        } else {
            CheckResult::failed(target_id, at, 12, "connection refused")
        }
    }

    #[tokio::test]
    async fn test_recent_checks_newest_first() {
        let store = MemoryStore::new();
        let base = Utc::now();

        for i in 0..5 {
            store
                .insert_check_result(check(1, base + Duration::seconds(i), i % 2 == 0))
                .await
                .unwrap();
        }

        let recent = store
            .list_recent_checks(1, HistoryWindow::Latest(3))
            .await
            .unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].checked_at, base + Duration::seconds(4));
        assert_eq!(recent[2].checked_at, base + Duration::seconds(2));

        let since = store
            .list_recent_checks(1, HistoryWindow::Since(base + Duration::seconds(3)))
            .await
            .unwrap();
        assert_eq!(since.len(), 2);

        assert!(store
            .list_recent_checks(99, HistoryWindow::Latest(3))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_rules_decoded_and_filtered() {
        let store = MemoryStore::new();
        store.add_rule(
            &AlertRule::new(1, 10, 1, RuleType::ConsecutiveFailures, 3).with_channel(Channel::Slack),
        );
        store.add_rule(
            &AlertRule::new(2, 10, 1, RuleType::ResponseTime, 500)
                .with_channel(Channel::Email)
                .with_active(false),
        );
        store.add_stored_rule(StoredRule {
            id: 3,
            target_id: 10,
            user_id: 1,
            name: "broken".to_string(),
            rule_type: "uptime_percentage".to_string(),
            threshold: 90,
            notification_channels: "slack;email".to_string(),
            is_active: true,
        });

        let entries = store.list_active_rules_for_target(10).await.unwrap();
        assert_eq!(entries.len(), 2);
        let rule = entries[0].as_ref().unwrap();
        assert_eq!(rule.id, 1);
        assert!(rule.channels.contains(&Channel::Slack));
        assert!(matches!(
            entries[1],
            Err(ConfigError::MalformedChannels { .. })
        ));
    }

    #[tokio::test]
    async fn test_alert_ids_and_open_lookup() {
        let store = MemoryStore::new();
        let new_alert = |rule_id| NewAlert {
            rule_id,
            target_id: 1,
            user_id: 1,
            severity: Severity::High,
            message: "down".to_string(),
            triggered_at: Utc::now(),
        };

        let first = store.insert_alert(new_alert(7)).await.unwrap();
        let second = store.insert_alert(new_alert(7)).await.unwrap();
        assert_eq!(first.id + 1, second.id);

        let open = store.find_open_alert(7).await.unwrap().unwrap();
        assert_eq!(open.id, second.id);
        assert!(store.find_open_alert(8).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_missing_alert() {
        let store = MemoryStore::new();
        let alert = NewAlert {
            rule_id: 1,
            target_id: 1,
            user_id: 1,
            severity: Severity::Low,
            message: "x".to_string(),
            triggered_at: Utc::now(),
        }
        .into_alert(42);

        assert!(matches!(
            store.update_alert(&alert).await,
            Err(StoreError::AlertNotFound(42))
        ));
    }
}
