//! Alert state machine
//!
//! `triggered -> acknowledged -> resolved`, with `triggered -> resolved`
//! allowed directly. `resolved` is terminal. Timestamps are stamped once,
//! on the first entry into the corresponding state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::clock::Clock;
use crate::model::{Alert, AlertId, AlertStatus, NewAlert};
use crate::store::{AuditEvent, MonitorStore, StoreError};

/// Effect of a requested transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied { from: AlertStatus, to: AlertStatus },
    /// Alert was already in the requested state
    Unchanged,
}

/// Apply a status change in place
pub fn apply_transition(
    alert: &mut Alert,
    to: AlertStatus,
    now: DateTime<Utc>,
) -> Result<Transition, LifecycleError> {
    let from = alert.status;
    if from == to {
        return Ok(Transition::Unchanged);
    }

    let allowed = matches!(
        (from, to),
        (AlertStatus::Triggered, AlertStatus::Acknowledged)
            | (AlertStatus::Triggered, AlertStatus::Resolved)
            | (AlertStatus::Acknowledged, AlertStatus::Resolved)
    );
    if !allowed {
        return Err(LifecycleError::InvalidTransition {
            alert_id: alert.id,
            from,
            to,
        });
    }

    match to {
        AlertStatus::Acknowledged => {
            alert.acknowledged_at.get_or_insert(now);
        }
        AlertStatus::Resolved => {
            alert.resolved_at.get_or_insert(now);
        }
        AlertStatus::Triggered => {}
    }
    alert.status = to;

    Ok(Transition::Applied { from, to })
}

/// Creates alerts and applies externally requested status changes
#[derive(Clone)]
pub struct AlertLifecycle {
    store: Arc<dyn MonitorStore>,
    clock: Arc<dyn Clock>,
    /// Serializes read-apply-write per alert
    locks: Arc<DashMap<AlertId, Arc<Mutex<()>>>>,
}

impl AlertLifecycle {
    pub fn new(store: Arc<dyn MonitorStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            locks: Arc::new(DashMap::new()),
        }
    }

    /// Persist a new alert in the `triggered` state
    pub async fn open(&self, alert: NewAlert) -> Result<Alert, StoreError> {
        let alert = self.store.insert_alert(alert).await?;
        tracing::info!(
            alert_id = alert.id,
            rule_id = alert.rule_id,
            target_id = alert.target_id,
            severity = %alert.severity,
            "Alert triggered: {}",
            alert.message
        );
        Ok(alert)
    }

    /// Move an alert to `status`, persisting and auditing the change
    pub async fn update_status(
        &self,
        alert_id: AlertId,
        status: AlertStatus,
    ) -> Result<Alert, LifecycleError> {
        let lock = Arc::clone(self.locks.entry(alert_id).or_default().value());
        let _guard = lock.lock().await;

        let mut alert = self
            .store
            .get_alert(alert_id)
            .await?
            .ok_or(LifecycleError::AlertNotFound(alert_id))?;

        let transition = apply_transition(&mut alert, status, self.clock.now())?;
        let Transition::Applied { from, to } = transition else {
            return Ok(alert);
        };

        self.store.update_alert(&alert).await?;
        tracing::info!(alert_id, from = %from, to = %to, "Alert status updated");

        let event = AuditEvent {
            user_id: alert.user_id,
            action: "UPDATE".to_string(),
            entity_type: "Alert".to_string(),
            entity_id: Some(alert.id),
            details: Some(serde_json::json!({ "status": to.as_str() }).to_string()),
            created_at: self.clock.now(),
        };
        if let Err(e) = self.store.record_audit_event(event).await {
            tracing::warn!(alert_id, error = %e, "Failed to record audit event");
        }

        Ok(alert)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("Alert {0} not found")]
    AlertNotFound(AlertId),

    #[error("Alert {alert_id} cannot move from {from} to {to}")]
    InvalidTransition {
        alert_id: AlertId,
        from: AlertStatus,
        to: AlertStatus,
    },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
