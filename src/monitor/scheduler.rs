//! Periodic monitoring cycle

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::{Mutex, Notify};
use tokio::time::{self, MissedTickBehavior};

use super::checker::HealthChecker;
use super::summary::{summarize, UptimeSummary};
use crate::alerts::{AlertEvaluator, AlertLifecycle, NotificationDispatcher, Notifier};
use crate::clock::Clock;
use crate::config::ServiceConfig;
use crate::model::{NewAlert, Target, TargetId};
use crate::store::{HistoryWindow, MonitorStore, StoreError};

/// Whether a rule that keeps firing opens a new alert every cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupPolicy {
    /// Every firing cycle creates an alert; acknowledging is the suppression mechanism
    #[default]
    Always,
    /// Skip while the rule already has an unresolved alert
    SuppressWhileOpen,
}

impl FromStr for DedupPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "always" => Ok(DedupPolicy::Always),
            "suppress_while_open" => Ok(DedupPolicy::SuppressWhileOpen),
            other => Err(format!(
                "unknown dedup policy '{}', expected 'always' or 'suppress_while_open'",
                other
            )),
        }
    }
}

impl fmt::Display for DedupPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DedupPolicy::Always => f.write_str("always"),
            DedupPolicy::SuppressWhileOpen => f.write_str("suppress_while_open"),
        }
    }
}

/// Scheduler configuration
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub interval: Duration,
    pub max_concurrency: usize,
    pub uptime_window: chrono::Duration,
    pub notify_timeout: Duration,
    pub dedup: DedupPolicy,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            max_concurrency: 16,
            uptime_window: chrono::Duration::hours(24),
            notify_timeout: Duration::from_secs(10),
            dedup: DedupPolicy::Always,
        }
    }
}

impl From<&ServiceConfig> for SchedulerConfig {
    fn from(config: &ServiceConfig) -> Self {
        Self {
            interval: config.check_interval,
            max_concurrency: config.max_concurrency.max(1),
            uptime_window: chrono::Duration::hours(config.uptime_window_hours),
            notify_timeout: config.notify_timeout,
            dedup: config.dedup,
        }
    }
}

/// Totals for one pass over the active targets
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub targets: usize,
    pub checks_succeeded: usize,
    pub checks_failed: usize,
    pub pipeline_errors: usize,
    pub rules_skipped: usize,
    pub alerts_created: usize,
    pub alerts_suppressed: usize,
    pub notifications_sent: usize,
    pub notifications_failed: usize,
}

/// Per-target tally, folded into the cycle report
#[derive(Debug, Default)]
struct TargetOutcome {
    check_success: Option<bool>,
    failed: bool,
    rules_skipped: usize,
    alerts_created: usize,
    alerts_suppressed: usize,
    notifications_sent: usize,
    notifications_failed: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    #[error("A monitoring cycle is already running")]
    AlreadyRunning,

    #[error("Failed to list active targets: {0}")]
    ListTargets(StoreError),
}

/// Drives probe, persist, evaluate and notify for every active target
pub struct MonitoringScheduler {
    store: Arc<dyn MonitorStore>,
    clock: Arc<dyn Clock>,
    checker: HealthChecker,
    evaluator: AlertEvaluator,
    lifecycle: AlertLifecycle,
    dispatcher: NotificationDispatcher,
    config: SchedulerConfig,
    /// Held for the duration of a cycle
    cycle_lock: Mutex<()>,
    running: AtomicBool,
    shutdown: Notify,
    last_report: RwLock<Option<CycleReport>>,
}

impl MonitoringScheduler {
    pub fn new(store: Arc<dyn MonitorStore>, clock: Arc<dyn Clock>, config: SchedulerConfig) -> Self {
        let notifier = Notifier::with_timeout(config.notify_timeout);
        Self {
            checker: HealthChecker::new(Arc::clone(&clock)),
            evaluator: AlertEvaluator::new(config.uptime_window),
            lifecycle: AlertLifecycle::new(Arc::clone(&store), Arc::clone(&clock)),
            dispatcher: NotificationDispatcher::new(notifier, Arc::clone(&store), Arc::clone(&clock)),
            store,
            clock,
            config,
            cycle_lock: Mutex::new(()),
            running: AtomicBool::new(false),
            shutdown: Notify::new(),
            last_report: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn checker(&self) -> &HealthChecker {
        &self.checker
    }

    pub fn lifecycle(&self) -> &AlertLifecycle {
        &self.lifecycle
    }

    pub fn last_report(&self) -> Option<CycleReport> {
        self.last_report.read().clone()
    }

    /// Start the periodic loop. The first cycle runs immediately.
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        self.running.store(true, Ordering::SeqCst);

        tokio::spawn(async move {
            tracing::info!(
                "Monitoring scheduler started with interval {:?}",
                self.config.interval
            );

            let mut ticker = time::interval(self.config.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            while self.running.load(Ordering::SeqCst) {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = self.shutdown.notified() => break,
                }
                if !self.running.load(Ordering::SeqCst) {
                    break;
                }

                match self.run_cycle().await {
                    Ok(report) => tracing::info!(
                        targets = report.targets,
                        failed_checks = report.checks_failed,
                        pipeline_errors = report.pipeline_errors,
                        alerts = report.alerts_created,
                        duration_ms = report.duration_ms,
                        "Monitoring cycle completed"
                    ),
                    Err(CycleError::AlreadyRunning) => {
                        tracing::debug!("Skipping tick, previous cycle still running");
                    }
                    Err(e) => tracing::error!(error = %e, "Monitoring cycle failed"),
                }
            }

            tracing::info!("Monitoring scheduler stopped");
        })
    }

    /// Stop the loop after the current cycle, if any
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.shutdown.notify_one();
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Run one cycle now. Fails fast if another cycle is in progress.
    pub async fn run_cycle(&self) -> Result<CycleReport, CycleError> {
        let _guard = self
            .cycle_lock
            .try_lock()
            .map_err(|_| CycleError::AlreadyRunning)?;

        let started_at = self.clock.now();
        let started = Instant::now();

        let mut targets = self
            .store
            .list_active_targets()
            .await
            .map_err(CycleError::ListTargets)?;
        targets.sort_by_key(|t| t.id);
        tracing::debug!(targets = targets.len(), "Starting monitoring cycle");

        let pending: Vec<_> = targets.iter().map(|t| self.process_target(t)).collect();
        let outcomes: Vec<TargetOutcome> = stream::iter(pending)
            .buffer_unordered(self.config.max_concurrency.max(1))
            .collect()
            .await;

        let mut report = CycleReport {
            started_at,
            duration_ms: 0,
            targets: targets.len(),
            checks_succeeded: 0,
            checks_failed: 0,
            pipeline_errors: 0,
            rules_skipped: 0,
            alerts_created: 0,
            alerts_suppressed: 0,
            notifications_sent: 0,
            notifications_failed: 0,
        };
        for outcome in outcomes {
            match outcome.check_success {
                Some(true) => report.checks_succeeded += 1,
                Some(false) => report.checks_failed += 1,
                None => {}
            }
            report.pipeline_errors += outcome.failed as usize;
            report.rules_skipped += outcome.rules_skipped;
            report.alerts_created += outcome.alerts_created;
            report.alerts_suppressed += outcome.alerts_suppressed;
            report.notifications_sent += outcome.notifications_sent;
            report.notifications_failed += outcome.notifications_failed;
        }
        report.duration_ms = started.elapsed().as_millis() as u64;

        *self.last_report.write() = Some(report.clone());
        Ok(report)
    }

    async fn process_target(&self, target: &Target) -> TargetOutcome {
        let mut outcome = TargetOutcome::default();
        if let Err(e) = self.run_pipeline(target, &mut outcome).await {
            outcome.failed = true;
            tracing::error!(target_id = target.id, error = %e, "Target pipeline failed");
        }
        outcome
    }

    async fn run_pipeline(
        &self,
        target: &Target,
        outcome: &mut TargetOutcome,
    ) -> Result<(), PipelineError> {
        let result = self.checker.check(target).await;
        outcome.check_success = Some(result.is_success);
        tracing::info!(
            target_id = target.id,
            name = %target.name,
            success = result.is_success,
            status = ?result.status_code,
            response_time_ms = result.response_time_ms,
            "Target checked"
        );
        self.store.insert_check_result(result).await?;

        let entries = self.store.list_active_rules_for_target(target.id).await?;
        for entry in entries {
            let rule = match entry.and_then(|rule| rule.validate().map(|_| rule)) {
                Ok(rule) => rule,
                Err(e) => {
                    outcome.rules_skipped += 1;
                    tracing::warn!(target_id = target.id, error = %e, "Skipping misconfigured rule");
                    continue;
                }
            };
            if !rule.is_active || rule.target_id != target.id {
                continue;
            }

            let window = self.evaluator.history_window(&rule, self.clock.now());
            let history = self.store.list_recent_checks(target.id, window).await?;
            let evaluation = self.evaluator.evaluate(target, &rule, &history);
            if !evaluation.fires {
                continue;
            }

            if self.config.dedup == DedupPolicy::SuppressWhileOpen {
                if let Some(open) = self.store.find_open_alert(rule.id).await? {
                    outcome.alerts_suppressed += 1;
                    tracing::debug!(
                        rule_id = rule.id,
                        alert_id = open.id,
                        "Rule still firing, alert already open"
                    );
                    continue;
                }
            }

            let alert = self
                .lifecycle
                .open(NewAlert {
                    rule_id: rule.id,
                    target_id: target.id,
                    user_id: rule.user_id,
                    severity: evaluation.severity,
                    message: format!("{}: {}", target.name, evaluation.reason),
                    triggered_at: self.clock.now(),
                })
                .await?;
            outcome.alerts_created += 1;

            let settings = match self.store.get_notification_settings(rule.user_id).await {
                Ok(settings) => settings,
                Err(e) => {
                    tracing::warn!(user_id = rule.user_id, error = %e, "Failed to load notification settings");
                    None
                }
            };
            let report = self
                .dispatcher
                .dispatch(&alert, &rule.channels, settings.as_ref())
                .await;
            outcome.notifications_sent += report.sent();
            outcome.notifications_failed += report.failed();
        }

        Ok(())
    }

    /// Uptime summary for a target over the configured window
    pub async fn target_summary(
        &self,
        target_id: TargetId,
    ) -> Result<Option<UptimeSummary>, StoreError> {
        if self.store.get_target(target_id).await?.is_none() {
            return Ok(None);
        }
        let since = self.clock.now() - self.config.uptime_window;
        let checks = self
            .store
            .list_recent_checks(target_id, HistoryWindow::Since(since))
            .await?;
        Ok(Some(summarize(&checks)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ManualClock, SystemClock};
    use crate::model::{
        Alert, AlertId, AlertRule, AlertStatus, Channel, CheckResult, NotificationSettings,
        Protocol, RuleId, RuleType, UserId,
    };
    use crate::store::{AuditEvent, MemoryStore, RuleEntry, StoredRule, UserRecord};
    use crate::testing::{closed_addr, spawn_server};
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::Router;
    use std::net::SocketAddr;
    use std::sync::atomic::AtomicUsize;

    async fn probe_server() -> SocketAddr {
        let app = Router::new()
            .route("/ok", get(|| async { "fine" }))
            .route(
                "/hang",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    "late"
                }),
            );
        spawn_server(app).await
    }

    async fn counting_webhook() -> (SocketAddr, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let app = Router::new().route(
            "/hook",
            post(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    StatusCode::OK
                }
            }),
        );
        (spawn_server(app).await, hits)
    }

    fn local_target(id: TargetId, addr: SocketAddr, path: &str) -> Target {
        Target::new(id, 1, format!("target-{}", id), format!("{}{}", addr, path))
            .with_protocol(Protocol::Http)
            .with_timeout_secs(1)
    }

    fn scheduler(store: Arc<dyn MonitorStore>, config: SchedulerConfig) -> Arc<MonitoringScheduler> {
        Arc::new(MonitoringScheduler::new(store, Arc::new(SystemClock), config))
    }

    #[tokio::test]
    async fn test_hung_target_does_not_stall_cycle() {
        let addr = probe_server().await;
        let store = Arc::new(MemoryStore::new());
        for id in 1..=5 {
            let path = if id == 3 { "/hang" } else { "/ok" };
            store.add_target(local_target(id, addr, path));
        }

        let config = SchedulerConfig {
            max_concurrency: 1,
            ..SchedulerConfig::default()
        };
        let scheduler = scheduler(store.clone(), config);

        let started = Instant::now();
        let report = scheduler.run_cycle().await.unwrap();
        assert!(started.elapsed() < Duration::from_secs(5));

        assert_eq!(report.targets, 5);
        assert_eq!(report.checks_succeeded, 4);
        assert_eq!(report.checks_failed, 1);
        for id in [1, 2, 4, 5] {
            let checks = store.checks_for(id);
            assert_eq!(checks.len(), 1);
            assert!(checks[0].is_success);
        }
        let hung = store.checks_for(3);
        assert_eq!(hung.len(), 1);
        assert!(!hung[0].is_success);
        assert!(hung[0].error_message.is_some());
    }

    #[tokio::test]
    async fn test_inactive_targets_are_skipped() {
        let addr = probe_server().await;
        let store = Arc::new(MemoryStore::new());
        store.add_target(local_target(1, addr, "/ok"));
        store.add_target(local_target(2, addr, "/ok").with_active(false));

        let report = scheduler(store.clone(), SchedulerConfig::default())
            .run_cycle()
            .await
            .unwrap();
        assert_eq!(report.targets, 1);
        assert!(store.checks_for(2).is_empty());
    }

    async fn failing_target_store(dead: SocketAddr, hook: SocketAddr) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.add_user(UserRecord {
            id: 1,
            name: None,
            email: Some("ops@example.com".to_string()),
        });
        store.add_target(local_target(1, dead, "/"));
        store.add_rule(
            &AlertRule::new(10, 1, 1, RuleType::ConsecutiveFailures, 2).with_channel(Channel::Slack),
        );
        let mut settings = NotificationSettings::new(1);
        settings.slack_webhook_url = Some(format!("http://{}/hook", hook));
        store.set_notification_settings(settings);
        store
    }

    #[tokio::test]
    async fn test_consecutive_failures_alert_and_notify() {
        let dead = closed_addr().await;
        let (hook, hits) = counting_webhook().await;
        let store = failing_target_store(dead, hook).await;
        let scheduler = scheduler(store.clone(), SchedulerConfig::default());

        let first = scheduler.run_cycle().await.unwrap();
        assert_eq!(first.alerts_created, 0);

        let second = scheduler.run_cycle().await.unwrap();
        assert_eq!(second.alerts_created, 1);
        assert_eq!(second.notifications_sent, 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        let alerts = store.alerts_for_rule(10);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].status, AlertStatus::Triggered);
        assert_eq!(alerts[0].severity, crate::model::Severity::High);
        assert_eq!(alerts[0].message, "target-1: 2 consecutive failures detected");

        // condition still holds: a new alert every cycle by default
        scheduler.run_cycle().await.unwrap();
        assert_eq!(store.alerts_for_rule(10).len(), 2);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_suppress_while_open() {
        let dead = closed_addr().await;
        let (hook, hits) = counting_webhook().await;
        let store = failing_target_store(dead, hook).await;
        let config = SchedulerConfig {
            dedup: DedupPolicy::SuppressWhileOpen,
            ..SchedulerConfig::default()
        };
        let scheduler = scheduler(store.clone(), config);

        for _ in 0..3 {
            scheduler.run_cycle().await.unwrap();
        }
        let alerts = store.alerts_for_rule(10);
        assert_eq!(alerts.len(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.last_report().unwrap().alerts_suppressed, 1);

        scheduler
            .lifecycle()
            .update_status(alerts[0].id, AlertStatus::Resolved)
            .await
            .unwrap();
        scheduler.run_cycle().await.unwrap();
        assert_eq!(store.alerts_for_rule(10).len(), 2);
    }

    #[tokio::test]
    async fn test_misconfigured_rule_is_skipped() {
        let dead = closed_addr().await;
        let (hook, _hits) = counting_webhook().await;
        let store = failing_target_store(dead, hook).await;
        store.add_stored_rule(StoredRule {
            id: 11,
            target_id: 1,
            user_id: 1,
            name: "garbled".to_string(),
            rule_type: "response_time".to_string(),
            threshold: 0,
            notification_channels: "not json".to_string(),
            is_active: true,
        });
        store.add_rule(&AlertRule::new(12, 1, 1, RuleType::ResponseTime, 100));
        store.add_rule(
            &AlertRule::new(13, 1, 1, RuleType::UptimePercentage, 90)
                .with_channel(Channel::Email)
                .with_active(false),
        );
        let scheduler = scheduler(store.clone(), SchedulerConfig::default());

        scheduler.run_cycle().await.unwrap();
        let report = scheduler.run_cycle().await.unwrap();

        assert_eq!(report.rules_skipped, 2);
        assert_eq!(report.alerts_created, 1);
        assert!(store.alerts_for_rule(11).is_empty());
        assert!(store.alerts_for_rule(13).is_empty());
    }

    #[tokio::test]
    async fn test_cycles_do_not_overlap() {
        let addr = probe_server().await;
        let store = Arc::new(MemoryStore::new());
        store.add_target(local_target(1, addr, "/hang"));
        let scheduler = scheduler(store, SchedulerConfig::default());

        let (first, second) = tokio::join!(scheduler.run_cycle(), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            scheduler.run_cycle().await
        });

        assert!(first.is_ok());
        assert!(matches!(second, Err(CycleError::AlreadyRunning)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_and_stop() {
        let dead = closed_addr().await;
        let store = Arc::new(MemoryStore::new());
        store.add_target(local_target(1, dead, "/"));
        let scheduler = scheduler(store.clone(), SchedulerConfig::default());

        let handle = Arc::clone(&scheduler).start();
        assert!(scheduler.is_running());
        // ticks at 0s, 60s and 120s
        tokio::time::sleep(Duration::from_secs(150)).await;
        scheduler.stop();

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("scheduler loop should exit after stop")
            .unwrap();
        assert!(!scheduler.is_running());
        assert!(store.checks_for(1).len() >= 2);
        assert!(scheduler.last_report().is_some());
    }

    #[tokio::test]
    async fn test_summary_window_follows_clock() {
        let start = Utc::now();
        let store = Arc::new(MemoryStore::new());
        store.add_target(Target::new(1, 1, "api", "api.example.com"));
        store
            .insert_check_result(CheckResult::failed(1, start, 10_000, "timeout"))
            .await
            .unwrap();
        store
            .insert_check_result(CheckResult::responded(
                1,
                start + chrono::Duration::hours(20),
                200,
                200,
                80,
            ))
            .await
            .unwrap();

        let clock = Arc::new(ManualClock::new(start + chrono::Duration::hours(20)));
        let scheduler = MonitoringScheduler::new(store, clock.clone(), SchedulerConfig::default());

        let summary = scheduler.target_summary(1).await.unwrap().unwrap();
        assert_eq!(summary.total_checks, 2);
        assert_eq!(summary.uptime, 50.0);

        // the failure falls out of the 24h window
        clock.set(start + chrono::Duration::hours(30));
        let summary = scheduler.target_summary(1).await.unwrap().unwrap();
        assert_eq!(summary.total_checks, 1);
        assert_eq!(summary.uptime, 100.0);
        assert_eq!(summary.avg_response_time, 80);
    }

    #[tokio::test]
    async fn test_target_summary() {
        let addr = probe_server().await;
        let store = Arc::new(MemoryStore::new());
        store.add_target(local_target(1, addr, "/ok"));
        store.add_target(local_target(2, addr, "/ok").with_expected_status(204));
        let scheduler = scheduler(store, SchedulerConfig::default());

        scheduler.run_cycle().await.unwrap();
        scheduler.run_cycle().await.unwrap();

        let healthy = scheduler.target_summary(1).await.unwrap().unwrap();
        assert_eq!(healthy.total_checks, 2);
        assert_eq!(healthy.uptime, 100.0);

        let wrong_status = scheduler.target_summary(2).await.unwrap().unwrap();
        assert_eq!(wrong_status.successful_checks, 0);
        assert_eq!(wrong_status.uptime, 0.0);

        assert!(scheduler.target_summary(99).await.unwrap().is_none());
    }

    /// Delegates to a memory store but refuses check inserts for one target
    struct FlakyStore {
        inner: MemoryStore,
        broken_target: TargetId,
    }

    #[async_trait]
    impl MonitorStore for FlakyStore {
        async fn list_active_targets(&self) -> Result<Vec<Target>, StoreError> {
            self.inner.list_active_targets().await
        }

        async fn get_target(&self, id: TargetId) -> Result<Option<Target>, StoreError> {
            self.inner.get_target(id).await
        }

        async fn insert_check_result(&self, result: CheckResult) -> Result<(), StoreError> {
            if result.target_id == self.broken_target {
                return Err(StoreError::Unavailable("connection reset".to_string()));
            }
            self.inner.insert_check_result(result).await
        }

        async fn list_recent_checks(
            &self,
            target_id: TargetId,
            window: HistoryWindow,
        ) -> Result<Vec<CheckResult>, StoreError> {
            self.inner.list_recent_checks(target_id, window).await
        }

        async fn list_active_rules_for_target(
            &self,
            target_id: TargetId,
        ) -> Result<Vec<RuleEntry>, StoreError> {
            self.inner.list_active_rules_for_target(target_id).await
        }

        async fn insert_alert(&self, alert: NewAlert) -> Result<Alert, StoreError> {
            self.inner.insert_alert(alert).await
        }

        async fn get_alert(&self, id: AlertId) -> Result<Option<Alert>, StoreError> {
            self.inner.get_alert(id).await
        }

        async fn update_alert(&self, alert: &Alert) -> Result<(), StoreError> {
            self.inner.update_alert(alert).await
        }

        async fn find_open_alert(&self, rule_id: RuleId) -> Result<Option<Alert>, StoreError> {
            self.inner.find_open_alert(rule_id).await
        }

        async fn get_notification_settings(
            &self,
            user_id: UserId,
        ) -> Result<Option<NotificationSettings>, StoreError> {
            self.inner.get_notification_settings(user_id).await
        }

        async fn get_user_email(&self, user_id: UserId) -> Result<Option<String>, StoreError> {
            self.inner.get_user_email(user_id).await
        }

        async fn record_audit_event(&self, event: AuditEvent) -> Result<(), StoreError> {
            self.inner.record_audit_event(event).await
        }
    }

    #[tokio::test]
    async fn test_persistence_failure_is_isolated() {
        let addr = probe_server().await;
        let inner = MemoryStore::new();
        for id in 1..=3 {
            inner.add_target(local_target(id, addr, "/ok"));
        }
        let store = Arc::new(FlakyStore {
            inner,
            broken_target: 2,
        });
        let scheduler = scheduler(store.clone(), SchedulerConfig::default());

        let report = scheduler.run_cycle().await.unwrap();
        assert_eq!(report.targets, 3);
        assert_eq!(report.pipeline_errors, 1);
        assert_eq!(store.inner.checks_for(1).len(), 1);
        assert!(store.inner.checks_for(2).is_empty());
        assert_eq!(store.inner.checks_for(3).len(), 1);
    }

    #[test]
    fn test_dedup_policy_parse() {
        assert_eq!("always".parse::<DedupPolicy>().unwrap(), DedupPolicy::Always);
        assert_eq!(
            "suppress_while_open".parse::<DedupPolicy>().unwrap(),
            DedupPolicy::SuppressWhileOpen
        );
        assert!("sometimes".parse::<DedupPolicy>().is_err());
    }
}
