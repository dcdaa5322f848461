//! Rule evaluation over check history

use chrono::{DateTime, Duration, Utc};

use crate::model::{AlertRule, CheckResult, RuleType, Severity, Target};
use crate::store::HistoryWindow;

/// Outcome of evaluating one rule
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub fires: bool,
    pub reason: String,
    pub severity: Severity,
}

/// Stateless rule evaluator
#[derive(Debug, Clone)]
pub struct AlertEvaluator {
    uptime_window: Duration,
}

impl AlertEvaluator {
    pub fn new(uptime_window: Duration) -> Self {
        Self { uptime_window }
    }

    /// History a rule needs, relative to `now`
    pub fn history_window(&self, rule: &AlertRule, now: DateTime<Utc>) -> HistoryWindow {
        match rule.rule_type {
            RuleType::ConsecutiveFailures => HistoryWindow::Latest(rule.threshold.max(1) as usize),
            RuleType::UptimePercentage => HistoryWindow::Since(now - self.uptime_window),
            RuleType::ResponseTime => HistoryWindow::Latest(1),
        }
    }

    /// Evaluate a rule. `history` must be most recent first.
    pub fn evaluate(&self, target: &Target, rule: &AlertRule, history: &[CheckResult]) -> Evaluation {
        let (fires, reason) = match rule.rule_type {
            RuleType::ConsecutiveFailures => consecutive_failures(rule.threshold, history),
            RuleType::UptimePercentage => uptime_below(rule.threshold, history),
            RuleType::ResponseTime => response_time_above(rule.threshold, history),
        };

        tracing::trace!(
            target_id = target.id,
            rule_id = rule.id,
            rule_type = rule.rule_type.as_str(),
            fires,
            reason = %reason,
            "Rule evaluated"
        );

        Evaluation {
            fires,
            reason,
            severity: rule.rule_type.severity(),
        }
    }
}

impl Default for AlertEvaluator {
    fn default() -> Self {
        Self::new(Duration::hours(24))
    }
}

fn consecutive_failures(threshold: i64, history: &[CheckResult]) -> (bool, String) {
    let required = threshold.max(1) as usize;

    if history.len() < required {
        return (
            false,
            format!("{} of {} required checks recorded", history.len(), required),
        );
    }
    if history[0].is_success {
        return (false, "latest check succeeded".to_string());
    }

    let failures = history[..required].iter().filter(|c| !c.is_success).count();
    if failures == required {
        (true, format!("{} consecutive failures detected", required))
    } else {
        (
            false,
            format!("{} of the last {} checks failed", failures, required),
        )
    }
}

/// Success percentage of a window; an empty window counts as fully up
pub fn uptime_percentage(history: &[CheckResult]) -> f64 {
    if history.is_empty() {
        return 100.0;
    }
    let successes = history.iter().filter(|c| c.is_success).count();
    successes as f64 / history.len() as f64 * 100.0
}

fn uptime_below(threshold: i64, history: &[CheckResult]) -> (bool, String) {
    let uptime = uptime_percentage(history);
    let fires = uptime < threshold as f64;
    let relation = if fires { "below" } else { "at or above" };
    (
        fires,
        format!(
            "uptime {:.2}% over {} checks is {} threshold {}%",
            uptime,
            history.len(),
            relation,
            threshold
        ),
    )
}

fn response_time_above(threshold: i64, history: &[CheckResult]) -> (bool, String) {
    let Some(latest) = history.first() else {
        return (false, "no checks recorded".to_string());
    };

    let fires = latest.response_time_ms as i128 > threshold as i128;
    let relation = if fires { "exceeds" } else { "within" };
    (
        fires,
        format!(
            "response time {}ms {} threshold {}ms",
            latest.response_time_ms, relation, threshold
        ),
    )
}
