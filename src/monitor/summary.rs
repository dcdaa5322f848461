//! Uptime statistics over a check window

use serde::Serialize;

use crate::alerts::uptime_percentage;
use crate::model::CheckResult;

#[derive(Debug, Clone, Serialize)]
pub struct UptimeSummary {
    pub uptime: f64,
    pub avg_response_time: u64,
    pub total_checks: usize,
    pub successful_checks: usize,
    pub last_check: Option<CheckResult>,
}

/// Summarize checks given most recent first
pub fn summarize(checks: &[CheckResult]) -> UptimeSummary {
    let total: u64 = checks.iter().map(|c| c.response_time_ms).sum();
    let avg_response_time = if checks.is_empty() {
        0
    } else {
        (total as f64 / checks.len() as f64).round() as u64
    };

    UptimeSummary {
        uptime: uptime_percentage(checks),
        avg_response_time,
        total_checks: checks.len(),
        successful_checks: checks.iter().filter(|c| c.is_success).count(),
        last_check: checks.first().cloned(),
    }
}
