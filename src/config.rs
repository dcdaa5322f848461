//! Service configuration and configuration errors
//!
//! Settings are read from environment variables:
//! - UPTIME_HOST / UPTIME_PORT: status API bind address (default 0.0.0.0:8080)
//! - UPTIME_CHECK_INTERVAL_SECS: seconds between monitoring cycles (default 60)
//! - UPTIME_MAX_CONCURRENCY: targets probed in parallel (default 4 per CPU)
//! - UPTIME_NOTIFY_TIMEOUT_SECS: webhook timeout (default 10)
//! - UPTIME_UPTIME_WINDOW_HOURS: history window for uptime rules (default 24)
//! - UPTIME_ALERT_DEDUP: `always` or `suppress_while_open` (default always)
//! - UPTIME_SEED_FILE: optional JSON document loaded into the in-memory store

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::model::{RuleId, TargetId};
use crate::monitor::DedupPolicy;

/// Configuration errors. Rule-level variants cause the rule to be skipped.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Unknown notification channel '{0}'")]
    UnknownChannel(String),

    #[error("Malformed channel list '{raw}': {reason}")]
    MalformedChannels { raw: String, reason: String },

    #[error("Rule {0} is active but has no notification channels")]
    NoChannels(RuleId),

    #[error("Rule {rule_id}: threshold {threshold} out of range for {rule_type}")]
    InvalidThreshold {
        rule_id: RuleId,
        rule_type: &'static str,
        threshold: i64,
    },

    #[error("Unknown rule type '{0}'")]
    UnknownRuleType(String),

    #[error("Target {id}: {reason}")]
    InvalidTarget { id: TargetId, reason: String },

    #[error("Invalid value for {key}: {reason}")]
    InvalidEnv { key: &'static str, reason: String },
}

/// Top-level service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub check_interval: Duration,
    pub max_concurrency: usize,
    pub notify_timeout: Duration,
    pub uptime_window_hours: i64,
    pub dedup: DedupPolicy,
    pub seed_file: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            check_interval: Duration::from_secs(60),
            max_concurrency: (num_cpus::get() * 4).max(1),
            notify_timeout: Duration::from_secs(10),
            uptime_window_hours: 24,
            dedup: DedupPolicy::Always,
            seed_file: None,
        }
    }
}

impl ServiceConfig {
    /// Build from process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host = lookup("UPTIME_HOST").unwrap_or(defaults.host);
        let port = parse_var(&lookup, "UPTIME_PORT")?.unwrap_or(defaults.port);

        let interval_secs: u64 = parse_var(&lookup, "UPTIME_CHECK_INTERVAL_SECS")?
            .unwrap_or(defaults.check_interval.as_secs());
        if interval_secs == 0 {
            return Err(ConfigError::InvalidEnv {
                key: "UPTIME_CHECK_INTERVAL_SECS",
                reason: "must be greater than zero".to_string(),
            });
        }

        let max_concurrency: usize = parse_var(&lookup, "UPTIME_MAX_CONCURRENCY")?
            .unwrap_or(defaults.max_concurrency)
            .max(1);

        let notify_secs: u64 = parse_var(&lookup, "UPTIME_NOTIFY_TIMEOUT_SECS")?
            .unwrap_or(defaults.notify_timeout.as_secs())
            .max(1);

        let uptime_window_hours: i64 = parse_var(&lookup, "UPTIME_UPTIME_WINDOW_HOURS")?
            .unwrap_or(defaults.uptime_window_hours);
        if uptime_window_hours <= 0 {
            return Err(ConfigError::InvalidEnv {
                key: "UPTIME_UPTIME_WINDOW_HOURS",
                reason: "must be greater than zero".to_string(),
            });
        }

        let dedup = parse_var(&lookup, "UPTIME_ALERT_DEDUP")?.unwrap_or(defaults.dedup);
        let seed_file = lookup("UPTIME_SEED_FILE")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            host,
            port,
            check_interval: Duration::from_secs(interval_secs),
            max_concurrency,
            notify_timeout: Duration::from_secs(notify_secs),
            uptime_window_hours,
            dedup,
            seed_file,
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::InvalidEnv {
                key,
                reason: e.to_string(),
            }),
    }
}
