//! Uptime Core: scheduled HTTP monitoring with rule-based alerting
//!
//! Every cycle probes each active target once, records the outcome, evaluates
//! the target's alert rules against its recent history, and fans firing rules
//! out to email, Slack and Discord.
//!
//! # Features
//!
//! - **Bounded probes**: a hung endpoint costs at most its own timeout
//! - **Failure isolation**: one target or channel failing never blocks the rest
//! - **Alert rules**: consecutive failures, uptime percentage, response time
//! - **Alert lifecycle**: triggered, acknowledged, resolved with audit trail
//! - **Status API**: last cycle report, uptime summaries, alert updates
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use uptime_core::clock::SystemClock;
//! use uptime_core::model::Target;
//! use uptime_core::monitor::{MonitoringScheduler, SchedulerConfig};
//! use uptime_core::store::MemoryStore;
//!
//! # async fn demo() {
//! let store = Arc::new(MemoryStore::new());
//! store.add_target(Target::new(1, 1, "api", "api.example.com/health"));
//!
//! let scheduler = MonitoringScheduler::new(store, Arc::new(SystemClock), SchedulerConfig::default());
//! let report = scheduler.run_cycle().await.unwrap();
//! println!("{} targets checked", report.targets);
//! # }
//! ```

pub mod alerts;
pub mod api;
pub mod clock;
pub mod config;
pub mod model;
pub mod monitor;
pub mod store;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use config::{ConfigError, ServiceConfig};
pub use monitor::{CycleReport, HealthChecker, MonitoringScheduler, SchedulerConfig};
pub use store::{MemoryStore, MonitorStore, StoreError};
