//! Domain records shared by the monitoring engine
//!
//! Targets, rules and notification settings are owned by the user and only
//! read here. Check results and alerts are produced by the engine.

pub mod alert;
pub mod check;
pub mod rule;
pub mod settings;
pub mod target;

pub use alert::{Alert, AlertStatus, NewAlert, Severity};
pub use check::CheckResult;
pub use rule::{AlertRule, Channel, RuleType};
pub use settings::NotificationSettings;
pub use target::{HttpMethod, Protocol, Target};

pub type UserId = i64;
pub type TargetId = i64;
pub type RuleId = i64;
pub type AlertId = i64;
