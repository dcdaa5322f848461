//! Health probing and the periodic monitoring cycle

pub mod checker;
pub mod scheduler;
pub mod summary;

pub use checker::HealthChecker;
pub use scheduler::{
    CycleError, CycleReport, DedupPolicy, MonitoringScheduler, PipelineError, SchedulerConfig,
};
pub use summary::{summarize, UptimeSummary};
