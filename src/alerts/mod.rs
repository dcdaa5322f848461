//! Alert rules, alert lifecycle and notifications
//!
//! Rules are evaluated against a target's check history after every probe.
//! A firing rule produces an alert in the `triggered` state, which is then
//! fanned out to the rule's notification channels.

pub mod dispatcher;
pub mod evaluator;
pub mod lifecycle;
pub mod notifier;

pub use dispatcher::{ChannelOutcome, ChannelStatus, DispatchReport, NotificationDispatcher};
pub use evaluator::{uptime_percentage, AlertEvaluator, Evaluation};
pub use lifecycle::{apply_transition, AlertLifecycle, LifecycleError, Transition};
pub use notifier::{Notifier, NotifierError};
