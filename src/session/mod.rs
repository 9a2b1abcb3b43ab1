//! Per-task session: state model, optimistic edits and the deadline watchdog.

pub mod optimistic;
pub mod task_session;
pub mod watchdog;

pub use optimistic::{optimistic_update, OptimisticError};
pub use task_session::{SessionOptions, SubmissionOutcome, TaskAggregate, TaskSession};
pub use watchdog::{plan as plan_watchdog, DeadlineWatchdog, FireReason, SkipReason, WatchdogPlan};
