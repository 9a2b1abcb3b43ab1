//! # System Constants
//!
//! Operational constants for the task approval core: watchdog timing,
//! activity-log action labels and session event names.

use std::time::Duration;

/// Lead time before the deadline at which the watchdog submits an open task
pub const DEFAULT_WATCHDOG_BUFFER: Duration = Duration::from_secs(10);

/// Upper bound on a single read-retry backoff
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Default capacity of the session event channel
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;

/// Prefix of the wire encoding for multi-level review statuses (`Pending_<Role>`)
pub const PENDING_STATUS_PREFIX: &str = "Pending";

/// Activity log action labels written by the task service
pub mod activity {
    pub const SUBMITTED: &str = "submitted";
    pub const APPROVED: &str = "approved";
    pub const REJECTED: &str = "rejected";
    pub const FORWARDED: &str = "forwarded";
}

/// Event names published on the session event channel
pub mod events {
    pub const CHECKLIST_ITEM_UPDATED: &str = "checklist.item_updated";
    pub const CHECKLIST_ITEM_REVERTED: &str = "checklist.item_reverted";
    pub const CHECKLIST_ITEM_ADDED: &str = "checklist.item_added";
    pub const CHECKLIST_NOTES_SAVED: &str = "checklist.notes_saved";
    pub const CHECKLIST_PHOTO_ATTACHED: &str = "checklist.photo_attached";
    pub const TASK_SUBMITTED: &str = "task.submitted";
    pub const TASK_APPROVED: &str = "task.approved";
    pub const TASK_REJECTED: &str = "task.rejected";
    pub const TASK_FORWARDED: &str = "task.forwarded";
    pub const WATCHDOG_ARMED: &str = "watchdog.armed";
    pub const WATCHDOG_FIRED: &str = "watchdog.fired";
    pub const MUTATION_FAILED: &str = "mutation.failed";
}
