//! # Task Model
//!
//! A unit of pharmacy work with a deadline, a checklist and an approval status.
//!
//! ## Ownership
//!
//! `status` and `deadline` are owned by the task service. The core only reads
//! them, drives actions that make the service change them, and echoes the
//! expected status locally when a confirmed action cannot be followed by a
//! refresh.

use crate::state_machine::TaskStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Recurrence scope of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskScope {
    Daily,
    Weekly,
    Monthly,
    Custom,
}

impl TaskScope {
    /// Recurring daily tasks keep one checklist per calendar date
    pub fn has_dated_checklist(&self) -> bool {
        matches!(self, Self::Daily)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Default for Priority {
    fn default() -> Self {
        Self::Medium
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub scope: TaskScope,
    pub status: TaskStatus,
    pub deadline: DateTime<Utc>,
    #[serde(default)]
    pub priority: Priority,
    /// Service-side flag: forward to the next review level automatically
    #[serde(default)]
    pub auto_forward: bool,
    #[serde(default)]
    pub branch_ids: Vec<Uuid>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Check whether the deadline has passed at `now`
    pub fn is_past_deadline(&self, now: DateTime<Utc>) -> bool {
        now > self.deadline
    }

    /// `locked` = status is `submitted`/`approved`, or the deadline has passed
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.status.locks_checklist() || self.is_past_deadline(now)
    }

    /// Time left before the deadline; negative once it has passed
    pub fn time_remaining(&self, now: DateTime<Utc>) -> chrono::Duration {
        self.deadline - now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn task_with(status: TaskStatus, deadline: DateTime<Utc>) -> Task {
        Task {
            id: Uuid::new_v4(),
            title: "Cold chain log".to_string(),
            description: None,
            scope: TaskScope::Daily,
            status,
            deadline,
            priority: Priority::High,
            auto_forward: false,
            branch_ids: vec![],
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_lock_by_status_and_deadline() {
        let now = Utc::now();
        let future = now + Duration::hours(1);

        assert!(!task_with(TaskStatus::InProgress, future).is_locked(now));
        assert!(task_with(TaskStatus::Submitted, future).is_locked(now));
        assert!(task_with(TaskStatus::Approved, future).is_locked(now));
        assert!(task_with(TaskStatus::InProgress, now - Duration::seconds(1)).is_locked(now));
        // Exactly at the deadline is not yet past it
        assert!(!task_with(TaskStatus::InProgress, now).is_locked(now));
    }

    #[test]
    fn test_task_deserializes_wire_shape() {
        let json = serde_json::json!({
            "id": "6a1f0a5e-3d4b-4c47-9d5e-0a8b3c2f1e11",
            "title": "Controlled drugs count",
            "scope": "weekly",
            "status": "Pending_Area_Manager",
            "deadline": "2026-10-18T17:00:00Z",
            "priority": "urgent",
            "auto_forward": true
        });

        let task: Task = serde_json::from_value(json).unwrap();
        assert_eq!(task.scope, TaskScope::Weekly);
        assert_eq!(task.priority, Priority::Urgent);
        assert!(task.auto_forward);
        assert!(task.branch_ids.is_empty());
        assert_eq!(
            task.status.pending_role(),
            Some(&crate::models::Role::AreaManager)
        );
    }
}
