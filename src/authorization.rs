//! # Authorization Gate
//!
//! Pure predicates over `(current user, task, assignees, now)` deciding which
//! affordances a session offers and which mutations it lets through to the
//! task service. Nothing here performs I/O; a failed check means no network
//! call is made.
//!
//! ## Rules
//!
//! - **Edit checklist**: assignee or management, and the task is not locked
//!   (status `submitted`/`approved`, or past the deadline).
//! - **Submit**: assignee or management, and the task is still open.
//! - **Approve**: not an assignee, a reviewer role, and the task is awaiting
//!   review (`submitted` or `Pending_<Role>`).
//! - **Reject**: as approve, plus a non-empty reason.
//! - **Forward**: the current holder of a non-terminal task.

use crate::error::{PharmadeskError, Result};
use crate::models::{is_assignee, Assignee, Task, User};
use crate::state_machine::TaskAction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Affordances for the current user, evaluated at one instant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    pub can_edit_checklist: bool,
    pub can_submit: bool,
    pub can_approve: bool,
    /// Reject is offered; a reason is still required when it is used
    pub can_reject: bool,
    pub can_forward: bool,
}

/// Stateless collection of authorization predicates
#[derive(Debug, Clone, Copy)]
pub struct AuthorizationGate;

impl AuthorizationGate {
    pub fn is_assignee_or_management(user: &User, assignees: &[Assignee]) -> bool {
        user.role.is_management() || is_assignee(user.id, assignees)
    }

    pub fn is_locked(task: &Task, now: DateTime<Utc>) -> bool {
        task.is_locked(now)
    }

    pub fn can_edit_checklist(
        user: &User,
        task: &Task,
        assignees: &[Assignee],
        now: DateTime<Utc>,
    ) -> bool {
        Self::is_assignee_or_management(user, assignees) && !Self::is_locked(task, now)
    }

    /// The deadline does not block submission; the watchdog submits late tasks
    pub fn can_submit(user: &User, task: &Task, assignees: &[Assignee]) -> bool {
        Self::is_assignee_or_management(user, assignees) && task.status.is_open()
    }

    pub fn can_approve(task: &Task, user: &User, assignees: &[Assignee]) -> bool {
        Self::review_denial(task, user, assignees).is_none()
    }

    /// Whether reject is offered at all; the reason is validated on use
    pub fn can_reject(task: &Task, user: &User, assignees: &[Assignee]) -> bool {
        Self::can_approve(task, user, assignees)
    }

    pub fn can_forward(task: &Task, user: &User, assignees: &[Assignee]) -> bool {
        if task.status.is_terminal() {
            return false;
        }
        if task.status.is_open() {
            Self::is_assignee_or_management(user, assignees)
        } else {
            Self::can_approve(task, user, assignees)
        }
    }

    pub fn permissions(
        user: &User,
        task: &Task,
        assignees: &[Assignee],
        now: DateTime<Utc>,
    ) -> Permissions {
        Permissions {
            can_edit_checklist: Self::can_edit_checklist(user, task, assignees, now),
            can_submit: Self::can_submit(user, task, assignees),
            can_approve: Self::can_approve(task, user, assignees),
            can_reject: Self::can_reject(task, user, assignees),
            can_forward: Self::can_forward(task, user, assignees),
        }
    }

    /// Gate a checklist mutation, returning the denial to surface
    pub fn authorize_checklist_edit(
        user: &User,
        task: &Task,
        assignees: &[Assignee],
        now: DateTime<Utc>,
    ) -> Result<()> {
        if !Self::is_assignee_or_management(user, assignees) {
            return Err(PharmadeskError::denied(
                "edit_checklist",
                "only assignees or management can edit the checklist",
            ));
        }
        if Self::is_locked(task, now) {
            return Err(PharmadeskError::denied(
                "edit_checklist",
                format!("task {} is locked", task.id),
            ));
        }
        Ok(())
    }

    /// Gate a task action, including the caller-side validation of its inputs
    pub fn authorize(
        action: &TaskAction,
        user: &User,
        task: &Task,
        assignees: &[Assignee],
    ) -> Result<()> {
        match action {
            TaskAction::Submit(trigger) => {
                if !task.status.is_open() {
                    return Err(PharmadeskError::denied(
                        "submit",
                        format!("task status {} cannot be submitted", task.status),
                    ));
                }
                // The watchdog acts for the assignees regardless of who is viewing
                if !trigger.is_automatic() && !Self::is_assignee_or_management(user, assignees) {
                    return Err(PharmadeskError::denied(
                        "submit",
                        "only assignees or management can submit",
                    ));
                }
                Ok(())
            }
            TaskAction::Approve => match Self::review_denial(task, user, assignees) {
                Some(reason) => Err(PharmadeskError::denied("approve", reason)),
                None => Ok(()),
            },
            TaskAction::Reject { reason } => {
                if let Some(denial) = Self::review_denial(task, user, assignees) {
                    return Err(PharmadeskError::denied("reject", denial));
                }
                if reason.trim().is_empty() {
                    return Err(PharmadeskError::validation("a rejection reason is required"));
                }
                Ok(())
            }
            TaskAction::Forward { to_user_id } => {
                if !Self::can_forward(task, user, assignees) {
                    return Err(PharmadeskError::denied(
                        "forward",
                        format!("user {} does not hold task {}", user.id, task.id),
                    ));
                }
                Self::validate_forward_target(user, *to_user_id)
            }
        }
    }

    fn validate_forward_target(user: &User, to_user_id: Uuid) -> Result<()> {
        if to_user_id.is_nil() {
            return Err(PharmadeskError::validation("a forward target is required"));
        }
        if to_user_id == user.id {
            return Err(PharmadeskError::validation(
                "a task cannot be forwarded to the current holder",
            ));
        }
        Ok(())
    }

    /// First rule that blocks a review by `user`, if any
    fn review_denial(task: &Task, user: &User, assignees: &[Assignee]) -> Option<String> {
        if is_assignee(user.id, assignees) {
            return Some("assignees cannot review their own task".to_string());
        }
        if !user.role.is_reviewer() {
            return Some(format!("role {} cannot review tasks", user.role));
        }
        if !task.status.is_awaiting_review() {
            return Some(format!("task status {} is not awaiting review", task.status));
        }
        None
    }
}
