use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who initiated a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionTrigger {
    /// An assignee (or management) pressed submit
    User,
    /// The deadline watchdog submitted on the assignees' behalf
    Watchdog,
}

impl SubmissionTrigger {
    pub fn is_automatic(&self) -> bool {
        matches!(self, Self::Watchdog)
    }
}

/// Actions the core can drive against a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum TaskAction {
    /// Hand the checklist in for review
    Submit(SubmissionTrigger),
    /// Accept the submission at the current review level
    Approve,
    /// Send the submission back with a reason
    Reject { reason: String },
    /// Pass the task to another user
    Forward { to_user_id: Uuid },
}

impl TaskAction {
    /// Get a string representation of the action for logging
    pub fn action_type(&self) -> &'static str {
        match self {
            Self::Submit(_) => "submit",
            Self::Approve => "approve",
            Self::Reject { .. } => "reject",
            Self::Forward { .. } => "forward",
        }
    }

    /// Extract the rejection reason if this is a reject action
    pub fn rejection_reason(&self) -> Option<&str> {
        match self {
            Self::Reject { reason } => Some(reason),
            _ => None,
        }
    }

    /// Review actions need a reviewer, not an assignee
    pub fn is_review(&self) -> bool {
        matches!(self, Self::Approve | Self::Reject { .. })
    }
}
