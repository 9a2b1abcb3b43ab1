use crate::constants::PENDING_STATUS_PREFIX;
use crate::models::Role;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task status as reported by the task service.
///
/// Multi-level review is a tagged variant instead of the `Pending_<Role>`
/// string the service sends; the string form only exists at the wire boundary.
/// Any status starting with `Pending` is awaiting review, with or without a
/// named role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TaskStatus {
    /// Task handed to its assignees, no work recorded yet
    Assigned,
    /// Assignees have started working through the checklist
    InProgress,
    /// Submitted and waiting for the first review
    Submitted,
    /// Hierarchical review in flight, awaiting the named role if the service
    /// gave one
    PendingReview { role: Option<Role> },
    /// Review accepted the submission
    Approved,
    /// Review rejected the submission
    Rejected,
    /// Task lapsed without a successful submission
    Expired,
    /// Task closed out after approval
    Completed,
}

impl TaskStatus {
    /// No transition is permitted out of a terminal status
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Approved | Self::Rejected | Self::Completed | Self::Expired
        )
    }

    /// Assignees still owe a submission
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Assigned | Self::InProgress)
    }

    /// Waiting on a reviewer: `submitted` or any `Pending*` status
    pub fn is_awaiting_review(&self) -> bool {
        matches!(self, Self::Submitted | Self::PendingReview { .. })
    }

    /// Checklist edits are frozen by the status alone (the deadline also locks)
    pub fn locks_checklist(&self) -> bool {
        matches!(self, Self::Submitted | Self::Approved)
    }

    /// The role a `Pending_<Role>` status is waiting on, if it names one
    pub fn pending_role(&self) -> Option<&Role> {
        match self {
            Self::PendingReview { role } => role.as_ref(),
            _ => None,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Assigned => write!(f, "assigned"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Submitted => write!(f, "submitted"),
            Self::PendingReview { role: None } => write!(f, "{PENDING_STATUS_PREFIX}"),
            Self::PendingReview { role: Some(role) } => write!(
                f,
                "{PENDING_STATUS_PREFIX}_{}",
                role.display_name().replace(' ', "_")
            ),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
            Self::Expired => write!(f, "expired"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        if let Some(rest) = strip_prefix_ignore_case(trimmed, PENDING_STATUS_PREFIX) {
            let role_name = rest.trim_matches(['_', ' ', '-']);
            let role = if role_name.is_empty() {
                None
            } else {
                Some(
                    role_name
                        .parse::<Role>()
                        .map_err(|e| format!("Invalid task status {s}: {e}"))?,
                )
            };
            return Ok(Self::PendingReview { role });
        }

        match trimmed.to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "assigned" => Ok(Self::Assigned),
            "in_progress" => Ok(Self::InProgress),
            "submitted" => Ok(Self::Submitted),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "expired" => Ok(Self::Expired),
            "completed" => Ok(Self::Completed),
            _ => Err(format!("Invalid task status: {s}")),
        }
    }
}

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    let head = value.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &value[prefix.len()..])
}

impl TryFrom<String> for TaskStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TaskStatus> for String {
    fn from(status: TaskStatus) -> Self {
        status.to_string()
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::Assigned
    }
}
