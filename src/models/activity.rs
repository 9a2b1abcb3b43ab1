//! # Activity Log and Workflow Steps
//!
//! Read-only, service-generated views of a task's history. The core never
//! writes either of these; both are refetched on every task load.

use crate::models::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One audit-trail record written by the task service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    pub id: Uuid,
    /// Action label, e.g. "submitted", "approved", "rejected"
    pub action: String,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub user_name: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub details: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStepState {
    Pending,
    Current,
    Completed,
}

/// One level of the approval hierarchy for a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStep {
    /// 1-based position in the hierarchy
    pub level: u32,
    pub role: Role,
    pub state: WorkflowStepState,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_by: Option<String>,
    #[serde(default)]
    pub comments: Option<String>,
}
