//! # Activity and Workflow Projections
//!
//! Derived, read-only views over what the task service returned: who the task
//! is waiting on, the most recent review decision, ordered history, and
//! progress through the checklist and the approval hierarchy.

use crate::constants::activity;
use crate::models::{ActivityLogEntry, ChecklistItem, Role, WorkflowStep, WorkflowStepState};
use crate::state_machine::TaskStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewOutcome {
    Approved,
    Rejected,
}

impl ReviewOutcome {
    /// Match whole words of the label, so `disapproved` is not an approval
    fn from_action_label(label: &str) -> Option<Self> {
        let label = label.trim().to_ascii_lowercase();
        let words: Vec<&str> = label.split(['_', ' ', '-', '.']).collect();
        let has = |targets: [&str; 2]| words.iter().any(|w| targets.contains(w));

        if has([activity::REJECTED, "reject"]) {
            Some(Self::Rejected)
        } else if has([activity::APPROVED, "approve"]) {
            Some(Self::Approved)
        } else {
            None
        }
    }
}

/// The latest terminal review recorded in the activity log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewDecision {
    pub outcome: ReviewOutcome,
    pub reviewer_id: Option<Uuid>,
    pub reviewer_name: Option<String>,
    pub decided_at: DateTime<Utc>,
    /// Free-text details; the reason for a rejection
    pub details: Option<String>,
}

/// The role a `Pending_<Role>` status is waiting on, if it names one
pub fn pending_approver(status: &TaskStatus) -> Option<&Role> {
    status.pending_role()
}

/// Scan the activity log for the most recent approve/reject decision
pub fn latest_review_decision(entries: &[ActivityLogEntry]) -> Option<ReviewDecision> {
    entries
        .iter()
        .filter_map(|entry| {
            ReviewOutcome::from_action_label(&entry.action).map(|outcome| (outcome, entry))
        })
        .max_by_key(|(_, entry)| entry.timestamp)
        .map(|(outcome, entry)| ReviewDecision {
            outcome,
            reviewer_id: entry.user_id,
            reviewer_name: entry.user_name.clone(),
            decided_at: entry.timestamp,
            details: entry.details.clone(),
        })
}

/// Activity entries newest first
pub fn activity_history(entries: &[ActivityLogEntry]) -> Vec<ActivityLogEntry> {
    let mut history = entries.to_vec();
    history.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    history
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowProgress {
    pub total_levels: usize,
    pub completed_levels: usize,
    pub current_level: Option<u32>,
    pub current_role: Option<Role>,
}

impl WorkflowProgress {
    pub fn from_steps(steps: &[WorkflowStep]) -> Self {
        let mut ordered: Vec<&WorkflowStep> = steps.iter().collect();
        ordered.sort_by_key(|step| step.level);

        let current = ordered
            .iter()
            .find(|step| step.state == WorkflowStepState::Current);

        Self {
            total_levels: ordered.len(),
            completed_levels: ordered
                .iter()
                .filter(|step| step.state == WorkflowStepState::Completed)
                .count(),
            current_level: current.map(|step| step.level),
            current_role: current.map(|step| step.role.clone()),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.total_levels > 0 && self.completed_levels == self.total_levels
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistProgress {
    pub completed: usize,
    pub total: usize,
}

impl ChecklistProgress {
    pub fn from_items(items: &[ChecklistItem]) -> Self {
        Self {
            completed: items.iter().filter(|item| item.completed).count(),
            total: items.len(),
        }
    }

    /// Whole-number completion percentage, 0 for an empty checklist
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        ((self.completed * 100) / self.total) as u8
    }

    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entry(action: &str, at: DateTime<Utc>, details: Option<&str>) -> ActivityLogEntry {
        ActivityLogEntry {
            id: Uuid::new_v4(),
            action: action.to_string(),
            user_id: Some(Uuid::new_v4()),
            user_name: Some("Reviewer".to_string()),
            timestamp: at,
            details: details.map(str::to_string),
        }
    }

    #[test]
    fn test_latest_review_decision_picks_newest() {
        let t0 = Utc::now();
        let entries = vec![
            entry("Submitted", t0, None),
            entry("Rejected", t0 + Duration::minutes(5), Some("photos blurry")),
            entry("Submitted", t0 + Duration::minutes(10), None),
            entry("Approved", t0 + Duration::minutes(20), None),
            entry("Forwarded", t0 + Duration::minutes(30), None),
        ];

        let decision = latest_review_decision(&entries).unwrap();
        assert_eq!(decision.outcome, ReviewOutcome::Approved);
        assert_eq!(decision.decided_at, t0 + Duration::minutes(20));
    }

    #[test]
    fn test_latest_review_decision_keeps_rejection_reason() {
        let t0 = Utc::now();
        let entries = vec![
            entry("task_rejected", t0 + Duration::minutes(1), Some("fridge log missing")),
            entry("submitted", t0, None),
        ];
        let decision = latest_review_decision(&entries).unwrap();
        assert_eq!(decision.outcome, ReviewOutcome::Rejected);
        assert_eq!(decision.details.as_deref(), Some("fridge log missing"));

        assert!(latest_review_decision(&[entry("submitted", t0, None)]).is_none());
    }

    #[test]
    fn test_review_outcome_matches_whole_words() {
        assert_eq!(
            ReviewOutcome::from_action_label("Task Approved"),
            Some(ReviewOutcome::Approved)
        );
        assert_eq!(
            ReviewOutcome::from_action_label("review.reject"),
            Some(ReviewOutcome::Rejected)
        );
        assert_eq!(ReviewOutcome::from_action_label("disapproved"), None);
        assert_eq!(ReviewOutcome::from_action_label("unapproved-draft"), None);

        let t0 = Utc::now();
        let entries = vec![
            entry("rejected", t0, Some("recount shelf B")),
            entry("disapproved", t0 + Duration::minutes(5), None),
        ];
        let decision = latest_review_decision(&entries).unwrap();
        assert_eq!(decision.outcome, ReviewOutcome::Rejected);
        assert_eq!(decision.decided_at, t0);
    }

    #[test]
    fn test_activity_history_is_newest_first() {
        let t0 = Utc::now();
        let entries = vec![
            entry("submitted", t0, None),
            entry("approved", t0 + Duration::minutes(3), None),
        ];
        let history = activity_history(&entries);
        assert_eq!(history[0].action, "approved");
        assert_eq!(history[1].action, "submitted");
    }

    #[test]
    fn test_workflow_progress() {
        let steps = vec![
            WorkflowStep {
                level: 2,
                role: Role::AreaManager,
                state: WorkflowStepState::Current,
                completed_at: None,
                completed_by: None,
                comments: None,
            },
            WorkflowStep {
                level: 1,
                role: Role::BranchManager,
                state: WorkflowStepState::Completed,
                completed_at: Some(Utc::now()),
                completed_by: Some("Yasmin".into()),
                comments: Some("ok".into()),
            },
            WorkflowStep {
                level: 3,
                role: Role::Management,
                state: WorkflowStepState::Pending,
                completed_at: None,
                completed_by: None,
                comments: None,
            },
        ];

        let progress = WorkflowProgress::from_steps(&steps);
        assert_eq!(progress.total_levels, 3);
        assert_eq!(progress.completed_levels, 1);
        assert_eq!(progress.current_level, Some(2));
        assert_eq!(progress.current_role, Some(Role::AreaManager));
        assert!(!progress.is_complete());
    }

    #[test]
    fn test_checklist_progress_percent() {
        let progress = ChecklistProgress {
            completed: 2,
            total: 3,
        };
        assert_eq!(progress.percent(), 66);
        assert_eq!(ChecklistProgress::from_items(&[]).percent(), 0);
    }

    #[test]
    fn test_pending_approver() {
        let status = TaskStatus::PendingReview {
            role: Some(Role::Auditor),
        };
        assert_eq!(pending_approver(&status), Some(&Role::Auditor));
        assert_eq!(pending_approver(&TaskStatus::Submitted), None);
    }
}
