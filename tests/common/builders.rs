//! Builders for tasks, users and checklist fixtures

use chrono::{DateTime, Duration, TimeZone, Utc};
use pharmadesk_core::models::{
    ActivityLogEntry, Assignee, ChecklistItem, Priority, Role, Task, TaskScope, User,
    WorkflowStep, WorkflowStepState,
};
use pharmadesk_core::TaskStatus;
use uuid::Uuid;

/// Fixed wall-clock instant tests pin their clocks to
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap()
}

pub fn user(name: &str, role: Role) -> User {
    let email = format!("{}@branch.example", name.to_lowercase().replace(' ', "."));
    User::new(name, email, role)
}

pub fn assignees(users: &[&User]) -> Vec<Assignee> {
    users.iter().map(|user| Assignee::from(*user)).collect()
}

pub struct TaskBuilder {
    task: Task,
}

impl TaskBuilder {
    pub fn new(title: &str) -> Self {
        Self {
            task: Task {
                id: Uuid::new_v4(),
                title: title.to_string(),
                description: None,
                scope: TaskScope::Daily,
                status: TaskStatus::InProgress,
                deadline: fixed_now() + Duration::hours(8),
                priority: Priority::Medium,
                auto_forward: false,
                branch_ids: vec![Uuid::new_v4()],
                created_at: Some(fixed_now() - Duration::days(1)),
                updated_at: None,
            },
        }
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.task.status = status;
        self
    }

    /// Deadline relative to [`fixed_now`]
    pub fn deadline_in(mut self, offset: Duration) -> Self {
        self.task.deadline = fixed_now() + offset;
        self
    }

    pub fn scope(mut self, scope: TaskScope) -> Self {
        self.task.scope = scope;
        self
    }

    pub fn build(self) -> Task {
        self.task
    }
}

/// Unchecked items in reverse sort order, so loading has to sort them
pub fn checklist(task_id: Uuid, titles: &[&str]) -> Vec<ChecklistItem> {
    titles
        .iter()
        .enumerate()
        .rev()
        .map(|(index, title)| ChecklistItem {
            id: Uuid::new_v4(),
            task_id,
            title: title.to_string(),
            description: None,
            completed: false,
            notes: None,
            sort_order: index as i32,
            photos: vec![],
        })
        .collect()
}

pub fn activity(action: &str, by: &User, minutes_ago: i64, details: Option<&str>) -> ActivityLogEntry {
    ActivityLogEntry {
        id: Uuid::new_v4(),
        action: action.to_string(),
        user_id: Some(by.id),
        user_name: Some(by.name.clone()),
        timestamp: fixed_now() - Duration::minutes(minutes_ago),
        details: details.map(str::to_string),
    }
}

/// Branch manager, then area manager, with the first level current
pub fn two_level_workflow() -> Vec<WorkflowStep> {
    vec![
        WorkflowStep {
            level: 2,
            role: Role::AreaManager,
            state: WorkflowStepState::Pending,
            completed_at: None,
            completed_by: None,
            comments: None,
        },
        WorkflowStep {
            level: 1,
            role: Role::BranchManager,
            state: WorkflowStepState::Current,
            completed_at: None,
            completed_by: None,
            comments: None,
        },
    ]
}
