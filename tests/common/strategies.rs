//! Proptest strategies for roles, statuses and tasks

use super::builders::{fixed_now, TaskBuilder};
use chrono::Duration;
use pharmadesk_core::models::{Role, Task};
use pharmadesk_core::TaskStatus;
use proptest::prelude::*;

pub fn role_strategy() -> impl Strategy<Value = Role> {
    prop_oneof![
        Just(Role::Staff),
        Just(Role::Pharmacist),
        Just(Role::BranchManager),
        Just(Role::AreaManager),
        Just(Role::Auditor),
        Just(Role::Management),
        "[a-z]{3,10}_[a-z]{3,10}".prop_map(Role::Other),
    ]
}

pub fn non_reviewer_role_strategy() -> impl Strategy<Value = Role> {
    role_strategy().prop_filter("reviewer roles excluded", |role| !role.is_reviewer())
}

pub fn status_strategy() -> impl Strategy<Value = TaskStatus> {
    prop_oneof![
        Just(TaskStatus::Assigned),
        Just(TaskStatus::InProgress),
        Just(TaskStatus::Submitted),
        Just(TaskStatus::Approved),
        Just(TaskStatus::Rejected),
        Just(TaskStatus::Expired),
        Just(TaskStatus::Completed),
        proptest::option::of(role_strategy()).prop_map(|role| TaskStatus::PendingReview { role }),
    ]
}

/// Deadline offset from [`fixed_now`] in seconds, past and future
pub fn deadline_offset_strategy() -> impl Strategy<Value = i64> {
    -7 * 24 * 3600i64..7 * 24 * 3600i64
}

pub fn task_strategy() -> impl Strategy<Value = Task> {
    (status_strategy(), deadline_offset_strategy()).prop_map(|(status, offset)| {
        TaskBuilder::new("Generated task")
            .status(status)
            .deadline_in(Duration::seconds(offset))
            .build()
    })
}

/// A moment around the task's deadline
pub fn now_strategy() -> impl Strategy<Value = chrono::DateTime<chrono::Utc>> {
    deadline_offset_strategy().prop_map(|offset| fixed_now() + Duration::seconds(offset))
}
