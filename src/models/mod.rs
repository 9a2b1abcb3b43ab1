pub mod activity;
pub mod checklist;
pub mod task;
pub mod user;

// Re-export models for easy access
pub use activity::{ActivityLogEntry, WorkflowStep, WorkflowStepState};
pub use checklist::{
    ChecklistEntrySnapshot, ChecklistItem, ChecklistItemUpdate, ChecklistPhoto, ChecklistSnapshot,
    NewChecklistItem, PhotoUpload,
};
pub use task::{Priority, Task, TaskScope};
pub use user::{is_assignee, Assignee, Role, User};
