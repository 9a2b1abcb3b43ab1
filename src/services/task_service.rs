//! # Task Service Seam
//!
//! The external task/workflow service the core drives. Persistence, hierarchy
//! resolution and deadline enforcement all live behind this trait; the core
//! only calls it.

use crate::error::Result;
use crate::models::{
    ActivityLogEntry, Assignee, ChecklistItem, ChecklistItemUpdate, ChecklistSnapshot,
    NewChecklistItem, PhotoUpload, Task, WorkflowStep,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Response of a photo upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedPhoto {
    #[serde(alias = "photoUrl")]
    pub photo_url: String,
}

#[async_trait]
pub trait TaskService: Send + Sync {
    async fn get_task(&self, task_id: Uuid) -> Result<Task>;

    /// `date` scopes the checklist of a recurring daily task to one day
    async fn get_checklist(&self, task_id: Uuid, date: Option<NaiveDate>)
        -> Result<Vec<ChecklistItem>>;

    async fn update_checklist_item(
        &self,
        task_id: Uuid,
        item_id: Uuid,
        update: ChecklistItemUpdate,
    ) -> Result<()>;

    async fn add_checklist_item(&self, task_id: Uuid, item: NewChecklistItem) -> Result<()>;

    async fn upload_checklist_photo(
        &self,
        task_id: Uuid,
        item_id: Uuid,
        file: PhotoUpload,
    ) -> Result<UploadedPhoto>;

    async fn get_activity_log(&self, task_id: Uuid) -> Result<Vec<ActivityLogEntry>>;

    async fn get_workflow(&self, task_id: Uuid) -> Result<Vec<WorkflowStep>>;

    async fn get_assignees(&self, task_id: Uuid) -> Result<Vec<Assignee>>;

    async fn submit_task(
        &self,
        task_id: Uuid,
        checklist: ChecklistSnapshot,
        notes: Option<String>,
    ) -> Result<()>;

    async fn approve_task(&self, task_id: Uuid) -> Result<()>;

    async fn reject_task(&self, task_id: Uuid, reason: String) -> Result<()>;

    async fn forward_task(&self, task_id: Uuid, to_user_id: Uuid, notes: Option<String>)
        -> Result<()>;
}
