//! Mock Task Service for Testing
//!
//! In-memory implementation of the `TaskService` trait. Records every call,
//! applies mutations to its own copy of the task so refreshes see the new
//! state, and can be told to fail individual operations.

use async_trait::async_trait;
use chrono::NaiveDate;
use pharmadesk_core::error::{PharmadeskError, Result};
use pharmadesk_core::models::{
    ActivityLogEntry, Assignee, ChecklistItem, ChecklistItemUpdate, ChecklistSnapshot,
    NewChecklistItem, PhotoUpload, Task, WorkflowStep,
};
use pharmadesk_core::services::{TaskService, UploadedPhoto};
use pharmadesk_core::TaskStatus;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

/// Service operations, for failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    GetTask,
    GetChecklist,
    UpdateChecklistItem,
    AddChecklistItem,
    UploadPhoto,
    GetActivity,
    GetWorkflow,
    GetAssignees,
    Submit,
    Approve,
    Reject,
    Forward,
}

/// Mock service state for tracking calls and simulating the task service
#[derive(Debug, Default, Clone)]
pub struct MockServiceState {
    pub task: Option<Task>,
    pub checklist: Vec<ChecklistItem>,
    pub activity: Vec<ActivityLogEntry>,
    pub workflow: Vec<WorkflowStep>,
    pub assignees: Vec<Assignee>,

    /// Dates passed to `get_checklist`
    pub checklist_dates: Vec<Option<NaiveDate>>,
    pub checklist_updates: Vec<(Uuid, ChecklistItemUpdate)>,
    pub added_items: Vec<NewChecklistItem>,
    pub photo_uploads: Vec<(Uuid, String)>,
    /// Every submit call, including failed ones
    pub submissions: Vec<(ChecklistSnapshot, Option<String>)>,
    pub approvals: usize,
    pub rejections: Vec<String>,
    pub forwards: Vec<(Uuid, Option<String>)>,
    pub task_fetches: usize,
}

#[derive(Clone, Default)]
pub struct MockTaskService {
    state: Arc<Mutex<MockServiceState>>,
    failures: Arc<Mutex<HashSet<Op>>>,
    /// Simulate a slow service
    response_delay: Option<Duration>,
}

impl MockTaskService {
    pub fn new(
        task: Task,
        checklist: Vec<ChecklistItem>,
        assignees: Vec<Assignee>,
    ) -> Self {
        let state = MockServiceState {
            task: Some(task),
            checklist,
            assignees,
            ..Default::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            ..Default::default()
        }
    }

    pub fn with_response_delay(mut self, delay: Duration) -> Self {
        self.response_delay = Some(delay);
        self
    }

    pub fn with_activity(self, activity: Vec<ActivityLogEntry>) -> Self {
        self.state.lock().unwrap().activity = activity;
        self
    }

    pub fn with_workflow(self, workflow: Vec<WorkflowStep>) -> Self {
        self.state.lock().unwrap().workflow = workflow;
        self
    }

    pub fn fail_on(&self, op: Op) {
        self.failures.lock().unwrap().insert(op);
    }

    pub fn succeed_on(&self, op: Op) {
        self.failures.lock().unwrap().remove(&op);
    }

    /// Change the service-side task, as another user would
    pub fn update_task(&self, update: impl FnOnce(&mut Task)) {
        if let Some(task) = self.state.lock().unwrap().task.as_mut() {
            update(task);
        }
    }

    /// Get the current state for assertions
    pub fn get_state(&self) -> MockServiceState {
        self.state.lock().unwrap().clone()
    }

    async fn respond(&self, op: Op) -> Result<()> {
        if let Some(delay) = self.response_delay {
            tokio::time::sleep(delay).await;
        }
        if self.failures.lock().unwrap().contains(&op) {
            return Err(PharmadeskError::NetworkError(format!(
                "injected failure for {op:?}"
            )));
        }
        Ok(())
    }

    fn set_status(&self, status: TaskStatus) {
        self.update_task(|task| task.status = status);
    }
}

#[async_trait]
impl TaskService for MockTaskService {
    async fn get_task(&self, task_id: Uuid) -> Result<Task> {
        self.state.lock().unwrap().task_fetches += 1;
        self.respond(Op::GetTask).await?;
        self.state
            .lock()
            .unwrap()
            .task
            .clone()
            .filter(|task| task.id == task_id)
            .ok_or_else(|| PharmadeskError::not_found("Task", task_id))
    }

    async fn get_checklist(
        &self,
        _task_id: Uuid,
        date: Option<NaiveDate>,
    ) -> Result<Vec<ChecklistItem>> {
        self.state.lock().unwrap().checklist_dates.push(date);
        self.respond(Op::GetChecklist).await?;
        Ok(self.state.lock().unwrap().checklist.clone())
    }

    async fn update_checklist_item(
        &self,
        _task_id: Uuid,
        item_id: Uuid,
        update: ChecklistItemUpdate,
    ) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .checklist_updates
            .push((item_id, update.clone()));
        self.respond(Op::UpdateChecklistItem).await?;

        let mut state = self.state.lock().unwrap();
        let item = state
            .checklist
            .iter_mut()
            .find(|item| item.id == item_id)
            .ok_or_else(|| PharmadeskError::not_found("ChecklistItem", item_id))?;
        item.completed = update.completed;
        if update.notes.is_some() {
            item.notes = update.notes;
        }
        Ok(())
    }

    async fn add_checklist_item(&self, task_id: Uuid, item: NewChecklistItem) -> Result<()> {
        self.state.lock().unwrap().added_items.push(item.clone());
        self.respond(Op::AddChecklistItem).await?;

        let mut state = self.state.lock().unwrap();
        let sort_order = state.checklist.len() as i32;
        state.checklist.push(ChecklistItem {
            id: Uuid::new_v4(),
            task_id,
            title: item.title,
            description: item.description,
            completed: false,
            notes: None,
            sort_order,
            photos: vec![],
        });
        Ok(())
    }

    async fn upload_checklist_photo(
        &self,
        _task_id: Uuid,
        item_id: Uuid,
        file: PhotoUpload,
    ) -> Result<UploadedPhoto> {
        self.state
            .lock()
            .unwrap()
            .photo_uploads
            .push((item_id, file.file_name.clone()));
        self.respond(Op::UploadPhoto).await?;
        Ok(UploadedPhoto {
            photo_url: format!("https://photos.example/{item_id}/{}", file.file_name),
        })
    }

    async fn get_activity_log(&self, _task_id: Uuid) -> Result<Vec<ActivityLogEntry>> {
        self.respond(Op::GetActivity).await?;
        Ok(self.state.lock().unwrap().activity.clone())
    }

    async fn get_workflow(&self, _task_id: Uuid) -> Result<Vec<WorkflowStep>> {
        self.respond(Op::GetWorkflow).await?;
        Ok(self.state.lock().unwrap().workflow.clone())
    }

    async fn get_assignees(&self, _task_id: Uuid) -> Result<Vec<Assignee>> {
        self.respond(Op::GetAssignees).await?;
        Ok(self.state.lock().unwrap().assignees.clone())
    }

    async fn submit_task(
        &self,
        _task_id: Uuid,
        checklist: ChecklistSnapshot,
        notes: Option<String>,
    ) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .submissions
            .push((checklist, notes));
        self.respond(Op::Submit).await?;
        self.set_status(TaskStatus::Submitted);
        Ok(())
    }

    async fn approve_task(&self, _task_id: Uuid) -> Result<()> {
        self.state.lock().unwrap().approvals += 1;
        self.respond(Op::Approve).await?;
        self.set_status(TaskStatus::Approved);
        Ok(())
    }

    async fn reject_task(&self, _task_id: Uuid, reason: String) -> Result<()> {
        self.state.lock().unwrap().rejections.push(reason);
        self.respond(Op::Reject).await?;
        self.set_status(TaskStatus::Rejected);
        Ok(())
    }

    async fn forward_task(
        &self,
        _task_id: Uuid,
        to_user_id: Uuid,
        notes: Option<String>,
    ) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .forwards
            .push((to_user_id, notes));
        self.respond(Op::Forward).await
    }
}
