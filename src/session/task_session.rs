//! # Task Session
//!
//! The canonical view of one task for one user while it is open on screen.
//! A session loads the task aggregate, applies checklist edits optimistically,
//! drives the review transitions through the [`AuthorizationGate`], and owns
//! the [`DeadlineWatchdog`] for the task.
//!
//! Canonical status only changes after the task service confirms an action:
//! the session refetches the aggregate, or, if that refetch fails, echoes the
//! target status the state machine expects.
//!
//! ## Submission claim
//!
//! The watchdog and the user share one submission path. A claim flag is set
//! before the remote call starts; whichever path claims first submits and the
//! other returns [`SubmissionOutcome::AlreadyClaimed`] without a call. A failed
//! submission releases the claim so the user can retry.

use super::optimistic::{optimistic_update, OptimisticError};
use super::watchdog::{DeadlineWatchdog, SkipReason, WatchdogPlan};
use crate::authorization::{AuthorizationGate, Permissions};
use crate::clock::{Clock, SystemClock};
use crate::config::{DashboardConfig, WatchdogConfig};
use crate::error::{PharmadeskError, Result};
use crate::events::{EventPublisher, SessionEvent};
use crate::logging::{log_error, log_task_operation};
use crate::models::{
    ActivityLogEntry, Assignee, ChecklistItem, ChecklistItemUpdate, ChecklistPhoto,
    ChecklistSnapshot, NewChecklistItem, PhotoUpload, Role, Task, User, WorkflowStep,
};
use crate::projection::{
    activity_history, latest_review_decision, pending_approver, ChecklistProgress,
    ReviewDecision, WorkflowProgress,
};
use crate::services::TaskService;
use crate::state_machine::{SubmissionTrigger, TaskAction, TaskStateMachine, TaskStatus};
use chrono::NaiveDate;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Everything the dashboard shows for one task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskAggregate {
    pub task: Task,
    /// Ordered by `sort_order`
    pub checklist: Vec<ChecklistItem>,
    pub activity: Vec<ActivityLogEntry>,
    pub workflow: Vec<WorkflowStep>,
    pub assignees: Vec<Assignee>,
}

impl TaskAggregate {
    /// Fetch all five parts of the aggregate concurrently
    pub async fn fetch(
        service: &dyn TaskService,
        task_id: Uuid,
        as_of: Option<NaiveDate>,
    ) -> Result<Self> {
        let (task, mut checklist, activity, workflow, assignees) = futures::try_join!(
            service.get_task(task_id),
            service.get_checklist(task_id, as_of),
            service.get_activity_log(task_id),
            service.get_workflow(task_id),
            service.get_assignees(task_id)
        )?;
        checklist.sort_by_key(|item| item.sort_order);

        Ok(Self {
            task,
            checklist,
            activity,
            workflow,
            assignees,
        })
    }

    pub fn item(&self, item_id: Uuid) -> Option<&ChecklistItem> {
        self.checklist.iter().find(|item| item.id == item_id)
    }

    fn item_mut(&mut self, item_id: Uuid) -> Option<&mut ChecklistItem> {
        self.checklist.iter_mut().find(|item| item.id == item_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Submitted,
    /// Another submission path already holds the claim; nothing was sent
    AlreadyClaimed,
}

/// Collaborators a session needs besides the task service
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub clock: Arc<dyn Clock>,
    pub publisher: EventPublisher,
    pub watchdog: WatchdogConfig,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            publisher: EventPublisher::default(),
            watchdog: WatchdogConfig::default(),
        }
    }
}

impl SessionOptions {
    pub fn from_config(config: &DashboardConfig) -> Self {
        Self {
            clock: Arc::new(SystemClock),
            publisher: EventPublisher::new(config.events.channel_capacity),
            watchdog: config.watchdog.clone(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_publisher(mut self, publisher: EventPublisher) -> Self {
        self.publisher = publisher;
        self
    }

    pub fn with_watchdog(mut self, watchdog: WatchdogConfig) -> Self {
        self.watchdog = watchdog;
        self
    }
}

struct SessionInner {
    task_id: Uuid,
    as_of: Option<NaiveDate>,
    user: User,
    service: Arc<dyn TaskService>,
    clock: Arc<dyn Clock>,
    publisher: EventPublisher,
    state: Mutex<TaskAggregate>,
    watchdog: DeadlineWatchdog,
    submission_claimed: AtomicBool,
    closed: AtomicBool,
}

/// One user's live view of one task. Dropping the session closes it.
pub struct TaskSession {
    inner: Arc<SessionInner>,
}

impl std::fmt::Debug for TaskSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskSession")
            .field("task_id", &self.inner.task_id)
            .field("user_id", &self.inner.user.id)
            .field("as_of", &self.inner.as_of)
            .field("closed", &self.inner.is_closed())
            .finish()
    }
}

impl TaskSession {
    /// Load the task aggregate and evaluate the deadline watchdog.
    ///
    /// `as_of` scopes the checklist of a recurring daily task to one calendar date.
    pub async fn load(
        service: Arc<dyn TaskService>,
        user: User,
        task_id: Uuid,
        as_of: Option<NaiveDate>,
        options: SessionOptions,
    ) -> Result<Self> {
        info!(task_id = %task_id, user_id = %user.id, as_of = ?as_of, "Loading task session");

        let aggregate = TaskAggregate::fetch(service.as_ref(), task_id, as_of)
            .await
            .inspect_err(|e| log_error("task_session", "load", &e.to_string(), Some(task_id)))?;

        log_task_operation(
            "load",
            task_id,
            &aggregate.task.status.to_string(),
            Some(&format!("{} checklist items", aggregate.checklist.len())),
        );

        let session = Self {
            inner: Arc::new(SessionInner {
                task_id,
                as_of,
                user,
                service,
                clock: options.clock,
                publisher: options.publisher,
                state: Mutex::new(aggregate),
                watchdog: DeadlineWatchdog::new(&options.watchdog),
                submission_claimed: AtomicBool::new(false),
                closed: AtomicBool::new(false),
            }),
        };
        session.arm_watchdog();

        Ok(session)
    }

    pub fn task_id(&self) -> Uuid {
        self.inner.task_id
    }

    pub fn current_user(&self) -> &User {
        &self.inner.user
    }

    pub fn as_of(&self) -> Option<NaiveDate> {
        self.inner.as_of
    }

    pub fn snapshot(&self) -> TaskAggregate {
        self.inner.state.lock().clone()
    }

    pub fn task(&self) -> Task {
        self.inner.state.lock().task.clone()
    }

    pub fn status(&self) -> TaskStatus {
        self.inner.state.lock().task.status.clone()
    }

    pub fn checklist(&self) -> Vec<ChecklistItem> {
        self.inner.state.lock().checklist.clone()
    }

    pub fn checklist_item(&self, item_id: Uuid) -> Option<ChecklistItem> {
        self.inner.state.lock().item(item_id).cloned()
    }

    pub fn assignees(&self) -> Vec<Assignee> {
        self.inner.state.lock().assignees.clone()
    }

    pub fn workflow(&self) -> Vec<WorkflowStep> {
        self.inner.state.lock().workflow.clone()
    }

    /// Activity log, newest first
    pub fn activity_history(&self) -> Vec<ActivityLogEntry> {
        activity_history(&self.inner.state.lock().activity)
    }

    pub fn latest_review_decision(&self) -> Option<ReviewDecision> {
        latest_review_decision(&self.inner.state.lock().activity)
    }

    pub fn pending_approver(&self) -> Option<Role> {
        pending_approver(&self.inner.state.lock().task.status).cloned()
    }

    pub fn checklist_progress(&self) -> ChecklistProgress {
        ChecklistProgress::from_items(&self.inner.state.lock().checklist)
    }

    pub fn workflow_progress(&self) -> WorkflowProgress {
        WorkflowProgress::from_steps(&self.inner.state.lock().workflow)
    }

    /// Every gate predicate for the current user, evaluated now
    pub fn permissions(&self) -> Permissions {
        let now = self.inner.clock.now();
        let state = self.inner.state.lock();
        AuthorizationGate::permissions(&self.inner.user, &state.task, &state.assignees, now)
    }

    pub fn is_locked(&self) -> bool {
        let now = self.inner.clock.now();
        self.inner.state.lock().task.is_locked(now)
    }

    pub fn watchdog_fired(&self) -> bool {
        self.inner.watchdog.has_fired()
    }

    pub fn watchdog_armed(&self) -> bool {
        self.inner.watchdog.is_armed()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    /// Evaluate the watchdog against the current status and deadline and
    /// schedule it. Re-evaluating replaces a pending timer; it never fires twice.
    pub fn arm_watchdog(&self) -> WatchdogPlan {
        let inner = &self.inner;
        if inner.is_closed() {
            return WatchdogPlan::Skip(SkipReason::SessionClosed);
        }

        let (status, deadline) = {
            let state = inner.state.lock();
            (state.task.status.clone(), state.task.deadline)
        };
        let plan = inner.watchdog.evaluate(&status, deadline, inner.clock.now());

        match &plan {
            WatchdogPlan::Arm { delay, fires_at } => {
                info!(
                    task_id = %inner.task_id,
                    delay_secs = delay.as_secs(),
                    fires_at = %fires_at,
                    "Deadline watchdog armed"
                );
                inner.emit(SessionEvent::WatchdogArmed {
                    fires_at: *fires_at,
                });
            }
            WatchdogPlan::FireNow(reason) => {
                info!(task_id = %inner.task_id, reason = ?reason, "Deadline reached, submitting now");
            }
            WatchdogPlan::Skip(reason) => {
                debug!(task_id = %inner.task_id, reason = ?reason, "Deadline watchdog skipped");
            }
        }

        let weak = Arc::downgrade(inner);
        inner.watchdog.arm(&plan, move || async move {
            if let Some(inner) = weak.upgrade() {
                inner.fire_watchdog().await;
            }
        });

        plan
    }

    /// Refetch the aggregate and re-evaluate the watchdog
    pub async fn reload(&self) -> Result<()> {
        let inner = &self.inner;
        inner.ensure_open()?;
        inner.watchdog.cancel();

        match TaskAggregate::fetch(inner.service.as_ref(), inner.task_id, inner.as_of).await {
            Ok(aggregate) => {
                inner.replace_state(aggregate);
                self.arm_watchdog();
                Ok(())
            }
            Err(e) => {
                inner.report_failure("reload", &e);
                self.arm_watchdog();
                Err(e)
            }
        }
    }

    /// Set an item's completion, optimistically. On failure only the
    /// completion flag is reverted; notes typed alongside are kept.
    pub async fn toggle_checklist_item(
        &self,
        item_id: Uuid,
        completed: bool,
        notes: Option<String>,
    ) -> Result<()> {
        let inner = &self.inner;
        inner.ensure_open()?;
        inner.authorize_checklist_edit(item_id)?;

        if let Some(notes) = &notes {
            if let Some(item) = inner.state.lock().item_mut(item_id) {
                item.notes = Some(notes.clone());
            }
        }

        let update = ChecklistItemUpdate {
            completed,
            notes,
            date: inner.as_of,
        };
        let remote = inner
            .service
            .update_checklist_item(inner.task_id, item_id, update);

        let result = optimistic_update(
            &inner.state,
            |state| state.item_mut(item_id).map(|item| &mut item.completed),
            completed,
            remote,
        )
        .await;

        match result {
            Ok(()) => {
                debug!(task_id = %inner.task_id, item_id = %item_id, completed, "Checklist item updated");
                inner.emit(SessionEvent::ChecklistItemUpdated { item_id, completed });
                Ok(())
            }
            Err(OptimisticError::MissingTarget) => {
                Err(PharmadeskError::not_found("ChecklistItem", item_id))
            }
            Err(OptimisticError::RemoteFailed { error, restored }) => {
                if let Some(completed) = restored {
                    inner.emit(SessionEvent::ChecklistItemReverted {
                        item_id,
                        completed,
                        error: error.to_string(),
                    });
                }
                inner.report_failure("update_checklist_item", &error);
                Err(error)
            }
        }
    }

    /// Persist an item's notes with its current completion flag.
    /// The local notes stay as typed even if the save fails.
    pub async fn save_item_notes(&self, item_id: Uuid, notes: impl Into<String>) -> Result<()> {
        let inner = &self.inner;
        inner.ensure_open()?;
        inner.authorize_checklist_edit(item_id)?;

        let notes = notes.into();
        let completed = {
            let mut state = inner.state.lock();
            let item = state
                .item_mut(item_id)
                .ok_or_else(|| PharmadeskError::not_found("ChecklistItem", item_id))?;
            item.notes = Some(notes.clone());
            item.completed
        };

        let update = ChecklistItemUpdate {
            completed,
            notes: Some(notes),
            date: inner.as_of,
        };
        match inner
            .service
            .update_checklist_item(inner.task_id, item_id, update)
            .await
        {
            Ok(()) => {
                inner.emit(SessionEvent::ChecklistNotesSaved { item_id });
                Ok(())
            }
            Err(e) => {
                inner.report_failure("save_item_notes", &e);
                Err(e)
            }
        }
    }

    /// Append an item remotely, then refetch the checklist for the
    /// server-assigned id and order
    pub async fn add_checklist_item(
        &self,
        title: impl Into<String>,
        description: Option<String>,
    ) -> Result<()> {
        let inner = &self.inner;
        inner.ensure_open()?;

        let title = title.into().trim().to_string();
        if title.is_empty() {
            return Err(PharmadeskError::validation("a checklist item title is required"));
        }
        inner.authorize_edit()?;

        let item = NewChecklistItem {
            title: title.clone(),
            description,
        };
        if let Err(e) = inner.service.add_checklist_item(inner.task_id, item).await {
            inner.report_failure("add_checklist_item", &e);
            return Err(e);
        }
        inner.emit(SessionEvent::ChecklistItemAdded { title });

        match inner
            .service
            .get_checklist(inner.task_id, inner.as_of)
            .await
        {
            Ok(mut items) => {
                items.sort_by_key(|item| item.sort_order);
                if !inner.is_closed() {
                    inner.state.lock().checklist = items;
                }
            }
            Err(e) => {
                warn!(task_id = %inner.task_id, error = %e, "Checklist refresh after add failed");
                inner.report_failure("refresh_checklist", &e);
            }
        }
        Ok(())
    }

    /// Upload a completion photo and prepend it to the item's photos
    pub async fn attach_photo(&self, item_id: Uuid, file: PhotoUpload) -> Result<ChecklistPhoto> {
        let inner = &self.inner;
        inner.ensure_open()?;
        inner.authorize_checklist_edit(item_id)?;

        let uploaded = match inner
            .service
            .upload_checklist_photo(inner.task_id, item_id, file)
            .await
        {
            Ok(uploaded) => uploaded,
            Err(e) => {
                inner.report_failure("upload_checklist_photo", &e);
                return Err(e);
            }
        };

        let photo = ChecklistPhoto {
            url: uploaded.photo_url,
            uploaded_by: inner.user.id,
            uploaded_at: inner.clock.now(),
        };
        if !inner.is_closed() {
            if let Some(item) = inner.state.lock().item_mut(item_id) {
                item.photos.insert(0, photo.clone());
            }
            inner.emit(SessionEvent::PhotoAttached {
                item_id,
                url: photo.url.clone(),
            });
        }
        Ok(photo)
    }

    /// Submit the checklist for review as the current user
    pub async fn submit(&self, notes: Option<String>) -> Result<SubmissionOutcome> {
        let outcome = self
            .inner
            .submit_with(SubmissionTrigger::User, notes)
            .await?;
        if outcome == SubmissionOutcome::Submitted {
            self.inner.watchdog.cancel();
        }
        Ok(outcome)
    }

    pub async fn approve(&self) -> Result<()> {
        let inner = &self.inner;
        let action = TaskAction::Approve;
        let target = inner.authorize_action(&action)?;

        if let Err(e) = inner.service.approve_task(inner.task_id).await {
            inner.report_failure(action.action_type(), &e);
            return Err(e);
        }
        inner
            .confirm(&action, SessionEvent::TaskApproved, target)
            .await;
        Ok(())
    }

    /// Reject with a reason; an empty reason fails before any call is made
    pub async fn reject(&self, reason: impl Into<String>) -> Result<()> {
        let inner = &self.inner;
        let reason = reason.into().trim().to_string();
        let action = TaskAction::Reject {
            reason: reason.clone(),
        };
        let target = inner.authorize_action(&action)?;

        if let Err(e) = inner.service.reject_task(inner.task_id, reason.clone()).await {
            inner.report_failure(action.action_type(), &e);
            return Err(e);
        }
        inner
            .confirm(&action, SessionEvent::TaskRejected { reason }, target)
            .await;
        Ok(())
    }

    /// Hand the task to another user
    pub async fn forward(&self, to_user_id: Uuid, notes: Option<String>) -> Result<()> {
        let inner = &self.inner;
        let action = TaskAction::Forward { to_user_id };
        let target = inner.authorize_action(&action)?;

        if let Err(e) = inner
            .service
            .forward_task(inner.task_id, to_user_id, notes)
            .await
        {
            inner.report_failure(action.action_type(), &e);
            return Err(e);
        }
        inner
            .confirm(&action, SessionEvent::TaskForwarded { to_user_id }, target)
            .await;
        Ok(())
    }

    /// Clear the watchdog timer and ignore any response still in flight
    pub fn close(&self) {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let cancelled = self.inner.watchdog.cancel();
        info!(
            task_id = %self.inner.task_id,
            watchdog_cancelled = cancelled,
            "Task session closed"
        );
    }
}

impl Drop for TaskSession {
    fn drop(&mut self) {
        self.close();
    }
}

impl SessionInner {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(PharmadeskError::SessionClosed {
                task_id: self.task_id,
            });
        }
        Ok(())
    }

    /// Publish unless closed
    fn emit(&self, event: SessionEvent) {
        if !self.is_closed() {
            self.publisher.publish(self.task_id, event);
        }
    }

    /// Log a remote failure and raise the user-visible notification
    fn report_failure(&self, operation: &str, error: &PharmadeskError) {
        log_error("task_session", operation, &error.to_string(), Some(self.task_id));
        self.emit(SessionEvent::MutationFailed {
            operation: operation.to_string(),
            message: error.to_string(),
        });
    }

    fn replace_state(&self, aggregate: TaskAggregate) {
        if self.is_closed() {
            debug!(task_id = %self.task_id, "Ignoring response for closed session");
            return;
        }
        *self.state.lock() = aggregate;
    }

    fn authorize_edit(&self) -> Result<()> {
        let now = self.clock.now();
        let state = self.state.lock();
        AuthorizationGate::authorize_checklist_edit(&self.user, &state.task, &state.assignees, now)
    }

    fn authorize_checklist_edit(&self, item_id: Uuid) -> Result<()> {
        self.authorize_edit()?;
        if self.state.lock().item(item_id).is_none() {
            return Err(PharmadeskError::not_found("ChecklistItem", item_id));
        }
        Ok(())
    }

    /// Gate `action` and return the status the service should move the task to
    fn authorize_action(&self, action: &TaskAction) -> Result<TaskStatus> {
        self.ensure_open()?;
        let state = self.state.lock();
        AuthorizationGate::authorize(action, &self.user, &state.task, &state.assignees)?;
        TaskStateMachine::determine_target_state(&state.task.status, action)
    }

    async fn submit_with(
        &self,
        trigger: SubmissionTrigger,
        notes: Option<String>,
    ) -> Result<SubmissionOutcome> {
        let action = TaskAction::Submit(trigger);
        let target = self.authorize_action(&action)?;

        if self
            .submission_claimed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!(task_id = %self.task_id, trigger = ?trigger, "Submission already claimed");
            return Ok(SubmissionOutcome::AlreadyClaimed);
        }

        let snapshot = ChecklistSnapshot::capture(&self.state.lock().checklist);
        info!(
            task_id = %self.task_id,
            trigger = ?trigger,
            completed = snapshot.completed_count(),
            total = snapshot.len(),
            "Submitting task"
        );

        if let Err(e) = self.service.submit_task(self.task_id, snapshot, notes).await {
            self.submission_claimed.store(false, Ordering::SeqCst);
            self.report_failure(action.action_type(), &e);
            return Err(e);
        }

        let event = SessionEvent::TaskSubmitted {
            automatic: trigger.is_automatic(),
        };
        self.confirm(&action, event, target).await;
        Ok(SubmissionOutcome::Submitted)
    }

    /// After the service confirmed `action`: announce it and pull the new
    /// canonical state, echoing `target` if the refetch fails
    async fn confirm(&self, action: &TaskAction, event: SessionEvent, target: TaskStatus) {
        self.emit(event);
        log_task_operation(action.action_type(), self.task_id, &target.to_string(), None);

        match TaskAggregate::fetch(self.service.as_ref(), self.task_id, self.as_of).await {
            Ok(aggregate) => self.replace_state(aggregate),
            Err(e) => {
                warn!(
                    task_id = %self.task_id,
                    error = %e,
                    expected_status = %target,
                    "Refresh after confirmed action failed, applying expected status"
                );
                if !self.is_closed() {
                    self.state.lock().task.status = target;
                }
            }
        }
    }

    async fn fire_watchdog(&self) {
        if self.is_closed() {
            return;
        }
        self.emit(SessionEvent::WatchdogFired);

        match self.submit_with(SubmissionTrigger::Watchdog, None).await {
            Ok(SubmissionOutcome::Submitted) => {
                info!(task_id = %self.task_id, "Watchdog submitted task");
            }
            Ok(SubmissionOutcome::AlreadyClaimed) => {
                debug!(task_id = %self.task_id, "Watchdog found submission already in flight");
            }
            Err(e) if e.is_local_rejection() => {
                warn!(task_id = %self.task_id, error = %e, "Watchdog submission not allowed");
            }
            Err(e) => {
                warn!(task_id = %self.task_id, error = %e, "Watchdog submission failed");
            }
        }
    }
}
