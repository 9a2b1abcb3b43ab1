#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Pharmadesk Core
//!
//! Task lifecycle and approval-workflow core for the pharmacy operations
//! dashboard.
//!
//! ## Overview
//!
//! Branch staff work through recurring checklists (daily, weekly, monthly or
//! custom) that are reviewed up a role hierarchy: branch manager, area
//! manager, auditor, management. The task service owns persistence and the
//! hierarchy; this crate owns what happens while one user has one task open.
//!
//! ## Key Features
//!
//! - **Task sessions**: load the task aggregate, optimistic checklist edits
//!   with rollback, and service-confirmed status transitions
//! - **Deadline watchdog**: auto-submits an open task just before its
//!   deadline, exactly once per session
//! - **Authorization gate**: pure predicates for edit, submit, approve,
//!   reject and forward
//! - **Projections**: pending approver, latest review decision, checklist and
//!   workflow progress
//!
//! ## Module Organization
//!
//! - [`session`] - Task state model and deadline watchdog
//! - [`authorization`] - Authorization gate
//! - [`state_machine`] - Task status, actions and transition rules
//! - [`projection`] - Activity and workflow projections
//! - [`services`] - Task service trait and its HTTP client
//! - [`models`] - Wire types
//! - [`config`] - Layered configuration
//! - [`events`] - Session event publisher
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pharmadesk_core::config::ConfigManager;
//! use pharmadesk_core::models::{Role, User};
//! use pharmadesk_core::services::HttpTaskService;
//! use pharmadesk_core::session::{SessionOptions, TaskSession};
//! use std::sync::Arc;
//! use uuid::Uuid;
//!
//! # async fn example(task_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let service = Arc::new(HttpTaskService::new(manager.config().service.clone())?);
//! let user = User::new("Dana Reyes", "dana@example.com", Role::Staff);
//!
//! let session = TaskSession::load(
//!     service,
//!     user,
//!     task_id,
//!     None,
//!     SessionOptions::from_config(manager.config()),
//! )
//! .await?;
//!
//! if session.permissions().can_submit {
//!     session.submit(None).await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod authorization;
pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod projection;
pub mod services;
pub mod session;
pub mod state_machine;

pub use authorization::{AuthorizationGate, Permissions};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigManager, DashboardConfig};
pub use error::{PharmadeskError, Result};
pub use events::{EventPublisher, PublishedEvent, SessionEvent};
pub use models::{
    ActivityLogEntry, Assignee, ChecklistItem, ChecklistSnapshot, Role, Task, User, WorkflowStep,
};
pub use services::{HttpTaskService, TaskService};
pub use session::{SessionOptions, SubmissionOutcome, TaskAggregate, TaskSession};
pub use state_machine::{TaskAction, TaskStatus};
