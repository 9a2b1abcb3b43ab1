//! # Error Types
//!
//! One error taxonomy for every task-session operation. Local failures
//! (`AuthorizationDenied`, `ValidationError`) are raised before any network
//! call; remote failures (`NetworkError`, `ServiceError`, `NotFound`) come back
//! from the task service and never advance canonical task status.

use thiserror::Error;
use uuid::Uuid;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, PharmadeskError>;

#[derive(Debug, Error)]
pub enum PharmadeskError {
    #[error("Authorization denied for {action}: {reason}")]
    AuthorizationDenied { action: String, reason: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Service error: HTTP {status} - {message}")]
    ServiceError { status: u16, message: String },

    #[error("Invalid response from task service: {0}")]
    InvalidResponse(String),

    #[error("Task session {task_id} is closed")]
    SessionClosed { task_id: Uuid },

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PharmadeskError {
    pub fn denied(action: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::AuthorizationDenied {
            action: action.into(),
            reason: reason.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn service(status: u16, message: impl Into<String>) -> Self {
        Self::ServiceError {
            status,
            message: message.into(),
        }
    }

    /// True for failures that happened on the far side of the task service.
    /// These are the ones that trigger optimistic rollback.
    #[must_use]
    pub fn is_remote_failure(&self) -> bool {
        matches!(
            self,
            Self::NetworkError(_)
                | Self::ServiceError { .. }
                | Self::NotFound { .. }
                | Self::InvalidResponse(_)
                | Self::Serialization(_)
        )
    }

    /// True for failures raised locally, before any network call was made
    #[must_use]
    pub fn is_local_rejection(&self) -> bool {
        matches!(
            self,
            Self::AuthorizationDenied { .. } | Self::ValidationError(_)
        )
    }

    /// Check if error is worth retrying
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::NetworkError(_) => true,
            Self::ServiceError { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
