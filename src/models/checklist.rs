//! # Checklist Items
//!
//! Completable sub-steps of a task. Items carry free-text notes and completion
//! photos, and are only editable while the owning task is unlocked.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reference to a photo the photo service stored for a checklist item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistPhoto {
    pub url: String,
    pub uploaded_by: Uuid,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: Uuid,
    pub task_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
    /// Newest first
    #[serde(default)]
    pub photos: Vec<ChecklistPhoto>,
}

/// Body of an `updateChecklistItem` call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItemUpdate {
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Calendar date of the checklist for recurring daily tasks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

/// Body of an `addChecklistItem` call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewChecklistItem {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// An opaque file handed to the photo service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl PhotoUpload {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }
}

/// Per-item state captured at submission time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistEntrySnapshot {
    pub item_id: Uuid,
    pub completed: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Completion and notes of every checklist item, sent with a submission
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChecklistSnapshot(pub Vec<ChecklistEntrySnapshot>);

impl ChecklistSnapshot {
    pub fn capture(items: &[ChecklistItem]) -> Self {
        Self(
            items
                .iter()
                .map(|item| ChecklistEntrySnapshot {
                    item_id: item.id,
                    completed: item.completed,
                    notes: item.notes.clone(),
                })
                .collect(),
        )
    }

    pub fn entries(&self) -> &[ChecklistEntrySnapshot] {
        &self.0
    }

    pub fn completed_count(&self) -> usize {
        self.0.iter().filter(|entry| entry.completed).count()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
