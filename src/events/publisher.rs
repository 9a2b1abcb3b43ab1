use crate::constants::events as names;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Something a task session did, or failed to do, that a caller may surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    ChecklistItemUpdated { item_id: Uuid, completed: bool },
    ChecklistItemReverted { item_id: Uuid, completed: bool, error: String },
    ChecklistItemAdded { title: String },
    ChecklistNotesSaved { item_id: Uuid },
    PhotoAttached { item_id: Uuid, url: String },
    TaskSubmitted { automatic: bool },
    TaskApproved,
    TaskRejected { reason: String },
    TaskForwarded { to_user_id: Uuid },
    WatchdogArmed { fires_at: DateTime<Utc> },
    WatchdogFired,
    /// User-visible error notification for a failed remote mutation
    MutationFailed { operation: String, message: String },
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ChecklistItemUpdated { .. } => names::CHECKLIST_ITEM_UPDATED,
            Self::ChecklistItemReverted { .. } => names::CHECKLIST_ITEM_REVERTED,
            Self::ChecklistItemAdded { .. } => names::CHECKLIST_ITEM_ADDED,
            Self::ChecklistNotesSaved { .. } => names::CHECKLIST_NOTES_SAVED,
            Self::PhotoAttached { .. } => names::CHECKLIST_PHOTO_ATTACHED,
            Self::TaskSubmitted { .. } => names::TASK_SUBMITTED,
            Self::TaskApproved => names::TASK_APPROVED,
            Self::TaskRejected { .. } => names::TASK_REJECTED,
            Self::TaskForwarded { .. } => names::TASK_FORWARDED,
            Self::WatchdogArmed { .. } => names::WATCHDOG_ARMED,
            Self::WatchdogFired => names::WATCHDOG_FIRED,
            Self::MutationFailed { .. } => names::MUTATION_FAILED,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::MutationFailed { .. } | Self::ChecklistItemReverted { .. }
        )
    }
}

/// Event that has been published
#[derive(Debug, Clone)]
pub struct PublishedEvent {
    pub task_id: Uuid,
    pub event: SessionEvent,
    pub published_at: DateTime<Utc>,
}

/// Fan-out publisher for session events
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<PublishedEvent>,
}

impl EventPublisher {
    /// Create a new event publisher with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event for `task_id`
    pub fn publish(&self, task_id: Uuid, event: SessionEvent) {
        tracing::debug!(task_id = %task_id, event = event.name(), "Publishing session event");

        let published = PublishedEvent {
            task_id,
            event,
            published_at: Utc::now(),
        };

        // No subscribers is fine; events are fire-and-forget
        let _ = self.sender.send(published);
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(crate::constants::DEFAULT_EVENT_CHANNEL_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_subscribers() {
        let publisher = EventPublisher::new(8);
        let mut rx = publisher.subscribe();
        let task_id = Uuid::new_v4();

        publisher.publish(task_id, SessionEvent::TaskSubmitted { automatic: true });

        let received = rx.recv().await.unwrap();
        assert_eq!(received.task_id, task_id);
        assert_eq!(received.event.name(), "task.submitted");
    }

    #[test]
    fn test_publish_without_subscribers_is_ok() {
        let publisher = EventPublisher::default();
        assert_eq!(publisher.subscriber_count(), 0);
        publisher.publish(Uuid::new_v4(), SessionEvent::WatchdogFired);
    }
}
