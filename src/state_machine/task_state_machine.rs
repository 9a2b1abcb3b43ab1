use super::events::TaskAction;
use super::guards::TransitionGuard;
use super::states::TaskStatus;
use crate::error::Result;

/// Transition table for the approval workflow as observed by the core.
///
/// The task service owns the real status; this table yields the status the
/// core expects after a confirmed action, used as the local echo when the
/// follow-up refresh cannot reach the service.
#[derive(Debug, Default, Clone, Copy)]
pub struct TaskStateMachine;

impl TaskStateMachine {
    /// Determine the expected status after `action` succeeds from `current`
    pub fn determine_target_state(current: &TaskStatus, action: &TaskAction) -> Result<TaskStatus> {
        TransitionGuard::can_transition(current, action)?;

        let target = match action {
            TaskAction::Submit(_) => TaskStatus::Submitted,
            TaskAction::Approve => TaskStatus::Approved,
            TaskAction::Reject { .. } => TaskStatus::Rejected,
            // Forwarding changes the holder, not the status
            TaskAction::Forward { .. } => current.clone(),
        };

        Ok(target)
    }
}
