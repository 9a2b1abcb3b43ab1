use super::events::TaskAction;
use super::states::TaskStatus;
use crate::error::{PharmadeskError, Result};

/// Structural guard for status transitions.
///
/// This only answers "may this action leave this status at all". Who may
/// perform it is the job of [`crate::authorization::AuthorizationGate`].
#[derive(Debug)]
pub struct TransitionGuard;

impl TransitionGuard {
    /// Check if `action` is a valid transition out of `from`
    pub fn can_transition(from: &TaskStatus, action: &TaskAction) -> Result<()> {
        if from.is_terminal() {
            return Err(PharmadeskError::denied(
                action.action_type(),
                format!("no transition is permitted out of terminal status {from}"),
            ));
        }

        let valid = match action {
            TaskAction::Submit(_) => from.is_open(),
            TaskAction::Approve | TaskAction::Reject { .. } => from.is_awaiting_review(),
            TaskAction::Forward { .. } => true,
        };

        if valid {
            Ok(())
        } else {
            Err(PharmadeskError::denied(
                action.action_type(),
                format!("task status {from} does not allow {}", action.action_type()),
            ))
        }
    }
}
