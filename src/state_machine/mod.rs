// Task status state machine for the approval workflow.
//
// The task service is authoritative for status; this module types the status,
// the actions the core can drive, and the structural transition rules.

pub mod events;
pub mod guards;
pub mod states;
pub mod task_state_machine;

pub use events::{SubmissionTrigger, TaskAction};
pub use guards::TransitionGuard;
pub use states::TaskStatus;
pub use task_state_machine::TaskStateMachine;
