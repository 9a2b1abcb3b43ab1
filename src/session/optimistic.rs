//! Optimistic update with rollback.
//!
//! Snapshot the current value of a slot, write the new value, await the
//! remote call, and on failure put the snapshot back. The lock is never held
//! across the remote call.

use crate::error::{PharmadeskError, Result};
use parking_lot::Mutex;
use std::future::Future;

#[derive(Debug)]
pub enum OptimisticError<T> {
    /// The slot did not exist; nothing was applied and no remote call was made
    MissingTarget,
    /// The remote call failed. `restored` is the value put back, or `None`
    /// when the slot had since been changed again (or removed) and was left alone.
    RemoteFailed {
        error: PharmadeskError,
        restored: Option<T>,
    },
}

/// Apply `next` to the slot selected by `slot`, then reconcile with `remote`.
///
/// On failure the previous value is restored only if the slot still holds
/// `next`, so a newer local edit is never overwritten by an older failure.
pub async fn optimistic_update<S, T, F, Fut>(
    state: &Mutex<S>,
    mut slot: F,
    next: T,
    remote: Fut,
) -> std::result::Result<(), OptimisticError<T>>
where
    T: Clone + PartialEq,
    F: FnMut(&mut S) -> Option<&mut T>,
    Fut: Future<Output = Result<()>>,
{
    let previous = {
        let mut guard = state.lock();
        match slot(&mut guard) {
            Some(value) => std::mem::replace(value, next.clone()),
            None => return Err(OptimisticError::MissingTarget),
        }
    };

    let error = match remote.await {
        Ok(()) => return Ok(()),
        Err(error) => error,
    };

    let restored = {
        let mut guard = state.lock();
        match slot(&mut guard) {
            Some(value) if *value == next => {
                *value = previous.clone();
                Some(previous)
            }
            _ => None,
        }
    };

    Err(OptimisticError::RemoteFailed { error, restored })
}
