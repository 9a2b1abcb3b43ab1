//! # Deadline Watchdog
//!
//! Auto-submits an open task shortly before its deadline, at most once per
//! session. The arm/fire decision is [`plan`], a pure function of
//! `(deadline, now, buffer)`; [`DeadlineWatchdog`] owns the timer task and the
//! fire-once flag.
//!
//! ## Timing
//!
//! | time remaining        | decision                      |
//! |-----------------------|-------------------------------|
//! | `> buffer`            | arm for `remaining - buffer`  |
//! | `0 < r <= buffer`     | fire now                      |
//! | `<= 0`                | fire now                      |
//!
//! Re-arming replaces a pending timer. Once the watchdog has fired it never
//! arms again for the lifetime of the session.

use crate::config::WatchdogConfig;
use crate::state_machine::TaskStatus;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireReason {
    /// Deadline is closer than the buffer but not yet reached
    WithinBuffer,
    DeadlinePassed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Disabled,
    SessionClosed,
    AlreadyFired,
    /// Only `assigned` and `in_progress` tasks are watched
    NotOpen(TaskStatus),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchdogPlan {
    Arm {
        delay: Duration,
        fires_at: DateTime<Utc>,
    },
    FireNow(FireReason),
    Skip(SkipReason),
}

impl WatchdogPlan {
    pub fn is_armed(&self) -> bool {
        matches!(self, Self::Arm { .. })
    }

    pub fn fires_immediately(&self) -> bool {
        matches!(self, Self::FireNow(_))
    }
}

/// Decide when an open task with `deadline` should be auto-submitted
pub fn plan(deadline: DateTime<Utc>, now: DateTime<Utc>, buffer: Duration) -> WatchdogPlan {
    let remaining = deadline - now;
    let buffer = chrono::Duration::from_std(buffer).unwrap_or_else(|_| chrono::Duration::zero());

    if remaining <= chrono::Duration::zero() {
        return WatchdogPlan::FireNow(FireReason::DeadlinePassed);
    }
    if remaining <= buffer {
        return WatchdogPlan::FireNow(FireReason::WithinBuffer);
    }

    match (remaining - buffer).to_std() {
        Ok(delay) => WatchdogPlan::Arm {
            delay,
            fires_at: deadline - buffer,
        },
        Err(_) => WatchdogPlan::FireNow(FireReason::WithinBuffer),
    }
}

/// One-shot timer with a fire-once guard
#[derive(Debug)]
pub struct DeadlineWatchdog {
    enabled: bool,
    buffer: Duration,
    fired: Arc<AtomicBool>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl DeadlineWatchdog {
    pub fn new(config: &WatchdogConfig) -> Self {
        Self {
            enabled: config.enabled,
            buffer: config.buffer(),
            fired: Arc::new(AtomicBool::new(false)),
            pending: Mutex::new(None),
        }
    }

    pub fn buffer(&self) -> Duration {
        self.buffer
    }

    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    /// True while a timer is pending and has not fired
    pub fn is_armed(&self) -> bool {
        self.pending
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
            && !self.has_fired()
    }

    /// Plan for a task in `status`, taking the switch and fire-once flag into account
    pub fn evaluate(
        &self,
        status: &TaskStatus,
        deadline: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> WatchdogPlan {
        if !self.enabled {
            return WatchdogPlan::Skip(SkipReason::Disabled);
        }
        if self.has_fired() {
            return WatchdogPlan::Skip(SkipReason::AlreadyFired);
        }
        // Completed and Pending* are post-submission too, so only open tasks arm
        if !status.is_open() {
            return WatchdogPlan::Skip(SkipReason::NotOpen(status.clone()));
        }
        plan(deadline, now, self.buffer)
    }

    /// Schedule `fire` according to `plan`, replacing any pending timer.
    ///
    /// The fire future is spawned on its own task once the flag is claimed,
    /// so cancelling the timer never interrupts a submission in flight.
    /// Must be called from within a tokio runtime.
    pub fn arm<F, Fut>(&self, plan: &WatchdogPlan, fire: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let delay = match plan {
            WatchdogPlan::Arm { delay, .. } => *delay,
            WatchdogPlan::FireNow(_) => Duration::ZERO,
            WatchdogPlan::Skip(reason) => {
                debug!(reason = ?reason, "Watchdog not armed");
                return;
            }
        };

        if self.has_fired() {
            return;
        }

        let fired = Arc::clone(&self.fired);
        let handle = tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if fired.swap(true, Ordering::SeqCst) {
                return;
            }
            info!("Deadline watchdog fired");
            tokio::spawn(fire());
        });

        if let Some(previous) = self.pending.lock().replace(handle) {
            previous.abort();
        }
    }

    /// Clear a pending timer. Returns true if one was still waiting.
    pub fn cancel(&self) -> bool {
        match self.pending.lock().take() {
            Some(handle) => {
                let waiting = !handle.is_finished();
                handle.abort();
                waiting
            }
            None => false,
        }
    }
}

impl Drop for DeadlineWatchdog {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.get_mut().take() {
            handle.abort();
        }
    }
}
