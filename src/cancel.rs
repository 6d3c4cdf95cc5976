//! Cooperative cancellation for long waits and paced runs.
//!
//! A [`CancellationToken`] is a shared flag. Whoever owns the run (the CLI's
//! signal thread, the setup screen, a test) trips it; the engine only observes
//! it at its suspension points. Sleeps are split into short chunks so a
//! cancelled run stops within a fraction of a second, never mid device call.

use chrono::{DateTime, Local};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::constants::CANCEL_POLL_INTERVAL_MS;
use crate::time_source::{TimeSource, checked_after, until};

#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// The token was tripped before the sleep finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interrupted;

/// Sleep until `deadline` on `clock`, returning early if `token` is cancelled.
///
/// A deadline already in the past returns immediately (after one token check).
pub fn sleep_until(
    clock: &dyn TimeSource,
    deadline: DateTime<Local>,
    token: &CancellationToken,
) -> Result<(), Interrupted> {
    let poll = Duration::from_millis(CANCEL_POLL_INTERVAL_MS);
    loop {
        if token.is_cancelled() {
            return Err(Interrupted);
        }
        let remaining = until(clock.now(), deadline);
        if remaining.is_zero() {
            return Ok(());
        }
        clock.sleep(remaining.min(poll));
    }
}

/// Sleep for `duration` on `clock`, returning early if `token` is cancelled.
///
/// A duration that ends past chrono's range never elapses; only cancellation
/// ends the sleep.
pub fn sleep_for(
    clock: &dyn TimeSource,
    duration: Duration,
    token: &CancellationToken,
) -> Result<(), Interrupted> {
    if let Some(deadline) = checked_after(clock.now(), duration) {
        return sleep_until(clock, deadline, token);
    }
    let poll = Duration::from_millis(CANCEL_POLL_INTERVAL_MS);
    loop {
        if token.is_cancelled() {
            return Err(Interrupted);
        }
        clock.sleep(poll);
    }
}
