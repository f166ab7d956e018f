//! Timestamp sources for the execution environment.
//!
//! [`SystemClock`] reads wall-clock seconds but never runs backwards.
//! [`ManualClock`] is driven explicitly and is what tests use.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::traits::Clock;
use crate::types::Timestamp;

/// Wall-clock seconds since the Unix epoch, clamped to be monotonic.
#[derive(Debug, Default)]
pub struct SystemClock {
    last: AtomicU64,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let wall = chrono::Utc::now().timestamp().max(0) as u64;
        // fetch_max returns the previous value
        let prev = self.last.fetch_max(wall, Ordering::SeqCst);
        prev.max(wall)
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    /// Start at `start`.
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: AtomicU64::new(start),
        }
    }

    /// Move forward by `secs`. Returns the new time.
    pub fn advance(&self, secs: u64) -> Timestamp {
        let prev = self.now.fetch_add(secs, Ordering::SeqCst);
        prev.saturating_add(secs)
    }

    /// Jump to `to` unless that would move the clock backwards.
    pub fn set(&self, to: Timestamp) -> Timestamp {
        let prev = self.now.fetch_max(to, Ordering::SeqCst);
        prev.max(to)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}
