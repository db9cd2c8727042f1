//! Monotonic time sources.
//!
//! Every elapsed-time computation in the engine goes through a [`Clock`] so
//! that tests can drive time forward deterministically instead of sleeping.

use std::time::Instant;

use parking_lot::Mutex;

use crate::types::Timestamp;

/// A source of monotonic timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall-independent clock measuring time since its own creation.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Timestamp {
        let nanos = self.origin.elapsed().as_nanos().min(i64::MAX as u128) as i64;
        Timestamp::from_nanos(nanos)
    }
}

/// Manually advanced clock for tests and offline replay.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Mutex<Timestamp>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance_millis(&self, millis: i64) {
        let mut now = self.now.lock();
        *now = now.add_millis(millis);
    }

    pub fn set(&self, timestamp: Timestamp) {
        *self.now.lock() = timestamp;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.lock()
    }
}
