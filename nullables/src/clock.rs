//! Nullable clock: deterministic time for testing.

use spine_types::{Clock, Timestamp};
use std::cell::Cell;

/// A deterministic clock for testing.
///
/// Time only advances when you tell it to, or by a fixed step per reading
/// when built with [`NullClock::stepping`].
pub struct NullClock {
    current: Cell<f64>,
    step: f64,
}

impl NullClock {
    pub fn new(initial_secs: f64) -> Self {
        Self {
            current: Cell::new(initial_secs),
            step: 0.0,
        }
    }

    /// A clock that advances by `step_secs` after every reading.
    pub fn stepping(initial_secs: f64, step_secs: f64) -> Self {
        Self {
            current: Cell::new(initial_secs),
            step: step_secs,
        }
    }

    /// Advance time by a number of seconds.
    pub fn advance(&self, secs: f64) {
        self.current.set(self.current.get() + secs);
    }

    /// Set the time to a specific value.
    pub fn set(&self, secs: f64) {
        self.current.set(secs);
    }
}

impl Clock for NullClock {
    fn now(&self) -> Timestamp {
        let now = self.current.get();
        self.current.set(now + self.step);
        Timestamp::new(now)
    }
}
