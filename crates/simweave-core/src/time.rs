//! Time utilities for audit stamping
//!
//! Audit timestamps are UTC wall-clock values. Mutations read the current time
//! through a [`Clock`] so tests can drive time deterministically.

use chrono::{DateTime, Duration, Utc};
use std::cell::Cell;

/// Audit timestamp
pub type Timestamp = DateTime<Utc>;

/// Timestamp carried by entries that were never stamped
pub const EPOCH_MIN: Timestamp = DateTime::<Utc>::MIN_UTC;

/// Source of the current time
pub trait Clock {
    /// Current time
    fn now(&self) -> Timestamp;
}

/// Clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }
}

/// Manually advanced clock for deterministic tests and replays
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Cell<Timestamp>,
}

impl ManualClock {
    /// Create a clock frozen at `start`
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    /// Create a clock frozen at the unix epoch
    pub fn at_unix_epoch() -> Self {
        Self::new(DateTime::<Utc>::default())
    }

    /// Move the clock to `at`, which may lie in the past
    pub fn set(&self, at: Timestamp) {
        self.now.set(at);
    }

    /// Advance the clock by `seconds`
    pub fn advance_secs(&self, seconds: i64) {
        self.now.set(self.now.get() + Duration::seconds(seconds));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for std::rc::Rc<C> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::at_unix_epoch();
        let start = clock.now();
        clock.advance_secs(5);
        assert_eq!(clock.now() - start, Duration::seconds(5));
    }

    #[test]
    fn epoch_min_precedes_everything() {
        assert!(EPOCH_MIN < SystemClock.now());
        assert!(EPOCH_MIN < DateTime::<Utc>::default());
    }
}
