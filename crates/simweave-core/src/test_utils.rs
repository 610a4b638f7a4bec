//! Shared fixtures for unit and integration tests
//!
//! Kept in the library so downstream crates can build deterministic scenarios
//! without a separate testkit crate.

use crate::access::{SimUser, SimUserRole};
use crate::time::{ManualClock, Timestamp};
use chrono::{DateTime, Duration, Utc};

/// Fixed reference instant used by every fixture clock
pub fn base_time() -> Timestamp {
    DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap_or_default()
}

/// `base_time()` shifted by `seconds`
pub fn ts(seconds: i64) -> Timestamp {
    base_time() + Duration::seconds(seconds)
}

/// Clock frozen at `base_time()`
pub fn test_clock() -> ManualClock {
    ManualClock::new(base_time())
}

/// User acting in `role`, named after it
pub fn user(role: SimUserRole) -> SimUser {
    SimUser::new(format!("{role}-user").to_lowercase(), role)
}

/// Administrator fixture
pub fn admin() -> SimUser {
    user(SimUserRole::Administrator)
}

/// Architecture fixture
pub fn architect() -> SimUser {
    user(SimUserRole::Architecture)
}

/// Guest fixture, holds no privileges on freshly created components
pub fn guest() -> SimUser {
    user(SimUserRole::Guest)
}
