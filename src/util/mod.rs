//! Utility module
//!
//! Small helpers shared by the protocol and network layers.

use std::time::Duration;

/// Current time in whole seconds since the unix epoch
pub fn unix_timestamp() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

/// Seconds elapsed between two unix timestamps, zero if `later` is earlier
pub fn elapsed_between(earlier: u64, later: u64) -> Duration {
    Duration::from_secs(later.saturating_sub(earlier))
}
