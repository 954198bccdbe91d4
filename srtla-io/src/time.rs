//! Wall-clock helpers
//!
//! Connection and group lifetimes are tracked in whole seconds of wall
//! time; the reactor reads the clock once per event batch and threads the
//! value through, which also lets tests drive eviction with synthetic
//! timestamps.

use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds since the Unix epoch.
pub fn unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unix_secs_advances() {
        let a = unix_secs();
        // Some time in 2023; anything earlier means a broken clock source.
        assert!(a > 1_600_000_000);
        let b = unix_secs();
        assert!(b >= a);
    }
}
