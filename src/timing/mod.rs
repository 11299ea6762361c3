// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Timing utilities for training sessions.
//!
//! This module provides the pre-session countdown and the
//! drift-compensated delay used between announce cycles.

pub mod countdown;

pub use countdown::{Countdown, COUNTDOWN_FROM, COUNTDOWN_STEP};

use std::time::Duration;

/// Delay before the next cycle so that cycle starts stay `interval` apart.
///
/// `elapsed` is the time spent inside the current cycle. When the cycle
/// overran the interval the next one fires immediately.
pub fn next_cycle_delay(interval: Duration, elapsed: Duration) -> Duration {
    interval.saturating_sub(elapsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_subtracts_elapsed() {
        let interval = Duration::from_secs(10);
        assert_eq!(
            next_cycle_delay(interval, Duration::from_millis(2500)),
            Duration::from_millis(7500)
        );
    }

    #[test]
    fn test_delay_without_work() {
        let interval = Duration::from_secs(5);
        assert_eq!(next_cycle_delay(interval, Duration::ZERO), interval);
    }

    #[test]
    fn test_delay_floors_at_zero() {
        let interval = Duration::from_secs(5);
        assert_eq!(next_cycle_delay(interval, interval), Duration::ZERO);
        assert_eq!(
            next_cycle_delay(interval, Duration::from_secs(12)),
            Duration::ZERO
        );
    }
}
