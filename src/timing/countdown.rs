// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Pre-session countdown.

use std::time::Duration;

/// First value shown when a session starts
pub const COUNTDOWN_FROM: u8 = 3;

/// Time each countdown value stays on screen
pub const COUNTDOWN_STEP: Duration = Duration::from_secs(1);

/// A descending countdown (e.g. 3, 2, 1) with a fixed step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    from: u8,
    step: Duration,
}

impl Countdown {
    /// Create a countdown starting at `from`
    pub fn new(from: u8, step: Duration) -> Self {
        Self { from, step }
    }

    /// Values to display, highest first. Zero is never shown.
    pub fn values(&self) -> impl Iterator<Item = u8> {
        (1..=self.from).rev()
    }

    /// Delay between values
    pub fn step(&self) -> Duration {
        self.step
    }

    /// Time from the first value until the session becomes active
    pub fn total(&self) -> Duration {
        self.step * self.from as u32
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new(COUNTDOWN_FROM, COUNTDOWN_STEP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_countdown() {
        let countdown = Countdown::default();
        assert_eq!(countdown.values().collect::<Vec<_>>(), vec![3, 2, 1]);
        assert_eq!(countdown.step(), Duration::from_secs(1));
        assert_eq!(countdown.total(), Duration::from_secs(3));
    }

    #[test]
    fn test_zero_countdown_is_empty() {
        let countdown = Countdown::new(0, COUNTDOWN_STEP);
        assert_eq!(countdown.values().count(), 0);
        assert_eq!(countdown.total(), Duration::ZERO);
    }
}
