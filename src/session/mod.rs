// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Training session orchestration.
//!
//! This module provides:
//! - [`SessionController`], the Idle / Countdown / Active state machine
//! - [`MoveScheduler`], the repeating pick, display and announce cycle
//! - [`SessionCell`], the shared state every step checks its token against

pub mod controller;
pub mod scheduler;
pub mod state;

pub use controller::SessionController;
pub use scheduler::{MovePicker, MoveScheduler};
pub use state::{SessionCell, SessionPhase, SessionState, SessionToken};

use std::time::Duration;

use thiserror::Error;

/// Shortest allowed announce interval in seconds
pub const MIN_INTERVAL_SECONDS: u64 = 5;

/// Longest allowed announce interval in seconds
pub const MAX_INTERVAL_SECONDS: u64 = 20;

/// Announce interval used when none is configured
pub const DEFAULT_INTERVAL_SECONDS: u64 = 10;

/// Session errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// A session is already counting down or running
    #[error("a training session is already running")]
    AlreadyActive,
    /// The style id is not in the catalogue
    #[error("unknown dance style '{0}'")]
    UnknownStyle(String),
    /// The style has no moves to announce
    #[error("dance style '{0}' has no moves")]
    EmptyStyle(String),
    /// The interval is outside the allowed range
    #[error(
        "interval of {0}s is outside {min}..={max}s",
        min = MIN_INTERVAL_SECONDS,
        max = MAX_INTERVAL_SECONDS
    )]
    InvalidInterval(u64),
}

/// Parameters of one training session, fixed for its lifetime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    style_id: String,
    track_id: Option<String>,
    interval_seconds: u64,
}

impl SessionConfig {
    /// Create a session config, validating the interval
    pub fn new(
        style_id: impl Into<String>,
        track_id: Option<String>,
        interval_seconds: u64,
    ) -> Result<Self, SessionError> {
        if !(MIN_INTERVAL_SECONDS..=MAX_INTERVAL_SECONDS).contains(&interval_seconds) {
            return Err(SessionError::InvalidInterval(interval_seconds));
        }
        Ok(Self {
            style_id: style_id.into(),
            track_id,
            interval_seconds,
        })
    }

    /// Config with the default interval and no track
    pub fn for_style(style_id: impl Into<String>) -> Self {
        Self {
            style_id: style_id.into(),
            track_id: None,
            interval_seconds: DEFAULT_INTERVAL_SECONDS,
        }
    }

    pub fn style_id(&self) -> &str {
        &self.style_id
    }

    pub fn track_id(&self) -> Option<&str> {
        self.track_id.as_deref()
    }

    pub fn interval_seconds(&self) -> u64 {
        self.interval_seconds
    }

    /// Time between the starts of consecutive announce cycles
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_bounds() {
        assert!(SessionConfig::new("salsa-1", None, 5).is_ok());
        assert!(SessionConfig::new("salsa-1", None, 20).is_ok());
        assert_eq!(
            SessionConfig::new("salsa-1", None, 4),
            Err(SessionError::InvalidInterval(4))
        );
        assert_eq!(
            SessionConfig::new("salsa-1", None, 21),
            Err(SessionError::InvalidInterval(21))
        );
    }

    #[test]
    fn test_for_style_defaults() {
        let config = SessionConfig::for_style("bachata-1");
        assert_eq!(config.style_id(), "bachata-1");
        assert_eq!(config.track_id(), None);
        assert_eq!(config.interval(), Duration::from_secs(10));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            SessionError::InvalidInterval(30).to_string(),
            "interval of 30s is outside 5..=20s"
        );
        assert_eq!(
            SessionError::EmptyStyle("tango".to_string()).to_string(),
            "dance style 'tango' has no moves"
        );
    }
}
