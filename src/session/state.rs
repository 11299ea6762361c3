// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Observable session state guarded by session tokens.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;

use crate::library::Move;

/// Identifies one started session.
///
/// Minted on every successful start; a step holding a stale token
/// must not touch the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionToken(u64);

impl SessionToken {
    pub(crate) fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Idle,
    Countdown,
    Active,
}

/// Snapshot of what the trainer is doing
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionState {
    pub phase: SessionPhase,
    /// Value shown during the countdown
    pub countdown: Option<u8>,
    /// Last announced move; only set while active
    pub current_move: Option<Move>,
    /// Token of the running session; `None` when idle
    pub token: Option<SessionToken>,
}

impl SessionState {
    pub fn is_idle(&self) -> bool {
        self.phase == SessionPhase::Idle
    }
}

/// Shared session state published over a watch channel.
///
/// Every write checks the caller's token under the channel's lock, so a
/// step from a stopped session can never overwrite a newer one.
#[derive(Clone)]
pub struct SessionCell {
    tx: Arc<watch::Sender<SessionState>>,
}

impl SessionCell {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionState::default());
        Self { tx: Arc::new(tx) }
    }

    /// Current state
    pub fn snapshot(&self) -> SessionState {
        self.tx.borrow().clone()
    }

    /// Receiver notified on every change
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }

    /// Whether `token` belongs to the running session
    pub fn is_current(&self, token: SessionToken) -> bool {
        self.tx.borrow().token == Some(token)
    }

    /// Apply `f` if `token` is still current. Returns whether it was applied.
    pub fn update(&self, token: SessionToken, f: impl FnOnce(&mut SessionState)) -> bool {
        self.tx.send_if_modified(|state| {
            if state.token != Some(token) {
                return false;
            }
            f(state);
            true
        })
    }

    /// Enter the countdown for a new session. Fails unless idle.
    pub fn begin(&self, token: SessionToken, countdown: u8) -> bool {
        self.tx.send_if_modified(|state| {
            if !state.is_idle() {
                return false;
            }
            *state = SessionState {
                phase: SessionPhase::Countdown,
                countdown: Some(countdown),
                current_move: None,
                token: Some(token),
            };
            true
        })
    }

    /// Return to idle. Returns whether anything changed.
    pub fn reset(&self) -> bool {
        self.tx.send_if_modified(|state| {
            if state.is_idle() && state.token.is_none() {
                return false;
            }
            *state = SessionState::default();
            true
        })
    }
}

impl Default for SessionCell {
    fn default() -> Self {
        Self::new()
    }
}
