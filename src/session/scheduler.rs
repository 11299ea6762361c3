// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Repeating move announcements.
//!
//! Each cycle picks a random move, shows it, speaks its name and waits
//! out the rest of the interval. Cycle starts stay one interval apart
//! however long the announcement took.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{RngCore, SeedableRng};
use tokio::time::{self, Instant};
use tracing::debug;

use super::{SessionCell, SessionToken};
use crate::library::Move;
use crate::speech::SpeechChannel;
use crate::timing::next_cycle_delay;

/// Uniform random move selection.
///
/// Draws are independent, so the same move may come up twice in a row.
pub struct MovePicker {
    rng: Box<dyn RngCore + Send>,
}

impl MovePicker {
    /// Picker seeded from the operating system
    pub fn from_entropy() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Reproducible picker
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(rng: impl RngCore + Send + 'static) -> Self {
        Self { rng: Box::new(rng) }
    }

    /// Pick one of `moves`, or `None` if there are none
    pub fn pick<'a>(&mut self, moves: &'a [Move]) -> Option<&'a Move> {
        moves.choose(&mut self.rng)
    }
}

impl Default for MovePicker {
    fn default() -> Self {
        Self::from_entropy()
    }
}

/// Announce loop for one session
pub struct MoveScheduler {
    token: SessionToken,
    moves: Arc<[Move]>,
    interval: Duration,
    speech: Arc<SpeechChannel>,
    picker: Arc<Mutex<MovePicker>>,
    state: SessionCell,
}

impl MoveScheduler {
    pub fn new(
        token: SessionToken,
        moves: impl Into<Arc<[Move]>>,
        interval: Duration,
        speech: Arc<SpeechChannel>,
        picker: Arc<Mutex<MovePicker>>,
        state: SessionCell,
    ) -> Self {
        Self {
            token,
            moves: moves.into(),
            interval,
            speech,
            picker,
            state,
        }
    }

    /// Run cycles until the session is stopped or replaced
    pub async fn run(self) {
        debug!(token = %self.token, interval_s = self.interval.as_secs(), "scheduler started");
        while self.cycle().await {}
        debug!(token = %self.token, "scheduler finished");
    }

    /// Run one announce cycle.
    ///
    /// Returns `false` once the token is no longer current.
    pub async fn cycle(&self) -> bool {
        let started = Instant::now();
        if !self.state.is_current(self.token) {
            return false;
        }

        let Some(next) = self.pick() else {
            return false;
        };
        let shown = self
            .state
            .update(self.token, |state| state.current_move = Some(next.clone()));
        if !shown {
            return false;
        }

        let outcome = self.speech.speak(&next.name).await;
        debug!(token = %self.token, name = %next.name, ?outcome, "announced");

        if !self.state.is_current(self.token) {
            return false;
        }

        time::sleep(next_cycle_delay(self.interval, started.elapsed())).await;
        self.state.is_current(self.token)
    }

    fn pick(&self) -> Option<Move> {
        self.picker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pick(&self.moves)
            .cloned()
    }
}
