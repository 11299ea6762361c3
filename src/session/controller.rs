// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Session lifecycle: Idle, Countdown, Active and back.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{info, warn};

use super::{
    MovePicker, MoveScheduler, SessionCell, SessionConfig, SessionError, SessionPhase,
    SessionState, SessionToken,
};
use crate::audio::{AudioError, AudioPlayer};
use crate::library::{StyleCatalog, TrackCatalog};
use crate::speech::SpeechChannel;
use crate::timing::Countdown;

/// Starts and stops training sessions.
///
/// At most one session runs at a time. Every asynchronous step of a
/// session carries its [`SessionToken`] and gives up once `stop` or a
/// newer session has invalidated it.
pub struct SessionController {
    styles: Arc<dyn StyleCatalog>,
    tracks: Arc<dyn TrackCatalog>,
    speech: Arc<SpeechChannel>,
    audio: Mutex<AudioPlayer>,
    picker: Arc<Mutex<MovePicker>>,
    countdown: Countdown,
    state: SessionCell,
    next_token: AtomicU64,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SessionController {
    pub fn new(
        styles: Arc<dyn StyleCatalog>,
        tracks: Arc<dyn TrackCatalog>,
        speech: Arc<SpeechChannel>,
        audio: AudioPlayer,
    ) -> Self {
        Self {
            styles,
            tracks,
            speech,
            audio: Mutex::new(audio),
            picker: Arc::new(Mutex::new(MovePicker::from_entropy())),
            countdown: Countdown::default(),
            state: SessionCell::new(),
            next_token: AtomicU64::new(1),
            task: Mutex::new(None),
        }
    }

    /// Use a specific move picker (e.g. a seeded one)
    pub fn with_picker(mut self, picker: MovePicker) -> Self {
        self.picker = Arc::new(Mutex::new(picker));
        self
    }

    pub fn with_countdown(mut self, countdown: Countdown) -> Self {
        self.countdown = countdown;
        self
    }

    /// Start a session.
    ///
    /// Must be called from within a Tokio runtime. Nothing changes when
    /// an error is returned.
    pub fn start(&self, config: &SessionConfig) -> Result<SessionToken, SessionError> {
        if !self.state.snapshot().is_idle() {
            return Err(SessionError::AlreadyActive);
        }

        let style = self
            .styles
            .style(config.style_id())
            .ok_or_else(|| SessionError::UnknownStyle(config.style_id().to_string()))?;
        if !style.is_trainable() {
            return Err(SessionError::EmptyStyle(style.id));
        }

        let token = SessionToken::new(self.next_token.fetch_add(1, Ordering::SeqCst));
        let first = self.countdown.values().next();
        let started = match first {
            Some(value) => self.state.begin(token, value),
            None => self.state.begin(token, 0) && self.state.update(token, |s| s.countdown = None),
        };
        if !started {
            return Err(SessionError::AlreadyActive);
        }

        info!(
            %token,
            style = %style.id,
            moves = style.moves.len(),
            interval_s = config.interval_seconds(),
            "session starting"
        );

        if let Some(track_id) = config.track_id() {
            if let Err(e) = self.start_track(track_id) {
                warn!(track = track_id, error = %e, "track unavailable, training without music");
            }
        }

        let scheduler = MoveScheduler::new(
            token,
            style.moves,
            config.interval(),
            Arc::clone(&self.speech),
            Arc::clone(&self.picker),
            self.state.clone(),
        );
        let task = tokio::spawn(run_session(
            token,
            self.countdown,
            self.state.clone(),
            scheduler,
        ));
        *self.task.lock().unwrap_or_else(PoisonError::into_inner) = Some(task);

        Ok(token)
    }

    /// Stop the running session, if any.
    ///
    /// Cancels pending timers and in-flight speech and releases the track.
    /// No effect when already idle.
    pub fn stop(&self) {
        let task = self.task.lock().unwrap_or_else(PoisonError::into_inner).take();
        let was_running = self.state.reset();
        if task.is_none() && !was_running {
            return;
        }

        if let Some(task) = task {
            task.abort();
        }
        self.speech.stop();
        self.audio.lock().unwrap_or_else(PoisonError::into_inner).stop();
        info!("session stopped");
    }

    /// Current state
    pub fn state(&self) -> SessionState {
        self.state.snapshot()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn is_running(&self) -> bool {
        !self.state.snapshot().is_idle()
    }

    fn start_track(&self, track_id: &str) -> Result<(), AudioError> {
        let track = self
            .tracks
            .track(track_id)
            .ok_or_else(|| AudioError::TrackUnavailable(track_id.to_string()))?;
        self.audio
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .start(&track.source)
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Count down, then announce moves until the token goes stale
async fn run_session(
    token: SessionToken,
    countdown: Countdown,
    state: SessionCell,
    scheduler: MoveScheduler,
) {
    for value in countdown.values() {
        if !state.update(token, |s| s.countdown = Some(value)) {
            return;
        }
        time::sleep(countdown.step()).await;
    }

    let active = state.update(token, |s| {
        s.phase = SessionPhase::Active;
        s.countdown = None;
    });
    if !active {
        return;
    }
    info!(%token, "session active");

    scheduler.run().await;
}
