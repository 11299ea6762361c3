// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Background music for a training session.
//!
//! This module provides:
//! - The [`AudioBackend`] / [`Playback`] seam over the platform audio output
//! - [`AudioPlayer`], which owns at most one looping track handle
//! - A rodio backend running on a dedicated audio thread

pub mod output;

pub use output::RodioBackend;

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::library::AudioSource;

/// Audio error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AudioError {
    /// No audio output device available
    #[error("no audio output device available")]
    NoDevice,
    /// The track file could not be read
    #[error("failed to open {path:?}: {reason}")]
    OpenFailed { path: PathBuf, reason: String },
    /// The track is not in a supported format
    #[error("failed to decode {path:?}: {reason}")]
    DecodeFailed { path: PathBuf, reason: String },
    /// Failed to start the output stream
    #[error("audio stream failed: {0}")]
    StreamFailed(String),
    /// The audio thread has exited
    #[error("audio thread is not running")]
    ThreadGone,
    /// The requested track is not in the library
    #[error("track '{0}' is not available")]
    TrackUnavailable(String),
}

/// An opened track that can be started, paused and released.
///
/// Dropping the handle releases the underlying resource.
pub trait Playback: Send {
    /// Restart from the beginning when the end is reached
    fn set_looping(&mut self, looping: bool);

    /// Start or resume playback
    fn play(&mut self) -> Result<(), AudioError>;

    /// Pause playback
    fn pause(&mut self);
}

/// Platform audio output
pub trait AudioBackend: Send + Sync {
    /// Open a track, ready to play
    fn open(&self, source: &AudioSource) -> Result<Box<dyn Playback>, AudioError>;
}

/// Player owning the current background track.
///
/// At most one handle exists at a time: starting a new track releases
/// the previous one first.
pub struct AudioPlayer {
    backend: Arc<dyn AudioBackend>,
    current: Option<Box<dyn Playback>>,
}

impl AudioPlayer {
    pub fn new(backend: Arc<dyn AudioBackend>) -> Self {
        Self {
            backend,
            current: None,
        }
    }

    /// Open `source` and play it on loop
    pub fn start(&mut self, source: &AudioSource) -> Result<(), AudioError> {
        self.stop();

        let mut playback = self.backend.open(source)?;
        playback.set_looping(true);
        playback.play()?;

        info!(path = ?source.path(), "track started");
        self.current = Some(playback);
        Ok(())
    }

    /// Pause and release the current track. No effect when nothing plays.
    pub fn stop(&mut self) {
        if let Some(mut playback) = self.current.take() {
            playback.pause();
            debug!("track released");
        }
    }

    pub fn is_playing(&self) -> bool {
        self.current.is_some()
    }
}

impl Drop for AudioPlayer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Backend for hosts without audio output: every open fails with `NoDevice`
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentBackend;

impl AudioBackend for SilentBackend {
    fn open(&self, _source: &AudioSource) -> Result<Box<dyn Playback>, AudioError> {
        Err(AudioError::NoDevice)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory backend recording every playback call

    use std::sync::{Arc, Mutex, PoisonError};

    use super::*;

    /// A call made on a fake playback handle, tagged with the handle's id
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        Open(usize, PathBuf),
        Looping(usize, bool),
        Play(usize),
        Pause(usize),
        Release(usize),
    }

    #[derive(Default, Clone)]
    pub struct FakeBackend {
        calls: Arc<Mutex<Vec<Call>>>,
        fail_open: bool,
    }

    impl FakeBackend {
        pub fn failing() -> Self {
            Self {
                fail_open: true,
                ..Self::default()
            }
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
        }

        /// Handles opened and not yet released
        pub fn live_handles(&self) -> usize {
            let calls = self.calls();
            let opened = calls.iter().filter(|c| matches!(c, Call::Open(..))).count();
            let released = calls.iter().filter(|c| matches!(c, Call::Release(_))).count();
            opened - released
        }

        fn record(&self, call: Call) {
            self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(call);
        }
    }

    struct FakePlayback {
        id: usize,
        backend: FakeBackend,
    }

    impl Playback for FakePlayback {
        fn set_looping(&mut self, looping: bool) {
            self.backend.record(Call::Looping(self.id, looping));
        }

        fn play(&mut self) -> Result<(), AudioError> {
            self.backend.record(Call::Play(self.id));
            Ok(())
        }

        fn pause(&mut self) {
            self.backend.record(Call::Pause(self.id));
        }
    }

    impl Drop for FakePlayback {
        fn drop(&mut self) {
            self.backend.record(Call::Release(self.id));
        }
    }

    impl AudioBackend for FakeBackend {
        fn open(&self, source: &AudioSource) -> Result<Box<dyn Playback>, AudioError> {
            if self.fail_open {
                return Err(AudioError::OpenFailed {
                    path: source.path().to_path_buf(),
                    reason: "not found".to_string(),
                });
            }
            let id = self
                .calls()
                .iter()
                .filter(|c| matches!(c, Call::Open(..)))
                .count();
            self.record(Call::Open(id, source.path().to_path_buf()));
            Ok(Box::new(FakePlayback {
                id,
                backend: self.clone(),
            }))
        }
    }
}
