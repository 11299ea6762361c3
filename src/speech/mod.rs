// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Spoken move announcements.
//!
//! This module provides:
//! - The [`SpeechEngine`] trait over a platform speech capability
//! - Voice profiles and the voice fallback chain
//! - [`SpeechChannel`], a cancellable speak operation that always settles
//! - A local `espeak-ng` engine and a scripted engine for dry runs and tests

pub mod channel;
pub mod espeak;
pub mod scripted;
pub mod voice;

pub use channel::SpeechChannel;
pub use espeak::EspeakEngine;
pub use scripted::{ScriptedEngine, SpeechBehavior};
pub use voice::{infer_gender, language_code, language_tag, select_voice, VoiceProfile};

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::oneshot;

/// Voice gender as reported by the platform or inferred from its name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceGender {
    Female,
    Male,
}

/// A voice offered by the speech engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    /// Display name (e.g. "Milena", "Spanish_(Spain)")
    pub name: String,
    /// BCP 47 language tag (e.g. "es-ES", "ru")
    pub lang: String,
    /// Gender, when the platform reports one
    pub gender: Option<VoiceGender>,
    /// Engine-specific identifier, when the name alone does not select the voice
    pub id: Option<String>,
}

impl Voice {
    pub fn new(name: impl Into<String>, lang: impl Into<String>, gender: Option<VoiceGender>) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
            gender,
            id: None,
        }
    }

    /// Attach the engine's identifier for this voice
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Reported gender, falling back to a guess from the voice name
    pub fn effective_gender(&self) -> Option<VoiceGender> {
        self.gender.or_else(|| infer_gender(&self.name))
    }

    /// Whether the voice speaks the given language code (prefix match)
    pub fn speaks(&self, code: &str) -> bool {
        self.lang.to_lowercase().starts_with(&code.to_lowercase())
    }
}

/// A single request to vocalize a string
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    /// Selected voice; `None` lets the platform pick a default for `lang`
    pub voice: Option<Voice>,
    pub lang: String,
    /// Speech rate, 1.0 is the platform's normal speed
    pub rate: f32,
    /// Pitch, 1.0 is neutral
    pub pitch: f32,
}

/// Completion report for one utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UtteranceEvent {
    /// Finished speaking
    Ended,
    /// Stopped by a cancel or replaced by a newer utterance
    Interrupted,
    /// Platform error
    Failed(String),
}

/// Speech errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpeechError {
    /// No speech capability is present
    #[error("speech synthesis is not available")]
    PlatformUnavailable,
    /// The platform reported an error other than an interruption
    #[error("speech synthesis failed: {0}")]
    Transient(String),
}

/// How a call to [`SpeechChannel::speak`] settled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechOutcome {
    Completed,
    Cancelled,
    Errored(SpeechError),
    /// The safety timeout fired before the platform reported back
    TimedOut,
}

/// Platform speech capability.
///
/// Implementations report completion through the returned receiver.
/// The voice list may be empty until the platform has loaded it.
pub trait SpeechEngine: Send + Sync {
    /// Currently known voices
    fn voices(&self) -> Vec<Voice>;

    /// Whether an utterance is in progress
    fn is_speaking(&self) -> bool;

    /// Begin speaking an utterance
    fn speak(&self, utterance: Utterance) -> Result<oneshot::Receiver<UtteranceEvent>, SpeechError>;

    /// Cancel the current utterance, if any
    fn cancel(&self);
}

/// Speech settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechSettings {
    /// Requested voice, e.g. "spanish-female"
    #[serde(default)]
    pub voice: VoiceProfile,
    /// Language used when no voice matches the requested profile
    #[serde(default = "default_fallback_language")]
    pub fallback_language: String,
    /// Slightly slower than normal for clarity
    #[serde(default = "default_rate")]
    pub rate: f32,
    #[serde(default = "default_pitch")]
    pub pitch: f32,
    /// Upper bound on how long one announcement may take to settle
    #[serde(default = "default_safety_timeout_ms")]
    pub safety_timeout_ms: u64,
    /// Pause between cancelling an utterance and issuing the next one
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

fn default_fallback_language() -> String {
    "ru".to_string()
}
fn default_rate() -> f32 {
    0.9
}
fn default_pitch() -> f32 {
    1.0
}
fn default_safety_timeout_ms() -> u64 {
    10_000
}
fn default_settle_delay_ms() -> u64 {
    50
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            voice: VoiceProfile::default(),
            fallback_language: default_fallback_language(),
            rate: default_rate(),
            pitch: default_pitch(),
            safety_timeout_ms: default_safety_timeout_ms(),
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

impl SpeechSettings {
    pub fn safety_timeout(&self) -> Duration {
        Duration::from_millis(self.safety_timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}
