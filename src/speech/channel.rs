// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Cancellable speech channel.
//!
//! Wraps a [`SpeechEngine`] so that at most one utterance is outstanding
//! and every call to [`SpeechChannel::speak`] settles, whatever the
//! platform does.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::time;
use tracing::{debug, warn};

use super::{
    language_tag, select_voice, SpeechEngine, SpeechError, SpeechOutcome, SpeechSettings,
    Utterance, UtteranceEvent, Voice,
};

/// Speech channel owning a single outstanding utterance
pub struct SpeechChannel {
    /// `None` when the platform has no speech capability
    engine: Option<Arc<dyn SpeechEngine>>,
    settings: SpeechSettings,
    /// Voices seen so far; refreshed while empty
    voices: Mutex<Vec<Voice>>,
}

impl SpeechChannel {
    /// Create a channel speaking through `engine`
    pub fn new(engine: Arc<dyn SpeechEngine>, settings: SpeechSettings) -> Self {
        Self {
            engine: Some(engine),
            settings,
            voices: Mutex::new(Vec::new()),
        }
    }

    /// Create a channel for a platform without speech.
    ///
    /// Every announcement settles immediately.
    pub fn unavailable(settings: SpeechSettings) -> Self {
        Self {
            engine: None,
            settings,
            voices: Mutex::new(Vec::new()),
        }
    }

    pub fn is_available(&self) -> bool {
        self.engine.is_some()
    }

    pub fn settings(&self) -> &SpeechSettings {
        &self.settings
    }

    /// Speak `text`, cancelling whatever this channel was saying.
    ///
    /// Never fails: completes on the platform's end-of-speech report, on
    /// an error, or when the safety timeout elapses.
    pub async fn speak(&self, text: &str) -> SpeechOutcome {
        let Some(engine) = &self.engine else {
            warn!(text, "speech unavailable, skipping announcement");
            return SpeechOutcome::Errored(SpeechError::PlatformUnavailable);
        };

        if engine.is_speaking() {
            debug!("cancelling previous utterance");
            engine.cancel();
            time::sleep(self.settings.settle_delay()).await;
        }

        let voices = self.known_voices(engine.as_ref());
        let utterance = self.utterance(text, &voices);
        debug!(
            text,
            voice = utterance.voice.as_ref().map(|v| v.name.as_str()),
            lang = %utterance.lang,
            "speaking"
        );

        let done = match engine.speak(utterance) {
            Ok(done) => done,
            Err(e) => {
                warn!(error = %e, "failed to start utterance");
                return SpeechOutcome::Errored(e);
            }
        };

        match time::timeout(self.settings.safety_timeout(), done).await {
            Ok(Ok(UtteranceEvent::Ended)) => SpeechOutcome::Completed,
            Ok(Ok(UtteranceEvent::Interrupted)) | Ok(Err(_)) => SpeechOutcome::Cancelled,
            Ok(Ok(UtteranceEvent::Failed(reason))) => {
                let error = SpeechError::Transient(reason);
                warn!(error = %error, "speech error");
                SpeechOutcome::Errored(error)
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.settings.safety_timeout_ms,
                    "speech safety timeout fired"
                );
                engine.cancel();
                SpeechOutcome::TimedOut
            }
        }
    }

    /// Cancel the current utterance, if any
    pub fn stop(&self) {
        if let Some(engine) = &self.engine {
            if engine.is_speaking() {
                engine.cancel();
            }
        }
    }

    /// Build the utterance for `text` using the voice fallback chain
    pub fn utterance(&self, text: &str, voices: &[Voice]) -> Utterance {
        let selected = select_voice(voices, &self.settings.voice, &self.settings.fallback_language);

        let lang = match selected {
            Some(voice) => voice.lang.clone(),
            None => language_tag(self.settings.voice.language()),
        };

        Utterance {
            text: text.to_string(),
            voice: selected.cloned(),
            lang,
            rate: self.settings.rate,
            pitch: self.settings.pitch,
        }
    }

    fn known_voices(&self, engine: &dyn SpeechEngine) -> Vec<Voice> {
        let mut cache = self.voices.lock().unwrap_or_else(PoisonError::into_inner);
        if cache.is_empty() {
            *cache = engine.voices();
        }
        cache.clone()
    }
}
