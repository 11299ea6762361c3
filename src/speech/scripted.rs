// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Scripted speech engine.
//!
//! Simulates a speech platform without producing sound: every utterance
//! takes a fixed time, fails, or never reports back. Used for dry runs
//! and to exercise the trainer deterministically.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::{self, Instant};

use super::{SpeechEngine, SpeechError, Utterance, UtteranceEvent, Voice};

/// How the scripted platform responds to each utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechBehavior {
    /// Report completion after the given time
    Complete(Duration),
    /// Report an error immediately
    Fail(String),
    /// Accept the utterance but never report back
    Silent,
    /// Refuse to start speaking
    Refuse,
}

/// An utterance as it reached the engine
#[derive(Debug, Clone)]
pub struct SpokenUtterance {
    pub at: Instant,
    pub utterance: Utterance,
}

struct Inner {
    behavior: Mutex<SpeechBehavior>,
    voices: Mutex<Vec<Voice>>,
    spoken: Mutex<Vec<SpokenUtterance>>,
    speaking: AtomicBool,
    /// Identifies the newest utterance so a finished old one cannot clear `speaking`
    generation: AtomicU64,
    cancel: Mutex<Option<oneshot::Sender<()>>>,
    /// Held so a silent utterance does not resolve as dropped
    unanswered: Mutex<Option<oneshot::Sender<UtteranceEvent>>>,
    cancels: AtomicUsize,
}

/// Speech engine with scripted timing
#[derive(Clone)]
pub struct ScriptedEngine {
    inner: Arc<Inner>,
}

impl ScriptedEngine {
    pub fn new(behavior: SpeechBehavior) -> Self {
        Self {
            inner: Arc::new(Inner {
                behavior: Mutex::new(behavior),
                voices: Mutex::new(Vec::new()),
                spoken: Mutex::new(Vec::new()),
                speaking: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                cancel: Mutex::new(None),
                unanswered: Mutex::new(None),
                cancels: AtomicUsize::new(0),
            }),
        }
    }

    /// Set the voices the engine offers
    pub fn with_voices(self, voices: Vec<Voice>) -> Self {
        self.set_voices(voices);
        self
    }

    pub fn set_voices(&self, voices: Vec<Voice>) {
        *self.inner.voices.lock().unwrap_or_else(PoisonError::into_inner) = voices;
    }

    /// Change how subsequent utterances behave
    pub fn set_behavior(&self, behavior: SpeechBehavior) {
        *self.inner.behavior.lock().unwrap_or_else(PoisonError::into_inner) = behavior;
    }

    /// Every utterance received so far, oldest first
    pub fn spoken(&self) -> Vec<SpokenUtterance> {
        self.inner
            .spoken
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn spoken_texts(&self) -> Vec<String> {
        self.spoken()
            .into_iter()
            .map(|s| s.utterance.text)
            .collect()
    }

    /// Number of utterances cancelled
    pub fn cancel_count(&self) -> usize {
        self.inner.cancels.load(Ordering::SeqCst)
    }

    /// Record an accepted utterance and open its completion channel
    fn begin(
        &self,
        utterance: Utterance,
    ) -> (u64, oneshot::Sender<UtteranceEvent>, oneshot::Receiver<UtteranceEvent>) {
        tracing::info!(text = %utterance.text, "announce");
        self.inner
            .spoken
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SpokenUtterance {
                at: Instant::now(),
                utterance,
            });

        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let (done_tx, done_rx) = oneshot::channel();
        (generation, done_tx, done_rx)
    }
}

impl SpeechEngine for ScriptedEngine {
    fn voices(&self) -> Vec<Voice> {
        self.inner
            .voices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn is_speaking(&self) -> bool {
        self.inner.speaking.load(Ordering::SeqCst)
    }

    fn speak(&self, utterance: Utterance) -> Result<oneshot::Receiver<UtteranceEvent>, SpeechError> {
        let behavior = self
            .inner
            .behavior
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        match behavior {
            SpeechBehavior::Refuse => Err(SpeechError::PlatformUnavailable),
            SpeechBehavior::Complete(duration) => {
                let (generation, done_tx, done_rx) = self.begin(utterance);
                let (cancel_tx, cancel_rx) = oneshot::channel();
                *self.inner.cancel.lock().unwrap_or_else(PoisonError::into_inner) = Some(cancel_tx);
                self.inner.speaking.store(true, Ordering::SeqCst);

                let inner = Arc::clone(&self.inner);
                tokio::spawn(async move {
                    let event = tokio::select! {
                        _ = time::sleep(duration) => UtteranceEvent::Ended,
                        _ = cancel_rx => UtteranceEvent::Interrupted,
                    };
                    if inner.generation.load(Ordering::SeqCst) == generation {
                        inner.speaking.store(false, Ordering::SeqCst);
                    }
                    let _ = done_tx.send(event);
                });
                Ok(done_rx)
            }
            SpeechBehavior::Fail(reason) => {
                let (_, done_tx, done_rx) = self.begin(utterance);
                let _ = done_tx.send(UtteranceEvent::Failed(reason));
                Ok(done_rx)
            }
            SpeechBehavior::Silent => {
                let (_, done_tx, done_rx) = self.begin(utterance);
                self.inner.speaking.store(true, Ordering::SeqCst);
                let replaced = self
                    .inner
                    .unanswered
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .replace(done_tx);
                if let Some(replaced) = replaced {
                    let _ = replaced.send(UtteranceEvent::Interrupted);
                }
                Ok(done_rx)
            }
        }
    }

    fn cancel(&self) {
        self.inner.cancels.fetch_add(1, Ordering::SeqCst);
        self.inner.speaking.store(false, Ordering::SeqCst);
        if let Some(cancel) = self
            .inner
            .cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            let _ = cancel.send(());
        }
        if let Some(silent) = self
            .inner
            .unanswered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            let _ = silent.send(UtteranceEvent::Interrupted);
        }
    }
}
