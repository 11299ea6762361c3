// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Local speech via the `espeak-ng` command line synthesizer.
//!
//! Each utterance runs one `espeak-ng` process. Cancelling kills it.
//! The voice list is loaded in the background and stays empty until
//! `espeak-ng --voices` has answered.

use std::env;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::{SpeechEngine, SpeechError, Utterance, UtteranceEvent, Voice, VoiceGender};

/// Executables tried, in order
const PROGRAMS: &[&str] = &["espeak-ng", "espeak"];

/// espeak's normal speaking rate in words per minute
const NORMAL_WPM: f32 = 175.0;

/// espeak's neutral pitch (0-99)
const NEUTRAL_PITCH: f32 = 50.0;

/// Voice variants appended to a voice file to change its gender
const FEMALE_VARIANT: &str = "f3";
const MALE_VARIANT: &str = "m3";

struct Inner {
    program: PathBuf,
    voices: RwLock<Vec<Voice>>,
    speaking: AtomicBool,
    generation: AtomicU64,
    cancel: Mutex<Option<oneshot::Sender<()>>>,
}

/// Speech engine backed by `espeak-ng`
#[derive(Clone)]
pub struct EspeakEngine {
    inner: Arc<Inner>,
}

impl EspeakEngine {
    /// Find `espeak-ng` (or `espeak`) on `PATH`
    pub fn detect() -> Option<Self> {
        let found = PROGRAMS.iter().find_map(|name| find_in_path(name))?;
        info!(program = %found.display(), "found speech synthesizer");
        Some(Self::with_program(found))
    }

    /// Use a specific synthesizer executable
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(Inner {
                program: program.into(),
                voices: RwLock::new(Vec::new()),
                speaking: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                cancel: Mutex::new(None),
            }),
        }
    }

    pub fn program(&self) -> &Path {
        &self.inner.program
    }

    /// Query the installed voices in the background.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn load_voices(&self) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            match Command::new(&inner.program).arg("--voices").output().await {
                Ok(output) if output.status.success() => {
                    let listing = String::from_utf8_lossy(&output.stdout);
                    let voices = parse_voice_list(&listing);
                    debug!(count = voices.len(), "loaded espeak voices");
                    *inner.voices.write().unwrap_or_else(PoisonError::into_inner) = voices;
                }
                Ok(output) => warn!(status = %output.status, "espeak --voices failed"),
                Err(e) => warn!(error = %e, "could not run espeak --voices"),
            }
        });
    }

    /// Load voices and wait for the listing
    pub async fn load_voices_now(&self) -> Vec<Voice> {
        match Command::new(&self.inner.program).arg("--voices").output().await {
            Ok(output) if output.status.success() => {
                let voices = parse_voice_list(&String::from_utf8_lossy(&output.stdout));
                *self.inner.voices.write().unwrap_or_else(PoisonError::into_inner) = voices.clone();
                voices
            }
            Ok(output) => {
                warn!(status = %output.status, "espeak --voices failed");
                Vec::new()
            }
            Err(e) => {
                warn!(error = %e, "could not run espeak --voices");
                Vec::new()
            }
        }
    }
}

impl SpeechEngine for EspeakEngine {
    fn voices(&self) -> Vec<Voice> {
        self.inner
            .voices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn is_speaking(&self) -> bool {
        self.inner.speaking.load(Ordering::SeqCst)
    }

    fn speak(&self, utterance: Utterance) -> Result<oneshot::Receiver<UtteranceEvent>, SpeechError> {
        let mut child = Command::new(&self.inner.program)
            .args(espeak_args(&utterance))
            .arg("--stdin")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => SpeechError::PlatformUnavailable,
                _ => SpeechError::Transient(e.to_string()),
            })?;

        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let (done_tx, done_rx) = oneshot::channel();
        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
        *self.inner.cancel.lock().unwrap_or_else(PoisonError::into_inner) = Some(cancel_tx);
        self.inner.speaking.store(true, Ordering::SeqCst);

        let inner = Arc::clone(&self.inner);
        let text = utterance.text;
        tokio::spawn(async move {
            if let Some(mut stdin) = child.stdin.take() {
                if let Err(e) = stdin.write_all(text.as_bytes()).await {
                    debug!(error = %e, "failed to write utterance to espeak");
                }
                // closing stdin lets espeak start speaking
                drop(stdin);
            }

            let event = tokio::select! {
                status = child.wait() => match status {
                    Ok(status) if status.success() => UtteranceEvent::Ended,
                    Ok(status) => UtteranceEvent::Failed(format!("espeak exited with {}", status)),
                    Err(e) => UtteranceEvent::Failed(e.to_string()),
                },
                _ = cancel_rx => {
                    let _ = child.kill().await;
                    UtteranceEvent::Interrupted
                }
            };

            if inner.generation.load(Ordering::SeqCst) == generation {
                inner.speaking.store(false, Ordering::SeqCst);
            }
            let _ = done_tx.send(event);
        });

        Ok(done_rx)
    }

    fn cancel(&self) {
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
    }
}

/// Command line arguments selecting voice, rate and pitch
fn espeak_args(utterance: &Utterance) -> Vec<String> {
    let voice = match &utterance.voice {
        // listed voices already carry their variant
        Some(Voice { id: Some(id), .. }) => id.clone(),
        Some(voice) => {
            let base = voice.lang.to_lowercase();
            match voice.effective_gender() {
                Some(VoiceGender::Female) => format!("{}+{}", base, FEMALE_VARIANT),
                Some(VoiceGender::Male) => format!("{}+{}", base, MALE_VARIANT),
                None => base,
            }
        }
        // espeak names languages by their primary subtag
        None => utterance
            .lang
            .split('-')
            .next()
            .unwrap_or_default()
            .to_lowercase(),
    };
    let wpm = (NORMAL_WPM * utterance.rate).round().max(80.0) as u32;
    let pitch = (NEUTRAL_PITCH * utterance.pitch).round().clamp(0.0, 99.0) as u32;

    vec![
        "-v".to_string(),
        voice,
        "-s".to_string(),
        wpm.to_string(),
        "-p".to_string(),
        pitch.to_string(),
    ]
}

/// Parse the table printed by `espeak-ng --voices`.
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File                 Other Languages
///  5  ru              --/M      Russian            zle/ru
/// ```
///
/// Each voice file is listed once per gender: as reported, and with the
/// opposite gender's variant (`zle/ru+f3`). A voice without a gender is
/// listed once.
pub fn parse_voice_list(listing: &str) -> Vec<Voice> {
    listing
        .lines()
        .filter(|line| !line.trim_start().starts_with("Pty"))
        .filter_map(|line| {
            let mut columns = line.split_whitespace();
            let _priority = columns.next()?;
            let lang = columns.next()?;
            let age_gender = columns.next()?;
            let name = columns.next()?.replace('_', " ");
            let file = columns.next().unwrap_or(lang);

            let gender = match age_gender.rsplit('/').next() {
                Some("F") => Some(VoiceGender::Female),
                Some("M") => Some(VoiceGender::Male),
                _ => None,
            };
            let variant = match gender {
                Some(VoiceGender::Male) => Some(Voice::new(
                    format!("{} (female)", name),
                    lang,
                    Some(VoiceGender::Female),
                )
                .with_id(format!("{}+{}", file, FEMALE_VARIANT))),
                Some(VoiceGender::Female) => Some(Voice::new(
                    format!("{} (male)", name),
                    lang,
                    Some(VoiceGender::Male),
                )
                .with_id(format!("{}+{}", file, MALE_VARIANT))),
                None => None,
            };
            let reported = Voice::new(name, lang, gender).with_id(file);
            Some(std::iter::once(reported).chain(variant))
        })
        .flatten()
        .collect()
}

fn find_in_path(program: &str) -> Option<PathBuf> {
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}
