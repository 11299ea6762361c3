// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Track playback via rodio.
//!
//! `rodio::OutputStream` is not `Send` on every platform, so the stream and
//! all sinks live on one audio thread. [`RodioBackend`] and the handles it
//! returns talk to that thread over a channel.

use std::collections::HashMap;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc, Mutex, PoisonError};
use std::thread;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use tracing::{debug, warn};

use super::{AudioBackend, AudioError, Playback};
use crate::library::AudioSource;

type Bytes = Arc<[u8]>;

enum AudioCommand {
    /// Decode a track into a new paused sink
    Load {
        id: u64,
        path: PathBuf,
        data: Bytes,
        looping: bool,
        reply: mpsc::Sender<Result<(), AudioError>>,
    },
    Play { id: u64 },
    Pause { id: u64 },
    Release { id: u64 },
    Shutdown,
}

/// Audio backend playing files through the default output device
pub struct RodioBackend {
    cmd_tx: Mutex<mpsc::Sender<AudioCommand>>,
    next_id: AtomicU64,
    thread: Option<thread::JoinHandle<()>>,
}

impl RodioBackend {
    /// Spawn the audio thread.
    ///
    /// The output device is opened lazily on the first track.
    pub fn spawn() -> Result<Self, AudioError> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let thread = thread::Builder::new()
            .name("dance-trainer-audio".into())
            .spawn(move || run(cmd_rx))
            .map_err(|e| AudioError::StreamFailed(format!("failed to spawn audio thread: {}", e)))?;

        Ok(Self {
            cmd_tx: Mutex::new(cmd_tx),
            next_id: AtomicU64::new(0),
            thread: Some(thread),
        })
    }

    fn sender(&self) -> mpsc::Sender<AudioCommand> {
        self.cmd_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl AudioBackend for RodioBackend {
    fn open(&self, source: &AudioSource) -> Result<Box<dyn Playback>, AudioError> {
        let path = source.path();
        let data = read_track(path)?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(RodioPlayback {
            id,
            path: path.to_path_buf(),
            data,
            looping: false,
            loaded: false,
            cmd_tx: self.sender(),
        }))
    }
}

impl Drop for RodioBackend {
    fn drop(&mut self) {
        let _ = self.sender().send(AudioCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Read a track into memory and check that rodio can decode it
fn read_track(path: &Path) -> Result<Bytes, AudioError> {
    let data: Bytes = fs::read(path)
        .map_err(|e| AudioError::OpenFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?
        .into();

    Decoder::new(Cursor::new(Arc::clone(&data))).map_err(|e| AudioError::DecodeFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    Ok(data)
}

/// Handle to one track on the audio thread
struct RodioPlayback {
    id: u64,
    path: PathBuf,
    data: Bytes,
    looping: bool,
    /// Whether the audio thread holds a sink for this track
    loaded: bool,
    cmd_tx: mpsc::Sender<AudioCommand>,
}

impl Playback for RodioPlayback {
    fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    fn play(&mut self) -> Result<(), AudioError> {
        if !self.loaded {
            let (reply, result) = mpsc::channel();
            self.cmd_tx
                .send(AudioCommand::Load {
                    id: self.id,
                    path: self.path.clone(),
                    data: Arc::clone(&self.data),
                    looping: self.looping,
                    reply,
                })
                .map_err(|_| AudioError::ThreadGone)?;
            result.recv().map_err(|_| AudioError::ThreadGone)??;
            self.loaded = true;
        }

        self.cmd_tx
            .send(AudioCommand::Play { id: self.id })
            .map_err(|_| AudioError::ThreadGone)
    }

    fn pause(&mut self) {
        let _ = self.cmd_tx.send(AudioCommand::Pause { id: self.id });
    }
}

impl Drop for RodioPlayback {
    fn drop(&mut self) {
        if self.loaded {
            let _ = self.cmd_tx.send(AudioCommand::Release { id: self.id });
        }
    }
}

/// Output stream, opened on first use and kept for the thread's lifetime
struct Output {
    _stream: OutputStream,
    handle: OutputStreamHandle,
}

/// Body of the audio thread. Owns the output stream and every sink.
fn run(cmd_rx: mpsc::Receiver<AudioCommand>) {
    let mut output: Option<Output> = None;
    let mut sinks: HashMap<u64, Sink> = HashMap::new();

    while let Ok(cmd) = cmd_rx.recv() {
        match cmd {
            AudioCommand::Load {
                id,
                path,
                data,
                looping,
                reply,
            } => {
                let result = load(&mut output, &path, data, looping).map(|sink| {
                    sinks.insert(id, sink);
                });
                let _ = reply.send(result);
            }
            AudioCommand::Play { id } => {
                if let Some(sink) = sinks.get(&id) {
                    sink.play();
                }
            }
            AudioCommand::Pause { id } => {
                if let Some(sink) = sinks.get(&id) {
                    sink.pause();
                }
            }
            AudioCommand::Release { id } => {
                if let Some(sink) = sinks.remove(&id) {
                    sink.stop();
                    debug!(id, "sink released");
                }
            }
            AudioCommand::Shutdown => break,
        }
    }

    for (_, sink) in sinks.drain() {
        sink.stop();
    }
    debug!("audio thread exiting");
}

fn load(
    output: &mut Option<Output>,
    path: &Path,
    data: Bytes,
    looping: bool,
) -> Result<Sink, AudioError> {
    if output.is_none() {
        let (stream, handle) = OutputStream::try_default().map_err(|e| {
            warn!(error = %e, "no audio output");
            AudioError::NoDevice
        })?;
        *output = Some(Output {
            _stream: stream,
            handle,
        });
    }
    let handle = match output {
        Some(output) => &output.handle,
        None => return Err(AudioError::NoDevice),
    };

    let sink = Sink::try_new(handle).map_err(|e| AudioError::StreamFailed(e.to_string()))?;
    sink.pause();

    let decode_failed = |e: rodio::decoder::DecoderError| AudioError::DecodeFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };
    let cursor = Cursor::new(data);
    if looping {
        sink.append(Decoder::new_looped(cursor).map_err(decode_failed)?);
    } else {
        sink.append(Decoder::new(cursor).map_err(decode_failed)?);
    }

    Ok(sink)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file() {
        let err = read_track(Path::new("/nonexistent/track.mp3")).unwrap_err();
        assert!(matches!(err, AudioError::OpenFailed { .. }));
    }

    #[test]
    fn test_undecodable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.mp3");
        fs::write(&path, b"definitely not audio").unwrap();

        let err = read_track(&path).unwrap_err();
        assert!(matches!(err, AudioError::DecodeFailed { .. }));
    }

    #[test]
    fn test_backend_open_reports_missing_track() {
        let backend = RodioBackend::spawn().unwrap();
        let source = AudioSource::File(PathBuf::from("/nonexistent/track.mp3"));
        assert!(matches!(
            backend.open(&source),
            Err(AudioError::OpenFailed { .. })
        ));
    }
}
