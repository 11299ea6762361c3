// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Integration tests for the dance trainer
//!
//! These tests drive whole sessions through the public API on a paused
//! Tokio clock. Times are measured from the moment a session becomes
//! active, after the three second countdown.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::{self, Instant};

use dance_trainer::audio::{AudioBackend, AudioError, AudioPlayer, Playback};
use dance_trainer::config::TrainerConfig;
use dance_trainer::library::{AudioSource, DanceStyle, Level, Library, Move, Track};
use dance_trainer::session::{
    MovePicker, SessionConfig, SessionController, SessionError, SessionPhase,
};
use dance_trainer::speech::{
    ScriptedEngine, SpeechBehavior, SpeechChannel, SpeechEngine, SpeechSettings, Voice,
    VoiceGender,
};

const COUNTDOWN: Duration = Duration::from_secs(3);

/// Counts open track handles
#[derive(Default, Clone)]
struct CountingBackend {
    live: Arc<Mutex<usize>>,
    opened: Arc<Mutex<usize>>,
}

impl CountingBackend {
    fn live(&self) -> usize {
        *self.live.lock().unwrap()
    }

    fn opened(&self) -> usize {
        *self.opened.lock().unwrap()
    }
}

struct CountingPlayback {
    live: Arc<Mutex<usize>>,
}

impl Playback for CountingPlayback {
    fn set_looping(&mut self, _looping: bool) {}

    fn play(&mut self) -> Result<(), AudioError> {
        Ok(())
    }

    fn pause(&mut self) {}
}

impl Drop for CountingPlayback {
    fn drop(&mut self) {
        *self.live.lock().unwrap() -= 1;
    }
}

impl AudioBackend for CountingBackend {
    fn open(&self, _source: &AudioSource) -> Result<Box<dyn Playback>, AudioError> {
        *self.opened.lock().unwrap() += 1;
        *self.live.lock().unwrap() += 1;
        Ok(Box::new(CountingPlayback {
            live: self.live.clone(),
        }))
    }
}

fn library() -> Library {
    let mut library = Library::empty();

    let mut salsa = DanceStyle::new("salsa-1", "Salsa");
    salsa.moves = vec![
        Move::new("s1", "Basic", Level::Beginner),
        Move::new("s2", "Cross Body Lead", Level::Beginner),
        Move::new("s3", "Dile Que No", Level::Intermediate),
    ];
    library.add_style(salsa).unwrap();

    let mut bachata = DanceStyle::new("bachata-1", "Bachata");
    bachata.moves = vec![
        Move::new("b1", "Side Basic", Level::Beginner),
        Move::new("b2", "Sensual Wave", Level::Advanced),
    ];
    library.add_style(bachata).unwrap();

    library.add_style(DanceStyle::new("empty", "Empty")).unwrap();

    library
        .add_track(Track {
            id: "t1".to_string(),
            title: "Salsa Practice".to_string(),
            artist: None,
            style: Some("salsa-1".to_string()),
            level: Some(Level::Beginner),
            source: AudioSource::File("salsa.mp3".into()),
        })
        .unwrap();

    library
}

struct Trainer {
    controller: SessionController,
    engine: ScriptedEngine,
    audio: CountingBackend,
}

fn trainer(engine: ScriptedEngine) -> Trainer {
    let library = Arc::new(library());
    let audio = CountingBackend::default();
    let speech = Arc::new(SpeechChannel::new(
        Arc::new(engine.clone()),
        SpeechSettings::default(),
    ));
    let controller = SessionController::new(
        library.clone(),
        library,
        speech,
        AudioPlayer::new(Arc::new(audio.clone())),
    )
    .with_picker(MovePicker::seeded(11));

    Trainer {
        controller,
        engine,
        audio,
    }
}

fn speaking_for(duration: Duration) -> ScriptedEngine {
    ScriptedEngine::new(SpeechBehavior::Complete(duration))
}

/// Announcement times relative to `active`
fn announce_offsets(engine: &ScriptedEngine, active: Instant) -> Vec<Duration> {
    engine.spoken().iter().map(|s| s.at - active).collect()
}

#[tokio::test(start_paused = true)]
async fn test_announces_every_interval() {
    let t = trainer(speaking_for(Duration::ZERO));
    let start = Instant::now();
    t.controller
        .start(&SessionConfig::new("salsa-1", None, 10).unwrap())
        .unwrap();

    time::sleep(COUNTDOWN + Duration::from_secs(38)).await;

    let secs = |s| Duration::from_secs(s);
    assert_eq!(
        announce_offsets(&t.engine, start + COUNTDOWN),
        vec![secs(0), secs(10), secs(20), secs(30)]
    );

    let state = t.controller.state();
    assert_eq!(state.phase, SessionPhase::Active);
    let names: Vec<String> = ["Basic", "Cross Body Lead", "Dile Que No"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert!(names.contains(&state.current_move.unwrap().name));
}

#[tokio::test(start_paused = true)]
async fn test_cadence_holds_for_every_interval() {
    for interval in 5..=20u64 {
        let t = trainer(speaking_for(Duration::from_secs(2)));
        let start = Instant::now();
        t.controller
            .start(&SessionConfig::new("bachata-1", None, interval).unwrap())
            .unwrap();

        time::sleep(COUNTDOWN + Duration::from_secs(3 * interval + 1)).await;

        let expected: Vec<Duration> = (0..4).map(|n| Duration::from_secs(n * interval)).collect();
        assert_eq!(
            announce_offsets(&t.engine, start + COUNTDOWN),
            expected,
            "interval {}s",
            interval
        );
        t.controller.stop();
    }
}

#[tokio::test(start_paused = true)]
async fn test_interval_absorbs_speech_time() {
    let t = trainer(speaking_for(Duration::from_secs(3)));
    let start = Instant::now();
    t.controller
        .start(&SessionConfig::new("salsa-1", None, 10).unwrap())
        .unwrap();

    time::sleep(COUNTDOWN + Duration::from_secs(25)).await;

    let secs = |s| Duration::from_secs(s);
    assert_eq!(
        announce_offsets(&t.engine, start + COUNTDOWN),
        vec![secs(0), secs(10), secs(20)]
    );
}

#[tokio::test(start_paused = true)]
async fn test_overlong_speech_delays_next_cycle() {
    let t = trainer(speaking_for(Duration::from_secs(7)));
    let start = Instant::now();
    t.controller
        .start(&SessionConfig::new("salsa-1", None, 5).unwrap())
        .unwrap();

    time::sleep(COUNTDOWN + Duration::from_secs(15)).await;

    let secs = |s| Duration::from_secs(s);
    assert_eq!(
        announce_offsets(&t.engine, start + COUNTDOWN),
        vec![secs(0), secs(7), secs(14)]
    );
}

#[tokio::test(start_paused = true)]
async fn test_stop_mid_utterance() {
    let t = trainer(speaking_for(Duration::from_secs(8)));
    let config = SessionConfig::new("salsa-1", Some("t1".to_string()), 10).unwrap();
    t.controller.start(&config).unwrap();
    assert_eq!(t.audio.live(), 1);

    time::sleep(COUNTDOWN + Duration::from_secs(5)).await;
    assert!(t.engine.is_speaking());
    t.controller.stop();

    assert_eq!(t.controller.state().phase, SessionPhase::Idle);
    assert!(t.controller.state().current_move.is_none());
    assert!(!t.engine.is_speaking());
    assert_eq!(t.engine.cancel_count(), 1);
    assert_eq!(t.audio.live(), 0);

    time::sleep(Duration::from_secs(60)).await;
    assert_eq!(t.engine.spoken().len(), 1);
    assert_eq!(t.controller.state().phase, SessionPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_stop_during_countdown() {
    let t = trainer(speaking_for(Duration::ZERO));
    t.controller
        .start(&SessionConfig::for_style("salsa-1"))
        .unwrap();

    time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(t.controller.state().phase, SessionPhase::Countdown);
    t.controller.stop();

    time::sleep(Duration::from_secs(30)).await;
    assert!(t.engine.spoken().is_empty());
    assert_eq!(t.controller.state().phase, SessionPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_empty_style_leaves_idle() {
    let t = trainer(speaking_for(Duration::ZERO));
    let config = SessionConfig::new("empty", Some("t1".to_string()), 10).unwrap();

    assert_eq!(
        t.controller.start(&config),
        Err(SessionError::EmptyStyle("empty".to_string()))
    );
    assert_eq!(t.controller.state().phase, SessionPhase::Idle);
    assert_eq!(t.audio.opened(), 0);

    time::sleep(Duration::from_secs(10)).await;
    assert!(t.engine.spoken().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_second_start_rejected_while_running() {
    let t = trainer(speaking_for(Duration::ZERO));
    let first = t
        .controller
        .start(&SessionConfig::for_style("salsa-1"))
        .unwrap();

    time::sleep(COUNTDOWN + Duration::from_secs(1)).await;
    assert_eq!(
        t.controller.start(&SessionConfig::for_style("bachata-1")),
        Err(SessionError::AlreadyActive)
    );
    assert_eq!(t.controller.state().token, Some(first));
}

#[tokio::test(start_paused = true)]
async fn test_stale_session_cannot_touch_new_one() {
    let t = trainer(speaking_for(Duration::from_secs(8)));
    t.controller
        .start(&SessionConfig::for_style("salsa-1"))
        .unwrap();

    // stop while the first session's announcement is in flight
    time::sleep(COUNTDOWN + Duration::from_secs(2)).await;
    t.controller.stop();
    let second = t
        .controller
        .start(&SessionConfig::for_style("bachata-1"))
        .unwrap();

    // the first session's utterance would have ended during this countdown
    time::sleep(Duration::from_millis(2500)).await;
    let state = t.controller.state();
    assert_eq!(state.phase, SessionPhase::Countdown);
    assert!(state.current_move.is_none());
    assert_eq!(state.token, Some(second));

    time::sleep(Duration::from_secs(20)).await;
    let spoken = t.engine.spoken_texts();
    assert!(["Basic", "Cross Body Lead", "Dile Que No"].contains(&spoken[0].as_str()));
    assert!(spoken[1..]
        .iter()
        .all(|name| name == "Side Basic" || name == "Sensual Wave"));
    let current = t.controller.state().current_move.unwrap();
    assert!(current.id.starts_with('b'));
}

#[tokio::test(start_paused = true)]
async fn test_missing_track_is_not_fatal() {
    let t = trainer(speaking_for(Duration::ZERO));
    let config = SessionConfig::new("salsa-1", Some("no-such-track".to_string()), 10).unwrap();
    t.controller.start(&config).unwrap();

    time::sleep(COUNTDOWN + Duration::from_secs(1)).await;
    assert_eq!(t.controller.state().phase, SessionPhase::Active);
    assert_eq!(t.engine.spoken().len(), 1);
    assert_eq!(t.audio.opened(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_speech_failures_keep_session_running() {
    let engine = ScriptedEngine::new(SpeechBehavior::Silent);
    let t = trainer(engine);
    t.controller
        .start(&SessionConfig::new("salsa-1", None, 5).unwrap())
        .unwrap();

    // each silent utterance settles on the 10 s safety timeout
    time::sleep(COUNTDOWN + Duration::from_secs(25)).await;
    assert_eq!(t.engine.spoken().len(), 3);
    assert_eq!(t.controller.state().phase, SessionPhase::Active);
}

#[tokio::test(start_paused = true)]
async fn test_voice_falls_back_to_russian_female() {
    let engine = speaking_for(Duration::ZERO).with_voices(vec![
        Voice::new("Yuri", "ru-RU", Some(VoiceGender::Male)),
        Voice::new("Milena", "ru-RU", None),
        Voice::new("Daniel", "en-GB", Some(VoiceGender::Male)),
    ]);
    let t = trainer(engine);
    t.controller
        .start(&SessionConfig::for_style("salsa-1"))
        .unwrap();

    time::sleep(COUNTDOWN + Duration::from_secs(1)).await;
    let spoken = t.engine.spoken();
    let utterance = &spoken[0].utterance;
    assert_eq!(utterance.voice.as_ref().map(|v| v.name.as_str()), Some("Milena"));
    assert_eq!(utterance.lang, "ru-RU");
    assert_eq!(utterance.rate, 0.9);
}

#[tokio::test(start_paused = true)]
async fn test_library_and_config_files_drive_session() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("trainer.yaml");
    std::fs::write(
        &config_path,
        "session:\n  style: bachata-1\n  interval_seconds: 6\n",
    )
    .unwrap();

    let config = TrainerConfig::load(&config_path).unwrap();
    library().save(config.library_path(&config_path)).unwrap();
    let loaded = Arc::new(Library::load(config.library_path(&config_path)).unwrap());

    let session = config.session_config(None, None, None).unwrap();
    assert_eq!(session.interval_seconds(), 6);

    let engine = speaking_for(Duration::ZERO);
    let controller = SessionController::new(
        loaded.clone(),
        loaded,
        Arc::new(SpeechChannel::new(
            Arc::new(engine.clone()),
            SpeechSettings::default(),
        )),
        AudioPlayer::new(Arc::new(CountingBackend::default())),
    );
    controller.start(&session).unwrap();

    time::sleep(COUNTDOWN + Duration::from_secs(13)).await;
    let spoken = engine.spoken_texts();
    assert_eq!(spoken.len(), 3);
    assert!(spoken
        .iter()
        .all(|name| name == "Side Basic" || name == "Sensual Wave"));
}
