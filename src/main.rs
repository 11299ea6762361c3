// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use std::env;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use dance_trainer::audio::{AudioBackend, AudioPlayer, RodioBackend, SilentBackend};
use dance_trainer::config::{TrainerConfig, DEFAULT_CONFIG_FILE};
use dance_trainer::library::{Level, Library, MoveFilter, StyleCatalog, TrackCatalog};
use dance_trainer::session::{SessionConfig, SessionController, SessionPhase, SessionState};
use dance_trainer::speech::{
    select_voice, EspeakEngine, ScriptedEngine, SpeechBehavior, SpeechChannel, SpeechEngine,
    SpeechSettings, Voice,
};
use dance_trainer::ui::{self, UiState};

/// Time a dry-run announcement takes
const DRY_RUN_SPEECH: Duration = Duration::from_millis(1500);

fn print_usage() {
    println!("Dance Trainer - spoken move drills");
    println!();
    println!("Usage: dance-trainer [--config FILE] [--verbose] <COMMAND>");
    println!();
    println!("Commands:");
    println!("  --list-styles           List dance styles and their moves");
    println!("      --level <LEVEL>     Only moves of this level");
    println!("      --search <TEXT>     Only moves whose name contains TEXT");
    println!("      --sort <ORDER>      Order moves by name or level (default name)");
    println!("  --list-tracks           List background tracks");
    println!("  --list-voices           List speech voices and the one that will be used");
    println!("  --init-library          Write the built-in library to the library file");
    println!("  --add-style <NAME>      Add an empty dance style");
    println!("  --add-move <STYLE> <NAME>");
    println!("                          Add a move to a style");
    println!("      --level <LEVEL>     beginner, intermediate or advanced (default beginner)");
    println!("  --remove-move <STYLE> <MOVE>");
    println!("                          Delete a move from a style");
    println!("  --add-track <FILE>      Add an audio file as a background track");
    println!("  --remove-track <ID>     Delete a background track");
    println!("  --train [STYLE]         Start a training session");
    println!("      --track <ID>        Loop this track during the session");
    println!("      --interval <SECS>   Seconds between moves (5-20, default 10)");
    println!("      --headless          Print moves instead of opening the trainer screen");
    println!("      --dry-run           Simulate speech and audio");
    println!("  --help                  Show this help message");
    println!();
    println!("Options:");
    println!("  --config <FILE>         Configuration file (default {})", DEFAULT_CONFIG_FILE);
    println!("  --verbose               Debug logging");
}

#[derive(Debug, Default, PartialEq)]
struct TrainArgs {
    style: Option<String>,
    track: Option<String>,
    interval: Option<u64>,
    headless: bool,
    dry_run: bool,
}

/// Changes saved back to the library file
#[derive(Debug, PartialEq)]
enum Edit {
    AddStyle { name: String },
    AddMove { style: String, name: String, level: Level },
    RemoveMove { style: String, move_id: String },
    AddTrack { path: PathBuf },
    RemoveTrack { id: String },
}

#[derive(Debug, PartialEq)]
enum Command {
    Help,
    ListStyles(MoveFilter),
    ListTracks,
    ListVoices,
    InitLibrary,
    Edit(Edit),
    Train(TrainArgs),
}

#[derive(Debug, PartialEq)]
struct Options {
    config: PathBuf,
    verbose: bool,
    command: Command,
}

fn parse_args(args: &[String]) -> Result<Options> {
    let mut config = PathBuf::from(DEFAULT_CONFIG_FILE);
    let mut verbose = false;
    let mut command = None;
    let mut train = TrainArgs::default();
    let mut filter = MoveFilter::default();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let mut value = |name: &str| {
            iter.next()
                .cloned()
                .ok_or_else(|| anyhow!("{} requires a value", name))
        };

        match arg.as_str() {
            "--config" => config = PathBuf::from(value("--config")?),
            "--verbose" | "-v" => verbose = true,
            "--help" | "-h" => command = Some(Command::Help),
            "--list-styles" => command = Some(Command::ListStyles(MoveFilter::default())),
            "--list-tracks" => command = Some(Command::ListTracks),
            "--list-voices" => command = Some(Command::ListVoices),
            "--init-library" => command = Some(Command::InitLibrary),
            "--add-style" => {
                let name = value("--add-style")?;
                command = Some(Command::Edit(Edit::AddStyle { name }));
            }
            "--add-move" => {
                let style = value("--add-move")?;
                let name = value("--add-move")?;
                command = Some(Command::Edit(Edit::AddMove {
                    style,
                    name,
                    level: Level::default(),
                }));
            }
            "--remove-move" => {
                let style = value("--remove-move")?;
                let move_id = value("--remove-move")?;
                command = Some(Command::Edit(Edit::RemoveMove { style, move_id }));
            }
            "--add-track" => {
                let path = PathBuf::from(value("--add-track")?);
                command = Some(Command::Edit(Edit::AddTrack { path }));
            }
            "--remove-track" => {
                let id = value("--remove-track")?;
                command = Some(Command::Edit(Edit::RemoveTrack { id }));
            }
            "--level" => filter.level = Some(value("--level")?.parse()?),
            "--search" => filter.query = Some(value("--search")?),
            "--sort" => filter.sort = value("--sort")?.parse()?,
            "--train" => command = Some(Command::Train(TrainArgs::default())),
            "--track" => train.track = Some(value("--track")?),
            "--interval" => {
                let raw = value("--interval")?;
                let seconds = raw
                    .parse()
                    .map_err(|_| anyhow!("Invalid interval: {}", raw))?;
                train.interval = Some(seconds);
            }
            "--headless" => train.headless = true,
            "--dry-run" => train.dry_run = true,
            other if other.starts_with('-') => bail!("Unknown option: {}", other),
            other => {
                if train.style.is_some() {
                    bail!("Unexpected argument: {}", other);
                }
                train.style = Some(other.to_string());
            }
        }
    }

    let command = match command {
        Some(Command::Train(_)) => Command::Train(train),
        Some(Command::ListStyles(_)) => Command::ListStyles(filter),
        Some(Command::Edit(Edit::AddMove { style, name, .. })) => Command::Edit(Edit::AddMove {
            style,
            name,
            level: filter.level.unwrap_or_default(),
        }),
        Some(command) => command,
        None => Command::Help,
    };

    Ok(Options {
        config,
        verbose,
        command,
    })
}

/// Install the tracing subscriber. `RUST_LOG` overrides the default level.
fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,dance_trainer={}", level)));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file: {:?}", path))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(io::stderr).init(),
    }
    Ok(())
}

fn load_library(config: &TrainerConfig, config_path: &Path) -> Result<Library> {
    Library::load_or_default(config.library_path(config_path))
}

fn list_styles(library: &Library, filter: &MoveFilter) {
    if library.styles().is_empty() {
        println!("No dance styles");
        return;
    }
    for style in library.styles() {
        println!("{} ({}) - {} moves", style.name, style.id, style.moves.len());
        for mv in style.filtered_moves(filter) {
            println!("  {:<16} {:<28} {}", mv.id, mv.name, mv.level.label());
        }
    }
}

/// Apply an edit, returning a line describing it
fn apply_edit(library: &mut Library, edit: &Edit) -> Result<String> {
    let message = match edit {
        Edit::AddStyle { name } => {
            let id = library.add_style_named(name)?;
            format!("Added style {} ({})", name, id)
        }
        Edit::AddMove { style, name, level } => {
            let id = library.add_move_named(style, name, *level)?;
            format!("Added move {} ({}) to {}", name, id, style)
        }
        Edit::RemoveMove { style, move_id } => {
            let removed = library.remove_move(style, move_id)?;
            format!("Removed move {} from {}", removed.name, style)
        }
        Edit::AddTrack { path } => {
            if !path.is_file() {
                warn!(path = ?path, "track file does not exist yet");
            }
            let id = library.add_track_file(path)?;
            format!("Added track {} ({})", path.display(), id)
        }
        Edit::RemoveTrack { id } => {
            let removed = library.remove_track(id)?;
            format!("Removed track {}", removed.title)
        }
    };
    Ok(message)
}

/// Load the library, apply `edit` and save it back
fn edit_library(config: &TrainerConfig, config_path: &Path, edit: &Edit) -> Result<()> {
    let path = config.library_path(config_path);
    let mut library = Library::load_or_default(&path)?;
    let message = apply_edit(&mut library, edit)?;
    library.save(&path)?;
    info!(path = ?path, "library saved");
    println!("{}", message);
    Ok(())
}

fn list_tracks(library: &Library) {
    if library.tracks().is_empty() {
        println!("No tracks");
        return;
    }
    for track in library.tracks() {
        let artist = track.artist.as_deref().unwrap_or("unknown artist");
        println!(
            "{:<8} {} - {} [{}]",
            track.id,
            track.title,
            artist,
            track.source.path().display()
        );
    }
}

async fn list_voices(settings: &SpeechSettings) {
    let Some(engine) = EspeakEngine::detect() else {
        println!("No speech synthesizer found (install espeak-ng)");
        return;
    };

    let voices = engine.load_voices_now().await;
    for voice in &voices {
        let gender = voice
            .effective_gender()
            .map(|g| format!("{:?}", g))
            .unwrap_or_else(|| "-".to_string());
        println!("{:<32} {:<10} {}", voice.name, voice.lang, gender);
    }
    println!();
    match select_voice(&voices, &settings.voice, &settings.fallback_language) {
        Some(voice) => println!("Profile {} uses: {} ({})", settings.voice, voice.name, voice.lang),
        None => println!("Profile {} has no matching voice", settings.voice),
    }
}

fn init_library(config: &TrainerConfig, config_path: &Path) -> Result<()> {
    let path = config.library_path(config_path);
    if path.exists() {
        bail!("Library file already exists: {:?}", path);
    }
    Library::default().save(&path)?;
    println!("Wrote built-in library to {}", path.display());
    Ok(())
}

fn speech_channel(settings: &SpeechSettings, dry_run: bool) -> SpeechChannel {
    if dry_run {
        let engine = ScriptedEngine::new(SpeechBehavior::Complete(DRY_RUN_SPEECH))
            .with_voices(vec![Voice::new("Dry Run", settings.voice.language(), None)]);
        return SpeechChannel::new(Arc::new(engine), settings.clone());
    }

    match EspeakEngine::detect() {
        Some(engine) => {
            engine.load_voices();
            let engine: Arc<dyn SpeechEngine> = Arc::new(engine);
            SpeechChannel::new(engine, settings.clone())
        }
        None => {
            warn!("no speech synthesizer found, moves will only be shown");
            SpeechChannel::unavailable(settings.clone())
        }
    }
}

fn audio_backend(dry_run: bool) -> Arc<dyn AudioBackend> {
    if dry_run {
        return Arc::new(SilentBackend);
    }
    match RodioBackend::spawn() {
        Ok(backend) => Arc::new(backend),
        Err(e) => {
            warn!(error = %e, "audio unavailable");
            Arc::new(SilentBackend)
        }
    }
}

fn print_state(state: &SessionState) {
    match state.phase {
        SessionPhase::Idle => println!("Stopped"),
        SessionPhase::Countdown => {
            if let Some(value) = state.countdown {
                println!("{}...", value);
            }
        }
        SessionPhase::Active => {
            if let Some(current) = &state.current_move {
                println!("▶ {} ({})", current.name, current.level);
            }
        }
    }
}

/// Print every state change until Ctrl+C
async fn run_headless(controller: &SessionController, session: &SessionConfig) -> Result<()> {
    let mut states = controller.subscribe();
    controller.start(session)?;
    print_state(&states.borrow_and_update());

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                print_state(&states.borrow_and_update());
            }
            _ = &mut ctrl_c => break,
        }
    }

    controller.stop();
    Ok(())
}

async fn train(config: &TrainerConfig, config_path: &Path, args: &TrainArgs) -> Result<()> {
    let library = Arc::new(load_library(config, config_path)?);
    let session = config.session_config(args.style.as_deref(), args.track.as_deref(), args.interval)?;

    let style_name = library
        .style(session.style_id())
        .map(|style| style.name)
        .unwrap_or_else(|| session.style_id().to_string());
    let track_title = session
        .track_id()
        .and_then(|id| library.track(id))
        .map(|track| track.title);

    let speech = Arc::new(speech_channel(&config.speech, args.dry_run));
    let audio = AudioPlayer::new(audio_backend(args.dry_run));
    let controller = SessionController::new(library.clone(), library, speech, audio);

    info!(style = session.style_id(), interval_s = session.interval_seconds(), "training");

    if args.headless {
        run_headless(&controller, &session).await
    } else {
        let ui_state = UiState::new(style_name, track_title, session.interval_seconds());
        ui::run(&controller, &session, ui_state)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let options = parse_args(&args)?;

    // the trainer screen owns the terminal, so its logs go to a file
    let log_file = match &options.command {
        Command::Train(train) if !train.headless => {
            Some(env::temp_dir().join("dance-trainer.log"))
        }
        _ => None,
    };
    init_logging(options.verbose, log_file.as_deref())?;

    let config = TrainerConfig::load_or_default(&options.config)?;

    match &options.command {
        Command::Help => print_usage(),
        Command::ListStyles(filter) => {
            list_styles(&load_library(&config, &options.config)?, filter)
        }
        Command::ListTracks => list_tracks(&load_library(&config, &options.config)?),
        Command::ListVoices => list_voices(&config.speech).await,
        Command::InitLibrary => init_library(&config, &options.config)?,
        Command::Edit(edit) => edit_library(&config, &options.config, edit)?,
        Command::Train(args) => train(&config, &options.config, args).await?,
    }

    Ok(())
}
