// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Terminal UI for the dance trainer.
//!
//! Provides a ratatui-based trainer screen showing the countdown and the
//! current move, with keys to start and stop the session.

mod trainer;

pub use trainer::TrainerWidget;

use std::io::{self, Stdout};
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame, Terminal,
};
use tracing::info;

use crate::session::{SessionConfig, SessionController, SessionPhase, SessionState};

/// How long a status message stays visible
const STATUS_TIMEOUT: Duration = Duration::from_secs(3);

/// Screen state that is not part of the session
#[derive(Debug, Clone, Default)]
pub struct UiState {
    /// Name of the style being trained
    pub style_name: String,
    /// Title of the background track, if any
    pub track_title: Option<String>,
    pub interval_seconds: u64,
    /// Help text visible
    pub show_help: bool,
    pub status_message: Option<String>,
    pub status_time: Option<Instant>,
}

impl UiState {
    pub fn new(style_name: impl Into<String>, track_title: Option<String>, interval_seconds: u64) -> Self {
        Self {
            style_name: style_name.into(),
            track_title,
            interval_seconds,
            ..Self::default()
        }
    }

    /// Set a status message that will be displayed temporarily
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
        self.status_time = Some(Instant::now());
    }

    /// Clear expired status message
    pub fn clear_expired_status(&mut self) {
        if let Some(time) = self.status_time {
            if time.elapsed() > STATUS_TIMEOUT {
                self.status_message = None;
                self.status_time = None;
            }
        }
    }
}

/// Key event result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    None,
    Quit,
    /// Start when idle, stop otherwise
    ToggleSession,
    Stop,
    ToggleHelp,
}

/// Map a key press to an action
pub fn key_action(code: KeyCode, modifiers: KeyModifiers) -> KeyAction {
    match (code, modifiers) {
        (KeyCode::Char('q'), KeyModifiers::NONE)
        | (KeyCode::Esc, _)
        | (KeyCode::Char('c'), KeyModifiers::CONTROL) => KeyAction::Quit,
        (KeyCode::Char(' '), _) | (KeyCode::Enter, _) => KeyAction::ToggleSession,
        (KeyCode::Char('s'), KeyModifiers::NONE) => KeyAction::Stop,
        (KeyCode::Char('?'), _) | (KeyCode::Char('h'), KeyModifiers::NONE) => {
            KeyAction::ToggleHelp
        }
        _ => KeyAction::None,
    }
}

/// Terminal UI application
pub struct App {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    /// Target frame rate
    frame_rate: u32,
}

impl App {
    /// Switch the terminal to the trainer screen
    pub fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Self {
            terminal,
            frame_rate: 30,
        })
    }

    /// Poll for events with timeout
    pub fn poll_event(&self) -> io::Result<Option<Event>> {
        let timeout = Duration::from_millis(1000 / self.frame_rate as u64);
        if event::poll(timeout)? {
            Ok(Some(event::read()?))
        } else {
            Ok(None)
        }
    }

    /// Draw the UI
    pub fn draw(&mut self, session: &SessionState, ui: &UiState) -> io::Result<()> {
        self.terminal.draw(|frame| {
            let area = frame.area();

            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(3), // Header
                    Constraint::Min(7),    // Trainer
                    Constraint::Length(1), // Status bar
                ])
                .split(area);

            render_header(frame, chunks[0], session, ui);

            let trainer = TrainerWidget::new(session)
                .block(Block::default().borders(Borders::ALL).title(" Move "));
            frame.render_widget(trainer, chunks[1]);

            render_status_bar(frame, chunks[2], ui);

            if ui.show_help {
                render_help_overlay(frame, area);
            }
        })?;

        Ok(())
    }

    fn cleanup(&mut self) -> io::Result<()> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for App {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

/// Run the trainer screen until the user quits.
///
/// Starts `config` right away; space toggles the session. Blocks the
/// calling thread, so call it from the runtime's main future rather
/// than from a spawned task.
pub fn run(controller: &SessionController, config: &SessionConfig, mut ui: UiState) -> Result<()> {
    let mut app = App::new()?;
    let mut session = controller.subscribe();

    toggle(controller, config, &mut ui);

    loop {
        ui.clear_expired_status();
        let state = session.borrow_and_update().clone();
        app.draw(&state, &ui)?;

        let Some(Event::Key(key)) = app.poll_event()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match key_action(key.code, key.modifiers) {
            KeyAction::Quit => break,
            KeyAction::ToggleSession => toggle(controller, config, &mut ui),
            KeyAction::Stop => {
                controller.stop();
                ui.set_status("Stopped");
            }
            KeyAction::ToggleHelp => ui.show_help = !ui.show_help,
            KeyAction::None => {}
        }
    }

    controller.stop();
    info!("trainer screen closed");
    Ok(())
}

fn toggle(controller: &SessionController, config: &SessionConfig, ui: &mut UiState) {
    if controller.is_running() {
        controller.stop();
        ui.set_status("Stopped");
        return;
    }
    match controller.start(config) {
        Ok(_) => ui.set_status("Starting"),
        Err(e) => ui.set_status(e.to_string()),
    }
}

fn render_header(frame: &mut Frame, area: Rect, session: &SessionState, ui: &UiState) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Dance Trainer ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let (phase, phase_style) = match session.phase {
        SessionPhase::Idle => ("■ IDLE", Style::default().fg(Color::Yellow)),
        SessionPhase::Countdown => (
            "◔ READY",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        SessionPhase::Active => (
            "▶ TRAINING",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
    };

    let mut spans = vec![
        Span::styled(phase, phase_style),
        Span::raw("  "),
        Span::styled(ui.style_name.clone(), Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!("  every {}s", ui.interval_seconds)),
    ];
    if let Some(title) = &ui.track_title {
        spans.push(Span::styled(
            format!("  ♪ {}", title),
            Style::default().fg(Color::Magenta),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), inner);
}

fn render_status_bar(frame: &mut Frame, area: Rect, ui: &UiState) {
    let text = match &ui.status_message {
        Some(message) => Span::styled(message.clone(), Style::default().fg(Color::Yellow)),
        None => Span::styled(
            " SPACE start/stop  s stop  ? help  q quit",
            Style::default().fg(Color::DarkGray),
        ),
    };
    frame.render_widget(Paragraph::new(text), area);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let width = 40.min(area.width);
    let height = 9.min(area.height);
    let popup = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    };

    let help = vec![
        Line::from("SPACE / Enter  start or stop"),
        Line::from("s              stop"),
        Line::from("? / h          toggle help"),
        Line::from("q / Esc        quit"),
        Line::from(""),
        Line::from("Moves are announced at a fixed interval."),
    ];

    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(help).block(Block::default().borders(Borders::ALL).title(" Help ")),
        popup,
    );
}
