// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Trainer display widget.

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph, Widget, Wrap},
};

use crate::session::{SessionPhase, SessionState};

/// Shows the countdown or the move to perform
pub struct TrainerWidget<'a> {
    state: &'a SessionState,
    block: Option<Block<'a>>,
}

impl<'a> TrainerWidget<'a> {
    pub fn new(state: &'a SessionState) -> Self {
        Self { state, block: None }
    }

    /// Set the block wrapper
    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    fn lines(&self) -> Vec<Line<'a>> {
        match self.state.phase {
            SessionPhase::Idle => vec![Line::from(Span::styled(
                "Press SPACE to start training",
                Style::default().fg(Color::DarkGray),
            ))],
            SessionPhase::Countdown => {
                let value = self
                    .state
                    .countdown
                    .map(|v| v.to_string())
                    .unwrap_or_default();
                vec![
                    Line::from(Span::styled(
                        "Get ready",
                        Style::default().fg(Color::Yellow),
                    )),
                    Line::from(""),
                    Line::from(Span::styled(
                        value,
                        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                    )),
                ]
            }
            SessionPhase::Active => match &self.state.current_move {
                Some(current) => {
                    let mut lines = vec![
                        Line::from(Span::styled(
                            current.name.clone(),
                            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                        )),
                        Line::from(Span::styled(
                            current.level.to_string(),
                            Style::default().fg(Color::Cyan),
                        )),
                    ];
                    if let Some(description) = &current.description {
                        lines.push(Line::from(""));
                        lines.push(Line::from(description.clone()));
                    }
                    lines
                }
                None => vec![Line::from(Span::styled(
                    "Waiting for first move",
                    Style::default().fg(Color::DarkGray),
                ))],
            },
        }
    }
}

impl Widget for TrainerWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let lines = self.lines();
        let area = if let Some(block) = self.block {
            let inner = block.inner(area);
            block.render(area, buf);
            inner
        } else {
            area
        };

        // vertically centred
        let top = area.height.saturating_sub(lines.len() as u16) / 2;
        let body = Rect {
            y: area.y + top,
            height: area.height - top,
            ..area
        };

        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(body, buf);
    }
}
