// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Scoreboard display widget.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph, Widget},
};

use super::ScoreboardState;
use crate::battle::GamePhase;

/// Scoreboard widget for displaying battle progress
pub struct ScoreboardWidget<'a> {
    state: &'a ScoreboardState,
    block: Option<Block<'a>>,
}

impl<'a> ScoreboardWidget<'a> {
    pub fn new(state: &'a ScoreboardState) -> Self {
        Self { state, block: None }
    }

    /// Set the block wrapper
    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }
}

/// Indicator text and style for a phase
fn phase_indicator(phase: GamePhase) -> (&'static str, Style) {
    match phase {
        GamePhase::Waiting => ("● OPPONENT", Style::default().fg(Color::Yellow)),
        GamePhase::Selecting => (
            "◆ YOUR TURN",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
        GamePhase::Performing => ("▶ PERFORM", Style::default().fg(Color::Cyan)),
        GamePhase::Result => (
            "■ RESULT",
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
        ),
    }
}

impl Widget for ScoreboardWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let area = if let Some(block) = self.block {
            let inner = block.inner(area);
            block.render(area, buf);
            inner
        } else {
            area
        };

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(13), // Phase indicator
                Constraint::Length(2),  // Spacer
                Constraint::Length(10), // Turn
                Constraint::Length(2),  // Spacer
                Constraint::Length(18), // Beat meter
                Constraint::Length(2),  // Spacer
                Constraint::Length(10), // Tempo
                Constraint::Min(0),     // Scores
            ])
            .split(area);

        let (indicator, style) = phase_indicator(self.state.phase);
        Paragraph::new(indicator).style(style).render(chunks[0], buf);

        let turn = format!("Turn {}/{}", self.state.turn, self.state.turns_total);
        Paragraph::new(turn)
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .render(chunks[2], buf);

        BeatMeterWidget::new(
            self.state.cycle_position(),
            self.state.beats_per_cycle,
            self.state.player_slot(),
        )
        .render(chunks[4], buf);

        let tempo = format!("{:.1} BPM", self.state.bpm);
        Paragraph::new(tempo)
            .style(Style::default().fg(Color::Magenta))
            .render(chunks[6], buf);

        let scores = Line::from(vec![
            Span::styled("YOU ", Style::default().fg(Color::Green)),
            Span::styled(
                format!("{:4}", self.state.player_score),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled("OPP ", Style::default().fg(Color::Red)),
            Span::styled(
                format!("{:4}", self.state.opponent_score),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ),
        ]);
        Paragraph::new(scores).render(chunks[7], buf);
    }
}

/// One mark per beat of the cycle, current beat highlighted
pub struct BeatMeterWidget {
    position: u32,
    cycle: u32,
    player_slot: u32,
}

impl BeatMeterWidget {
    /// `position` is 1-based within the cycle; 0 before the first beat
    pub fn new(position: u32, cycle: u32, player_slot: u32) -> Self {
        Self {
            position,
            cycle,
            player_slot,
        }
    }

    fn mark(&self, slot: u32) -> &'static str {
        if slot == 1 {
            "O"
        } else if slot == self.player_slot {
            "Y"
        } else {
            "·"
        }
    }
}

impl Widget for BeatMeterWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let spans: Vec<Span> = (1..=self.cycle)
            .map(|slot| {
                let style = if slot == self.position {
                    Style::default().fg(Color::Black).bg(Color::White).add_modifier(Modifier::BOLD)
                } else if slot == 1 {
                    Style::default().fg(Color::Red)
                } else if slot == self.player_slot {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                Span::styled(format!("{} ", self.mark(slot)), style)
            })
            .collect();
        Paragraph::new(Line::from(spans)).render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BattleConfig;

    fn buffer_text(buf: &Buffer) -> String {
        buf.content.iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn test_scoreboard_renders_scores() {
        let mut state = ScoreboardState::from_config(&BattleConfig::default());
        state.turn = 2;
        state.player_score = 120;
        state.opponent_score = 70;
        state.phase = GamePhase::Selecting;

        let area = Rect::new(0, 0, 100, 1);
        let mut buf = Buffer::empty(area);
        ScoreboardWidget::new(&state).render(area, &mut buf);

        let text = buffer_text(&buf);
        assert!(text.contains("YOUR TURN"));
        assert!(text.contains("Turn 2/4"));
        assert!(text.contains("90.0 BPM"));
        assert!(text.contains("120"));
        assert!(text.contains("70"));
    }

    #[test]
    fn test_beat_meter_marks() {
        let area = Rect::new(0, 0, 16, 1);
        let mut buf = Buffer::empty(area);
        BeatMeterWidget::new(3, 8, 5).render(area, &mut buf);

        let text = buffer_text(&buf);
        assert!(text.starts_with("O · · · Y"));
    }
}
