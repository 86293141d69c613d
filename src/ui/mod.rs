// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Terminal UI for rap battles.
//!
//! Provides a ratatui-based terminal interface with a lyric selection
//! screen, the battle view (scoreboard, opponent line, perform buttons and
//! a battle feed) and a result screen.

mod scoreboard;

pub use scoreboard::{BeatMeterWidget, ScoreboardWidget};

use std::io::{self, Stdout};
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame, Terminal,
};

use crate::battle::{BattleEvent, BattleOutcome, GamePhase, GameState, PlayerTurnReport, Verdict};
use crate::config::BattleConfig;
use crate::lyrics::{LyricEntry, LyricSelection, SelectionChange, PLAYER_POOL_SIZE};

/// Which screen is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Select,
    Battle,
    Result(BattleOutcome),
}

/// Battle progress shown in the scoreboard
#[derive(Debug, Clone)]
pub struct ScoreboardState {
    pub phase: GamePhase,
    pub turn: u32,
    pub turns_total: u32,
    /// Beats since the battle started
    pub beat: u64,
    pub beats_per_cycle: u32,
    pub player_turn_offset: u32,
    pub bpm: f64,
    pub player_score: u32,
    pub opponent_score: u32,
}

impl ScoreboardState {
    pub fn from_config(config: &BattleConfig) -> Self {
        Self {
            phase: GamePhase::Waiting,
            turn: 1,
            turns_total: config.turns_per_battle,
            beat: 0,
            beats_per_cycle: config.beats_per_cycle,
            player_turn_offset: config.player_turn_offset_beats,
            bpm: config.bpm,
            player_score: 0,
            opponent_score: 0,
        }
    }

    /// Update from the controller's state
    pub fn update_from_state(&mut self, state: &GameState) {
        self.phase = state.phase();
        self.turn = state.current_turn();
        self.beat = state.beat_count();
        self.player_score = state.player_score();
        self.opponent_score = state.opponent_score();
    }

    /// 1-based position of the current beat within its cycle, 0 before the first beat
    pub fn cycle_position(&self) -> u32 {
        if self.beat == 0 || self.beats_per_cycle == 0 {
            return 0;
        }
        ((self.beat - 1) % u64::from(self.beats_per_cycle)) as u32 + 1
    }

    /// Cycle position on which the player's window opens
    pub fn player_slot(&self) -> u32 {
        self.player_turn_offset + 1
    }
}

/// Who a feed line is about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedKind {
    Opponent,
    Player,
    System,
}

/// A line in the battle feed
#[derive(Debug, Clone)]
pub struct FeedEntry {
    pub kind: FeedKind,
    pub text: String,
}

/// UI state
#[derive(Debug, Clone)]
pub struct UiState {
    pub screen: Screen,
    /// Full catalog, shown on the selection screen
    pub catalog: Vec<LyricEntry>,
    /// Selection screen cursor
    pub cursor: usize,
    pub selection: LyricSelection,
    /// The player's lyrics during a battle
    pub pool: Vec<LyricEntry>,
    pub scoreboard: ScoreboardState,
    /// Opponent's most recent lyric
    pub opponent_lyric: Option<LyricEntry>,
    /// Result of the player's latest move
    pub last_report: Option<PlayerTurnReport>,
    pub feed: Vec<FeedEntry>,
    /// Maximum feed lines to keep
    pub max_feed: usize,
    /// Help text visible
    pub show_help: bool,
    /// Status message
    pub status_message: Option<String>,
    /// Status message timestamp
    pub status_time: Option<Instant>,
}

impl UiState {
    pub fn new(catalog: Vec<LyricEntry>, config: &BattleConfig) -> Self {
        Self {
            screen: Screen::Select,
            catalog,
            cursor: 0,
            selection: LyricSelection::new(),
            pool: Vec::new(),
            scoreboard: ScoreboardState::from_config(config),
            opponent_lyric: None,
            last_report: None,
            feed: Vec::new(),
            max_feed: 8,
            show_help: false,
            status_message: None,
            status_time: None,
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
            if time.elapsed() > Duration::from_secs(3) {
                self.status_message = None;
                self.status_time = None;
            }
        }
    }

    /// Move the selection cursor, wrapping around the catalog
    pub fn move_cursor(&mut self, down: bool) {
        let len = self.catalog.len();
        if len == 0 {
            return;
        }
        self.cursor = if down {
            (self.cursor + 1) % len
        } else {
            (self.cursor + len - 1) % len
        };
    }

    /// Toggle the lyric under the cursor
    pub fn toggle_current(&mut self) {
        let Some(id) = self.catalog.get(self.cursor).map(|l| l.id.clone()) else {
            return;
        };
        match self.selection.toggle(&id) {
            SelectionChange::Added | SelectionChange::Removed => self.status_message = None,
            SelectionChange::Full => {
                self.set_status(format!("Only {} lyrics can be selected", PLAYER_POOL_SIZE))
            }
        }
    }

    /// Switch to the battle screen with a fresh scoreboard
    pub fn begin_battle(&mut self, pool: Vec<LyricEntry>, config: &BattleConfig) {
        self.screen = Screen::Battle;
        self.pool = pool;
        self.scoreboard = ScoreboardState::from_config(config);
        self.opponent_lyric = None;
        self.last_report = None;
        self.feed.clear();
        self.push_feed(FeedKind::System, "Battle start! Listen for the beat...");
    }

    /// Back to the selection screen, keeping the previous picks
    pub fn back_to_select(&mut self) {
        self.screen = Screen::Select;
        self.pool.clear();
    }

    pub fn push_feed(&mut self, kind: FeedKind, text: impl Into<String>) {
        self.feed.push(FeedEntry {
            kind,
            text: text.into(),
        });
        if self.feed.len() > self.max_feed {
            self.feed.remove(0);
        }
    }

    /// Reflect a battle event
    pub fn apply_event(&mut self, event: &BattleEvent) {
        match event {
            BattleEvent::BeatTicked { beat } => self.scoreboard.beat = *beat,
            BattleEvent::OpponentActed {
                turn, lyric, score, ..
            } => {
                self.push_feed(
                    FeedKind::Opponent,
                    format!("T{} OPP [{}] {} +{}", turn, lyric.kind, lyric.label(), score),
                );
                self.opponent_lyric = Some(lyric.clone());
                self.last_report = None;
            }
            BattleEvent::PlayerTurnOpened { .. } => {
                self.scoreboard.phase = GamePhase::Selecting;
                self.set_status("Your turn! Perform on the beat");
            }
            BattleEvent::PlayerTurnResolved(report) => {
                let played = report.lyric_id.as_deref().unwrap_or("-");
                self.push_feed(
                    FeedKind::Player,
                    format!(
                        "T{} YOU {} {} +{}",
                        report.turn, played, report.timing.accuracy, report.total_score
                    ),
                );
                self.last_report = Some(report.clone());
            }
            BattleEvent::TurnAdvanced { turn } => self.scoreboard.turn = *turn,
            BattleEvent::ScoreChanged { player, opponent } => {
                self.scoreboard.player_score = *player;
                self.scoreboard.opponent_score = *opponent;
            }
            BattleEvent::BattleEnded(outcome) => {
                self.scoreboard.phase = GamePhase::Result;
                self.screen = Screen::Result(*outcome);
            }
        }
    }
}

/// Key event result
#[derive(Debug, Clone, PartialEq)]
pub enum KeyAction {
    /// No action needed
    None,
    /// Quit the application
    Quit,
    /// Move the selection cursor
    CursorUp,
    CursorDown,
    /// Toggle the lyric under the cursor
    ToggleLyric,
    /// Start a battle with the current selection
    StartBattle,
    /// Perform the n-th lyric of the pool
    Perform(usize),
    /// Leave the current battle
    Abandon,
    /// Result screen: back to selection
    NewBattle,
    /// Toggle help
    ToggleHelp,
}

/// Map a key press to an action for `screen`
pub fn map_key(screen: Screen, code: KeyCode, modifiers: KeyModifiers) -> KeyAction {
    match (code, modifiers) {
        (KeyCode::Char('q'), KeyModifiers::NONE)
        | (KeyCode::Char('c'), KeyModifiers::CONTROL) => return KeyAction::Quit,
        (KeyCode::Char('?'), _) => return KeyAction::ToggleHelp,
        _ => {}
    }

    match screen {
        Screen::Select => match code {
            KeyCode::Up | KeyCode::Char('k') => KeyAction::CursorUp,
            KeyCode::Down | KeyCode::Char('j') => KeyAction::CursorDown,
            KeyCode::Char(' ') => KeyAction::ToggleLyric,
            KeyCode::Enter => KeyAction::StartBattle,
            KeyCode::Char('h') => KeyAction::ToggleHelp,
            _ => KeyAction::None,
        },
        Screen::Battle => match code {
            KeyCode::Char(c @ '1'..='9') => {
                let index = (c as usize) - ('1' as usize);
                if index < PLAYER_POOL_SIZE {
                    KeyAction::Perform(index)
                } else {
                    KeyAction::None
                }
            }
            KeyCode::Esc => KeyAction::Abandon,
            _ => KeyAction::None,
        },
        Screen::Result(_) => match code {
            KeyCode::Enter => KeyAction::NewBattle,
            _ => KeyAction::None,
        },
    }
}

/// Terminal UI application
pub struct App {
    state: UiState,
    /// Terminal handle
    terminal: Terminal<CrosstermBackend<Stdout>>,
    /// Target frame rate
    frame_rate: u32,
    /// Whether to continue running
    running: bool,
}

impl App {
    /// Take over the terminal
    pub fn new(state: UiState) -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Self {
            state,
            terminal,
            frame_rate: 60,
            running: true,
        })
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut UiState {
        &mut self.state
    }

    /// Check if running
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Stop the app
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Handle a key event. UI-only actions are applied here; the rest are
    /// returned for the caller.
    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> KeyAction {
        let action = map_key(self.state.screen, code, modifiers);
        match action {
            KeyAction::Quit => self.quit(),
            KeyAction::ToggleHelp => self.state.show_help = !self.state.show_help,
            KeyAction::CursorUp => self.state.move_cursor(false),
            KeyAction::CursorDown => self.state.move_cursor(true),
            KeyAction::ToggleLyric => self.state.toggle_current(),
            _ => {}
        }
        action
    }

    /// Poll for events, waiting at most one frame or `max_wait`
    pub fn poll_event(&self, max_wait: Option<Duration>) -> io::Result<Option<Event>> {
        let frame = Duration::from_millis(1000 / self.frame_rate as u64);
        let timeout = max_wait.map_or(frame, |wait| wait.min(frame));
        if event::poll(timeout)? {
            Ok(Some(event::read()?))
        } else {
            Ok(None)
        }
    }

    /// Draw the UI
    pub fn draw(&mut self) -> io::Result<()> {
        self.state.clear_expired_status();
        let state = &self.state;

        self.terminal.draw(|frame| {
            let area = frame.area();

            match state.screen {
                Screen::Select => render_select(frame, area, state),
                Screen::Battle => render_battle(frame, area, state),
                Screen::Result(outcome) => render_result(frame, area, &outcome),
            }

            if state.show_help {
                render_help_overlay(frame, area);
            }
        })?;

        Ok(())
    }

    /// Cleanup terminal on drop
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

fn kind_color(entry: &LyricEntry) -> Color {
    use crate::lyrics::LyricType;

    match entry.kind {
        LyricType::Attack => Color::Red,
        LyricType::Technical => Color::Blue,
        LyricType::Counter => Color::Green,
        LyricType::Closing => Color::Magenta,
    }
}

/// Render the lyric selection screen
fn render_select(frame: &mut Frame, area: Rect, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(6),    // Catalog
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    let title = Paragraph::new(Line::from(vec![
        Span::styled(
            " Choose your lyrics ",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            " {}/{} selected",
            state.selection.len(),
            PLAYER_POOL_SIZE
        )),
    ]))
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(title, chunks[0]);

    let block = Block::default().borders(Borders::ALL).title(" Catalog ");
    let inner = block.inner(chunks[1]);
    frame.render_widget(block, chunks[1]);

    let lines: Vec<Line> = state
        .catalog
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let marker = if state.selection.is_selected(&entry.id) { "[x]" } else { "[ ]" };
            let cursor = if i == state.cursor { ">" } else { " " };
            let row_style = if i == state.cursor {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::styled(format!("{} {} ", cursor, marker), row_style),
                Span::styled(format!("{:<3}", entry.id), Style::default().fg(Color::Cyan)),
                Span::styled(
                    format!("{:<10}", entry.kind.name()),
                    Style::default().fg(kind_color(entry)),
                ),
                Span::styled(format!("R{:<3}", entry.rhyme_score), Style::default().fg(Color::Yellow)),
                Span::raw(entry.one_line()),
            ])
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);

    render_status_bar(
        frame,
        chunks[2],
        state,
        " Up/Down: Move | Space: Select | Enter: Battle | ?: Help | q: Quit",
    );
}

/// Render the battle screen
fn render_battle(frame: &mut Frame, area: Rect, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Scoreboard
            Constraint::Length(5), // Opponent line
            Constraint::Length(6), // Perform buttons
            Constraint::Min(4),    // Feed
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    frame.render_widget(
        ScoreboardWidget::new(&state.scoreboard)
            .block(Block::default().borders(Borders::ALL).title(" Battle ")),
        chunks[0],
    );

    render_opponent(frame, chunks[1], state);
    render_pool(frame, chunks[2], state);
    render_feed(frame, chunks[3], &state.feed);

    render_status_bar(
        frame,
        chunks[4],
        state,
        " 1-4: Perform on the beat | Esc: Leave battle | ?: Help | q: Quit",
    );
}

fn render_opponent(frame: &mut Frame, area: Rect, state: &UiState) {
    let block = Block::default().borders(Borders::ALL).title(" Opponent ");
    let text = match &state.opponent_lyric {
        Some(lyric) => lyric
            .text
            .lines()
            .map(|line| Line::from(Span::styled(line.to_string(), Style::default().fg(Color::Red))))
            .collect::<Vec<_>>(),
        None => vec![Line::from(Span::styled(
            "...",
            Style::default().fg(Color::DarkGray),
        ))],
    };
    frame.render_widget(
        Paragraph::new(text).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

fn render_pool(frame: &mut Frame, area: Rect, state: &UiState) {
    let selecting = state.scoreboard.phase == GamePhase::Selecting;
    let title = match &state.last_report {
        Some(report) => format!(
            " Your lyrics | {} +{} (timing {} / choice {} / rhyme {}) ",
            report.timing.accuracy,
            report.total_score,
            report.timing.score,
            report.choice_score,
            report.rhyme_score
        ),
        None => " Your lyrics ".to_string(),
    };
    let border_style = if selecting {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(title);

    let counters_opponent = |entry: &LyricEntry| {
        state
            .opponent_lyric
            .as_ref()
            .is_some_and(|opponent| entry.counters(opponent.kind))
    };

    let lines: Vec<Line> = state
        .pool
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let key_style = if selecting {
                Style::default().fg(Color::Black).bg(Color::Green)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            let mut spans = vec![
                Span::styled(format!(" {} ", i + 1), key_style),
                Span::raw(" "),
                Span::styled(
                    format!("{:<12}", entry.label()),
                    Style::default().fg(kind_color(entry)).add_modifier(Modifier::BOLD),
                ),
                Span::raw(entry.one_line()),
            ];
            if counters_opponent(entry) {
                spans.push(Span::styled(" ★", Style::default().fg(Color::Yellow)));
            }
            Line::from(spans)
        })
        .collect();
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_feed(frame: &mut Frame, area: Rect, feed: &[FeedEntry]) {
    let block = Block::default().borders(Borders::ALL).title(" Feed ");
    let lines: Vec<Line> = feed
        .iter()
        .map(|entry| {
            let color = match entry.kind {
                FeedKind::Opponent => Color::Red,
                FeedKind::Player => Color::Green,
                FeedKind::System => Color::Gray,
            };
            Line::from(Span::styled(entry.text.as_str(), Style::default().fg(color)))
        })
        .collect();
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Render the result screen
fn render_result(frame: &mut Frame, area: Rect, outcome: &BattleOutcome) {
    let color = match outcome.verdict {
        Verdict::Win => Color::Yellow,
        Verdict::Lose => Color::Red,
        Verdict::Draw => Color::White,
    };

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            outcome.verdict.banner(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(format!("You       {:>5}", outcome.player_score)),
        Line::from(format!("Opponent  {:>5}", outcome.opponent_score)),
        Line::from(""),
        Line::from(Span::styled(
            "Enter: New battle | q: Quit",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let block = Block::default().borders(Borders::ALL).title(" Result ");
    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .alignment(ratatui::layout::Alignment::Center),
        area,
    );
}

/// Render status bar
fn render_status_bar(frame: &mut Frame, area: Rect, state: &UiState, hint: &'static str) {
    let text = if let Some(ref msg) = state.status_message {
        Span::styled(msg.as_str(), Style::default().fg(Color::Yellow))
    } else {
        Span::styled(hint, Style::default().fg(Color::DarkGray))
    };

    frame.render_widget(Paragraph::new(text), area);
}

/// Render help overlay
fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let width = 52.min(area.width.saturating_sub(4));
    let height = 17.min(area.height.saturating_sub(4));
    let x = (area.width - width) / 2;
    let y = (area.height - height) / 2;
    let help_area = Rect::new(x, y, width, height);

    frame.render_widget(
        Block::default().style(Style::default().bg(Color::Black)),
        help_area,
    );

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Help ")
        .style(Style::default().bg(Color::Black));

    let inner = block.inner(help_area);
    frame.render_widget(block, help_area);

    let help_text = vec![
        Line::from(Span::styled("Selection", Style::default().add_modifier(Modifier::BOLD))),
        Line::from("  Up/Down     Move cursor"),
        Line::from("  Space       Select / deselect (4 lyrics)"),
        Line::from("  Enter       Start the battle"),
        Line::from(""),
        Line::from(Span::styled("Battle", Style::default().add_modifier(Modifier::BOLD))),
        Line::from("  1-4         Perform a lyric on the beat"),
        Line::from("  Esc         Leave the battle"),
        Line::from("  ★           Counters the opponent (+50)"),
        Line::from(""),
        Line::from(Span::styled("Other", Style::default().add_modifier(Modifier::BOLD))),
        Line::from("  ?           Toggle help"),
        Line::from("  q/Ctrl+c    Quit"),
    ];

    frame.render_widget(Paragraph::new(help_text), inner);
}
