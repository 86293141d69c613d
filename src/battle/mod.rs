// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Battle turn engine.
//!
//! This module provides the core of a beat-synchronized rap battle:
//! - Turn state machine driven by beat ticks and player input
//! - Scoring of timing, tactical choice and rhyme quality
//! - Scripted opponent decisions
//! - A controller that owns the game state and emits events

pub mod autoplay;
pub mod controller;
pub mod deferred;
pub mod driver;
pub mod opponent;
pub mod scoring;
pub mod turn;

pub use autoplay::AutoPlayer;
pub use controller::BattleController;
pub use deferred::{Deferred, DeferredKind, DeferredQueue};
pub use driver::{run_simulation, TokioClock};
pub use opponent::{OpponentDecisionProcess, OpponentMove, OpponentTier, OpponentTiming};
pub use scoring::{ScoreBreakdown, ScoringEngine, COUNTER_BONUS};
pub use turn::{CycleSlot, PhaseInput, TurnAfterPlayer, TurnStateMachine};

use std::fmt;
use std::sync::mpsc::Sender;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::lyrics::{LyricEntry, PlayerLyricPool};
use crate::timing::TimingResult;

/// Phase of a battle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GamePhase {
    /// Opponent's move or idle
    #[default]
    Waiting,
    /// Player input window open
    Selecting,
    /// Input received, feedback showing
    Performing,
    /// Battle concluded
    Result,
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GamePhase::Waiting => "waiting",
            GamePhase::Selecting => "selecting",
            GamePhase::Performing => "performing",
            GamePhase::Result => "result",
        };
        f.write_str(name)
    }
}

/// Authoritative state of one battle.
///
/// Only the `BattleController` mutates it; everyone else gets `&GameState`.
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    pub(crate) current_turn: u32,
    pub(crate) player_score: u32,
    pub(crate) opponent_score: u32,
    pub(crate) beat_count: u64,
    pub(crate) phase: GamePhase,
    pub(crate) opponent_lyric: Option<LyricEntry>,
    pub(crate) player_pool: PlayerLyricPool,
    pub(crate) expected_beat_time: Option<Duration>,
    pub(crate) opponent_turns_taken: u32,
    pub(crate) player_turns_taken: u32,
}

impl GameState {
    pub(crate) fn new(player_pool: PlayerLyricPool) -> Self {
        Self {
            current_turn: 1,
            player_score: 0,
            opponent_score: 0,
            beat_count: 0,
            phase: GamePhase::Waiting,
            opponent_lyric: None,
            player_pool,
            expected_beat_time: None,
            opponent_turns_taken: 0,
            player_turns_taken: 0,
        }
    }

    /// Current turn, starting at 1
    pub fn current_turn(&self) -> u32 {
        self.current_turn
    }

    pub fn player_score(&self) -> u32 {
        self.player_score
    }

    pub fn opponent_score(&self) -> u32 {
        self.opponent_score
    }

    /// Beats elapsed since the battle started
    pub fn beat_count(&self) -> u64 {
        self.beat_count
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Lyric the opponent played most recently
    pub fn opponent_lyric(&self) -> Option<&LyricEntry> {
        self.opponent_lyric.as_ref()
    }

    pub fn player_pool(&self) -> &PlayerLyricPool {
        &self.player_pool
    }

    /// Beat the player is expected to hit while selecting
    pub fn expected_beat_time(&self) -> Option<Duration> {
        self.expected_beat_time
    }

    pub fn opponent_turns_taken(&self) -> u32 {
        self.opponent_turns_taken
    }

    pub fn player_turns_taken(&self) -> u32 {
        self.player_turns_taken
    }
}

/// Scored outcome of one player turn
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerTurnReport {
    /// Turn this move belongs to
    pub turn: u32,
    /// Played lyric; `None` when the window closed without input
    pub lyric_id: Option<String>,
    pub timing: TimingResult,
    pub choice_score: u32,
    pub rhyme_score: u32,
    pub total_score: u32,
    /// Distance to the expected beat, if the player submitted
    pub error_ms: Option<f64>,
}

/// Win/lose/draw from the player's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Win,
    Lose,
    Draw,
}

impl Verdict {
    pub fn from_scores(player: u32, opponent: u32) -> Self {
        match player.cmp(&opponent) {
            std::cmp::Ordering::Greater => Verdict::Win,
            std::cmp::Ordering::Less => Verdict::Lose,
            std::cmp::Ordering::Equal => Verdict::Draw,
        }
    }

    pub fn banner(self) -> &'static str {
        match self {
            Verdict::Win => "YOU WIN!",
            Verdict::Lose => "YOU LOSE...",
            Verdict::Draw => "DRAW",
        }
    }
}

/// Frozen final scores of a battle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleOutcome {
    pub player_score: u32,
    pub opponent_score: u32,
    pub verdict: Verdict,
}

impl BattleOutcome {
    pub fn new(player_score: u32, opponent_score: u32) -> Self {
        Self {
            player_score,
            opponent_score,
            verdict: Verdict::from_scores(player_score, opponent_score),
        }
    }
}

/// Events emitted by the controller for the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub enum BattleEvent {
    /// A beat elapsed
    BeatTicked { beat: u64 },
    /// The opponent played a lyric
    OpponentActed {
        turn: u32,
        lyric: LyricEntry,
        timing: OpponentTiming,
        score: u32,
    },
    /// The player's input window opened
    PlayerTurnOpened { turn: u32, expected_at: Duration },
    /// The player's move was scored
    PlayerTurnResolved(PlayerTurnReport),
    /// The turn counter moved on
    TurnAdvanced { turn: u32 },
    /// Either score changed
    ScoreChanged { player: u32, opponent: u32 },
    /// The battle is over; fired once
    BattleEnded(BattleOutcome),
}

/// Receiver of battle events
pub trait BattleObserver {
    fn notify(&mut self, event: &BattleEvent);
}

impl<F> BattleObserver for F
where
    F: FnMut(&BattleEvent),
{
    fn notify(&mut self, event: &BattleEvent) {
        self(event)
    }
}

impl BattleObserver for Sender<BattleEvent> {
    fn notify(&mut self, event: &BattleEvent) {
        // A dropped receiver just means nobody is listening anymore
        let _ = self.send(event.clone());
    }
}

/// Why a player submission was ignored. No state changed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("submissions are only accepted while selecting (phase is {phase})")]
    NotSelecting { phase: GamePhase },

    #[error("lyric '{0}' is not in the player's pool")]
    UnknownLyric(String),

    #[error("battle was abandoned")]
    Abandoned,
}
