// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Turn rules.
//!
//! Beats are grouped into fixed cycles. Within each cycle the opponent acts
//! on one beat and the player's input window opens on another:
//!
//! ```text
//! beat % cycle:  1    2    3    4    5    6    7    0
//!                OPP                 YOU
//! ```
//!
//! The player is judged against the beat that opens the window, or
//! `cue_offset_beats` later when configured.
//!
//! `TurnStateMachine` classifies beats and answers the questions the
//! controller asks before mutating state. It holds no state of its own.

use std::time::Duration;

use super::{GamePhase, GameState, Rejection};
use crate::config::{BattleConfig, MissedWindowPolicy};

/// Role of a beat within the cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleSlot {
    OpponentTurn,
    PlayerTurn,
    Rest,
}

/// Inputs that drive phase transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseInput {
    OpponentBeat,
    PlayerBeat,
    Submit,
    MissedWindow,
    EndBattle,
}

/// What follows a resolved player turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnAfterPlayer {
    Advance { next_turn: u32 },
    EndBattle,
}

/// Phase after `input` arrives in `phase`, or `None` if the input is ignored.
///
/// `Result` is terminal.
pub fn next_phase(phase: GamePhase, input: PhaseInput) -> Option<GamePhase> {
    use GamePhase::*;

    match (phase, input) {
        (Result, _) => None,
        (_, PhaseInput::EndBattle) => Some(Result),
        (_, PhaseInput::OpponentBeat) => Some(Waiting),
        (Waiting, PhaseInput::PlayerBeat) => Some(Selecting),
        (Selecting, PhaseInput::Submit) => Some(Performing),
        (Selecting, PhaseInput::MissedWindow) => Some(Waiting),
        _ => None,
    }
}

/// Beat classification and turn bookkeeping rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnStateMachine {
    beats_per_cycle: u32,
    player_turn_offset: u32,
    cue_offset: u32,
    turns_per_battle: u32,
    policy: MissedWindowPolicy,
}

impl TurnStateMachine {
    /// Rules for a validated configuration
    pub fn from_config(config: &BattleConfig) -> Self {
        Self {
            beats_per_cycle: config.beats_per_cycle,
            player_turn_offset: config.player_turn_offset_beats,
            cue_offset: config.cue_offset_beats,
            turns_per_battle: config.turns_per_battle,
            policy: config.missed_window_policy,
        }
    }

    pub fn turns_per_battle(&self) -> u32 {
        self.turns_per_battle
    }

    /// Role of beat `beat` (1-based) in its cycle
    pub fn slot(&self, beat: u64) -> CycleSlot {
        let cycle = u64::from(self.beats_per_cycle);
        let position = beat % cycle;
        let opponent = 1 % cycle;
        let player = (1 + u64::from(self.player_turn_offset)) % cycle;

        if position == opponent {
            CycleSlot::OpponentTurn
        } else if position == player {
            CycleSlot::PlayerTurn
        } else {
            CycleSlot::Rest
        }
    }

    /// Beat the player should hit when the window opens on `opened_at`
    pub fn cue_time(&self, opened_at: Duration, interval: Duration) -> Duration {
        opened_at + interval * self.cue_offset
    }

    /// The opponent moves once per turn
    pub fn opponent_may_act(&self, state: &GameState) -> bool {
        state.phase != GamePhase::Result && state.opponent_turns_taken < state.current_turn
    }

    /// The window opens only after this turn's opponent move and before the player's
    pub fn player_window_may_open(&self, state: &GameState) -> bool {
        state.phase == GamePhase::Waiting
            && state.opponent_turns_taken == state.current_turn
            && state.player_turns_taken < state.current_turn
    }

    /// Policy to apply if the selecting window is still open at the next opponent beat
    pub fn missed_window(&self, state: &GameState) -> Option<MissedWindowPolicy> {
        (state.phase == GamePhase::Selecting).then_some(self.policy)
    }

    /// Gate for player submissions
    pub fn check_submit(&self, state: &GameState) -> Result<(), Rejection> {
        match next_phase(state.phase, PhaseInput::Submit) {
            Some(_) => Ok(()),
            None => Err(Rejection::NotSelecting { phase: state.phase }),
        }
    }

    /// Next step once the current turn's player move is resolved
    pub fn after_player_turn(&self, state: &GameState) -> TurnAfterPlayer {
        if state.current_turn < self.turns_per_battle {
            TurnAfterPlayer::Advance {
                next_turn: state.current_turn + 1,
            }
        } else {
            TurnAfterPlayer::EndBattle
        }
    }
}
