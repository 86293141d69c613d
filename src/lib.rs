// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Beat-synchronized rap battle engine.
//!
//! A player and a scripted opponent trade lyrics over a fixed tempo. Each
//! player move is scored on timing against the beat, on whether it counters
//! the opponent's last lyric, and on its rhyme quality.

pub mod battle;
pub mod config;
pub mod error;
pub mod lyrics;
pub mod timing;
pub mod ui;

pub use battle::{BattleController, BattleEvent, BattleOutcome, GamePhase, GameState, Verdict};
pub use config::{BattleConfig, ConfigError, MissedWindowPolicy};
pub use error::BattleError;
pub use lyrics::{LyricCatalog, LyricEntry, LyricType, PlayerLyricPool};
