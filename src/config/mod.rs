// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Configuration system for battles.
//!
//! A battle is configured once, before it starts. Configuration files may be
//! YAML or TOML; every field has a default so partial files are fine.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::timing::{beat_interval, TimingWindows, DEFAULT_BPM};

/// Invalid battle configuration. Fatal to battle start.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("tempo must be a positive number of BPM, got {0}")]
    InvalidBpm(f64),

    #[error("timing windows must be strictly increasing (perfect {perfect}, great {great}, good {good})")]
    TimingWindows { perfect: f64, great: f64, good: f64 },

    #[error("a battle needs at least one turn")]
    NoTurns,

    #[error("beat cycle must be at least 2 beats, got {0}")]
    CycleTooShort(u32),

    #[error("player turn offset {offset} must fall inside the {cycle}-beat cycle")]
    PlayerTurnOffset { offset: u32, cycle: u32 },

    #[error("cue beat {cue} after the player turn (offset {offset}) overruns the {cycle}-beat cycle")]
    CueOffset { cue: u32, offset: u32, cycle: u32 },
}

/// What happens when the player lets a selecting window close
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissedWindowPolicy {
    /// Resolve the turn as a zero-score miss and move on
    #[default]
    AutoMiss,
    /// Fall back to waiting and re-open the window next cycle
    Hold,
}

/// Battle configuration, fixed at battle start
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BattleConfig {
    /// Tempo in BPM
    #[serde(default = "default_bpm")]
    pub bpm: f64,
    /// Upper bound of the perfect band (ms)
    #[serde(default = "default_perfect_window")]
    pub perfect_window_ms: f64,
    /// Upper bound of the great band (ms)
    #[serde(default = "default_great_window")]
    pub great_window_ms: f64,
    /// Upper bound of the good band (ms)
    #[serde(default = "default_good_window")]
    pub good_window_ms: f64,
    /// Number of turns (one opponent and one player move each)
    #[serde(default = "default_turns")]
    pub turns_per_battle: u32,
    /// Beats in one turn cycle
    #[serde(default = "default_beats_per_cycle")]
    pub beats_per_cycle: u32,
    /// Beats between the opponent beat and the player beat
    #[serde(default = "default_player_offset")]
    pub player_turn_offset_beats: u32,
    /// Beats between opening the player window and the beat to hit; 0 hits
    /// the opening beat itself
    #[serde(default = "default_cue_offset")]
    pub cue_offset_beats: u32,
    /// Delay before the turn counter advances (ms)
    #[serde(default = "default_turn_advance_delay")]
    pub turn_advance_delay_ms: u64,
    /// Delay before the battle end is announced (ms)
    #[serde(default = "default_result_delay")]
    pub result_delay_ms: u64,
    /// Behaviour when the selecting window closes without a submission
    #[serde(default)]
    pub missed_window_policy: MissedWindowPolicy,
    /// Seed for the opponent; entropy when absent
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

fn default_bpm() -> f64 {
    DEFAULT_BPM
}
fn default_perfect_window() -> f64 {
    50.0
}
fn default_great_window() -> f64 {
    120.0
}
fn default_good_window() -> f64 {
    200.0
}
fn default_turns() -> u32 {
    4
}
fn default_beats_per_cycle() -> u32 {
    8
}
fn default_player_offset() -> u32 {
    4
}
fn default_cue_offset() -> u32 {
    0
}
fn default_turn_advance_delay() -> u64 {
    1000
}
fn default_result_delay() -> u64 {
    1500
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            bpm: default_bpm(),
            perfect_window_ms: default_perfect_window(),
            great_window_ms: default_great_window(),
            good_window_ms: default_good_window(),
            turns_per_battle: default_turns(),
            beats_per_cycle: default_beats_per_cycle(),
            player_turn_offset_beats: default_player_offset(),
            cue_offset_beats: default_cue_offset(),
            turn_advance_delay_ms: default_turn_advance_delay(),
            result_delay_ms: default_result_delay(),
            missed_window_policy: MissedWindowPolicy::default(),
            rng_seed: None,
        }
    }
}

impl BattleConfig {
    /// Load a configuration file, choosing the parser by extension
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let is_toml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);

        if is_toml {
            Self::from_toml(&contents)
        } else {
            Self::from_yaml(&contents)
        }
    }

    /// Parse a configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse YAML configuration")
    }

    /// Parse a configuration from TOML string
    pub fn from_toml(source: &str) -> Result<Self> {
        toml::from_str(source).context("Failed to parse TOML configuration")
    }

    /// Serialize to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize configuration to YAML")
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = self.to_yaml()?;
        fs::write(path.as_ref(), yaml)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))
    }

    /// Check every constraint a battle relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        beat_interval(self.bpm)?;
        self.timing_windows()?;

        if self.turns_per_battle == 0 {
            return Err(ConfigError::NoTurns);
        }
        if self.beats_per_cycle < 2 {
            return Err(ConfigError::CycleTooShort(self.beats_per_cycle));
        }
        if self.player_turn_offset_beats == 0 || self.player_turn_offset_beats >= self.beats_per_cycle {
            return Err(ConfigError::PlayerTurnOffset {
                offset: self.player_turn_offset_beats,
                cycle: self.beats_per_cycle,
            });
        }
        // The cue beat must land before the next opponent beat
        let cue_beat = self.player_turn_offset_beats.checked_add(self.cue_offset_beats);
        if cue_beat.map_or(true, |beat| beat >= self.beats_per_cycle) {
            return Err(ConfigError::CueOffset {
                cue: self.cue_offset_beats,
                offset: self.player_turn_offset_beats,
                cycle: self.beats_per_cycle,
            });
        }
        Ok(())
    }

    /// Timing bands for the judge
    pub fn timing_windows(&self) -> Result<TimingWindows, ConfigError> {
        TimingWindows::new(self.perfect_window_ms, self.great_window_ms, self.good_window_ms)
    }

    pub fn turn_advance_delay(&self) -> Duration {
        Duration::from_millis(self.turn_advance_delay_ms)
    }

    pub fn result_delay(&self) -> Duration {
        Duration::from_millis(self.result_delay_ms)
    }
}
