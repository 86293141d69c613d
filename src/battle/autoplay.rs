// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Scripted player for headless battles.
//!
//! Picks a lyric that counters the opponent's last move when it has one,
//! otherwise the best rhyme, and submits near the cue beat with a seeded
//! random offset.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::lyrics::{LyricEntry, PlayerLyricPool};

/// Default largest distance from the cue beat (ms)
pub const DEFAULT_MAX_JITTER_MS: u64 = 160;

/// Automatic player
#[derive(Debug)]
pub struct AutoPlayer<R: Rng = StdRng> {
    rng: R,
    max_jitter_ms: u64,
}

impl AutoPlayer<StdRng> {
    /// Seeded player; entropy when `seed` is `None`
    pub fn from_seed(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(rng)
    }
}

impl<R: Rng> AutoPlayer<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            rng,
            max_jitter_ms: DEFAULT_MAX_JITTER_MS,
        }
    }

    /// Set the largest submission offset from the cue beat
    pub fn with_max_jitter(mut self, max_jitter_ms: u64) -> Self {
        self.max_jitter_ms = max_jitter_ms;
        self
    }

    /// Choose what to play against `opponent`
    pub fn choose<'a>(
        &mut self,
        pool: &'a PlayerLyricPool,
        opponent: Option<&LyricEntry>,
    ) -> Option<&'a LyricEntry> {
        let counters: Vec<&LyricEntry> = match opponent {
            Some(opponent) => pool.iter().filter(|l| l.counters(opponent.kind)).collect(),
            None => Vec::new(),
        };
        let candidates: Vec<&LyricEntry> = if counters.is_empty() {
            pool.iter().collect()
        } else {
            counters
        };

        let best = candidates.iter().map(|l| l.rhyme_score).max()?;
        let top: Vec<&LyricEntry> = candidates
            .into_iter()
            .filter(|l| l.rhyme_score == best)
            .collect();
        top.choose(&mut self.rng).copied()
    }

    /// When to submit for a beat expected at `expected_at`
    pub fn submit_time(&mut self, expected_at: Duration) -> Duration {
        if self.max_jitter_ms == 0 {
            return expected_at;
        }
        let offset = Duration::from_millis(self.rng.gen_range(0..=self.max_jitter_ms));
        if self.rng.gen_bool(0.5) {
            expected_at + offset
        } else {
            expected_at.saturating_sub(offset)
        }
    }
}
