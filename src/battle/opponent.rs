// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Scripted opponent.
//!
//! The opponent draws uniformly from the lyrics its tier allows and rolls
//! its own timing. It never sees the player's pool.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::BattleError;
use crate::lyrics::{LyricCatalog, LyricEntry, LyricType};

/// Chance that an opponent move lands perfectly
pub const OPPONENT_PERFECT_PROBABILITY: f64 = 0.8;

/// Opponent difficulty; decides which lyric types it may play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpponentTier {
    #[default]
    Standard,
}

impl OpponentTier {
    /// Lyric types the opponent may draw from
    pub fn allowed_types(self) -> &'static [LyricType] {
        match self {
            OpponentTier::Standard => &[LyricType::Attack, LyricType::Technical],
        }
    }
}

/// Opponent timing roll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpponentTiming {
    Perfect,
    Good,
}

impl OpponentTiming {
    pub fn score(self) -> u32 {
        match self {
            OpponentTiming::Perfect => 50,
            OpponentTiming::Good => 30,
        }
    }
}

/// One opponent decision
#[derive(Debug, Clone, PartialEq)]
pub struct OpponentMove {
    pub lyric: LyricEntry,
    pub timing: OpponentTiming,
}

/// Picks opponent lyrics and timing
#[derive(Debug)]
pub struct OpponentDecisionProcess<R: Rng = StdRng> {
    pool: Vec<LyricEntry>,
    rng: R,
}

impl OpponentDecisionProcess<StdRng> {
    /// Seeded opponent for reproducible battles; entropy when `seed` is `None`
    pub fn from_seed(
        catalog: &LyricCatalog,
        tier: OpponentTier,
        seed: Option<u64>,
    ) -> Result<Self, BattleError> {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(catalog, tier, rng)
    }
}

impl<R: Rng> OpponentDecisionProcess<R> {
    /// Build the opponent pool from the catalog
    pub fn with_rng(catalog: &LyricCatalog, tier: OpponentTier, rng: R) -> Result<Self, BattleError> {
        let pool: Vec<LyricEntry> = catalog.of_types(tier.allowed_types()).cloned().collect();
        if pool.is_empty() {
            return Err(BattleError::EmptyOpponentPool { tier });
        }
        Ok(Self { pool, rng })
    }

    /// Lyrics this opponent can play
    pub fn pool(&self) -> &[LyricEntry] {
        &self.pool
    }

    /// Draw the next move
    pub fn decide(&mut self) -> OpponentMove {
        let lyric = self.pool[self.rng.gen_range(0..self.pool.len())].clone();
        let timing = if self.rng.gen_bool(OPPONENT_PERFECT_PROBABILITY) {
            OpponentTiming::Perfect
        } else {
            OpponentTiming::Good
        };
        OpponentMove { lyric, timing }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opponent(seed: u64) -> OpponentDecisionProcess {
        let catalog = LyricCatalog::builtin().unwrap();
        OpponentDecisionProcess::from_seed(&catalog, OpponentTier::Standard, Some(seed)).unwrap()
    }

    #[test]
    fn test_pool_excludes_counter_and_closing() {
        let opponent = opponent(1);
        assert_eq!(opponent.pool().len(), 6);
        assert!(opponent
            .pool()
            .iter()
            .all(|l| matches!(l.kind, LyricType::Attack | LyricType::Technical)));
    }

    #[test]
    fn test_never_plays_counter() {
        let mut opponent = opponent(7);
        for _ in 0..500 {
            let mv = opponent.decide();
            assert_ne!(mv.lyric.kind, LyricType::Counter);
            assert_ne!(mv.lyric.kind, LyricType::Closing);
        }
    }

    #[test]
    fn test_timing_distribution() {
        let mut opponent = opponent(42);
        let perfect = (0..2000)
            .filter(|_| opponent.decide().timing == OpponentTiming::Perfect)
            .count();
        // Roughly 80%
        assert!((1450..=1750).contains(&perfect), "perfect count {}", perfect);
    }

    #[test]
    fn test_same_seed_same_moves() {
        let mut a = opponent(3);
        let mut b = opponent(3);
        for _ in 0..20 {
            assert_eq!(a.decide(), b.decide());
        }
    }

    #[test]
    fn test_empty_pool_is_an_error() {
        let catalog = LyricCatalog::new(vec![LyricEntry::new(
            "C1",
            "c",
            LyricType::Counter,
            15,
            &[LyricType::Attack],
        )])
        .unwrap();
        let result = OpponentDecisionProcess::from_seed(&catalog, OpponentTier::Standard, Some(1));
        assert!(matches!(result, Err(BattleError::EmptyOpponentPool { .. })));
    }
}
