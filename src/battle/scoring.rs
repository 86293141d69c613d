// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Turn scoring.
//!
//! A player turn scores three independent parts:
//! - timing, from the judge's accuracy band
//! - choice, a flat bonus when the lyric counters the opponent's last lyric
//! - rhyme, the lyric's fixed quality
//!
//! An opponent turn scores its timing plus rhyme; it never earns a choice bonus.

use super::opponent::OpponentTiming;
use crate::lyrics::{LyricEntry, LyricType};
use crate::timing::{TimingJudge, TimingResult};

/// Bonus for answering the opponent's lyric type
pub const COUNTER_BONUS: u32 = 50;

/// Parts of a scored player turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreBreakdown {
    pub timing: TimingResult,
    pub choice_score: u32,
    pub rhyme_score: u32,
    pub total: u32,
}

impl ScoreBreakdown {
    /// A window that closed without a submission
    pub fn missed() -> Self {
        Self {
            timing: TimingResult::miss(),
            choice_score: 0,
            rhyme_score: 0,
            total: 0,
        }
    }
}

/// Scores player and opponent turns
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    judge: TimingJudge,
}

impl ScoringEngine {
    pub fn new(judge: TimingJudge) -> Self {
        Self { judge }
    }

    pub fn judge(&self) -> &TimingJudge {
        &self.judge
    }

    /// Choice bonus for playing `lyric` against a lyric of type `opponent`
    pub fn choice_score(lyric: &LyricEntry, opponent: Option<LyricType>) -> u32 {
        match opponent {
            Some(kind) if lyric.counters(kind) => COUNTER_BONUS,
            _ => 0,
        }
    }

    /// Score a player submission `error_ms` away from the expected beat
    pub fn score_player_turn(
        &self,
        lyric: &LyricEntry,
        opponent_lyric: Option<&LyricEntry>,
        error_ms: f64,
    ) -> ScoreBreakdown {
        let timing = self.judge.judge(error_ms);
        Self::compose(timing, lyric, opponent_lyric)
    }

    /// Combine an already judged timing with the lyric parts
    pub fn compose(
        timing: TimingResult,
        lyric: &LyricEntry,
        opponent_lyric: Option<&LyricEntry>,
    ) -> ScoreBreakdown {
        let choice_score = Self::choice_score(lyric, opponent_lyric.map(|l| l.kind));
        let rhyme_score = lyric.rhyme_score;
        ScoreBreakdown {
            timing,
            choice_score,
            rhyme_score,
            total: timing.score + choice_score + rhyme_score,
        }
    }

    /// Score an opponent move
    pub fn score_opponent_turn(lyric: &LyricEntry, timing: OpponentTiming) -> u32 {
        timing.score() + lyric.rhyme_score
    }
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new(TimingJudge::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::Accuracy;

    fn counter_lyric() -> LyricEntry {
        LyricEntry::new("C3", "c", LyricType::Counter, 20, &[LyricType::Attack])
    }

    fn attack_lyric() -> LyricEntry {
        LyricEntry::new("A1", "a", LyricType::Attack, 20, &[LyricType::Technical])
    }

    #[test]
    fn test_great_counter() {
        let engine = ScoringEngine::default();
        let opponent = attack_lyric();
        let breakdown = engine.score_player_turn(&counter_lyric(), Some(&opponent), 40.0);

        assert_eq!(breakdown.timing.accuracy, Accuracy::Perfect);
        assert_eq!(breakdown.choice_score, 50);
        assert_eq!(breakdown.total, 50 + 50 + 20);
    }

    #[test]
    fn test_good_without_counter() {
        let engine = ScoringEngine::default();
        let opponent = LyricEntry::new("B1", "b", LyricType::Technical, 30, &[LyricType::Counter]);
        let closing = LyricEntry::new("D1", "d", LyricType::Closing, 25, &[]);
        let breakdown = engine.score_player_turn(&closing, Some(&opponent), 150.0);

        assert_eq!(breakdown.timing.accuracy, Accuracy::Good);
        assert_eq!(breakdown.choice_score, 0);
        assert_eq!(breakdown.total, 15 + 25);
    }

    #[test]
    fn test_no_opponent_lyric_means_no_bonus() {
        assert_eq!(ScoringEngine::choice_score(&counter_lyric(), None), 0);
        assert_eq!(
            ScoringEngine::choice_score(&counter_lyric(), Some(LyricType::Attack)),
            COUNTER_BONUS
        );
    }

    #[test]
    fn test_miss_keeps_lyric_parts() {
        let engine = ScoringEngine::default();
        let opponent = attack_lyric();
        let breakdown = engine.score_player_turn(&counter_lyric(), Some(&opponent), 500.0);
        assert_eq!(breakdown.timing.score, 0);
        assert_eq!(breakdown.total, 70);

        let nan = engine.score_player_turn(&counter_lyric(), Some(&opponent), f64::NAN);
        assert_eq!(nan.timing.accuracy, Accuracy::Miss);
    }

    #[test]
    fn test_opponent_score() {
        let lyric = attack_lyric();
        assert_eq!(ScoringEngine::score_opponent_turn(&lyric, OpponentTiming::Perfect), 70);
        assert_eq!(ScoringEngine::score_opponent_turn(&lyric, OpponentTiming::Good), 50);
        assert_eq!(ScoreBreakdown::missed().total, 0);
    }
}
