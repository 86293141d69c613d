// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Timing judge.
//!
//! Classifies the distance between a submission and its expected beat into
//! an accuracy tier. Each tier maps to a fixed score.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Accuracy tier of a timed submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accuracy {
    Perfect,
    Great,
    Good,
    Miss,
}

impl Accuracy {
    /// Fixed score for this tier
    pub fn score(self) -> u32 {
        match self {
            Accuracy::Perfect => 50,
            Accuracy::Great => 30,
            Accuracy::Good => 15,
            Accuracy::Miss => 0,
        }
    }

    /// Display label
    pub fn label(self) -> &'static str {
        match self {
            Accuracy::Perfect => "PERFECT",
            Accuracy::Great => "GREAT",
            Accuracy::Good => "GOOD",
            Accuracy::Miss => "MISS",
        }
    }
}

impl fmt::Display for Accuracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of judging one submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingResult {
    pub accuracy: Accuracy,
    pub score: u32,
}

impl TimingResult {
    pub fn new(accuracy: Accuracy) -> Self {
        Self {
            accuracy,
            score: accuracy.score(),
        }
    }

    pub fn miss() -> Self {
        Self::new(Accuracy::Miss)
    }
}

/// Upper bounds (inclusive, milliseconds) of each accuracy band
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingWindows {
    pub perfect_ms: f64,
    pub great_ms: f64,
    pub good_ms: f64,
}

impl TimingWindows {
    /// Create windows, rejecting bands that are negative or not strictly increasing
    pub fn new(perfect_ms: f64, great_ms: f64, good_ms: f64) -> Result<Self, ConfigError> {
        let increasing = perfect_ms >= 0.0 && perfect_ms < great_ms && great_ms < good_ms;
        if !increasing || !good_ms.is_finite() {
            return Err(ConfigError::TimingWindows {
                perfect: perfect_ms,
                great: great_ms,
                good: good_ms,
            });
        }
        Ok(Self {
            perfect_ms,
            great_ms,
            good_ms,
        })
    }
}

impl Default for TimingWindows {
    fn default() -> Self {
        Self {
            perfect_ms: 50.0,
            great_ms: 120.0,
            good_ms: 200.0,
        }
    }
}

/// Classifies timing errors into accuracy tiers
#[derive(Debug, Clone, Copy, Default)]
pub struct TimingJudge {
    windows: TimingWindows,
}

impl TimingJudge {
    pub fn new(windows: TimingWindows) -> Self {
        Self { windows }
    }

    pub fn windows(&self) -> &TimingWindows {
        &self.windows
    }

    /// Judge an absolute error in milliseconds.
    ///
    /// Bands are checked in order and the first match wins. A non-finite
    /// error is a miss.
    pub fn judge(&self, error_ms: f64) -> TimingResult {
        let error = error_ms.abs();
        let accuracy = if error <= self.windows.perfect_ms {
            Accuracy::Perfect
        } else if error <= self.windows.great_ms {
            Accuracy::Great
        } else if error <= self.windows.good_ms {
            Accuracy::Good
        } else {
            Accuracy::Miss
        };
        TimingResult::new(accuracy)
    }

    /// Judge a submission against its expected beat time
    pub fn judge_offset(&self, submitted: Duration, expected: Duration) -> TimingResult {
        self.judge(error_ms(submitted, expected))
    }
}

/// Absolute distance between two times in milliseconds
pub fn error_ms(submitted: Duration, expected: Duration) -> f64 {
    let distance = if submitted >= expected {
        submitted - expected
    } else {
        expected - submitted
    };
    distance.as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_boundaries() {
        let judge = TimingJudge::default();

        assert_eq!(judge.judge(0.0), TimingResult::new(Accuracy::Perfect));
        assert_eq!(judge.judge(50.0).accuracy, Accuracy::Perfect);
        assert_eq!(judge.judge(50.5).accuracy, Accuracy::Great);
        assert_eq!(judge.judge(51.0).accuracy, Accuracy::Great);
        assert_eq!(judge.judge(120.0).accuracy, Accuracy::Great);
        assert_eq!(judge.judge(121.0).accuracy, Accuracy::Good);
        assert_eq!(judge.judge(200.0).accuracy, Accuracy::Good);
        assert_eq!(judge.judge(200.1).accuracy, Accuracy::Miss);
        assert_eq!(judge.judge(5000.0).accuracy, Accuracy::Miss);
    }

    #[test]
    fn test_score_table() {
        let judge = TimingJudge::default();
        assert_eq!(judge.judge(40.0).score, 50);
        assert_eq!(judge.judge(100.0).score, 30);
        assert_eq!(judge.judge(150.0).score, 15);
        assert_eq!(judge.judge(250.0).score, 0);
    }

    #[test]
    fn test_every_error_maps_to_its_band() {
        let judge = TimingJudge::default();
        for e in 0..=400u32 {
            let result = judge.judge(e as f64);
            let expected = match e {
                0..=50 => (Accuracy::Perfect, 50),
                51..=120 => (Accuracy::Great, 30),
                121..=200 => (Accuracy::Good, 15),
                _ => (Accuracy::Miss, 0),
            };
            assert_eq!((result.accuracy, result.score), expected, "error {}", e);
        }
    }

    #[test]
    fn test_non_finite_error_is_miss() {
        let judge = TimingJudge::default();
        assert_eq!(judge.judge(f64::NAN).accuracy, Accuracy::Miss);
        assert_eq!(judge.judge(f64::INFINITY).accuracy, Accuracy::Miss);
    }

    #[test]
    fn test_judge_offset_is_symmetric() {
        let judge = TimingJudge::default();
        let expected = Duration::from_millis(2000);
        let early = judge.judge_offset(Duration::from_millis(1960), expected);
        let late = judge.judge_offset(Duration::from_millis(2040), expected);
        assert_eq!(early, late);
        assert_eq!(early.accuracy, Accuracy::Perfect);
    }

    #[test]
    fn test_custom_windows() {
        let windows = TimingWindows::new(30.0, 60.0, 90.0).unwrap();
        let judge = TimingJudge::new(windows);
        assert_eq!(judge.judge(45.0).accuracy, Accuracy::Great);
        assert_eq!(judge.judge(95.0).accuracy, Accuracy::Miss);
    }

    #[test]
    fn test_non_increasing_windows_rejected() {
        assert!(TimingWindows::new(120.0, 120.0, 200.0).is_err());
        assert!(TimingWindows::new(50.0, 200.0, 120.0).is_err());
        assert!(TimingWindows::new(-1.0, 120.0, 200.0).is_err());
    }

    #[test]
    fn test_labels() {
        assert_eq!(Accuracy::Perfect.to_string(), "PERFECT");
        assert_eq!(Accuracy::Miss.label(), "MISS");
    }
}
