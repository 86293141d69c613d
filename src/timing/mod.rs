// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Timing module.
//!
//! This module provides the beat clock, injectable time sources and the
//! timing judge used to grade player submissions.

pub mod clock;
pub mod judge;

pub use clock::{
    beat_interval, BeatClock, BeatTick, ClockState, ManualClock, SystemClock, TimeSource,
    DEFAULT_BPM,
};
pub use judge::{error_ms, Accuracy, TimingJudge, TimingResult, TimingWindows};
