// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Beat clock implementation.
//!
//! This module provides a BPM-based beat clock that emits one tick per beat.
//! Tick times are derived from the clock start by repeatedly adding the fixed
//! beat interval, so scheduling jitter in the caller never accumulates.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::config::ConfigError;

/// Default battle tempo
pub const DEFAULT_BPM: f64 = 90.0;

/// Source of "now" for the battle clock.
///
/// Times are expressed as the duration elapsed since the source's origin.
pub trait TimeSource {
    /// Current time relative to the source origin
    fn now(&self) -> Duration;
}

/// Wall clock anchored at construction time
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock whose origin is the current instant
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Manually advanced clock for deterministic tests and simulations.
///
/// Clones share the same underlying time value.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    /// Create a manual clock at time zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Jump to an absolute time
    pub fn set(&self, now: Duration) {
        self.now.set(now);
    }

    /// Move time forward by `delta`
    pub fn advance(&self, delta: Duration) {
        self.now.set(self.now.get() + delta);
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Beat clock state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockState {
    Stopped,
    Running,
}

/// A single beat emitted by the clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeatTick {
    /// Beat index, starting at 1 for the first tick after start
    pub index: u64,
    /// When this beat was due, on the clock's time base
    pub expected_at: Duration,
}

/// Beat clock generator
#[derive(Debug, Clone)]
pub struct BeatClock {
    /// Tempo in BPM
    bpm: f64,
    /// Fixed interval between beats
    interval: Duration,
    /// Current clock state
    state: ClockState,
    /// Index of the last emitted beat
    beat: u64,
    /// Expected time of the next beat
    next_due: Option<Duration>,
}

impl BeatClock {
    /// Create a new beat clock at the specified tempo
    pub fn new(bpm: f64) -> Result<Self, ConfigError> {
        let interval = beat_interval(bpm)?;
        Ok(Self {
            bpm,
            interval,
            state: ClockState::Stopped,
            beat: 0,
            next_due: None,
        })
    }

    /// Get the tempo in BPM
    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Interval between two beats
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Get the current clock state
    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == ClockState::Running
    }

    /// Index of the last emitted beat (0 before the first tick)
    pub fn beat(&self) -> u64 {
        self.beat
    }

    /// Expected time of the next beat, if running
    pub fn next_due(&self) -> Option<Duration> {
        if self.is_running() {
            self.next_due
        } else {
            None
        }
    }

    /// Start emitting beats; the first beat is due one interval after `now`
    pub fn start(&mut self, now: Duration) {
        self.state = ClockState::Running;
        self.beat = 0;
        self.next_due = Some(now + self.interval);
    }

    /// Stop the clock. Safe to call any number of times.
    ///
    /// Returns true if the clock was running.
    pub fn stop(&mut self) -> bool {
        let was_running = self.is_running();
        self.state = ClockState::Stopped;
        self.next_due = None;
        was_running
    }

    /// Emit the next beat if it is due at or before `now`
    pub fn poll_next(&mut self, now: Duration) -> Option<BeatTick> {
        let due = self.next_due()?;
        if due > now {
            return None;
        }

        self.beat += 1;
        // Advance from the previous expected time, not from `now`.
        self.next_due = Some(due + self.interval);
        Some(BeatTick {
            index: self.beat,
            expected_at: due,
        })
    }

    /// Emit every beat due at or before `now`, in order
    pub fn poll(&mut self, now: Duration) -> Vec<BeatTick> {
        let mut ticks = Vec::new();
        while let Some(tick) = self.poll_next(now) {
            ticks.push(tick);
        }
        ticks
    }
}

/// Interval between beats at `bpm`
pub fn beat_interval(bpm: f64) -> Result<Duration, ConfigError> {
    if !bpm.is_finite() || bpm <= 0.0 {
        return Err(ConfigError::InvalidBpm(bpm));
    }
    // Extreme tempos either overflow a Duration or round down to zero
    match Duration::try_from_secs_f64(60.0 / bpm) {
        Ok(interval) if !interval.is_zero() => Ok(interval),
        _ => Err(ConfigError::InvalidBpm(bpm)),
    }
}
