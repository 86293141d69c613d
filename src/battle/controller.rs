// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Battle controller.
//!
//! The controller owns the `GameState` and is the only code that mutates it.
//! Beat ticks, delayed notifications and player submissions are handled one
//! at a time to completion, and every transition is re-emitted as a
//! `BattleEvent` to the registered observers.
//!
//! Time never advances on its own: callers either poll `update()` against
//! the controller's `TimeSource` or pass explicit times to `update_at()`.

use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::Rng;
use tracing::{debug, info, warn};

use super::deferred::{DeferredKind, DeferredQueue};
use super::opponent::{OpponentDecisionProcess, OpponentTier};
use super::scoring::{ScoreBreakdown, ScoringEngine};
use super::turn::{next_phase, CycleSlot, PhaseInput, TurnAfterPlayer, TurnStateMachine};
use super::{
    BattleEvent, BattleObserver, BattleOutcome, GamePhase, GameState, PlayerTurnReport, Rejection,
};
use crate::config::{BattleConfig, MissedWindowPolicy};
use crate::error::BattleError;
use crate::lyrics::{LyricCatalog, PlayerLyricPool};
use crate::timing::{error_ms, BeatClock, BeatTick, SystemClock, TimeSource, TimingJudge};

/// Runs one battle
pub struct BattleController<T: TimeSource = SystemClock, R: Rng = StdRng> {
    config: BattleConfig,
    state: GameState,
    clock: BeatClock,
    machine: TurnStateMachine,
    scoring: ScoringEngine,
    opponent: OpponentDecisionProcess<R>,
    deferred: DeferredQueue,
    observers: Vec<Box<dyn BattleObserver>>,
    time: T,
    outcome: Option<BattleOutcome>,
    announced: bool,
    started: bool,
    abandoned: bool,
}

impl BattleController {
    /// Battle on the wall clock, seeded from `config.rng_seed`
    pub fn new(
        config: BattleConfig,
        catalog: &LyricCatalog,
        pool: PlayerLyricPool,
    ) -> Result<Self, BattleError> {
        Self::with_time(config, catalog, pool, SystemClock::new())
    }
}

impl<T: TimeSource> BattleController<T, StdRng> {
    /// Battle on a custom time source, seeded from `config.rng_seed`
    pub fn with_time(
        config: BattleConfig,
        catalog: &LyricCatalog,
        pool: PlayerLyricPool,
        time: T,
    ) -> Result<Self, BattleError> {
        config.validate()?;
        let opponent =
            OpponentDecisionProcess::from_seed(catalog, OpponentTier::default(), config.rng_seed)?;
        Self::assemble(config, pool, time, opponent)
    }
}

impl<T: TimeSource, R: Rng> BattleController<T, R> {
    /// Battle with injected time and random sources
    pub fn with_sources(
        config: BattleConfig,
        catalog: &LyricCatalog,
        pool: PlayerLyricPool,
        time: T,
        rng: R,
    ) -> Result<Self, BattleError> {
        config.validate()?;
        let opponent = OpponentDecisionProcess::with_rng(catalog, OpponentTier::default(), rng)?;
        Self::assemble(config, pool, time, opponent)
    }

    fn assemble(
        config: BattleConfig,
        pool: PlayerLyricPool,
        time: T,
        opponent: OpponentDecisionProcess<R>,
    ) -> Result<Self, BattleError> {
        let clock = BeatClock::new(config.bpm)?;
        let scoring = ScoringEngine::new(TimingJudge::new(config.timing_windows()?));
        let machine = TurnStateMachine::from_config(&config);

        Ok(Self {
            config,
            state: GameState::new(pool),
            clock,
            machine,
            scoring,
            opponent,
            deferred: DeferredQueue::new(),
            observers: Vec::new(),
            time,
            outcome: None,
            announced: false,
            started: false,
            abandoned: false,
        })
    }

    // ---- Read-only views ----

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    /// Final scores, frozen once the battle ends
    pub fn outcome(&self) -> Option<BattleOutcome> {
        self.outcome
    }

    pub fn beat_interval(&self) -> Duration {
        self.clock.interval()
    }

    /// Current time on the controller's time source
    pub fn now(&self) -> Duration {
        self.time.now()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Whether `BattleEnded` has been emitted
    pub fn is_finished(&self) -> bool {
        self.announced
    }

    pub fn is_abandoned(&self) -> bool {
        self.abandoned
    }

    /// Earliest time at which `update` has work to do
    pub fn next_event_at(&self) -> Option<Duration> {
        if self.abandoned {
            return None;
        }
        match (self.clock.next_due(), self.deferred.next_due()) {
            (Some(tick), Some(deferred)) => Some(tick.min(deferred)),
            (tick, deferred) => tick.or(deferred),
        }
    }

    /// Time left until the next tick or delayed notification
    pub fn time_until_next_event(&self) -> Option<Duration> {
        let now = self.time.now();
        self.next_event_at()
            .map(|due| due.saturating_sub(now))
    }

    // ---- Observers ----

    pub fn add_observer<O: BattleObserver + 'static>(&mut self, observer: O) {
        self.observers.push(Box::new(observer));
    }

    /// Receive every future event over a channel
    pub fn subscribe(&mut self) -> Receiver<BattleEvent> {
        let (tx, rx) = mpsc::channel();
        self.add_observer(tx);
        rx
    }

    fn emit(&mut self, event: BattleEvent) {
        for observer in &mut self.observers {
            observer.notify(&event);
        }
    }

    // ---- Lifecycle ----

    /// Start the beat clock now
    pub fn start(&mut self) {
        let now = self.time.now();
        self.start_at(now);
    }

    /// Start the beat clock at `now`. Ignored once started.
    pub fn start_at(&mut self, now: Duration) {
        if self.started || self.abandoned {
            debug!("Start ignored, battle already started");
            return;
        }
        self.started = true;
        self.state.phase = GamePhase::Waiting;
        self.clock.start(now);
        info!(
            bpm = self.clock.bpm(),
            interval_ms = self.clock.interval().as_secs_f64() * 1000.0,
            turns = self.machine.turns_per_battle(),
            "Battle started"
        );
    }

    /// Tear the battle down: stop the clock and cancel delayed notifications.
    ///
    /// Every later call is a no-op.
    pub fn abandon(&mut self) {
        if self.abandoned {
            return;
        }
        self.abandoned = true;
        self.clock.stop();
        let cancelled = !self.deferred.is_empty();
        self.deferred.clear();
        info!(turn = self.state.current_turn, cancelled, "Battle abandoned");
    }

    /// Process everything due by the time source's current time
    pub fn update(&mut self) {
        let now = self.time.now();
        self.update_at(now);
    }

    /// Process ticks and delayed notifications due at or before `now`, in
    /// time order. A notification wins a tie with a tick.
    pub fn update_at(&mut self, now: Duration) {
        if self.abandoned {
            return;
        }

        loop {
            let tick_due = self.clock.next_due().filter(|due| *due <= now);
            let deferred_due = self.deferred.next_due().filter(|due| *due <= now);

            match (tick_due, deferred_due) {
                (None, None) => break,
                (Some(tick), Some(deferred)) if deferred <= tick => self.fire_deferred(now),
                (None, Some(_)) => self.fire_deferred(now),
                _ => {
                    if let Some(tick) = self.clock.poll_next(now) {
                        self.on_tick(tick);
                    }
                }
            }
        }
    }

    // ---- Player command ----

    /// Submit the player's lyric at the time source's current time
    pub fn submit_now(&mut self, lyric_id: &str) -> Result<PlayerTurnReport, Rejection> {
        let now = self.time.now();
        self.submit_player_choice(lyric_id, now)
    }

    /// Submit the player's lyric, timestamped on the controller's time base.
    ///
    /// Rejected submissions leave the state untouched.
    pub fn submit_player_choice(
        &mut self,
        lyric_id: &str,
        timestamp: Duration,
    ) -> Result<PlayerTurnReport, Rejection> {
        if self.abandoned {
            warn!(lyric = lyric_id, "Submission after abandon ignored");
            return Err(Rejection::Abandoned);
        }
        if let Err(rejection) = self.machine.check_submit(&self.state) {
            warn!(lyric = lyric_id, phase = %self.state.phase, "Submission outside selecting ignored");
            return Err(rejection);
        }
        let Some(expected) = self.state.expected_beat_time else {
            return Err(Rejection::NotSelecting {
                phase: self.state.phase,
            });
        };
        let Some(lyric) = self.state.player_pool.get(lyric_id).cloned() else {
            warn!(lyric = lyric_id, "Submission of unknown lyric ignored");
            return Err(Rejection::UnknownLyric(lyric_id.to_string()));
        };

        let error = error_ms(timestamp, expected);
        let breakdown =
            self.scoring
                .score_player_turn(&lyric, self.state.opponent_lyric.as_ref(), error);

        self.state.phase = GamePhase::Performing;
        let report = self.record_player_turn(Some(lyric.id), breakdown, Some(error));
        info!(
            turn = report.turn,
            lyric = lyric_id,
            error_ms = error,
            accuracy = %report.timing.accuracy,
            total = report.total_score,
            "Player turn resolved"
        );

        self.finish_player_turn(timestamp, true);
        Ok(report)
    }

    // ---- Internals ----

    fn on_tick(&mut self, tick: BeatTick) {
        self.state.beat_count = tick.index;
        debug!(beat = tick.index, "Beat");
        self.emit(BattleEvent::BeatTicked { beat: tick.index });

        match self.machine.slot(tick.index) {
            CycleSlot::OpponentTurn => self.on_opponent_beat(tick),
            CycleSlot::PlayerTurn => self.on_player_beat(tick),
            CycleSlot::Rest => {}
        }
    }

    fn on_opponent_beat(&mut self, tick: BeatTick) {
        // A turn advance still pending from the previous cycle lands first
        if let Some(turn) = self.deferred.take_turn_advance() {
            self.advance_turn(turn);
        }

        if let Some(policy) = self.machine.missed_window(&self.state) {
            if let Some(phase) = next_phase(self.state.phase, PhaseInput::MissedWindow) {
                self.state.phase = phase;
            }
            match policy {
                MissedWindowPolicy::AutoMiss => {
                    warn!(turn = self.state.current_turn, "Selecting window closed without input");
                    self.record_player_turn(None, ScoreBreakdown::missed(), None);
                    self.finish_player_turn(tick.expected_at, false);
                    if self.state.phase == GamePhase::Result {
                        return;
                    }
                }
                MissedWindowPolicy::Hold => {
                    warn!(turn = self.state.current_turn, "Selecting window closed, holding turn");
                    self.state.expected_beat_time = None;
                }
            }
        }

        if let Some(phase) = next_phase(self.state.phase, PhaseInput::OpponentBeat) {
            self.state.phase = phase;
        }

        if self.machine.opponent_may_act(&self.state) {
            self.run_opponent_turn();
        }
    }

    fn run_opponent_turn(&mut self) {
        let decision = self.opponent.decide();
        let score = ScoringEngine::score_opponent_turn(&decision.lyric, decision.timing);

        self.state.opponent_score += score;
        self.state.opponent_turns_taken += 1;
        self.state.opponent_lyric = Some(decision.lyric.clone());

        info!(
            turn = self.state.current_turn,
            lyric = %decision.lyric.id,
            kind = %decision.lyric.kind,
            score,
            "Opponent acted"
        );

        self.emit(BattleEvent::OpponentActed {
            turn: self.state.current_turn,
            lyric: decision.lyric,
            timing: decision.timing,
            score,
        });
        self.emit(BattleEvent::ScoreChanged {
            player: self.state.player_score,
            opponent: self.state.opponent_score,
        });
    }

    fn on_player_beat(&mut self, tick: BeatTick) {
        if !self.machine.player_window_may_open(&self.state) {
            return;
        }
        let Some(phase) = next_phase(self.state.phase, PhaseInput::PlayerBeat) else {
            return;
        };

        let expected_at = self.machine.cue_time(tick.expected_at, self.clock.interval());
        self.state.phase = phase;
        self.state.expected_beat_time = Some(expected_at);

        info!(turn = self.state.current_turn, beat = tick.index, "Player turn opened");
        self.emit(BattleEvent::PlayerTurnOpened {
            turn: self.state.current_turn,
            expected_at,
        });
    }

    /// Apply a scored (or missed) player move to the state
    fn record_player_turn(
        &mut self,
        lyric_id: Option<String>,
        breakdown: ScoreBreakdown,
        error_ms: Option<f64>,
    ) -> PlayerTurnReport {
        self.state.player_score += breakdown.total;
        self.state.player_turns_taken += 1;
        self.state.expected_beat_time = None;

        let report = PlayerTurnReport {
            turn: self.state.current_turn,
            lyric_id,
            timing: breakdown.timing,
            choice_score: breakdown.choice_score,
            rhyme_score: breakdown.rhyme_score,
            total_score: breakdown.total,
            error_ms,
        };

        self.emit(BattleEvent::PlayerTurnResolved(report.clone()));
        if breakdown.total > 0 {
            self.emit(BattleEvent::ScoreChanged {
                player: self.state.player_score,
                opponent: self.state.opponent_score,
            });
        }
        report
    }

    /// Schedule or apply whatever follows the player's move
    fn finish_player_turn(&mut self, now: Duration, delayed: bool) {
        match self.machine.after_player_turn(&self.state) {
            TurnAfterPlayer::Advance { next_turn } if delayed => {
                self.deferred.schedule(
                    now + self.config.turn_advance_delay(),
                    DeferredKind::AdvanceTurn { turn: next_turn },
                );
            }
            TurnAfterPlayer::Advance { next_turn } => self.advance_turn(next_turn),
            TurnAfterPlayer::EndBattle => self.end_battle(now),
        }
    }

    fn advance_turn(&mut self, turn: u32) {
        if self.state.phase == GamePhase::Result || turn <= self.state.current_turn {
            return;
        }
        self.state.current_turn = turn;
        info!(turn, "Turn advanced");
        self.emit(BattleEvent::TurnAdvanced { turn });
    }

    /// Freeze scores, stop the clock and schedule the announcement
    fn end_battle(&mut self, now: Duration) {
        let Some(phase) = next_phase(self.state.phase, PhaseInput::EndBattle) else {
            return;
        };
        self.state.phase = phase;
        self.state.expected_beat_time = None;
        self.clock.stop();

        let outcome = BattleOutcome::new(self.state.player_score, self.state.opponent_score);
        self.outcome = Some(outcome);
        self.deferred
            .schedule(now + self.config.result_delay(), DeferredKind::AnnounceBattleEnd);

        info!(
            player = outcome.player_score,
            opponent = outcome.opponent_score,
            verdict = ?outcome.verdict,
            "Battle over"
        );
    }

    fn fire_deferred(&mut self, now: Duration) {
        let Some(deferred) = self.deferred.pop_due(now) else {
            return;
        };
        match deferred.kind {
            DeferredKind::AdvanceTurn { turn } => self.advance_turn(turn),
            DeferredKind::AnnounceBattleEnd => {
                if self.announced {
                    return;
                }
                if let Some(outcome) = self.outcome {
                    self.announced = true;
                    self.emit(BattleEvent::BattleEnded(outcome));
                }
            }
        }
    }
}

impl<T: TimeSource, R: Rng> Drop for BattleController<T, R> {
    fn drop(&mut self) {
        self.clock.stop();
        self.deferred.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::{Accuracy, ManualClock};

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    /// 120 BPM keeps beat times on whole milliseconds
    fn config() -> BattleConfig {
        BattleConfig {
            bpm: 120.0,
            rng_seed: Some(11),
            ..Default::default()
        }
    }

    fn controller(config: BattleConfig) -> BattleController<ManualClock> {
        let catalog = LyricCatalog::builtin().unwrap();
        let pool = PlayerLyricPool::from_ids(&catalog, &["A1", "B1", "C1", "D1"]).unwrap();
        BattleController::with_time(config, &catalog, pool, ManualClock::new()).unwrap()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let catalog = LyricCatalog::builtin().unwrap();
        let pool = PlayerLyricPool::from_ids(&catalog, &["A1", "B1", "C1", "D1"]).unwrap();
        let config = BattleConfig {
            bpm: -1.0,
            ..Default::default()
        };
        let result = BattleController::with_time(config, &catalog, pool, ManualClock::new());
        assert!(matches!(result, Err(BattleError::Config(_))));
    }

    #[test]
    fn test_opponent_then_player_window() {
        let mut battle = controller(config());
        battle.start_at(ms(0));
        assert_eq!(battle.beat_interval(), ms(500));

        // Beat 1: opponent
        battle.update_at(ms(500));
        assert_eq!(battle.state().beat_count(), 1);
        assert_eq!(battle.state().opponent_turns_taken(), 1);
        assert!(battle.state().opponent_score() > 0);
        assert_eq!(battle.state().phase(), GamePhase::Waiting);

        // Beat 5: window opens on the beat to hit
        battle.update_at(ms(2500));
        assert_eq!(battle.state().phase(), GamePhase::Selecting);
        assert_eq!(battle.state().expected_beat_time(), Some(ms(2500)));
    }

    #[test]
    fn test_submission_scores_and_defers_advance() {
        let mut battle = controller(config());
        battle.start_at(ms(0));
        battle.update_at(ms(2500));

        let report = battle.submit_player_choice("D1", ms(2500)).unwrap();
        assert_eq!(report.timing.accuracy, Accuracy::Perfect);
        assert_eq!(report.choice_score, 0);
        assert_eq!(report.total_score, 60);
        assert_eq!(battle.state().player_score(), 60);
        assert_eq!(battle.state().phase(), GamePhase::Performing);
        assert_eq!(battle.state().current_turn(), 1);

        // Advance fires one second later
        battle.update_at(ms(3499));
        assert_eq!(battle.state().current_turn(), 1);
        battle.update_at(ms(3500));
        assert_eq!(battle.state().current_turn(), 2);
    }

    #[test]
    fn test_hit_on_opening_beat_is_perfect() {
        let mut battle = controller(BattleConfig {
            rng_seed: Some(3),
            ..Default::default()
        });
        let events = battle.subscribe();
        battle.start_at(ms(0));
        let opening = battle.beat_interval() * 5;

        battle.update_at(opening);
        let expected = events
            .try_iter()
            .find_map(|event| match event {
                BattleEvent::PlayerTurnOpened { expected_at, .. } => Some(expected_at),
                _ => None,
            })
            .unwrap();
        assert_eq!(expected, opening);
        assert_eq!(battle.state().expected_beat_time(), Some(opening));

        let report = battle.submit_player_choice("D1", opening).unwrap();
        assert_eq!(report.timing.accuracy, Accuracy::Perfect);
        assert_eq!(report.error_ms, Some(0.0));
        assert_eq!(report.total_score, 60);
    }

    #[test]
    fn test_rejections_leave_state_unchanged() {
        let mut battle = controller(config());
        battle.start_at(ms(0));
        battle.update_at(ms(500));

        let before = battle.state().clone();
        assert_eq!(
            battle.submit_player_choice("A1", ms(600)),
            Err(Rejection::NotSelecting {
                phase: GamePhase::Waiting
            })
        );
        assert_eq!(battle.state(), &before);

        battle.update_at(ms(2500));
        let before = battle.state().clone();
        assert_eq!(
            battle.submit_player_choice("B3", ms(2500)),
            Err(Rejection::UnknownLyric("B3".to_string()))
        );
        assert_eq!(battle.state(), &before);
    }

    #[test]
    fn test_auto_miss_at_next_opponent_beat() {
        let mut battle = controller(config());
        battle.start_at(ms(0));
        battle.update_at(ms(2500));
        assert_eq!(battle.state().phase(), GamePhase::Selecting);

        // Beat 9 closes the window
        battle.update_at(ms(4500));
        let state = battle.state();
        assert_eq!(state.player_turns_taken(), 1);
        assert_eq!(state.player_score(), 0);
        assert_eq!(state.current_turn(), 2);
        assert_eq!(state.opponent_turns_taken(), 2);
        assert_eq!(state.phase(), GamePhase::Waiting);
    }

    #[test]
    fn test_hold_reopens_window() {
        let mut battle = controller(BattleConfig {
            missed_window_policy: MissedWindowPolicy::Hold,
            ..config()
        });
        battle.start_at(ms(0));
        battle.update_at(ms(2500));

        // Beat 9: forced back to waiting, opponent does not act again
        battle.update_at(ms(4500));
        assert_eq!(battle.state().phase(), GamePhase::Waiting);
        assert_eq!(battle.state().opponent_turns_taken(), 1);
        assert_eq!(battle.state().current_turn(), 1);

        // Beat 13: window re-opens for the same turn
        battle.update_at(ms(6500));
        assert_eq!(battle.state().phase(), GamePhase::Selecting);
        assert_eq!(battle.state().expected_beat_time(), Some(ms(6500)));
    }

    #[test]
    fn test_abandon_stops_everything() {
        let mut battle = controller(config());
        let events = battle.subscribe();
        battle.start_at(ms(0));
        battle.update_at(ms(2500));
        battle.submit_player_choice("A1", ms(2500)).unwrap();
        assert!(battle.next_event_at().is_some());

        battle.abandon();
        battle.abandon();
        let drained = events.try_iter().count();
        assert!(drained > 0);

        battle.update_at(ms(60_000));
        assert_eq!(events.try_iter().count(), 0);
        assert_eq!(battle.next_event_at(), None);
        assert_eq!(battle.submit_player_choice("A1", ms(60_000)), Err(Rejection::Abandoned));
        assert_eq!(battle.state().current_turn(), 1);
    }

    #[test]
    fn test_time_until_next_event() {
        let clock = ManualClock::new();
        let catalog = LyricCatalog::builtin().unwrap();
        let pool = PlayerLyricPool::from_ids(&catalog, &["A1", "B1", "C1", "D1"]).unwrap();
        let mut battle = BattleController::with_time(config(), &catalog, pool, clock.clone()).unwrap();

        assert_eq!(battle.time_until_next_event(), None);
        battle.start();
        assert_eq!(battle.time_until_next_event(), Some(ms(500)));

        clock.advance(ms(250));
        assert_eq!(battle.time_until_next_event(), Some(ms(250)));
        battle.update();
        assert_eq!(battle.state().beat_count(), 0);

        clock.advance(ms(250));
        battle.update();
        assert_eq!(battle.state().beat_count(), 1);
    }

    #[test]
    fn test_injected_rng_drives_opponent() {
        use rand::SeedableRng;

        let catalog = LyricCatalog::builtin().unwrap();
        let first_move = || {
            let pool = PlayerLyricPool::from_ids(&catalog, &["A1", "B1", "C1", "D1"]).unwrap();
            let mut battle = BattleController::with_sources(
                config(),
                &catalog,
                pool,
                ManualClock::new(),
                StdRng::seed_from_u64(5),
            )
            .unwrap();
            battle.start_at(ms(0));
            battle.update_at(ms(500));
            (
                battle.state().opponent_lyric().cloned(),
                battle.state().opponent_score(),
            )
        };

        let (lyric, score) = first_move();
        assert!(lyric.is_some());
        assert_eq!(first_move(), (lyric, score));
    }

    #[test]
    fn test_late_update_processes_in_order() {
        let mut battle = controller(config());
        let events = battle.subscribe();
        battle.start_at(ms(0));

        // One call covering several beats delivers them all, in order
        battle.update_at(ms(2500));
        let beats: Vec<u64> = events
            .try_iter()
            .filter_map(|e| match e {
                BattleEvent::BeatTicked { beat } => Some(beat),
                _ => None,
            })
            .collect();
        assert_eq!(beats, vec![1, 2, 3, 4, 5]);
    }
}
