// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Performance benchmarks for rapbattle
//!
//! Run with: cargo bench
//!
//! These benchmarks measure:
//! - Timing judgement and scoring (per submission)
//! - Beat clock polling
//! - A whole battle in event time

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::time::Duration;

use rapbattle::battle::{BattleController, BattleEvent, ScoringEngine};
use rapbattle::config::BattleConfig;
use rapbattle::lyrics::{LyricCatalog, PlayerLyricPool};
use rapbattle::timing::{BeatClock, ManualClock, TimingJudge};

/// Benchmark the judge across all bands
fn bench_judge(c: &mut Criterion) {
    let judge = TimingJudge::default();
    let errors = [0.0, 40.0, 90.0, 150.0, 250.0, f64::NAN];

    c.bench_function("judge", |b| {
        b.iter(|| {
            for error in errors {
                black_box(judge.judge(black_box(error)));
            }
        })
    });
}

/// Benchmark scoring a player turn
fn bench_scoring(c: &mut Criterion) {
    let catalog = LyricCatalog::builtin().unwrap();
    let engine = ScoringEngine::default();
    let lyric = catalog.get("C3").unwrap();
    let opponent = catalog.get("A1").unwrap();

    c.bench_function("score_player_turn", |b| {
        b.iter(|| black_box(engine.score_player_turn(lyric, Some(opponent), black_box(40.0))))
    });
}

/// Benchmark catching up the beat clock after a stall
fn bench_clock_poll(c: &mut Criterion) {
    let mut group = c.benchmark_group("clock_poll");

    for beats in [8u64, 64, 512].iter() {
        group.bench_with_input(BenchmarkId::new("beats", beats), beats, |b, &beats| {
            b.iter_batched(
                || {
                    let mut clock = BeatClock::new(90.0).unwrap();
                    clock.start(Duration::ZERO);
                    clock
                },
                |mut clock| {
                    let now = clock.interval() * beats as u32;
                    black_box(clock.poll(now).len())
                },
                criterion::BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

/// Benchmark a full battle driven in event time
fn bench_battle(c: &mut Criterion) {
    let catalog = LyricCatalog::builtin().unwrap();

    c.bench_function("full_battle", |b| {
        b.iter(|| {
            let pool = PlayerLyricPool::from_ids(&catalog, &["A2", "B1", "C3", "D1"]).unwrap();
            let config = BattleConfig {
                rng_seed: Some(1),
                ..Default::default()
            };
            let mut battle =
                BattleController::with_time(config, &catalog, pool, ManualClock::new()).unwrap();
            let events = battle.subscribe();
            battle.start_at(Duration::ZERO);

            while let Some(next) = battle.next_event_at() {
                battle.update_at(next);
                for event in events.try_iter() {
                    if let BattleEvent::PlayerTurnOpened { expected_at, .. } = event {
                        battle.update_at(expected_at);
                        let _ = battle.submit_player_choice("C3", expected_at);
                    }
                }
            }

            black_box(battle.outcome())
        })
    });
}

criterion_group!(benches, bench_judge, bench_scoring, bench_clock_poll, bench_battle);
criterion_main!(benches);
