// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Real-time headless driver.
//!
//! Sleeps on the tokio timer until the controller's next tick, delayed
//! notification or scripted submission is due, then hands control back to
//! the controller. Runs on a single task; the controller never crosses
//! threads.

use std::time::Duration;

use rand::Rng;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info};

use super::autoplay::AutoPlayer;
use super::controller::BattleController;
use super::{BattleEvent, BattleOutcome};
use crate::timing::TimeSource;

/// Time source backed by the tokio clock, so paused test time applies
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    origin: Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Tokio instant for a time on this clock's base
    pub fn instant_at(&self, at: Duration) -> Instant {
        self.origin + at
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for TokioClock {
    fn now(&self) -> Duration {
        Instant::now().saturating_duration_since(self.origin)
    }
}

/// Play a whole battle with `player` submitting for the human side.
///
/// `on_event` sees every event in order. Returns the outcome once
/// `BattleEnded` fires, or `None` if the battle stopped without one.
pub async fn run_simulation<R, P, F>(
    controller: &mut BattleController<TokioClock, R>,
    clock: TokioClock,
    player: &mut AutoPlayer<P>,
    mut on_event: F,
) -> Option<BattleOutcome>
where
    R: Rng,
    P: Rng,
    F: FnMut(&BattleEvent),
{
    let events = controller.subscribe();
    let mut pending: Option<(Duration, String)> = None;

    controller.start();

    loop {
        let next = match (controller.next_event_at(), pending.as_ref().map(|(at, _)| *at)) {
            (Some(event), Some(submit)) => event.min(submit),
            (Some(event), None) => event,
            (None, Some(submit)) => submit,
            (None, None) => break,
        };
        sleep_until(clock.instant_at(next)).await;

        if let Some((at, lyric_id)) = pending.take() {
            if at <= next {
                // Everything due before the submission happens first
                controller.update_at(at);
                match controller.submit_player_choice(&lyric_id, at) {
                    Ok(report) => debug!(lyric = %lyric_id, total = report.total_score, "Auto-player submitted"),
                    Err(rejection) => debug!(%rejection, "Auto-player submission rejected"),
                }
            } else {
                pending = Some((at, lyric_id));
            }
        }
        controller.update_at(next);

        for event in events.try_iter() {
            on_event(&event);
            match event {
                BattleEvent::PlayerTurnOpened { expected_at, .. } => {
                    let state = controller.state();
                    let choice = player
                        .choose(state.player_pool(), state.opponent_lyric())
                        .map(|lyric| lyric.id.clone());
                    if let Some(lyric_id) = choice {
                        // Nothing can be pressed before the window opened
                        let at = player.submit_time(expected_at).max(next);
                        pending = Some((at, lyric_id));
                    }
                }
                BattleEvent::BattleEnded(outcome) => {
                    info!(
                        player = outcome.player_score,
                        opponent = outcome.opponent_score,
                        "Simulation finished"
                    );
                    return Some(outcome);
                }
                _ => {}
            }
        }
    }

    controller.outcome()
}
