// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Delayed battle notifications.
//!
//! Turn advances and the battle-end announcement fire some time after the
//! move that caused them. They live in a min-heap keyed by due time so the
//! controller can interleave them with beat ticks. Clearing the queue
//! cancels everything pending.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Duration;

/// What a deferred notification does when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredKind {
    /// Move the turn counter to `turn`
    AdvanceTurn { turn: u32 },
    /// Announce the frozen battle outcome
    AnnounceBattleEnd,
}

/// A scheduled notification
#[derive(Debug, Clone, Copy)]
pub struct Deferred {
    /// When it is due, on the controller's time base
    pub due: Duration,
    /// Insertion order, breaks ties between equal due times
    seq: u64,
    pub kind: DeferredKind,
}

// For BinaryHeap - we want the earliest due time first
impl Eq for Deferred {}

impl PartialEq for Deferred {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Ord for Deferred {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap behavior
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Deferred {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Priority queue of deferred notifications
#[derive(Debug, Default)]
pub struct DeferredQueue {
    queue: BinaryHeap<Deferred>,
    next_seq: u64,
}

impl DeferredQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `kind` to fire at `due`
    pub fn schedule(&mut self, due: Duration, kind: DeferredKind) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Deferred { due, seq, kind });
    }

    /// Due time of the earliest pending notification
    pub fn next_due(&self) -> Option<Duration> {
        self.queue.peek().map(|d| d.due)
    }

    /// Pop the earliest notification if it is due at or before `now`
    pub fn pop_due(&mut self, now: Duration) -> Option<Deferred> {
        if self.queue.peek()?.due <= now {
            self.queue.pop()
        } else {
            None
        }
    }

    /// Remove a pending turn advance regardless of its due time
    pub fn take_turn_advance(&mut self) -> Option<u32> {
        let mut taken = None;
        let remaining: Vec<Deferred> = self
            .queue
            .drain()
            .filter(|d| match d.kind {
                DeferredKind::AdvanceTurn { turn } if taken.is_none() => {
                    taken = Some(turn);
                    false
                }
                _ => true,
            })
            .collect();
        self.queue.extend(remaining);
        taken
    }

    /// Cancel everything pending
    pub fn clear(&mut self) {
        self.queue.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn test_earliest_first() {
        let mut queue = DeferredQueue::new();
        queue.schedule(ms(300), DeferredKind::AnnounceBattleEnd);
        queue.schedule(ms(100), DeferredKind::AdvanceTurn { turn: 2 });

        assert_eq!(queue.next_due(), Some(ms(100)));
        assert!(queue.pop_due(ms(50)).is_none());

        let first = queue.pop_due(ms(400)).unwrap();
        assert_eq!(first.kind, DeferredKind::AdvanceTurn { turn: 2 });
        let second = queue.pop_due(ms(400)).unwrap();
        assert_eq!(second.kind, DeferredKind::AnnounceBattleEnd);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let mut queue = DeferredQueue::new();
        queue.schedule(ms(100), DeferredKind::AdvanceTurn { turn: 2 });
        queue.schedule(ms(100), DeferredKind::AnnounceBattleEnd);

        assert_eq!(
            queue.pop_due(ms(100)).unwrap().kind,
            DeferredKind::AdvanceTurn { turn: 2 }
        );
    }

    #[test]
    fn test_take_turn_advance() {
        let mut queue = DeferredQueue::new();
        queue.schedule(ms(1000), DeferredKind::AdvanceTurn { turn: 3 });
        queue.schedule(ms(2000), DeferredKind::AnnounceBattleEnd);

        assert_eq!(queue.take_turn_advance(), Some(3));
        assert_eq!(queue.take_turn_advance(), None);
        // The announcement stays queued
        assert_eq!(queue.next_due(), Some(ms(2000)));
        assert_eq!(
            queue.pop_due(ms(2000)).unwrap().kind,
            DeferredKind::AnnounceBattleEnd
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn test_clear_cancels() {
        let mut queue = DeferredQueue::new();
        queue.schedule(ms(10), DeferredKind::AnnounceBattleEnd);
        queue.clear();
        assert!(queue.pop_due(ms(1000)).is_none());
        assert_eq!(queue.next_due(), None);
    }
}
