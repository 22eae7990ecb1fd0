//! Deferred actions keyed by fire time.
//!
//! Entries are never cancelled. An action that fires after it stopped
//! making sense is dropped by its owner when popped.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerAction {
    /// Drive the stream from Live to Ended, if it is still in the Live
    /// period identified by `period`.
    EndStream { stream_id: String, period: u64 },
}

#[derive(Debug)]
struct TimerEntry {
    fire_at: DateTime<Utc>,
    /// Enqueue order, breaks ties between equal fire times.
    seq: u64,
    action: TimerAction,
}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TimerEntry {}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimerEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.fire_at, self.seq).cmp(&(other.fire_at, other.seq))
    }
}

/// Min-queue of pending timer actions.
#[derive(Debug, Default)]
pub struct TimerQueue {
    heap: BinaryHeap<Reverse<TimerEntry>>,
    next_seq: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, fire_at: DateTime<Utc>, action: TimerAction) {
        tracing::debug!("⏲️ Timer set for {} → {:?}", fire_at.to_rfc3339(), action);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(TimerEntry {
            fire_at,
            seq,
            action,
        }));
    }

    /// Remove and return every action due at `now`, earliest first, ties in
    /// enqueue order.
    pub fn pop_due(&mut self, now: DateTime<Utc>) -> Vec<TimerAction> {
        let mut due = Vec::new();
        while let Some(Reverse(entry)) = self.heap.peek() {
            if entry.fire_at > now {
                break;
            }
            if let Some(Reverse(entry)) = self.heap.pop() {
                due.push(entry.action);
            }
        }
        due
    }

    pub fn next_fire_at(&self) -> Option<DateTime<Utc>> {
        self.heap.peek().map(|Reverse(entry)| entry.fire_at)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
