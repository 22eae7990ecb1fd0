//! "Starts soon" warnings for one-time broadcasts.
//!
//! A scheduled stream with an absolute start time warns once when the start
//! falls inside the lookahead window. Recurring schedules never warn.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use castdeck_core::types::StreamStatus;

use crate::history::Snapshot;

/// A stream that just entered the lookahead window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpcomingWarning {
    pub stream_id: String,
    pub title: String,
    pub starts_in: chrono::Duration,
}

impl UpcomingWarning {
    /// Human-readable message, rounded up to whole minutes.
    pub fn message(&self) -> String {
        let minutes = (self.starts_in.num_seconds() + 59) / 60;
        let unit = if minutes == 1 { "minute" } else { "minutes" };
        format!("Stream '{}' starts in {} {}", self.title, minutes, unit)
    }
}

pub struct UpcomingEvaluator {
    lookahead: chrono::Duration,
    /// Stream ids that already warned. Never cleared.
    notified: HashSet<String>,
}

impl UpcomingEvaluator {
    pub fn new(lookahead: chrono::Duration) -> Self {
        Self {
            lookahead,
            notified: HashSet::new(),
        }
    }

    /// Warnings due at `now`, in snapshot order. Each stream id is returned
    /// at most once over the evaluator's lifetime.
    pub fn evaluate(&mut self, snapshot: &Snapshot, now: DateTime<Utc>) -> Vec<UpcomingWarning> {
        let mut warnings = Vec::new();

        for stream in snapshot.streams() {
            if stream.status != StreamStatus::Scheduled {
                continue;
            }
            let Some(start) = stream.schedule.start_at() else {
                continue;
            };
            let delta = start - now;
            // Already started (or starting this instant): never warn retroactively.
            if delta <= chrono::Duration::zero() || delta > self.lookahead {
                continue;
            }
            if !self.notified.insert(stream.id.clone()) {
                continue;
            }

            tracing::info!("⏰ Stream '{}' starts in {}s", stream.title, delta.num_seconds());
            warnings.push(UpcomingWarning {
                stream_id: stream.id.clone(),
                title: stream.title.clone(),
                starts_in: delta,
            });
        }

        warnings
    }

    pub fn has_notified(&self, stream_id: &str) -> bool {
        self.notified.contains(stream_id)
    }

    pub fn notified_count(&self) -> usize {
        self.notified.len()
    }
}
