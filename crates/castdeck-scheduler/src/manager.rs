//! Stream manager — the single owner of stream state.
//!
//! Edits, status changes and clock ticks all go through here. Every
//! mutation lands in history as exactly one new snapshot; events for the
//! notification sink are pushed before that snapshot is committed.
//!
//! Every Live stream in the current snapshot has exactly one armed
//! auto-stop, tagged with a Live period number. Timers from an earlier
//! period are dropped when they fire.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use castdeck_core::clock::Clock;
use castdeck_core::config::SchedulerConfig;
use castdeck_core::error::Result;
use castdeck_core::traits::{AccountDirectory, NotificationSink};
use castdeck_core::types::{
    Destination, NotificationKind, StreamEvent, StreamRecord, StreamStatus,
};

use crate::history::{History, Snapshot};
use crate::notify::NotificationCenter;
use crate::status::{self, Effect, Rejection, TransitionOutcome};
use crate::timers::{TimerAction, TimerQueue};
use crate::upcoming::UpcomingEvaluator;

/// Result of a status change request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    /// The stream now has this status.
    Applied(StreamStatus),
    Rejected(Rejection),
    /// No stream with that id in the current snapshot.
    UnknownStream,
}

/// What a single clock tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TickReport {
    /// Streams moved to Ended by auto-stop timers.
    pub ended: Vec<String>,
    /// Streams that got a "starts soon" warning.
    pub warned: Vec<String>,
}

impl TickReport {
    pub fn is_empty(&self) -> bool {
        self.ended.is_empty() && self.warned.is_empty()
    }
}

pub struct StreamManager<S: NotificationSink = NotificationCenter> {
    history: History<Snapshot>,
    upcoming: UpcomingEvaluator,
    timers: TimerQueue,
    /// Current Live period per stream id. Only timers tagged with it may end the stream.
    live_periods: HashMap<String, u64>,
    next_period: u64,
    sink: S,
    clock: Arc<dyn Clock>,
    pub(crate) accounts: Option<Arc<dyn AccountDirectory>>,
    config: SchedulerConfig,
}

impl<S: NotificationSink> StreamManager<S> {
    /// Create a manager whose history starts at `seed`.
    pub fn new(
        seed: Vec<StreamRecord>,
        sink: S,
        clock: Arc<dyn Clock>,
        config: SchedulerConfig,
    ) -> Self {
        let snapshot = Snapshot::new(seed);
        tracing::info!("📅 Stream manager ready with {} streams", snapshot.len());
        let mut manager = Self {
            history: History::new(snapshot),
            upcoming: UpcomingEvaluator::new(config.lookahead()),
            timers: TimerQueue::new(),
            live_periods: HashMap::new(),
            next_period: 0,
            sink,
            clock,
            accounts: None,
            config,
        };
        manager.sync_auto_stops();
        manager
    }

    /// Attach the connected-account directory used to check and label
    /// integrated destinations.
    pub fn with_accounts(mut self, accounts: Arc<dyn AccountDirectory>) -> Self {
        self.accounts = Some(accounts);
        self
    }

    /// Current streams in display order.
    pub fn streams(&self) -> &[StreamRecord] {
        self.history.current().streams()
    }

    /// Shared handle to the current snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.history.snapshot()
    }

    pub fn stream(&self, id: &str) -> Option<&StreamRecord> {
        self.history.current().get(id)
    }

    /// Insert or replace a stream. An unknown id is appended as a new stream.
    ///
    /// Fails only on structural problems, in which case nothing is committed.
    /// Integrated destinations whose account is gone or belongs to another
    /// platform are logged and kept.
    pub fn save_stream(&mut self, record: StreamRecord) -> Result<()> {
        record.validate()?;
        self.check_destinations(&record);

        let current = self.history.current();
        let created = current.get(&record.id).is_none();
        let title = record.title.clone();
        let next = current.upserted(record);
        self.history.commit(next);
        self.sync_auto_stops();

        if created {
            tracing::info!("💾 Stream created: '{}'", title);
        } else {
            tracing::info!("💾 Stream updated: '{}' (snapshot {})", title, self.history.cursor());
        }
        Ok(())
    }

    /// Remove a stream. Unknown ids are a no-op and commit nothing.
    pub fn delete_stream(&mut self, id: &str) -> bool {
        match self.history.current().without(id) {
            Some(next) => {
                self.history.commit(next);
                self.sync_auto_stops();
                tracing::info!("🗑️ Stream deleted: {}", id);
                true
            }
            None => {
                tracing::debug!("Delete ignored, no stream {}", id);
                false
            }
        }
    }

    pub fn undo(&mut self) -> bool {
        let moved = self.history.undo();
        if moved {
            self.sync_auto_stops();
        }
        tracing::debug!("↩️ Undo (moved: {}, cursor: {})", moved, self.history.cursor());
        moved
    }

    pub fn redo(&mut self) -> bool {
        let moved = self.history.redo();
        if moved {
            self.sync_auto_stops();
        }
        tracing::debug!("↪️ Redo (moved: {}, cursor: {})", moved, self.history.cursor());
        moved
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn cursor(&self) -> usize {
        self.history.cursor()
    }

    /// Ask for a stream to move to `target` now.
    pub fn request_status_change(&mut self, id: &str, target: StreamStatus) -> StatusChange {
        let now = self.clock.now();
        self.apply_status_change(id, target, now)
    }

    /// Advance to `now`: fire due auto-stop timers, then check which
    /// scheduled streams are about to start.
    pub fn on_tick(&mut self, now: DateTime<Utc>) -> TickReport {
        let mut report = TickReport::default();

        for action in self.timers.pop_due(now) {
            match action {
                TimerAction::EndStream { stream_id, period } => {
                    if self.live_periods.get(&stream_id) != Some(&period) {
                        tracing::debug!("⏲️ Stale auto-stop for {} (period {}) dropped", stream_id, period);
                        continue;
                    }
                    if let StatusChange::Applied(_) =
                        self.apply_status_change(&stream_id, StreamStatus::Ended, now)
                    {
                        report.ended.push(stream_id);
                    }
                }
            }
        }

        let snapshot = self.history.snapshot();
        for warning in self.upcoming.evaluate(&snapshot, now) {
            self.sink.push(StreamEvent {
                kind: NotificationKind::Warning,
                message: warning.message(),
                stream_id: Some(warning.stream_id.clone()),
                timestamp: now,
            });
            report.warned.push(warning.stream_id);
        }

        report
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Auto-stop timers not yet popped, including stale ones.
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    fn apply_status_change(
        &mut self,
        id: &str,
        target: StreamStatus,
        now: DateTime<Utc>,
    ) -> StatusChange {
        let Some(record) = self.history.current().get(id) else {
            tracing::debug!("Status change ignored, no stream {}", id);
            return StatusChange::UnknownStream;
        };

        let (next, effects) = match status::transition(record, target, self.config.fallback_live()) {
            TransitionOutcome::Applied { record, effects } => (record, effects),
            TransitionOutcome::Rejected(rejection) => {
                tracing::debug!("Status change {} → {} rejected: {:?}", id, target, rejection);
                return StatusChange::Rejected(rejection);
            }
        };

        tracing::info!("🎬 Stream '{}' {} → {}", next.title, record.status, target);

        for effect in effects {
            match effect {
                Effect::Notify { kind, message } => self.sink.push(StreamEvent {
                    kind,
                    message,
                    stream_id: Some(id.to_string()),
                    timestamp: now,
                }),
                Effect::ScheduleAutoStop { after } => self.arm_auto_stop(id, now, after),
            }
        }
        if target != StreamStatus::Live {
            self.live_periods.remove(id);
        }

        let snapshot = self.history.current().upserted(next);
        self.history.commit(snapshot);
        StatusChange::Applied(target)
    }

    /// Start a new Live period for `id` and queue its auto-stop.
    fn arm_auto_stop(&mut self, id: &str, now: DateTime<Utc>, after: chrono::Duration) {
        let Some(fire_at) = now.checked_add_signed(after) else {
            tracing::warn!("⚠️ Auto-stop for {} is out of range, stream stays live", id);
            self.live_periods.remove(id);
            return;
        };
        let period = self.next_period;
        self.next_period += 1;
        self.live_periods.insert(id.to_string(), period);
        self.timers.schedule(
            fire_at,
            TimerAction::EndStream {
                stream_id: id.to_string(),
                period,
            },
        );
    }

    /// Reconcile Live periods with the current snapshot after the cursor
    /// moved or a record was replaced. Streams no longer Live lose their
    /// period; Live streams without one get a fresh full-length auto-stop.
    fn sync_auto_stops(&mut self) {
        let current = self.history.snapshot();
        self.live_periods
            .retain(|id, _| current.get(id).is_some_and(|s| s.status == StreamStatus::Live));

        let now = self.clock.now();
        for stream in current.streams() {
            if stream.status != StreamStatus::Live || self.live_periods.contains_key(&stream.id) {
                continue;
            }
            let after = stream
                .schedule
                .auto_stop_duration()
                .unwrap_or(self.config.fallback_live());
            tracing::debug!("⏲️ Re-arming auto-stop for live stream '{}'", stream.title);
            self.arm_auto_stop(&stream.id, now, after);
        }
    }

    fn check_destinations(&self, record: &StreamRecord) {
        let Some(accounts) = &self.accounts else {
            return;
        };
        for destination in &record.destinations {
            let Destination::Integrated {
                id,
                platform,
                account_id,
                ..
            } = destination
            else {
                continue;
            };
            match accounts.lookup_account(account_id) {
                None => tracing::warn!(
                    "⚠️ Stream '{}' destination {} uses disconnected account {}",
                    record.id,
                    id,
                    account_id
                ),
                Some(account) if account.platform != *platform => tracing::warn!(
                    "⚠️ Stream '{}' destination {} targets {} but account {} is on {}",
                    record.id,
                    id,
                    platform,
                    account_id,
                    account.platform
                ),
                Some(_) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use castdeck_core::clock::ManualClock;
    use castdeck_core::error::CastDeckError;
    use castdeck_core::types::{Schedule, VideoSource};
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap()
    }

    fn demo() -> StreamRecord {
        StreamRecord::new(
            "demo-id",
            "Demo",
            VideoSource::upload("demo.mp4"),
            Schedule::once(t0() + chrono::Duration::hours(1)),
        )
    }

    fn manager_with(seed: Vec<StreamRecord>) -> (StreamManager, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(t0()));
        let manager = StreamManager::new(
            seed,
            NotificationCenter::default(),
            clock.clone(),
            SchedulerConfig::default(),
        );
        (manager, clock)
    }

    fn kinds(manager: &StreamManager) -> Vec<NotificationKind> {
        manager.sink().list().map(|n| n.kind).collect()
    }

    #[test]
    fn test_start_undo_then_edit_truncates_future() {
        let (mut manager, _clock) = manager_with(vec![demo()]);

        assert_eq!(
            manager.request_status_change("demo-id", StreamStatus::Live),
            StatusChange::Applied(StreamStatus::Live)
        );
        assert_eq!(manager.history_len(), 2);
        assert_eq!(manager.cursor(), 1);
        assert_eq!(manager.stream("demo-id").unwrap().status, StreamStatus::Live);
        assert_eq!(kinds(&manager), vec![NotificationKind::Success]);

        assert!(manager.undo());
        assert_eq!(manager.cursor(), 0);
        assert_eq!(manager.stream("demo-id").unwrap().status, StreamStatus::Scheduled);

        let mut renamed = demo();
        renamed.title = "Demo (edited)".into();
        manager.save_stream(renamed).unwrap();

        assert_eq!(manager.history_len(), 2);
        assert!(!manager.can_redo());
        let current = manager.stream("demo-id").unwrap();
        assert_eq!(current.title, "Demo (edited)");
        assert_eq!(current.status, StreamStatus::Scheduled);
    }

    #[test]
    fn test_save_unknown_id_appends() {
        let other = StreamRecord::new("other", "Other", VideoSource::upload("o.mp4"), Schedule::once(t0()));
        let (mut manager, _clock) = manager_with(vec![demo(), other]);

        let new = StreamRecord::new("new", "New", VideoSource::upload("n.mp4"), Schedule::once(t0()));
        manager.save_stream(new).unwrap();

        let ids: Vec<&str> = manager.streams().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["demo-id", "other", "new"]);
        assert_eq!(manager.history_len(), 2);
    }

    #[test]
    fn test_invalid_save_commits_nothing() {
        let (mut manager, _clock) = manager_with(vec![demo()]);
        let mut broken = demo();
        broken.title = String::new();

        assert!(matches!(
            manager.save_stream(broken),
            Err(CastDeckError::InvalidStream(_))
        ));
        assert_eq!(manager.history_len(), 1);
        assert_eq!(manager.stream("demo-id").unwrap().title, "Demo");
    }

    #[test]
    fn test_delete_unknown_is_true_noop() {
        let (mut manager, _clock) = manager_with(vec![demo()]);

        assert!(!manager.delete_stream("missing"));
        assert_eq!(manager.history_len(), 1);
        assert!(!manager.can_undo());

        assert!(manager.delete_stream("demo-id"));
        assert!(manager.streams().is_empty());
        assert!(manager.undo());
        assert_eq!(manager.streams().len(), 1);
    }

    #[test]
    fn test_rejected_transitions_commit_nothing() {
        let (mut manager, _clock) = manager_with(vec![demo()]);

        assert_eq!(
            manager.request_status_change("demo-id", StreamStatus::Scheduled),
            StatusChange::Rejected(Rejection::Unchanged)
        );
        assert_eq!(
            manager.request_status_change("demo-id", StreamStatus::Ended),
            StatusChange::Rejected(Rejection::Illegal {
                from: StreamStatus::Scheduled,
                to: StreamStatus::Ended,
            })
        );
        assert_eq!(
            manager.request_status_change("nope", StreamStatus::Live),
            StatusChange::UnknownStream
        );
        assert_eq!(manager.history_len(), 1);
        assert!(manager.sink().is_empty());
        assert_eq!(manager.pending_timers(), 0);
    }

    #[test]
    fn test_failure_is_terminal() {
        let (mut manager, _clock) = manager_with(vec![demo()]);
        manager.request_status_change("demo-id", StreamStatus::Error);

        assert_eq!(manager.stream("demo-id").unwrap().status, StreamStatus::Error);
        assert_eq!(kinds(&manager), vec![NotificationKind::Error]);
        assert!(matches!(
            manager.request_status_change("demo-id", StreamStatus::Live),
            StatusChange::Rejected(Rejection::Illegal { .. })
        ));
        assert_eq!(manager.pending_timers(), 0);
    }

    #[test]
    fn test_auto_stop_fires_once() {
        let mut stream = demo();
        stream.schedule = stream.schedule.clone().with_auto_stop(30);
        let (mut manager, clock) = manager_with(vec![stream]);

        manager.request_status_change("demo-id", StreamStatus::Live);
        assert_eq!(manager.pending_timers(), 1);

        let early = manager.on_tick(clock.advance(chrono::Duration::minutes(29)));
        assert!(early.ended.is_empty());

        let at_d = manager.on_tick(clock.advance(chrono::Duration::minutes(1)));
        assert_eq!(at_d.ended, vec!["demo-id".to_string()]);
        assert_eq!(manager.stream("demo-id").unwrap().status, StreamStatus::Ended);

        // A stray second timer at 2D must not produce another transition.
        manager.timers.schedule(
            t0() + chrono::Duration::minutes(60),
            TimerAction::EndStream {
                stream_id: "demo-id".into(),
                period: u64::MAX,
            },
        );
        let at_2d = manager.on_tick(clock.advance(chrono::Duration::minutes(30)));
        assert!(at_2d.ended.is_empty());
        assert_eq!(
            kinds(&manager),
            vec![NotificationKind::Info, NotificationKind::Success]
        );
        assert_eq!(manager.history_len(), 3);
    }

    #[test]
    fn test_manual_stop_neutralises_pending_timer() {
        let (mut manager, clock) = manager_with(vec![demo()]);

        manager.request_status_change("demo-id", StreamStatus::Live);
        clock.advance(chrono::Duration::seconds(10));
        assert_eq!(
            manager.request_status_change("demo-id", StreamStatus::Ended),
            StatusChange::Applied(StreamStatus::Ended)
        );

        // Fallback is 60s; the timer fires into an already-ended stream.
        let report = manager.on_tick(clock.advance(chrono::Duration::seconds(60)));
        assert!(report.ended.is_empty());
        assert_eq!(manager.pending_timers(), 0);
        assert_eq!(manager.history_len(), 3);
    }

    #[test]
    fn test_timer_after_undo_is_noop() {
        let (mut manager, clock) = manager_with(vec![demo()]);

        manager.request_status_change("demo-id", StreamStatus::Live);
        manager.undo();

        let report = manager.on_tick(clock.advance(chrono::Duration::seconds(60)));
        assert!(report.ended.is_empty());
        assert_eq!(manager.stream("demo-id").unwrap().status, StreamStatus::Scheduled);
        assert!(manager.can_redo());
    }

    #[test]
    fn test_restarted_stream_ignores_timer_from_earlier_live_period() {
        let (mut manager, clock) = manager_with(vec![demo()]);

        manager.request_status_change("demo-id", StreamStatus::Live);
        clock.advance(chrono::Duration::seconds(10));
        manager.undo();
        clock.advance(chrono::Duration::seconds(40));
        manager.request_status_change("demo-id", StreamStatus::Live);

        // The first period's timer comes due at +60s.
        let report = manager.on_tick(clock.advance(chrono::Duration::seconds(10)));
        assert!(report.ended.is_empty());
        assert_eq!(manager.stream("demo-id").unwrap().status, StreamStatus::Live);

        // The restart's own timer comes due at +110s.
        let report = manager.on_tick(clock.advance(chrono::Duration::seconds(50)));
        assert_eq!(report.ended, vec!["demo-id".to_string()]);
        assert_eq!(manager.stream("demo-id").unwrap().status, StreamStatus::Ended);
    }

    #[test]
    fn test_undo_of_auto_stop_rearms_timer() {
        let (mut manager, clock) = manager_with(vec![demo()]);

        manager.request_status_change("demo-id", StreamStatus::Live);
        let report = manager.on_tick(clock.advance(chrono::Duration::seconds(60)));
        assert_eq!(report.ended.len(), 1);
        assert_eq!(manager.pending_timers(), 0);

        assert!(manager.undo());
        assert_eq!(manager.stream("demo-id").unwrap().status, StreamStatus::Live);
        assert_eq!(manager.pending_timers(), 1);

        let report = manager.on_tick(clock.advance(chrono::Duration::hours(10)));
        assert_eq!(report.ended, vec!["demo-id".to_string()]);
        assert_eq!(manager.stream("demo-id").unwrap().status, StreamStatus::Ended);
    }

    #[test]
    fn test_redo_into_live_rearms_once() {
        let (mut manager, clock) = manager_with(vec![demo()]);

        manager.request_status_change("demo-id", StreamStatus::Live);
        manager.undo();
        manager.redo();
        manager.undo();
        manager.redo();
        assert_eq!(manager.stream("demo-id").unwrap().status, StreamStatus::Live);

        let report = manager.on_tick(clock.advance(chrono::Duration::seconds(60)));
        assert_eq!(report.ended, vec!["demo-id".to_string()]);
        assert_eq!(manager.pending_timers(), 0);
        assert_eq!(
            kinds(&manager),
            vec![NotificationKind::Info, NotificationKind::Success]
        );
    }

    #[test]
    fn test_live_seed_stream_gets_auto_stop() {
        let live = demo().with_status(StreamStatus::Live);
        let (mut manager, clock) = manager_with(vec![live]);
        assert_eq!(manager.pending_timers(), 1);

        let report = manager.on_tick(clock.advance(chrono::Duration::seconds(60)));
        assert_eq!(report.ended, vec!["demo-id".to_string()]);
    }

    #[test]
    fn test_tick_warns_once_for_stream_starting_soon() {
        let soon = StreamRecord::new(
            "soon",
            "FFmpeg Tutorial",
            VideoSource::upload("ffmpeg.mp4"),
            Schedule::once(t0() + chrono::Duration::minutes(4)),
        );
        let (mut manager, clock) = manager_with(vec![demo(), soon]);

        let mut warned = Vec::new();
        for _ in 0..10 {
            let report = manager.on_tick(clock.advance(chrono::Duration::minutes(1)));
            warned.extend(report.warned);
        }
        assert_eq!(warned, vec!["soon".to_string()]);
        let warning = manager.sink().latest().unwrap();
        assert_eq!(warning.kind, NotificationKind::Warning);
        assert!(warning.message.contains("FFmpeg Tutorial"));
        // Ticks never commit.
        assert_eq!(manager.history_len(), 1);
    }

    #[test]
    fn test_events_pushed_with_clock_time() {
        let (mut manager, clock) = manager_with(vec![demo()]);
        let started_at = clock.advance(chrono::Duration::seconds(5));
        manager.request_status_change("demo-id", StreamStatus::Live);

        let notification = manager.sink().latest().unwrap();
        assert_eq!(notification.created_at, started_at);
        assert_eq!(notification.stream_id.as_deref(), Some("demo-id"));
    }
}
