//! Broadcast lifecycle — the pure status transition function.
//!
//! ```text
//! Scheduled ──start──▶ Live ──stop / auto-stop──▶ Ended
//!     │
//!     └──fail──▶ Error
//! ```
//!
//! `transition` never touches timers or notifications itself. It hands
//! back [`Effect`]s and the caller carries them out, which is what lets a
//! late auto-stop fall through the same guard as a manual stop.

use castdeck_core::types::{NotificationKind, StreamRecord, StreamStatus};

/// Something the caller must do after an applied transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Forward a notification about the stream.
    Notify {
        kind: NotificationKind,
        message: String,
    },
    /// Arrange a Live → Ended transition after the given delay.
    ScheduleAutoStop { after: chrono::Duration },
}

/// Why a transition request was turned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The stream already has the requested status.
    Unchanged,
    /// The requested status is not reachable from the current one.
    Illegal { from: StreamStatus, to: StreamStatus },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    Applied {
        record: StreamRecord,
        effects: Vec<Effect>,
    },
    Rejected(Rejection),
}

/// Whether `from → to` is an edge of the lifecycle.
pub fn can_transition(from: StreamStatus, to: StreamStatus) -> bool {
    matches!(
        (from, to),
        (StreamStatus::Scheduled, StreamStatus::Live)
            | (StreamStatus::Scheduled, StreamStatus::Error)
            | (StreamStatus::Live, StreamStatus::Ended)
    )
}

/// Move `record` to `target`.
///
/// Going live schedules an auto-stop after the stream's configured
/// duration, or after `fallback_live` when auto-stop is off.
pub fn transition(
    record: &StreamRecord,
    target: StreamStatus,
    fallback_live: chrono::Duration,
) -> TransitionOutcome {
    let from = record.status;
    if from == target {
        return TransitionOutcome::Rejected(Rejection::Unchanged);
    }
    if !can_transition(from, target) {
        return TransitionOutcome::Rejected(Rejection::Illegal { from, to: target });
    }

    let effects = match target {
        StreamStatus::Live => vec![
            Effect::Notify {
                kind: NotificationKind::Success,
                message: format!("Stream '{}' is now live", record.title),
            },
            Effect::ScheduleAutoStop {
                after: record
                    .schedule
                    .auto_stop_duration()
                    .unwrap_or(fallback_live),
            },
        ],
        StreamStatus::Error => vec![Effect::Notify {
            kind: NotificationKind::Error,
            message: format!("Failed to start stream '{}'", record.title),
        }],
        StreamStatus::Ended => vec![Effect::Notify {
            kind: NotificationKind::Info,
            message: format!("Stream '{}' has ended", record.title),
        }],
        // No edge leads back to Scheduled.
        StreamStatus::Scheduled => Vec::new(),
    };

    TransitionOutcome::Applied {
        record: record.with_status(target),
        effects,
    }
}
