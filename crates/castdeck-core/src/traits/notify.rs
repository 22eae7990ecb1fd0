//! Notification sink — where scheduler events end up.

use crate::types::StreamEvent;

/// Receives typed events from the scheduler and owns their presentation.
///
/// Calls are fire-and-forget from the scheduler's point of view.
pub trait NotificationSink: Send {
    /// Record a new event.
    fn push(&mut self, event: StreamEvent);

    /// Mark one notification read. Returns `false` for an unknown id.
    fn mark_read(&mut self, id: &str) -> bool;

    /// Mark every notification read.
    fn mark_all_read(&mut self);
}
