//! Notification center — the default in-memory notification sink.
//! Newest first, bounded ring buffer, bulk clear only.

use std::collections::VecDeque;

use castdeck_core::traits::NotificationSink;
use castdeck_core::types::{Notification, StreamEvent};

pub struct NotificationCenter {
    /// Newest at the front.
    history: VecDeque<Notification>,
    max_history: usize,
}

impl NotificationCenter {
    pub fn new(max_history: usize) -> Self {
        Self {
            history: VecDeque::new(),
            max_history: max_history.max(1),
        }
    }

    /// Notifications, newest first.
    pub fn list(&self) -> impl Iterator<Item = &Notification> {
        self.history.iter()
    }

    pub fn latest(&self) -> Option<&Notification> {
        self.history.front()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn unread_count(&self) -> usize {
        self.history.iter().filter(|n| !n.read).count()
    }

    /// Drop every notification.
    pub fn clear(&mut self) {
        self.history.clear();
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(100)
    }
}

impl NotificationSink for NotificationCenter {
    fn push(&mut self, event: StreamEvent) {
        tracing::debug!("📣 [{:?}] {}", event.kind, event.message);
        self.history.push_front(Notification {
            id: uuid::Uuid::new_v4().to_string(),
            kind: event.kind,
            message: event.message,
            stream_id: event.stream_id,
            read: false,
            created_at: event.timestamp,
        });
        self.history.truncate(self.max_history);
    }

    fn mark_read(&mut self, id: &str) -> bool {
        match self.history.iter_mut().find(|n| n.id == id) {
            Some(notification) => {
                notification.read = true;
                true
            }
            None => false,
        }
    }

    fn mark_all_read(&mut self) {
        for notification in self.history.iter_mut() {
            notification.read = true;
        }
    }
}
