//! Linear undo/redo history of immutable snapshots.
//!
//! The history only ever truncates-and-appends or moves its cursor; past
//! snapshots are never rewritten.

use std::sync::Arc;

use castdeck_core::types::StreamRecord;

/// Ordered versions of a value plus the index of the current one.
#[derive(Debug, Clone)]
pub struct History<T> {
    entries: Vec<Arc<T>>,
    /// Always a valid index into `entries`.
    cursor: usize,
}

impl<T> History<T> {
    /// Start a history with `seed` as its only snapshot.
    pub fn new(seed: T) -> Self {
        Self {
            entries: vec![Arc::new(seed)],
            cursor: 0,
        }
    }

    /// The snapshot at the cursor.
    pub fn current(&self) -> &T {
        &self.entries[self.cursor]
    }

    /// Shared handle to the snapshot at the cursor.
    pub fn snapshot(&self) -> Arc<T> {
        Arc::clone(&self.entries[self.cursor])
    }

    /// Drop every snapshot after the cursor, append `next`, and point at it.
    pub fn commit(&mut self, next: T) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push(Arc::new(next));
        self.cursor = self.entries.len() - 1;
    }

    /// Step back one snapshot. Returns `false` at the first snapshot.
    pub fn undo(&mut self) -> bool {
        if !self.can_undo() {
            return false;
        }
        self.cursor -= 1;
        true
    }

    /// Step forward one snapshot. Returns `false` at the last snapshot.
    pub fn redo(&mut self) -> bool {
        if !self.can_redo() {
            return false;
        }
        self.cursor += 1;
        true
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.entries.len() - 1
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of snapshots, including any redo tail. Never zero.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// One complete version of the stream collection, in display order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    streams: Vec<StreamRecord>,
}

impl Snapshot {
    /// Build a snapshot. Records failing validation, and later records with
    /// an id already seen, are dropped.
    pub fn new(streams: Vec<StreamRecord>) -> Self {
        let mut unique: Vec<StreamRecord> = Vec::with_capacity(streams.len());
        for stream in streams {
            if let Err(e) = stream.validate() {
                tracing::warn!("⚠️ Invalid stream '{}' dropped from snapshot: {e}", stream.id);
                continue;
            }
            if unique.iter().any(|s| s.id == stream.id) {
                tracing::warn!("⚠️ Duplicate stream id '{}' dropped from snapshot", stream.id);
                continue;
            }
            unique.push(stream);
        }
        Self { streams: unique }
    }

    pub fn streams(&self) -> &[StreamRecord] {
        &self.streams
    }

    pub fn get(&self, id: &str) -> Option<&StreamRecord> {
        self.streams.iter().find(|s| s.id == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.streams.iter().position(|s| s.id == id)
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// New snapshot with `record` replacing the entry of the same id in
    /// place, or appended at the end when the id is new.
    pub fn upserted(&self, record: StreamRecord) -> Snapshot {
        let mut streams = self.streams.clone();
        match streams.iter().position(|s| s.id == record.id) {
            Some(idx) => streams[idx] = record,
            None => streams.push(record),
        }
        Snapshot { streams }
    }

    /// New snapshot without `id`, or `None` if there is nothing to remove.
    pub fn without(&self, id: &str) -> Option<Snapshot> {
        let idx = self.position(id)?;
        let mut streams = self.streams.clone();
        streams.remove(idx);
        Some(Snapshot { streams })
    }
}
