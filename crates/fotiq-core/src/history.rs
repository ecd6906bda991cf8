//! Bounded linear undo/redo history of adjustment states.

use std::collections::VecDeque;

use crate::transform::params::AdjustmentState;

/// Linear history with a cursor.
///
/// The history always holds at least one entry. Pushing while the cursor is
/// behind the newest entry discards the redo tail. When the limit is reached
/// the oldest entry is evicted.
#[derive(Debug, Clone)]
pub struct EditHistory {
    entries: VecDeque<AdjustmentState>,
    cursor: usize,
    limit: usize,
}

impl EditHistory {
    /// Start a history whose only entry is `initial`.
    pub fn new(initial: AdjustmentState, limit: usize) -> Self {
        let mut entries = VecDeque::with_capacity(limit.max(1));
        entries.push_back(initial);
        Self {
            entries,
            cursor: 0,
            limit: limit.max(1),
        }
    }

    /// State under the cursor.
    pub fn current(&self) -> &AdjustmentState {
        &self.entries[self.cursor]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// Append `state` after the cursor and move the cursor onto it.
    pub fn push(&mut self, state: AdjustmentState) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push_back(state);
        while self.entries.len() > self.limit {
            self.entries.pop_front();
            tracing::debug!(limit = self.limit, "history full, evicted oldest entry");
        }
        self.cursor = self.entries.len() - 1;
    }

    /// Step back. Returns the new current state, or `None` at the oldest entry.
    pub fn undo(&mut self) -> Option<&AdjustmentState> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        Some(self.current())
    }

    /// Step forward. Returns the new current state, or `None` at the newest entry.
    pub fn redo(&mut self) -> Option<&AdjustmentState> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        Some(self.current())
    }

    /// Drop every entry and start over from `initial`.
    pub fn reset(&mut self, initial: AdjustmentState) {
        self.entries.clear();
        self.entries.push_back(initial);
        self.cursor = 0;
    }

    /// Entries from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &AdjustmentState> {
        self.entries.iter()
    }
}
