//! Bounded undo history.
//!
//! Entries are flat `CartSnapshot`s, most recent first. Pushing past the
//! limit drops the oldest entry.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::types::CartSnapshot;

pub const DEFAULT_UNDO_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoStack {
    entries: VecDeque<CartSnapshot>,
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_UNDO_LIMIT
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::with_limit(DEFAULT_UNDO_LIMIT)
    }
}

impl UndoStack {
    /// A limit of zero is treated as one.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recent entry.
    pub fn peek(&self) -> Option<&CartSnapshot> {
        self.entries.front()
    }

    pub fn push(&mut self, snapshot: CartSnapshot) {
        self.entries.push_front(snapshot);
        self.entries.truncate(self.limit);
    }

    pub fn pop(&mut self) -> Option<CartSnapshot> {
        self.entries.pop_front()
    }

    /// Change the limit, dropping the oldest entries if the stack is now too deep.
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit.max(1);
        self.entries.truncate(self.limit);
    }

    pub fn iter(&self) -> impl Iterator<Item = &CartSnapshot> {
        self.entries.iter()
    }
}
