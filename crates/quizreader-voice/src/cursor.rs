//! Advance-only word cursor
//!
//! Speech engines report word positions unevenly: repeated, out of order, or
//! late. The revealed index a reader sees must never move backwards, so every
//! update path goes through [`advance`].

use serde::{Deserialize, Serialize};

/// Merge a candidate position into the current one, never regressing.
///
/// `None` means nothing revealed yet.
pub fn advance(current: Option<usize>, candidate: usize) -> Option<usize> {
    Some(current.map_or(candidate, |c| c.max(candidate)))
}

/// Monotonic cursor over a word sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealCursor {
    index: Option<usize>,
}

impl RevealCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current revealed index, `None` before the first reveal.
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Apply a candidate position. Returns `true` when the observable index moved.
    pub fn advance(&mut self, candidate: usize) -> bool {
        let next = advance(self.index, candidate);
        let moved = next != self.index;
        self.index = next;
        moved
    }

    /// Number of words revealed so far
    pub fn revealed(&self) -> usize {
        self.index.map_or(0, |i| i + 1)
    }
}
