//! # Undo/Redo History
//!
//! Bounded history of document states for the in-memory remote.
//!
//! ## Design
//!
//! - Each command records the state it replaced
//! - Undo restores the most recent recorded state and keeps the current
//!   one for redo
//! - New commands clear the redo stack
//! - The oldest entry is dropped once `max_levels` is exceeded
//!
//! Restoring a state is expressed as a [`delta`](crate::delta::delta) so
//! clients receive an ordinary payload.

use crate::document::Document;

#[derive(Debug)]
pub struct History {
    /// States before each applied command (most recent last)
    undo_stack: Vec<Document>,

    /// States undone, available for redo (most recent last)
    redo_stack: Vec<Document>,

    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    /// Create a history with default max levels (100)
    pub fn new() -> Self {
        Self::with_max_levels(100)
    }

    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_levels,
        }
    }

    /// Record the state a command is about to replace
    pub fn record(&mut self, previous: Document) {
        self.undo_stack.push(previous);

        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
            self.undo_stack.remove(0);
        }

        self.redo_stack.clear();
    }

    /// State to restore on undo, `None` when exhausted
    pub fn undo(&mut self, current: &Document) -> Option<Document> {
        let previous = self.undo_stack.pop()?;
        self.redo_stack.push(current.clone());
        Some(previous)
    }

    /// State to restore on redo, `None` when exhausted
    pub fn redo(&mut self, current: &Document) -> Option<Document> {
        let next = self.redo_stack.pop()?;
        self.undo_stack.push(current.clone());
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
