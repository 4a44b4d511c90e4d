//! Undo log for destructive bindings.

use log::trace;

use crate::term::{CellId, Heap, Word};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Entry {
    ChoicePoint,
    Binding(CellId),
}

/// LIFO record of bound cells, segmented by choice points.
#[derive(Debug, Clone, Default)]
pub struct Trail {
    entries: Vec<Entry>,
}

impl Trail {
    /// Create an empty trail
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a choice point.
    pub fn insert_choicepoint(&mut self) {
        self.entries.push(Entry::ChoicePoint);
    }

    /// Remember that `cell` was bound so it can be reset later.
    pub fn record(&mut self, cell: CellId) {
        self.entries.push(Entry::Binding(cell));
    }

    /// Reset every cell bound since the most recent choice point, then drop
    /// that choice point. Stops quietly if the trail runs out first.
    ///
    /// Returns the number of cells reset.
    pub fn undo_bindings(&mut self, heap: &mut Heap) -> usize {
        let mut reset = 0;
        while let Some(entry) = self.entries.pop() {
            match entry {
                Entry::Binding(cell) => {
                    heap.set(cell, Word::UNBOUND);
                    reset += 1;
                }
                Entry::ChoicePoint => break,
            }
        }
        trace!("undid {reset} binding(s)");
        reset
    }

    /// Number of entries, choice points included
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the trail holds no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of open choice points.
    #[must_use]
    pub fn choicepoints(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| matches!(entry, Entry::ChoicePoint))
            .count()
    }

    /// Forget every entry past the first `len` without touching the heap.
    pub fn truncate(&mut self, len: usize) {
        self.entries.truncate(len);
    }

    /// Forget everything without touching the heap.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
