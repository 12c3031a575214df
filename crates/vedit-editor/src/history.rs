//! Undo/Redo snapshot stacks.
//!
//! Every structural mutation records the whole document state as it was
//! *before* the mutation. Undo swaps the current state with the newest
//! `past` entry; redo does the same against `future`. There is no
//! branching: recording a new entry drops the redo path.
//!
//! Continuous gestures use **snapshot batching**: while a batch is open only
//! the first pre-mutation snapshot is kept, and closing the outermost batch
//! pushes it as a single undo step.

use std::collections::VecDeque;

/// Bounded linear history over snapshots of type `T`.
///
/// `T` is expected to be cheap to clone (the store uses persistent
/// collections), since undo and redo move whole states between stacks.
#[derive(Debug, Clone)]
pub struct History<T> {
    past: VecDeque<T>,
    future: Vec<T>,
    /// Maximum number of `past` entries.
    max_size: usize,
    /// Batch nesting depth (0 = not batching).
    batch_depth: usize,
    /// Pre-mutation snapshot captured by the first record inside a batch.
    batch_snapshot: Option<T>,
}

impl<T: Clone> History<T> {
    pub fn new(max_size: usize) -> Self {
        let max_size = max_size.max(1);
        Self {
            past: VecDeque::with_capacity(max_size),
            future: Vec::new(),
            max_size,
            batch_depth: 0,
            batch_snapshot: None,
        }
    }

    /// Record the state as it was before a structural mutation.
    pub fn record(&mut self, snapshot: T) {
        if self.batch_depth > 0 {
            // Keep only the state from before the first mutation in the batch.
            if self.batch_snapshot.is_none() {
                self.batch_snapshot = Some(snapshot);
                self.future.clear();
            }
            return;
        }
        self.push(snapshot);
    }

    /// Push onto `past`, evicting the oldest entry past the bound, and clear
    /// the redo path.
    fn push(&mut self, snapshot: T) {
        self.past.push_back(snapshot);
        if self.past.len() > self.max_size {
            self.past.pop_front();
            log::trace!("history: evicted oldest entry (limit {})", self.max_size);
        }
        self.future.clear();
    }

    /// Open a batch group. Batches nest; only the outermost close records.
    pub fn begin_batch(&mut self) {
        self.batch_depth += 1;
    }

    /// Close a batch group. When the outermost batch closes and anything was
    /// recorded inside it, one entry is pushed.
    pub fn end_batch(&mut self) {
        if self.batch_depth == 0 {
            return;
        }
        self.batch_depth -= 1;
        if self.batch_depth == 0
            && let Some(snapshot) = self.batch_snapshot.take()
        {
            self.push(snapshot);
        }
    }

    /// Close every open batch.
    fn flush_batch(&mut self) {
        if self.batch_depth > 0 {
            self.batch_depth = 1;
            self.end_batch();
        }
    }

    pub fn is_batching(&self) -> bool {
        self.batch_depth > 0
    }

    /// Step back. `current` goes onto `future`; the returned snapshot is the
    /// state to restore. Returns `None` (and keeps `current`) if there is
    /// nothing to undo.
    pub fn undo(&mut self, current: T) -> Option<T> {
        self.flush_batch();
        let previous = self.past.pop_back()?;
        self.future.push(current);
        Some(previous)
    }

    /// Step forward. `current` goes onto `past`; the returned snapshot is the
    /// state to restore. Returns `None` if there is nothing to redo.
    pub fn redo(&mut self, current: T) -> Option<T> {
        self.flush_batch();
        let next = self.future.pop()?;
        self.past.push_back(current);
        if self.past.len() > self.max_size {
            self.past.pop_front();
        }
        Some(next)
    }

    /// True if `undo` would restore something, counting a pending batch.
    pub fn can_undo(&self) -> bool {
        !self.past.is_empty() || self.batch_snapshot.is_some()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn past_len(&self) -> usize {
        self.past.len()
    }

    pub fn future_len(&self) -> usize {
        self.future.len()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Drop all history, including any open batch.
    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
        self.batch_depth = 0;
        self.batch_snapshot = None;
    }
}
