//! Bounded undo/redo over definition snapshots.
//!
//! # Responsibility
//! - Keep a linear list of committed snapshots and a cursor into it.
//!
//! # Invariants
//! - `index < snapshots.len()` whenever the history is non-empty.
//! - Committing drops every snapshot after the cursor (the redo branch).
//! - Length never exceeds `max_depth`; the oldest snapshot is evicted first.

use crate::config::DEFAULT_HISTORY_DEPTH;
use crate::model::definition::FormDefinition;
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryError {
    NothingToUndo,
    NothingToRedo,
}

impl Display for HistoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NothingToUndo => write!(f, "nothing to undo"),
            Self::NothingToRedo => write!(f, "nothing to redo"),
        }
    }
}

impl Error for HistoryError {}

/// Snapshot history with a movable cursor.
#[derive(Debug, Clone)]
pub struct HistoryManager {
    snapshots: Vec<Arc<FormDefinition>>,
    index: usize,
    max_depth: usize,
}

impl HistoryManager {
    /// Starts a history whose only entry is `initial`.
    pub fn new(initial: Arc<FormDefinition>, max_depth: usize) -> Self {
        Self {
            snapshots: vec![initial],
            index: 0,
            max_depth: max_depth.max(1),
        }
    }

    pub fn with_default_depth(initial: Arc<FormDefinition>) -> Self {
        Self::new(initial, DEFAULT_HISTORY_DEPTH)
    }

    /// Appends `snapshot` after the cursor, discarding any redo branch.
    pub fn commit(&mut self, snapshot: Arc<FormDefinition>) {
        self.snapshots.truncate(self.index + 1);
        self.snapshots.push(snapshot);
        if self.snapshots.len() > self.max_depth {
            let excess = self.snapshots.len() - self.max_depth;
            self.snapshots.drain(..excess);
        }
        self.index = self.snapshots.len() - 1;
        debug!(
            "event=history_commit module=history status=ok depth={} index={}",
            self.snapshots.len(),
            self.index
        );
    }

    /// Moves the cursor back one step and returns that snapshot.
    ///
    /// # Errors
    /// - `HistoryError::NothingToUndo` at the oldest snapshot.
    pub fn undo(&mut self) -> Result<Arc<FormDefinition>, HistoryError> {
        if !self.can_undo() {
            return Err(HistoryError::NothingToUndo);
        }
        self.index -= 1;
        Ok(Arc::clone(&self.snapshots[self.index]))
    }

    /// Moves the cursor forward one step and returns that snapshot.
    ///
    /// # Errors
    /// - `HistoryError::NothingToRedo` at the newest snapshot.
    pub fn redo(&mut self) -> Result<Arc<FormDefinition>, HistoryError> {
        if !self.can_redo() {
            return Err(HistoryError::NothingToRedo);
        }
        self.index += 1;
        Ok(Arc::clone(&self.snapshots[self.index]))
    }

    /// Drops every entry and restarts from `snapshot`.
    pub fn reset(&mut self, snapshot: Arc<FormDefinition>) {
        self.snapshots.clear();
        self.snapshots.push(snapshot);
        self.index = 0;
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.snapshots.len()
    }

    pub fn current(&self) -> Arc<FormDefinition> {
        Arc::clone(&self.snapshots[self.index])
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

#[cfg(test)]
mod tests {
    use super::{HistoryError, HistoryManager};
    use crate::model::definition::FormDefinition;
    use std::sync::Arc;

    fn named(name: &str) -> Arc<FormDefinition> {
        Arc::new(FormDefinition::new(name))
    }

    #[test]
    fn commit_after_undo_drops_redo_branch() {
        let mut history = HistoryManager::with_default_depth(named("a"));
        history.commit(named("b"));
        history.commit(named("c"));
        history.undo().unwrap();
        history.commit(named("d"));
        assert!(!history.can_redo());
        assert_eq!(history.len(), 3);
        assert_eq!(history.current().name, "d");
    }

    #[test]
    fn depth_bound_evicts_oldest() {
        let mut history = HistoryManager::new(named("0"), 3);
        for name in ["1", "2", "3", "4"] {
            history.commit(named(name));
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.index(), 2);
        history.undo().unwrap();
        assert_eq!(history.undo().unwrap().name, "2");
        assert_eq!(history.undo().err(), Some(HistoryError::NothingToUndo));
    }

    #[test]
    fn redo_at_head_is_an_error() {
        let mut history = HistoryManager::with_default_depth(named("a"));
        assert_eq!(history.redo().err(), Some(HistoryError::NothingToRedo));
        assert_eq!(history.undo().err(), Some(HistoryError::NothingToUndo));
    }
}
