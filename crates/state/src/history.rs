//! Undo/redo history
//!
//! A bounded past stack, the current snapshot and a future stack. Restoring a
//! snapshot puts the store into the `Undoing` or `Redoing` phase; until
//! `finish_restore` is called, saves are ignored so the restore itself is
//! never recorded as a new change.

use blueprint_ir::{Entity, Relation};
use std::collections::VecDeque;
use tracing::debug;

/// Default number of past snapshots kept
pub const DEFAULT_MAX_ENTRIES: usize = 50;

/// The part of the project that undo/redo covers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphSnapshot {
    pub entities: Vec<Entity>,
    pub relations: Vec<Relation>,
}

/// What the history store is currently doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryPhase {
    #[default]
    Recording,
    Undoing,
    Redoing,
}

/// History state for undo/redo operations
#[derive(Debug, Clone)]
pub struct HistoryStore<S> {
    past: VecDeque<S>,
    current: Option<S>,
    future: VecDeque<S>,
    phase: HistoryPhase,
    max_entries: usize,
}

impl<S> Default for HistoryStore<S> {
    fn default() -> Self {
        Self {
            past: VecDeque::new(),
            current: None,
            future: VecDeque::new(),
            phase: HistoryPhase::Recording,
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

impl<S: Clone + PartialEq> HistoryStore<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create history with a custom bound on the past stack (minimum 1)
    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            max_entries: max_entries.max(1),
            ..Default::default()
        }
    }

    /// Record a new state. Returns `true` if it was recorded.
    ///
    /// Ignored while a restore is in progress, and when the state equals the
    /// current one.
    pub fn save_snapshot(&mut self, state: S) -> bool {
        if self.is_time_travelling() {
            return false;
        }
        if self.current.as_ref() == Some(&state) {
            return false;
        }

        if let Some(previous) = self.current.replace(state) {
            self.past.push_back(previous);
            while self.past.len() > self.max_entries {
                self.past.pop_front();
            }
        }
        self.future.clear();
        true
    }

    /// Step back. Returns the state to restore.
    pub fn undo(&mut self) -> Option<S> {
        if self.current.is_none() {
            return None;
        }
        let previous = self.past.pop_back()?;
        if let Some(current) = self.current.replace(previous.clone()) {
            self.future.push_front(current);
        }
        self.phase = HistoryPhase::Undoing;
        debug!(past = self.past.len(), future = self.future.len(), "undo");
        Some(previous)
    }

    /// Step forward. Returns the state to restore.
    pub fn redo(&mut self) -> Option<S> {
        if self.current.is_none() {
            return None;
        }
        let next = self.future.pop_front()?;
        if let Some(current) = self.current.replace(next.clone()) {
            self.past.push_back(current);
        }
        self.phase = HistoryPhase::Redoing;
        debug!(past = self.past.len(), future = self.future.len(), "redo");
        Some(next)
    }

    /// The restored state has been applied; resume recording
    pub fn finish_restore(&mut self) {
        self.phase = HistoryPhase::Recording;
    }

    /// Forget everything, including the phase
    pub fn clear_history(&mut self) {
        self.past.clear();
        self.current = None;
        self.future.clear();
        self.phase = HistoryPhase::Recording;
    }

    pub fn phase(&self) -> HistoryPhase {
        self.phase
    }

    pub fn is_time_travelling(&self) -> bool {
        self.phase != HistoryPhase::Recording
    }

    pub fn current(&self) -> Option<&S> {
        self.current.as_ref()
    }

    pub fn can_undo(&self) -> bool {
        self.current.is_some() && !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        self.current.is_some() && !self.future.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.past.len()
    }

    pub fn redo_count(&self) -> usize {
        self.future.len()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_history() {
        let mut history: HistoryStore<u32> = HistoryStore::new();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert_eq!(history.undo(), None);

        history.save_snapshot(1);
        assert!(!history.can_undo());
        history.save_snapshot(2);
        assert!(history.can_undo());

        assert_eq!(history.undo(), Some(1));
        assert_eq!(history.phase(), HistoryPhase::Undoing);
        history.finish_restore();
        assert!(history.can_redo());

        assert_eq!(history.redo(), Some(2));
        assert_eq!(history.phase(), HistoryPhase::Redoing);
        history.finish_restore();
        assert_eq!(history.current(), Some(&2));
    }

    #[test]
    fn test_duplicate_snapshot_is_ignored() {
        let mut history = HistoryStore::new();
        assert!(history.save_snapshot(vec!["a".to_string()]));
        assert!(!history.save_snapshot(vec!["a".to_string()]));
        assert_eq!(history.undo_count(), 0);
    }

    #[test]
    fn test_saves_ignored_while_restoring() {
        let mut history = HistoryStore::new();
        history.save_snapshot(1);
        history.save_snapshot(2);
        history.undo();

        assert!(!history.save_snapshot(1));
        assert!(!history.save_snapshot(99));
        history.finish_restore();
        assert!(history.save_snapshot(99));
    }

    #[test]
    fn test_new_change_invalidates_future() {
        let mut history = HistoryStore::new();
        history.save_snapshot(1);
        history.save_snapshot(2);
        history.undo();
        history.finish_restore();
        assert_eq!(history.redo_count(), 1);

        history.save_snapshot(3);
        assert_eq!(history.redo_count(), 0);
        assert_eq!(history.undo(), Some(1));
    }

    #[test]
    fn test_past_is_bounded() {
        let mut history = HistoryStore::new();
        for i in 0..55 {
            history.save_snapshot(i);
        }
        assert_eq!(history.undo_count(), DEFAULT_MAX_ENTRIES);

        // The oldest entries were dropped
        let mut last = None;
        while let Some(state) = history.undo() {
            last = Some(state);
        }
        assert_eq!(last, Some(4));
    }

    #[test]
    fn test_custom_capacity() {
        let mut history = HistoryStore::with_max_entries(2);
        for i in 0..5 {
            history.save_snapshot(i);
        }
        assert_eq!(history.undo_count(), 2);
        assert_eq!(history.max_entries(), 2);
    }

    #[test]
    fn test_clear_history_resets_phase() {
        let mut history = HistoryStore::new();
        history.save_snapshot(1);
        history.save_snapshot(2);
        history.undo();

        history.clear_history();
        assert_eq!(history.phase(), HistoryPhase::Recording);
        assert_eq!(history.current(), None);
        assert!(history.save_snapshot(5));
    }

    #[test]
    fn test_graph_snapshot_deep_equality() {
        let entity = Entity::new("User");
        let a = GraphSnapshot {
            entities: vec![entity.clone()],
            relations: vec![],
        };
        let b = GraphSnapshot {
            entities: vec![entity],
            relations: vec![],
        };
        let mut history = HistoryStore::new();
        assert!(history.save_snapshot(a));
        assert!(!history.save_snapshot(b));
    }
}
