//! Entity selection state
//!
//! The primary selection drives the detail panel; the multi-selection is the
//! set built up with modifier clicks.

use blueprint_core::EntityId;
use std::collections::HashSet;

/// Tracks which entities are currently selected
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    /// Entity shown in the detail panel
    primary: Option<EntityId>,
    /// Multi-selected entities, in toggle order
    multi: Vec<EntityId>,
}

impl Selection {
    /// Create a new empty selection
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all selections
    pub fn clear(&mut self) {
        self.primary = None;
        self.multi.clear();
    }

    /// Check if anything is selected
    pub fn is_empty(&self) -> bool {
        self.primary.is_none() && self.multi.is_empty()
    }

    /// Select a single entity, or nothing. Clears the multi-selection.
    pub fn select(&mut self, id: Option<EntityId>) {
        self.multi.clear();
        self.primary = id;
    }

    /// Toggle an entity in the multi-selection.
    ///
    /// Toggling on makes the entity primary. Toggling off the primary entity
    /// hands primary to the most recently toggled remaining member, if any.
    pub fn toggle(&mut self, id: EntityId) {
        if let Some(pos) = self.multi.iter().position(|x| *x == id) {
            self.multi.remove(pos);
            if self.primary == Some(id) {
                self.primary = self.multi.last().copied();
            }
        } else {
            self.multi.push(id);
            self.primary = Some(id);
        }
    }

    /// Drop an entity from every part of the selection
    pub fn forget(&mut self, id: EntityId) {
        self.multi.retain(|x| *x != id);
        if self.primary == Some(id) {
            self.primary = None;
        }
    }

    /// Keep only entities for which the predicate holds
    pub fn retain(&mut self, mut keep: impl FnMut(EntityId) -> bool) {
        self.multi.retain(|x| keep(*x));
        if self.primary.is_some_and(|id| !keep(id)) {
            self.primary = None;
        }
    }

    /// The primary selection
    pub fn primary(&self) -> Option<EntityId> {
        self.primary
    }

    /// The multi-selection, in toggle order
    pub fn multi(&self) -> &[EntityId] {
        &self.multi
    }

    /// Check if a specific entity is selected in any way
    pub fn contains(&self, id: EntityId) -> bool {
        self.primary == Some(id) || self.multi.contains(&id)
    }

    /// Every selected entity, primary first, without duplicates
    pub fn all(&self) -> Vec<EntityId> {
        let mut seen = HashSet::new();
        self.primary
            .iter()
            .chain(self.multi.iter())
            .copied()
            .filter(|id| seen.insert(*id))
            .collect()
    }

    /// Get count of selected entities
    pub fn count(&self) -> usize {
        self.all().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_select_clears_multi() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let mut selection = Selection::new();
        selection.toggle(a);
        selection.toggle(b);
        assert_eq!(selection.count(), 2);

        selection.select(Some(a));
        assert!(selection.multi().is_empty());
        assert_eq!(selection.primary(), Some(a));
    }

    #[test]
    fn test_toggle_tracks_last_toggled() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let mut selection = Selection::new();

        selection.toggle(a);
        selection.toggle(b);
        selection.toggle(c);
        assert_eq!(selection.primary(), Some(c));

        // Toggling off the primary hands it to the newest remaining member
        selection.toggle(c);
        assert_eq!(selection.primary(), Some(b));

        // Toggling off a non-primary member leaves primary alone
        selection.toggle(a);
        assert_eq!(selection.primary(), Some(b));

        selection.toggle(b);
        assert!(selection.is_empty());
    }

    #[test]
    fn test_forget() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let mut selection = Selection::new();
        selection.toggle(a);
        selection.toggle(b);

        selection.forget(b);
        assert_eq!(selection.primary(), None);
        assert_eq!(selection.multi(), &[a]);
        assert!(!selection.contains(b));
    }

    #[test]
    fn test_all_dedupes_primary() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let mut selection = Selection::new();
        selection.toggle(a);
        selection.toggle(b);
        assert_eq!(selection.all(), vec![b, a]);
    }
}
