//! Relation store
//!
//! Relations are kept in insertion order. The store drops every relation that
//! touches an entity as soon as the entity store announces its removal.

use blueprint_core::{CascadeTarget, EntityId, RelationId};
use blueprint_ir::Relation;
use tracing::debug;
use uuid::Uuid;

/// Owns every relation and the relation selection
#[derive(Debug, Default)]
pub struct RelationStore {
    relations: Vec<Relation>,
    selected: Option<RelationId>,
    revision: u64,
}

impl RelationStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Relation by id
    pub fn get(&self, id: RelationId) -> Option<&Relation> {
        self.relations.iter().find(|r| r.id == id)
    }

    /// Every relation, in insertion order
    pub fn all(&self) -> &[Relation] {
        &self.relations
    }

    /// Number of relations
    pub fn len(&self) -> usize {
        self.relations.len()
    }

    /// Whether the store holds no relations
    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    /// Bumped on every change to the relation collection
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Relations with the entity on either side
    pub fn relations_for_entity(&self, entity_id: EntityId) -> Vec<&Relation> {
        self.relations
            .iter()
            .filter(|r| r.involves_entity(entity_id))
            .collect()
    }

    /// Append a relation as given. Endpoints are not checked here.
    pub fn add(&mut self, relation: Relation) -> RelationId {
        let id = relation.id;
        debug!(
            %id,
            source = %relation.source_entity_id,
            target = %relation.target_entity_id,
            kind = %relation.relation_type,
            "relation added"
        );
        self.relations.push(relation);
        self.touch();
        id
    }

    /// Store a new version of an existing relation, matched by id.
    /// Returns `true` if it differed from the stored one.
    pub fn replace(&mut self, relation: Relation) -> bool {
        let Some(slot) = self.relations.iter_mut().find(|r| r.id == relation.id) else {
            return false;
        };
        if *slot == relation {
            return false;
        }
        debug!(id = %relation.id, kind = %relation.relation_type, "relation updated");
        *slot = relation;
        self.touch();
        true
    }

    /// Remove a relation, clearing the selection if it pointed there
    pub fn remove(&mut self, id: RelationId) -> Option<Relation> {
        let pos = self.relations.iter().position(|r| r.id == id)?;
        let removed = self.relations.remove(pos);
        if self.selected == Some(id) {
            self.selected = None;
        }
        self.touch();
        Some(removed)
    }

    /// Drop every relation that touches the entity. Returns how many went.
    pub fn remove_for_entity(&mut self, entity_id: EntityId) -> usize {
        let before = self.relations.len();
        self.relations.retain(|r| !r.involves_entity(entity_id));
        let removed = before - self.relations.len();

        if let Some(selected) = self.selected {
            if !self.relations.iter().any(|r| r.id == selected) {
                self.selected = None;
            }
        }
        if removed > 0 {
            debug!(%entity_id, removed, "relations cascaded");
            self.touch();
        }
        removed
    }

    /// Replace every relation
    pub fn set_relations(&mut self, relations: Vec<Relation>) {
        self.relations = relations;
        if self
            .selected
            .is_some_and(|id| !self.relations.iter().any(|r| r.id == id))
        {
            self.selected = None;
        }
        self.touch();
    }

    /// Select a relation, or clear with `None`. Unknown ids are ignored.
    pub fn select(&mut self, id: Option<RelationId>) {
        if id.is_none_or(|id| self.get(id).is_some()) {
            self.selected = id;
        }
    }

    /// The selected relation
    pub fn selected(&self) -> Option<RelationId> {
        self.selected
    }

    fn touch(&mut self) {
        self.revision += 1;
    }
}

impl CascadeTarget for RelationStore {
    fn cascade_removed(&mut self, id: Uuid) {
        self.remove_for_entity(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_for_entity_drops_both_directions() {
        let (user, order, tag) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let mut store = RelationStore::new();
        store.add(Relation::many_to_one(order, user));
        store.add(Relation::one_to_many(user, tag));
        let keep = store.add(Relation::many_to_many(order, tag));

        assert_eq!(store.remove_for_entity(user), 2);
        assert_eq!(store.len(), 1);
        assert_eq!(store.all()[0].id, keep);
        assert_eq!(store.remove_for_entity(user), 0);
    }

    #[test]
    fn test_cascade_clears_selection() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let mut store = RelationStore::new();
        let rel = store.add(Relation::many_to_one(a, b));
        store.select(Some(rel));

        store.cascade_removed(b);
        assert!(store.is_empty());
        assert_eq!(store.selected(), None);
    }

    #[test]
    fn test_relations_for_entity() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let mut store = RelationStore::new();
        store.add(Relation::many_to_one(a, b));
        store.add(Relation::many_to_one(b, c));
        assert_eq!(store.relations_for_entity(b).len(), 2);
        assert_eq!(store.relations_for_entity(a).len(), 1);
    }

    #[test]
    fn test_replace_and_remove() {
        let mut store = RelationStore::new();
        let id = store.add(Relation::many_to_one(Uuid::new_v4(), Uuid::new_v4()));
        let rev = store.revision();

        let mut next = store.get(id).unwrap().clone();
        assert!(!store.replace(next.clone()));
        next.bidirectional = true;
        assert!(store.replace(next.clone()));
        assert_eq!(store.revision(), rev + 1);
        assert!(store.get(id).unwrap().bidirectional);

        assert!(store.remove(id).is_some());
        assert!(store.remove(id).is_none());
        assert!(!store.replace(next));
    }
}
