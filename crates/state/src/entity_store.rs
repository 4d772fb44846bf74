//! Entity store
//!
//! Holds every entity and its fields, the entity selection, and the grid used
//! to place new entities. The store knows nothing about relations or services:
//! a removal is announced through the single registered `RemovalListener`,
//! and dependent stores clean up before `remove` returns.

use crate::layout_store::AutoLayoutSignal;
use crate::selection::Selection;
use blueprint_core::{EngineResult, EntityId, FieldId, Position, RemovalListener};
use blueprint_ir::{DEFAULT_ENTITY_NAME, Entity, EntityPatch, Field, FieldPatch, derive_table_name};
use tracing::debug;

/// Default number of grid columns for new entities
pub const DEFAULT_GRID_COLUMNS: usize = 4;

/// Top-left corner of the placement grid
pub const GRID_ORIGIN: Position = Position { x: 100.0, y: 100.0 };

/// Horizontal distance between grid slots
pub const GRID_SPACING_X: f32 = 300.0;

/// Vertical distance between grid slots
pub const GRID_SPACING_Y: f32 = 250.0;

/// Owns every entity, the entity selection and the placement grid
pub struct EntityStore {
    entities: Vec<Entity>,
    selection: Selection,
    grid_columns: usize,
    listener: Option<Box<dyn RemovalListener>>,
    layout_signal: Option<AutoLayoutSignal>,
    revision: u64,
}

impl EntityStore {
    /// Create an empty store with the default grid
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            selection: Selection::new(),
            grid_columns: DEFAULT_GRID_COLUMNS,
            listener: None,
            layout_signal: None,
            revision: 0,
        }
    }

    /// Set the number of placement grid columns (minimum 1)
    pub fn with_grid_columns(mut self, columns: usize) -> Self {
        self.grid_columns = columns.max(1);
        self
    }

    /// Register the listener told about every entity removal
    pub fn set_listener(&mut self, listener: impl RemovalListener + 'static) {
        self.listener = Some(Box::new(listener));
    }

    /// Register the handle raised when bulk replacement needs a new layout
    pub fn set_layout_signal(&mut self, signal: AutoLayoutSignal) {
        self.layout_signal = Some(signal);
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Entity by id
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    /// First entity with exactly this name
    pub fn get_by_name(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name == name)
    }

    /// Whether the id names a stored entity
    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    /// Every entity, in insertion order
    pub fn all(&self) -> &[Entity] {
        &self.entities
    }

    /// Ids of every entity, in insertion order
    pub fn ids(&self) -> Vec<EntityId> {
        self.entities.iter().map(|e| e.id).collect()
    }

    /// Number of entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the store holds no entities
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Bumped on every change to the entity collection
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Current single and multi selection
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// The primary selected entity
    pub fn selected(&self) -> Option<EntityId> {
        self.selection.primary()
    }

    // ========================================================================
    // Entity lifecycle
    // ========================================================================

    /// Create an entity on the next free grid slot.
    ///
    /// A name that yields no table name (blank, punctuation only) is replaced
    /// by [`DEFAULT_ENTITY_NAME`].
    pub fn add(&mut self, name: impl Into<String>) -> Entity {
        let mut name = name.into();
        if derive_table_name(&name).is_empty() {
            name = DEFAULT_ENTITY_NAME.to_string();
        }
        let position = self.next_free_slot();
        let entity = Entity {
            position,
            ..Entity::new(name)
        };
        debug!(id = %entity.id, name = %entity.name, x = position.x, y = position.y, "entity added");
        self.entities.push(entity.clone());
        self.touch();
        entity
    }

    /// Insert a fully built entity as is
    pub fn insert(&mut self, entity: Entity) -> EntityId {
        let id = entity.id;
        self.entities.push(entity);
        self.touch();
        id
    }

    /// Apply a partial update. Unknown ids are ignored; a patch that would
    /// leave the entity invalid is rejected without changing it.
    pub fn update(&mut self, id: EntityId, patch: EntityPatch) -> EngineResult<bool> {
        let Some(entity) = self.entities.iter_mut().find(|e| e.id == id) else {
            return Ok(false);
        };
        let changed = entity.update(patch)?;
        if changed {
            debug!(%id, "entity updated");
            self.touch();
        }
        Ok(changed)
    }

    /// Remove an entity and notify the registered listener before returning.
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let pos = self.entities.iter().position(|e| e.id == id)?;
        let removed = self.entities.remove(pos);
        self.selection.forget(id);
        self.touch();
        debug!(%id, name = %removed.name, "entity removed");

        if let Some(listener) = &self.listener {
            listener.notify_removed(id);
        }
        Some(removed)
    }

    /// Replace every entity, e.g. from an import, and request a new layout
    pub fn set_entities(&mut self, entities: Vec<Entity>) {
        self.replace(entities);
        if let Some(signal) = &self.layout_signal {
            signal.raise();
        }
    }

    /// Replace every entity without requesting a layout (history restore)
    pub fn restore(&mut self, entities: Vec<Entity>) {
        self.replace(entities);
    }

    fn replace(&mut self, entities: Vec<Entity>) {
        self.entities = entities;
        let entities = &self.entities;
        self.selection
            .retain(|id| entities.iter().any(|e| e.id == id));
        self.touch();
    }

    // ========================================================================
    // Selection
    // ========================================================================

    /// Select one entity or none; clears the multi-selection
    pub fn select(&mut self, id: Option<EntityId>) {
        if id.is_some_and(|id| !self.contains(id)) {
            return;
        }
        self.selection.select(id);
    }

    /// Add or remove an entity from the multi-selection
    pub fn toggle_multi_select(&mut self, id: EntityId) {
        if self.contains(id) {
            self.selection.toggle(id);
        }
    }

    /// Drop the primary and multi selection
    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    // ========================================================================
    // Fields
    // ========================================================================

    /// Add a field. `Ok(None)` when the entity is unknown.
    pub fn add_field(&mut self, entity_id: EntityId, field: Field) -> EngineResult<Option<FieldId>> {
        let Some(entity) = self.entities.iter_mut().find(|e| e.id == entity_id) else {
            return Ok(None);
        };
        let field_id = entity.add_field(field)?;
        self.touch();
        Ok(Some(field_id))
    }

    /// Update a field. `Ok(false)` when the entity or field is unknown.
    pub fn update_field(
        &mut self,
        entity_id: EntityId,
        field_id: FieldId,
        patch: FieldPatch,
    ) -> EngineResult<bool> {
        let Some(entity) = self.entities.iter_mut().find(|e| e.id == entity_id) else {
            return Ok(false);
        };
        let changed = entity.update_field(field_id, patch)?;
        if changed {
            self.touch();
        }
        Ok(changed)
    }

    /// Remove a field. `None` when the entity or field is unknown.
    pub fn remove_field(&mut self, entity_id: EntityId, field_id: FieldId) -> Option<Field> {
        let removed = self
            .entities
            .iter_mut()
            .find(|e| e.id == entity_id)?
            .remove_field(field_id)?;
        self.touch();
        Some(removed)
    }

    // ========================================================================
    // Positions
    // ========================================================================

    /// Move an entity. Returns `true` if the position changed.
    pub fn update_position(&mut self, id: EntityId, position: Position) -> bool {
        let changed = match self.entities.iter_mut().find(|e| e.id == id) {
            Some(entity) if entity.position != position => {
                entity.position = position;
                true
            }
            _ => false,
        };
        if changed {
            self.touch();
        }
        changed
    }

    /// Move several entities by the same delta
    pub fn translate(&mut self, ids: &[EntityId], delta: Position) -> usize {
        if delta.is_zero() {
            return 0;
        }
        let mut moved = 0;
        for entity in self.entities.iter_mut().filter(|e| ids.contains(&e.id)) {
            entity.translate(delta);
            moved += 1;
        }
        if moved > 0 {
            self.touch();
        }
        moved
    }

    /// Grid position of a slot index
    pub fn slot_position(&self, index: usize) -> Position {
        let col = index % self.grid_columns;
        let row = index / self.grid_columns;
        GRID_ORIGIN.offset(col as f32 * GRID_SPACING_X, row as f32 * GRID_SPACING_Y)
    }

    fn next_free_slot(&self) -> Position {
        let mut index = self.entities.len();
        loop {
            let candidate = self.slot_position(index);
            if !self.entities.iter().any(|e| e.position == candidate) {
                return candidate;
            }
            index += 1;
        }
    }

    fn touch(&mut self) {
        self.revision += 1;
    }
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EntityStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityStore")
            .field("entities", &self.entities.len())
            .field("selection", &self.selection)
            .field("revision", &self.revision)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
