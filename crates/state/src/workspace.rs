//! Project facade
//!
//! `Workspace` owns the project metadata and one handle to every store. It
//! wires the removal listeners once, orchestrates settle/undo/redo against the
//! history store, and performs atomic import, export and reset.
//!
//! Domain operations settle on their own. Geometry writes coming from the
//! canvas (`update_entity_positions`, `move_service`) do not: the canvas layer
//! settles once a drag has ended.

use crate::config::EngineConfig;
use crate::connection_store::ConnectionStore;
use crate::entity_store::EntityStore;
use crate::history::{GraphSnapshot, HistoryPhase, HistoryStore};
use crate::layout_store::LayoutStore;
use crate::relation_store::RelationStore;
use crate::service_store::ServiceStore;
use crate::view::ProjectView;
use crate::Shared;
use blueprint_core::{
    CommunicationType, ConnectionId, EngineResult, EntityId, FieldId, ListenerChain, Position,
    RelationId, RelationType, ServiceId, Validatable,
};
use blueprint_ir::{
    Entity, EntityPatch, Field, FieldPatch, ProjectConfig, ProjectDocument, Relation,
    RelationPatch, Service, ServiceConnection, ServicePatch, Validator, export_to_string,
    parse_document,
};
use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashSet;
use std::rc::Rc;
use tracing::{debug, info};

pub struct Workspace {
    config: EngineConfig,
    project: ProjectConfig,
    entities: Shared<EntityStore>,
    relations: Shared<RelationStore>,
    services: Shared<ServiceStore>,
    connections: Shared<ConnectionStore>,
    layout: Shared<LayoutStore>,
    history: HistoryStore<GraphSnapshot>,
    /// Entity and relation revisions at the last settle
    settled: (u64, u64),
}

impl Workspace {
    /// Assemble the stores and wire the cascade listeners
    pub fn new(config: EngineConfig) -> Self {
        let entities = Rc::new(RefCell::new(
            EntityStore::new().with_grid_columns(config.layout.grid_columns),
        ));
        let relations = Rc::new(RefCell::new(RelationStore::new()));
        let services = Rc::new(RefCell::new(ServiceStore::with_palette(
            config.services.palette.clone(),
        )));
        let connections = Rc::new(RefCell::new(ConnectionStore::new()));
        let layout = Rc::new(RefCell::new(
            LayoutStore::new(Rc::clone(&entities), Rc::clone(&services))
                .with_grid_columns(config.layout.grid_columns)
                .with_density(config.layout.density),
        ));

        {
            let mut store = entities.borrow_mut();
            store.set_listener(
                ListenerChain::new()
                    .with(Rc::downgrade(&relations))
                    .with(Rc::downgrade(&services))
                    .with(Rc::downgrade(&layout)),
            );
            store.set_layout_signal(layout.borrow().signal());
        }
        services.borrow_mut().set_listener(
            ListenerChain::new()
                .with(Rc::downgrade(&connections))
                .with(Rc::downgrade(&layout)),
        );

        let history = HistoryStore::with_max_entries(config.history.max_entries);
        let mut workspace = Self {
            config,
            project: ProjectConfig::default(),
            entities,
            relations,
            services,
            connections,
            layout,
            history,
            settled: (0, 0),
        };
        workspace.record_baseline();
        workspace
    }

    /// Start a workspace for a named project
    pub fn with_project(config: EngineConfig, project: ProjectConfig) -> Self {
        let mut workspace = Self::new(config);
        workspace.project = project;
        workspace
    }

    // ========================================================================
    // Store access
    // ========================================================================

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn project(&self) -> &ProjectConfig {
        &self.project
    }

    pub fn set_project(&mut self, project: ProjectConfig) {
        self.project = project;
    }

    pub fn entities(&self) -> Ref<'_, EntityStore> {
        self.entities.borrow()
    }

    pub fn relations(&self) -> Ref<'_, RelationStore> {
        self.relations.borrow()
    }

    pub fn services(&self) -> Ref<'_, ServiceStore> {
        self.services.borrow()
    }

    pub fn connections(&self) -> Ref<'_, ConnectionStore> {
        self.connections.borrow()
    }

    pub fn layout(&self) -> Ref<'_, LayoutStore> {
        self.layout.borrow()
    }

    /// Mutable access to view state (mode, filter, expanded cards, density)
    pub fn layout_mut(&self) -> RefMut<'_, LayoutStore> {
        self.layout.borrow_mut()
    }

    pub fn history(&self) -> &HistoryStore<GraphSnapshot> {
        &self.history
    }

    // ========================================================================
    // Entities
    // ========================================================================

    /// Create an entity on the next free grid slot. A name that yields no
    /// table name falls back to `Entity`.
    pub fn add_entity(&mut self, name: impl Into<String>) -> EntityId {
        let id = self.entities.borrow_mut().add(name).id;
        self.settle();
        id
    }

    /// Apply a partial update. An update that would leave the entity invalid
    /// (empty name, no table name) is rejected and nothing changes.
    pub fn update_entity(&mut self, id: EntityId, patch: EntityPatch) -> EngineResult<bool> {
        let changed = self.entities.borrow_mut().update(id, patch)?;
        self.settle();
        Ok(changed)
    }

    /// Remove an entity along with every relation and assignment naming it
    pub fn remove_entity(&mut self, id: EntityId) -> Option<Entity> {
        let removed = self.entities.borrow_mut().remove(id);
        self.settle();
        removed
    }

    /// Remove the primary selection and every multi-selected entity
    pub fn remove_selected(&mut self) -> usize {
        let ids = self.entities.borrow().selection().all();
        let removed = ids
            .into_iter()
            .filter(|id| self.entities.borrow_mut().remove(*id).is_some())
            .count();
        if removed > 0 {
            debug!(removed, "selected entities removed");
        }
        self.settle();
        removed
    }

    pub fn add_field(&mut self, entity_id: EntityId, field: Field) -> EngineResult<Option<FieldId>> {
        let result = self.entities.borrow_mut().add_field(entity_id, field);
        self.settle();
        result
    }

    pub fn update_field(
        &mut self,
        entity_id: EntityId,
        field_id: FieldId,
        patch: FieldPatch,
    ) -> EngineResult<bool> {
        let result = self
            .entities
            .borrow_mut()
            .update_field(entity_id, field_id, patch);
        self.settle();
        result
    }

    pub fn remove_field(&mut self, entity_id: EntityId, field_id: FieldId) -> Option<Field> {
        let removed = self.entities.borrow_mut().remove_field(entity_id, field_id);
        self.settle();
        removed
    }

    pub fn select_entity(&mut self, id: Option<EntityId>) {
        self.entities.borrow_mut().select(id);
    }

    pub fn toggle_multi_select(&mut self, id: EntityId) {
        self.entities.borrow_mut().toggle_multi_select(id);
    }

    pub fn clear_selection(&mut self) {
        self.entities.borrow_mut().clear_selection();
    }

    // ========================================================================
    // Relations
    // ========================================================================

    /// Relate two live entities, naming the field, foreign key and join table
    /// after them. `None` when either endpoint is unknown.
    pub fn add_relation(
        &mut self,
        source: EntityId,
        target: EntityId,
        relation_type: RelationType,
    ) -> Option<RelationId> {
        let relation = self.complete_relation(Relation::new(source, target, relation_type))?;
        Some(self.push_relation(relation))
    }

    /// Insert a fully built relation, filling in any naming defaults it lacks.
    ///
    /// `Ok(None)` when either endpoint is unknown; an error when the relation
    /// does not validate.
    pub fn insert_relation(&mut self, relation: Relation) -> EngineResult<Option<RelationId>> {
        let Some(relation) = self.complete_relation(relation) else {
            return Ok(None);
        };
        relation.validate()?;
        Ok(Some(self.push_relation(relation)))
    }

    /// Apply a partial update. A type change to many-to-many gets a join
    /// table named after the endpoints; an invalid result is rejected.
    pub fn update_relation(&mut self, id: RelationId, patch: RelationPatch) -> EngineResult<bool> {
        let Some(mut next) = self.relations.borrow().get(id).cloned() else {
            return Ok(false);
        };
        next.apply(patch);
        let Some(next) = self.complete_relation(next) else {
            return Ok(false);
        };
        next.validate()?;

        let changed = self.relations.borrow_mut().replace(next);
        self.settle();
        Ok(changed)
    }

    fn push_relation(&mut self, relation: Relation) -> RelationId {
        let id = self.relations.borrow_mut().add(relation);
        self.settle();
        id
    }

    /// Fill naming defaults from the endpoint names. `None` when either
    /// endpoint is unknown.
    fn complete_relation(&self, relation: Relation) -> Option<Relation> {
        let entities = self.entities.borrow();
        let source = &entities.get(relation.source_entity_id)?.name;
        let target = &entities.get(relation.target_entity_id)?.name;
        Some(relation.with_defaults(source, target))
    }

    pub fn remove_relation(&mut self, id: RelationId) -> Option<Relation> {
        let removed = self.relations.borrow_mut().remove(id);
        self.settle();
        removed
    }

    pub fn select_relation(&mut self, id: Option<RelationId>) {
        self.relations.borrow_mut().select(id);
    }

    // ========================================================================
    // Services and connections
    // ========================================================================

    /// Create a service. A blank name falls back to `Service`.
    pub fn add_service(&mut self, name: impl Into<String>) -> ServiceId {
        self.services.borrow_mut().add(name).id
    }

    /// Apply a partial update; an update that would leave the service
    /// invalid is rejected and nothing changes
    pub fn update_service(&mut self, id: ServiceId, patch: ServicePatch) -> EngineResult<bool> {
        self.services.borrow_mut().update(id, patch)
    }

    /// Remove a service and its connections; its entities become unassigned
    pub fn remove_service(&mut self, id: ServiceId) -> Option<Service> {
        self.services.borrow_mut().remove(id)
    }

    pub fn select_service(&mut self, id: Option<ServiceId>) {
        self.services.borrow_mut().select(id);
    }

    /// Assign a live entity to a service, taking it from any previous owner
    pub fn assign_entity_to_service(&mut self, entity_id: EntityId, service_id: ServiceId) -> bool {
        if !self.entities.borrow().contains(entity_id) {
            return false;
        }
        self.services
            .borrow_mut()
            .assign_entity_to_service(entity_id, service_id)
    }

    pub fn assign_multiple(&mut self, entity_ids: &[EntityId], service_id: ServiceId) -> bool {
        let live: Vec<EntityId> = {
            let entities = self.entities.borrow();
            entity_ids
                .iter()
                .copied()
                .filter(|id| entities.contains(*id))
                .collect()
        };
        self.services.borrow_mut().assign_multiple(&live, service_id)
    }

    pub fn unassign_entity(&mut self, entity_id: EntityId) -> Option<ServiceId> {
        self.services.borrow_mut().unassign_entity(entity_id)
    }

    /// Connect two distinct live services. `None` otherwise.
    pub fn add_connection(
        &mut self,
        source: ServiceId,
        target: ServiceId,
        communication_type: CommunicationType,
    ) -> Option<ConnectionId> {
        {
            let services = self.services.borrow();
            if source == target || !services.contains(source) || !services.contains(target) {
                return None;
            }
        }
        Some(
            self.connections
                .borrow_mut()
                .add(ServiceConnection::new(source, target, communication_type)),
        )
    }

    pub fn remove_connection(&mut self, id: ConnectionId) -> Option<ServiceConnection> {
        self.connections.borrow_mut().remove(id)
    }

    // ========================================================================
    // Canvas geometry
    // ========================================================================

    /// Write absolute entity positions. Does not settle.
    pub fn update_entity_positions(&mut self, updates: &[(EntityId, Position)]) -> usize {
        self.layout.borrow().update_positions(updates)
    }

    /// Move a service and its entities. Does not settle.
    pub fn move_service(&mut self, id: ServiceId, position: Position) -> bool {
        self.layout.borrow().move_service(id, position)
    }

    pub fn update_service_dimensions(&mut self, id: ServiceId, width: f32, height: f32) -> bool {
        self.layout.borrow().update_dimensions(id, width, height)
    }

    /// Run auto-layout now and record the result
    pub fn apply_auto_layout(&mut self) {
        self.layout.borrow_mut().apply_auto_layout();
        self.settle();
    }

    /// Run auto-layout only if something requested it
    pub fn apply_pending_layout(&mut self) -> bool {
        if !self.layout.borrow().auto_layout_requested() {
            return false;
        }
        self.apply_auto_layout();
        true
    }

    // ========================================================================
    // History
    // ========================================================================

    /// Record the (entities, relations) graph if it changed since the last
    /// settle. Ignored while a restore is in progress.
    pub fn settle(&mut self) -> bool {
        if self.history.is_time_travelling() {
            return false;
        }
        let marker = self.revisions();
        if marker == self.settled {
            return false;
        }
        self.settled = marker;
        let recorded = self.history.save_snapshot(self.snapshot());
        if recorded {
            debug!(past = self.history.undo_count(), "snapshot recorded");
        }
        recorded
    }

    /// Restore the previous graph. Call [`finish_restore`](Self::finish_restore)
    /// once the consumer has applied it.
    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(snapshot) => {
                self.restore(snapshot);
                true
            }
            None => false,
        }
    }

    /// Restore the next graph. Call [`finish_restore`](Self::finish_restore)
    /// once the consumer has applied it.
    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(snapshot) => {
                self.restore(snapshot);
                true
            }
            None => false,
        }
    }

    /// The restored graph has been applied. Edits made meanwhile are recorded now.
    pub fn finish_restore(&mut self) {
        self.history.finish_restore();
        self.settle();
    }

    pub fn history_phase(&self) -> HistoryPhase {
        self.history.phase()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn restore(&mut self, snapshot: GraphSnapshot) {
        let existing: HashSet<EntityId> = snapshot.entities.iter().map(|e| e.id).collect();
        self.entities.borrow_mut().restore(snapshot.entities);
        self.relations.borrow_mut().set_relations(snapshot.relations);
        self.services
            .borrow_mut()
            .retain_entities(|id| existing.contains(&id));
        self.layout.borrow_mut().cleanup_deleted_entities(&existing);
        self.settled = self.revisions();
        debug!(phase = ?self.history.phase(), entities = existing.len(), "snapshot restored");
    }

    fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            entities: self.entities.borrow().all().to_vec(),
            relations: self.relations.borrow().all().to_vec(),
        }
    }

    fn revisions(&self) -> (u64, u64) {
        (
            self.entities.borrow().revision(),
            self.relations.borrow().revision(),
        )
    }

    fn record_baseline(&mut self) {
        self.history.clear_history();
        self.settled = self.revisions();
        self.history.save_snapshot(self.snapshot());
    }

    // ========================================================================
    // Import / export / reset
    // ========================================================================

    /// A composed, owned copy of the state for readers
    pub fn view(&self) -> ProjectView {
        let entities = self.entities.borrow();
        let relations = self.relations.borrow();
        let services = self.services.borrow();
        let layout = self.layout.borrow();
        ProjectView {
            project: self.project.clone(),
            entities: entities.all().to_vec(),
            relations: relations.all().to_vec(),
            services: services.all().to_vec(),
            connections: self.connections.borrow().all().to_vec(),
            selected_entity: entities.selected(),
            multi_selection: entities.selection().multi().to_vec(),
            selected_service: services.selected(),
            selected_relation: relations.selected(),
            mode: layout.mode(),
            filter: layout.filter(),
            expanded: layout.expanded().clone(),
            density: layout.density(),
        }
    }

    /// The exportable document, stamped with the export time
    pub fn export(&self) -> ProjectDocument {
        let doc = self.view().to_document().stamped();
        info!(
            project = %doc.project.name,
            entities = doc.entities.len(),
            services = doc.services.len(),
            "project exported"
        );
        doc
    }

    pub fn export_json(&self) -> EngineResult<String> {
        export_to_string(&self.export())
    }

    /// Parse, validate and load a JSON document. Nothing changes on error.
    pub fn import_json(&mut self, json: &str) -> EngineResult<()> {
        let doc = parse_document(json)?;
        self.load(doc);
        Ok(())
    }

    /// Validate and load a document. Nothing changes on error.
    pub fn import_document(&mut self, doc: ProjectDocument) -> EngineResult<()> {
        Validator::with_default_rules().validate_result(&doc)?;
        self.load(doc);
        Ok(())
    }

    fn load(&mut self, doc: ProjectDocument) {
        let stats = doc.stats();
        self.layout.borrow_mut().reset();
        self.project = doc.project;
        {
            let mut entities = self.entities.borrow_mut();
            entities.set_entities(doc.entities);
            entities.clear_selection();
        }
        self.relations.borrow_mut().set_relations(doc.relations);
        {
            let mut services = self.services.borrow_mut();
            services.set_services(doc.services);
            services.select(None);
        }
        self.connections
            .borrow_mut()
            .set_connections(doc.service_connections);
        self.record_baseline();
        info!(
            project = %self.project.name,
            entities = stats.entities,
            relations = stats.relations,
            services = stats.services,
            "project imported"
        );
    }

    /// Empty every store and start a fresh project
    pub fn reset(&mut self) {
        self.project = ProjectConfig::default();
        self.layout.borrow_mut().reset();
        self.entities.borrow_mut().restore(Vec::new());
        self.relations.borrow_mut().set_relations(Vec::new());
        {
            let mut services = self.services.borrow_mut();
            services.set_services(Vec::new());
            services.select(None);
        }
        self.connections.borrow_mut().set_connections(Vec::new());
        self.record_baseline();
        info!("workspace reset");
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("project", &self.project.name)
            .field("entities", &*self.entities.borrow())
            .field("services", &*self.services.borrow())
            .field("phase", &self.history.phase())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
