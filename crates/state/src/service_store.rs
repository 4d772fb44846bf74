//! Service store
//!
//! Owns services and the entity-to-service assignment. An entity belongs to
//! at most one service: every assignment strips the entity from its previous
//! owner in the same pass that adds it to the new one.
//!
//! The store cleans assignments up when an entity disappears, and announces
//! its own removals to the registered listener (connections, layout).

use blueprint_core::{CascadeTarget, EngineResult, EntityId, Position, RemovalListener, ServiceId};
use blueprint_ir::service::BASE_PORT;
use blueprint_ir::{DEFAULT_SERVICE_NAME, PALETTE, Service, ServicePatch};
use tracing::debug;
use uuid::Uuid;

/// Gap between services placed side by side on creation
const SERVICE_GAP: f32 = 80.0;

/// Owns every service, its entity assignments and the color palette
pub struct ServiceStore {
    services: Vec<Service>,
    selected: Option<ServiceId>,
    palette: Vec<String>,
    color_cursor: usize,
    listener: Option<Box<dyn RemovalListener>>,
    revision: u64,
}

impl ServiceStore {
    /// Create an empty store using the built-in palette
    pub fn new() -> Self {
        Self::with_palette(PALETTE.iter().map(|c| c.to_string()).collect())
    }

    /// Create a store that hands out colors from a custom palette
    pub fn with_palette(palette: Vec<String>) -> Self {
        let palette = if palette.is_empty() {
            PALETTE.iter().map(|c| c.to_string()).collect()
        } else {
            palette
        };
        Self {
            services: Vec::new(),
            selected: None,
            palette,
            color_cursor: 0,
            listener: None,
            revision: 0,
        }
    }

    /// Register the listener told about every service removal
    pub fn set_listener(&mut self, listener: impl RemovalListener + 'static) {
        self.listener = Some(Box::new(listener));
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Service by id
    pub fn get(&self, id: ServiceId) -> Option<&Service> {
        self.services.iter().find(|s| s.id == id)
    }

    /// Whether the id names a stored service
    pub fn contains(&self, id: ServiceId) -> bool {
        self.get(id).is_some()
    }

    /// Every service, in insertion order
    pub fn all(&self) -> &[Service] {
        &self.services
    }

    /// Number of services
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Whether the store holds no services
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Bumped on every change to the service collection
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// The service that owns the entity, if any
    pub fn service_for_entity(&self, entity_id: EntityId) -> Option<&Service> {
        self.services.iter().find(|s| s.contains(entity_id))
    }

    /// The selected service
    pub fn selected(&self) -> Option<ServiceId> {
        self.selected
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Create a service with the next palette color, placed right of the
    /// last one. A blank name is replaced by [`DEFAULT_SERVICE_NAME`].
    pub fn add(&mut self, name: impl Into<String>) -> Service {
        let mut name = name.into();
        if name.trim().is_empty() {
            name = DEFAULT_SERVICE_NAME.to_string();
        }
        let color = self.palette[self.color_cursor % self.palette.len()].clone();
        self.color_cursor += 1;

        let x = self
            .services
            .iter()
            .map(|s| s.position.x + s.width + SERVICE_GAP)
            .fold(100.0_f32, f32::max);

        let mut service = Service::new(name, color).at(x, 100.0);
        service.config.port = port_for(self.services.len());

        debug!(id = %service.id, name = %service.name, color = %service.color, "service added");
        self.services.push(service.clone());
        self.touch();
        service
    }

    /// Insert a fully built service as is
    pub fn insert(&mut self, service: Service) -> ServiceId {
        let id = service.id;
        self.services.push(service);
        self.touch();
        id
    }

    /// Apply a partial update. Unknown ids are ignored; a patch that would
    /// leave the service invalid (blank name, port 0) is rejected.
    pub fn update(&mut self, id: ServiceId, patch: ServicePatch) -> EngineResult<bool> {
        let Some(service) = self.services.iter_mut().find(|s| s.id == id) else {
            return Ok(false);
        };
        let changed = service.update(patch)?;
        if changed {
            debug!(%id, "service updated");
            self.touch();
        }
        Ok(changed)
    }

    /// Remove a service and notify the registered listener before returning.
    ///
    /// Its entities become unassigned; they are not deleted.
    pub fn remove(&mut self, id: ServiceId) -> Option<Service> {
        let pos = self.services.iter().position(|s| s.id == id)?;
        let removed = self.services.remove(pos);
        if self.selected == Some(id) {
            self.selected = None;
        }
        self.touch();
        debug!(%id, name = %removed.name, "service removed");

        if let Some(listener) = &self.listener {
            listener.notify_removed(id);
        }
        Some(removed)
    }

    /// Replace every service
    pub fn set_services(&mut self, services: Vec<Service>) {
        self.services = services;
        if self
            .selected
            .is_some_and(|id| !self.services.iter().any(|s| s.id == id))
        {
            self.selected = None;
        }
        self.color_cursor = self.services.len();
        self.touch();
    }

    /// Replace the palette used for new services
    pub fn set_palette(&mut self, palette: Vec<String>) {
        if !palette.is_empty() {
            self.palette = palette;
        }
    }

    /// Select a service, or clear with `None`. Unknown ids are ignored.
    pub fn select(&mut self, id: Option<ServiceId>) {
        if id.is_none_or(|id| self.contains(id)) {
            self.selected = id;
        }
    }

    // ========================================================================
    // Assignment
    // ========================================================================

    /// Assign an entity to a service, removing it from any other service.
    ///
    /// Unknown services are ignored. Returns `true` if anything changed.
    pub fn assign_entity_to_service(&mut self, entity_id: EntityId, service_id: ServiceId) -> bool {
        self.assign_multiple(&[entity_id], service_id)
    }

    /// Assign several entities to one service in a single pass
    pub fn assign_multiple(&mut self, entity_ids: &[EntityId], service_id: ServiceId) -> bool {
        if !self.contains(service_id) {
            return false;
        }

        let mut changed = false;
        for service in &mut self.services {
            if service.id == service_id {
                for entity_id in entity_ids {
                    changed |= service.insert_entity(*entity_id);
                }
            } else {
                let before = service.entity_ids.len();
                service.entity_ids.retain(|id| !entity_ids.contains(id));
                changed |= service.entity_ids.len() != before;
            }
        }

        if changed {
            debug!(%service_id, count = entity_ids.len(), "entities assigned");
            self.touch();
        }
        changed
    }

    /// Remove the entity from whichever service owns it
    pub fn unassign_entity(&mut self, entity_id: EntityId) -> Option<ServiceId> {
        let service = self.services.iter_mut().find(|s| s.contains(entity_id))?;
        service.remove_entity(entity_id);
        let id = service.id;
        self.touch();
        Some(id)
    }

    /// Drop assignments of entities that no longer exist
    pub fn retain_entities(&mut self, mut exists: impl FnMut(EntityId) -> bool) -> usize {
        let mut dropped = 0;
        for service in &mut self.services {
            let before = service.entity_ids.len();
            service.entity_ids.retain(|id| exists(*id));
            dropped += before - service.entity_ids.len();
        }
        if dropped > 0 {
            self.touch();
        }
        dropped
    }

    // ========================================================================
    // Geometry
    // ========================================================================

    /// Move a service. Returns the applied delta, or `None` if unknown.
    pub fn update_position(&mut self, id: ServiceId, position: Position) -> Option<Position> {
        let service = self.services.iter_mut().find(|s| s.id == id)?;
        let delta = position - service.position;
        if delta.is_zero() {
            return Some(delta);
        }
        service.position = position;
        self.touch();
        Some(delta)
    }

    /// Resize a service. Non-positive sizes are ignored.
    /// Returns `true` if the size changed.
    pub fn update_dimensions(&mut self, id: ServiceId, width: f32, height: f32) -> bool {
        if width <= 0.0 || height <= 0.0 {
            return false;
        }
        let changed = match self.services.iter_mut().find(|s| s.id == id) {
            Some(s) if s.width != width || s.height != height => {
                s.width = width;
                s.height = height;
                true
            }
            _ => false,
        };
        if changed {
            self.touch();
        }
        changed
    }

    fn touch(&mut self) {
        self.revision += 1;
    }
}

/// Port of the service created at `index`; saturates at `u16::MAX`
fn port_for(index: usize) -> u16 {
    BASE_PORT.saturating_add(u16::try_from(index).unwrap_or(u16::MAX))
}

impl Default for ServiceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ServiceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceStore")
            .field("services", &self.services.len())
            .field("selected", &self.selected)
            .field("revision", &self.revision)
            .finish()
    }
}

impl CascadeTarget for ServiceStore {
    /// An entity went away: strip it from its owner
    fn cascade_removed(&mut self, id: Uuid) {
        if let Some(service_id) = self.unassign_entity(id) {
            debug!(entity_id = %id, %service_id, "assignment cascaded");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn owners(store: &ServiceStore, entity: EntityId) -> usize {
        store.all().iter().filter(|s| s.contains(entity)).count()
    }

    #[test]
    fn test_colors_round_robin() {
        let mut store = ServiceStore::with_palette(vec!["red".into(), "blue".into()]);
        let colors: Vec<String> = (0..3).map(|i| store.add(format!("S{}", i)).color).collect();
        assert_eq!(colors, vec!["red", "blue", "red"]);
    }

    #[test]
    fn test_add_places_services_side_by_side() {
        let mut store = ServiceStore::new();
        let a = store.add("A");
        let b = store.add("B");
        assert_eq!(a.position, Position::new(100.0, 100.0));
        assert_eq!(b.position.x, 100.0 + a.width + SERVICE_GAP);
        assert_eq!(b.config.port, BASE_PORT + 1);
    }

    #[test]
    fn test_blank_name_uses_default() {
        let mut store = ServiceStore::new();
        assert_eq!(store.add(" ").name, DEFAULT_SERVICE_NAME);
        assert_eq!(store.add("Billing").name, "Billing");
    }

    #[test]
    fn test_port_saturates() {
        assert_eq!(port_for(0), BASE_PORT);
        assert_eq!(port_for(2), BASE_PORT + 2);
        assert_eq!(port_for(70_000), u16::MAX);
        assert_eq!(port_for(usize::MAX), u16::MAX);
    }

    #[test]
    fn test_update_rejects_invalid_patch() {
        let mut store = ServiceStore::new();
        let billing = store.add("Billing").id;
        let rev = store.revision();

        assert!(store.update(billing, ServicePatch::rename("")).is_err());
        assert_eq!(store.get(billing).unwrap().name, "Billing");
        assert_eq!(store.revision(), rev);

        assert!(store.update(billing, ServicePatch::rename("Payments")).unwrap());
        assert!(!store.update(Uuid::new_v4(), ServicePatch::rename("X")).unwrap());
    }

    #[test]
    fn test_reassignment_moves_entity() {
        let mut store = ServiceStore::new();
        let a = store.add("A").id;
        let b = store.add("B").id;
        let x = Uuid::new_v4();

        assert!(store.assign_entity_to_service(x, a));
        assert!(store.assign_entity_to_service(x, b));

        assert!(store.get(a).unwrap().entity_ids.is_empty());
        assert_eq!(store.get(b).unwrap().entity_ids, vec![x]);

        // Idempotent
        assert!(!store.assign_entity_to_service(x, b));
        assert_eq!(owners(&store, x), 1);
    }

    #[test]
    fn test_single_owner_under_mixed_sequence() {
        let mut store = ServiceStore::new();
        let services: Vec<ServiceId> = (0..3).map(|i| store.add(format!("S{}", i)).id).collect();
        let entities: Vec<EntityId> = (0..4).map(|_| Uuid::new_v4()).collect();

        store.assign_multiple(&entities, services[0]);
        store.assign_entity_to_service(entities[1], services[2]);
        store.assign_multiple(&entities[1..3], services[1]);
        store.unassign_entity(entities[0]);
        store.assign_entity_to_service(entities[3], services[2]);

        for entity in &entities {
            assert!(owners(&store, *entity) <= 1);
        }
        assert_eq!(
            store.service_for_entity(entities[1]).map(|s| s.id),
            Some(services[1])
        );
        assert!(store.service_for_entity(entities[0]).is_none());
    }

    #[test]
    fn test_assign_to_unknown_service_is_noop() {
        let mut store = ServiceStore::new();
        let a = store.add("A").id;
        let x = Uuid::new_v4();
        store.assign_entity_to_service(x, a);

        assert!(!store.assign_entity_to_service(x, Uuid::new_v4()));
        assert_eq!(store.get(a).unwrap().entity_ids, vec![x]);
    }

    #[test]
    fn test_cascade_removes_assignment() {
        let mut store = ServiceStore::new();
        let a = store.add("A").id;
        let x = Uuid::new_v4();
        store.assign_entity_to_service(x, a);

        store.cascade_removed(x);
        assert!(store.get(a).unwrap().entity_ids.is_empty());
    }

    #[derive(Default)]
    struct Recorder {
        removed: RefCell<Vec<Uuid>>,
    }

    impl RemovalListener for Recorder {
        fn notify_removed(&self, id: Uuid) {
            self.removed.borrow_mut().push(id);
        }
    }

    #[test]
    fn test_remove_notifies_listener() {
        let recorder = Rc::new(Recorder::default());
        let mut store = ServiceStore::new();
        store.set_listener(Rc::downgrade(&recorder));
        let a = store.add("A").id;
        store.select(Some(a));

        assert!(store.remove(a).is_some());
        assert_eq!(*recorder.removed.borrow(), vec![a]);
        assert_eq!(store.selected(), None);
        assert!(store.remove(a).is_none());
    }

    #[test]
    fn test_geometry_updates() {
        let mut store = ServiceStore::new();
        let a = store.add("A").id;

        let delta = store.update_position(a, Position::new(150.0, 130.0)).unwrap();
        assert_eq!(delta, Position::new(50.0, 30.0));
        assert!(store.update_position(Uuid::new_v4(), Position::zero()).is_none());

        assert!(store.update_dimensions(a, 800.0, 600.0));
        assert!(!store.update_dimensions(a, 800.0, 600.0));
        assert!(!store.update_dimensions(a, 0.0, 600.0));
        assert_eq!(store.get(a).unwrap().size(), blueprint_core::Size::new(800.0, 600.0));
    }
}
