//! Layout and canvas-UI store
//!
//! Transient view state: canvas mode, entity filter, expanded cards, spacing
//! density and the "auto-layout needed" flag. Position and dimension writes
//! coming from the canvas are forwarded to the entity and service stores,
//! which stay the owners of geometry.

use crate::entity_store::EntityStore;
use crate::service_store::ServiceStore;
use blueprint_core::{CascadeTarget, EntityId, Position, ServiceId, Size};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashSet};
use std::rc::Rc;
use tracing::debug;
use uuid::Uuid;

/// Top-left corner used by auto-layout
const LAYOUT_ORIGIN: Position = Position { x: 100.0, y: 100.0 };

/// Height reserved for a service container's title bar
const SERVICE_HEADER: f32 = 48.0;

// ============================================================================
// View modes
// ============================================================================

/// What the canvas shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CanvasMode {
    /// Entities and their relations
    #[default]
    Entities,
    /// Service containers with their entities nested inside
    Services,
}

/// Which entities the canvas shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EntityFilter {
    #[default]
    All,
    /// Only entities that belong to no service
    Unassigned,
    /// Only entities of one service
    Service(ServiceId),
}

/// Spacing preference for auto-layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Density {
    Compact,
    #[default]
    Comfortable,
    Spacious,
}

impl Density {
    /// Gap between cards
    pub fn gap(&self) -> f32 {
        match self {
            Density::Compact => 40.0,
            Density::Comfortable => 80.0,
            Density::Spacious => 140.0,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "compact" => Some(Density::Compact),
            "comfortable" => Some(Density::Comfortable),
            "spacious" => Some(Density::Spacious),
            _ => None,
        }
    }
}

// ============================================================================
// AutoLayoutSignal
// ============================================================================

/// Shared "auto-layout needed" flag.
///
/// The entity store holds a clone and raises it without borrowing the layout
/// store.
#[derive(Debug, Clone, Default)]
pub struct AutoLayoutSignal(Rc<Cell<bool>>);

impl AutoLayoutSignal {
    pub fn raise(&self) {
        self.0.set(true);
    }

    pub fn is_raised(&self) -> bool {
        self.0.get()
    }

    /// Lower the flag, returning whether it was raised
    pub fn take(&self) -> bool {
        self.0.replace(false)
    }
}

// ============================================================================
// LayoutStore
// ============================================================================

pub struct LayoutStore {
    mode: CanvasMode,
    filter: EntityFilter,
    expanded: BTreeSet<EntityId>,
    density: Density,
    grid_columns: usize,
    signal: AutoLayoutSignal,
    entities: Rc<RefCell<EntityStore>>,
    services: Rc<RefCell<ServiceStore>>,
}

impl LayoutStore {
    pub fn new(entities: Rc<RefCell<EntityStore>>, services: Rc<RefCell<ServiceStore>>) -> Self {
        Self {
            mode: CanvasMode::default(),
            filter: EntityFilter::default(),
            expanded: BTreeSet::new(),
            density: Density::default(),
            grid_columns: crate::entity_store::DEFAULT_GRID_COLUMNS,
            signal: AutoLayoutSignal::default(),
            entities,
            services,
        }
    }

    pub fn with_grid_columns(mut self, columns: usize) -> Self {
        self.grid_columns = columns.max(1);
        self
    }

    pub fn with_density(mut self, density: Density) -> Self {
        self.density = density;
        self
    }

    /// Handle other stores use to request a layout
    pub fn signal(&self) -> AutoLayoutSignal {
        self.signal.clone()
    }

    // ========================================================================
    // View state
    // ========================================================================

    pub fn mode(&self) -> CanvasMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: CanvasMode) {
        self.mode = mode;
    }

    pub fn filter(&self) -> EntityFilter {
        self.filter
    }

    /// Set the entity filter. A filter naming an unknown service is ignored.
    pub fn set_filter(&mut self, filter: EntityFilter) {
        if let EntityFilter::Service(id) = filter {
            if !self.services.borrow().contains(id) {
                return;
            }
        }
        self.filter = filter;
    }

    pub fn density(&self) -> Density {
        self.density
    }

    pub fn set_density(&mut self, density: Density) {
        self.density = density;
    }

    pub fn is_expanded(&self, id: EntityId) -> bool {
        self.expanded.contains(&id)
    }

    pub fn expanded(&self) -> &BTreeSet<EntityId> {
        &self.expanded
    }

    pub fn toggle_expanded(&mut self, id: EntityId) {
        if !self.expanded.remove(&id) {
            self.expanded.insert(id);
        }
    }

    pub fn auto_layout_requested(&self) -> bool {
        self.signal.is_raised()
    }

    pub fn request_auto_layout(&self) {
        self.signal.raise();
    }

    /// Drop expanded entries for entities that no longer exist
    pub fn cleanup_deleted_entities(&mut self, existing: &HashSet<EntityId>) {
        self.expanded.retain(|id| existing.contains(id));
    }

    /// Back to defaults, keeping the density preference
    pub fn reset(&mut self) {
        self.mode = CanvasMode::default();
        self.filter = EntityFilter::default();
        self.expanded.clear();
        self.signal.take();
    }

    // ========================================================================
    // Geometry forwarding
    // ========================================================================

    /// Write entity positions. Returns how many changed.
    pub fn update_positions(&self, updates: &[(EntityId, Position)]) -> usize {
        let mut entities = self.entities.borrow_mut();
        updates
            .iter()
            .filter(|(id, pos)| entities.update_position(*id, *pos))
            .count()
    }

    /// Move a service and carry its entities along by the same delta
    pub fn move_service(&self, id: ServiceId, position: Position) -> bool {
        let Some(delta) = self.services.borrow_mut().update_position(id, position) else {
            return false;
        };
        if delta.is_zero() {
            return false;
        }
        let members = self
            .services
            .borrow()
            .get(id)
            .map(|s| s.entity_ids.clone())
            .unwrap_or_default();
        self.entities.borrow_mut().translate(&members, delta);
        true
    }

    /// Write service dimensions
    pub fn update_dimensions(&self, id: ServiceId, width: f32, height: f32) -> bool {
        self.services.borrow_mut().update_dimensions(id, width, height)
    }

    // ========================================================================
    // Auto-layout
    // ========================================================================

    /// Arrange services in a row with their entities in a grid inside each
    /// container; unassigned entities go in a grid below. Clears the request.
    pub fn apply_auto_layout(&mut self) {
        let gap = self.density.gap();
        let card = Size::entity_card();
        let columns = self.grid_columns;

        let mut entity_positions: Vec<(EntityId, Position)> = Vec::new();
        let mut service_frames: Vec<(ServiceId, Position, Size)> = Vec::new();

        {
            let entities = self.entities.borrow();
            let services = self.services.borrow();

            let mut cursor_x = LAYOUT_ORIGIN.x;
            let mut tallest = 0.0_f32;

            for service in services.all() {
                let members: Vec<EntityId> = service
                    .entity_ids
                    .iter()
                    .copied()
                    .filter(|id| entities.contains(*id))
                    .collect();

                let inner_cols = members.len().clamp(1, columns);
                let inner_rows = members.len().div_ceil(inner_cols).max(1);
                let origin = Position::new(cursor_x, LAYOUT_ORIGIN.y);
                let pad = gap / 2.0;

                for (i, id) in members.iter().enumerate() {
                    let col = (i % inner_cols) as f32;
                    let row = (i / inner_cols) as f32;
                    entity_positions.push((
                        *id,
                        origin.offset(
                            pad + col * (card.width + gap),
                            SERVICE_HEADER + pad + row * (card.height + gap),
                        ),
                    ));
                }

                let default = Size::default_service();
                let size = Size::new(
                    default.width.max(
                        2.0 * pad + inner_cols as f32 * card.width + (inner_cols - 1) as f32 * gap,
                    ),
                    default.height.max(
                        SERVICE_HEADER
                            + 2.0 * pad
                            + inner_rows as f32 * card.height
                            + (inner_rows - 1) as f32 * gap,
                    ),
                );
                service_frames.push((service.id, origin, size));

                cursor_x += size.width + gap;
                tallest = tallest.max(size.height);
            }

            let top = if service_frames.is_empty() {
                LAYOUT_ORIGIN.y
            } else {
                LAYOUT_ORIGIN.y + tallest + 2.0 * gap
            };

            let unassigned = entities
                .all()
                .iter()
                .filter(|e| services.service_for_entity(e.id).is_none());
            for (i, entity) in unassigned.enumerate() {
                let col = (i % columns) as f32;
                let row = (i / columns) as f32;
                entity_positions.push((
                    entity.id,
                    Position::new(
                        LAYOUT_ORIGIN.x + col * (card.width + gap),
                        top + row * (card.height + gap),
                    ),
                ));
            }
        }

        {
            let mut services = self.services.borrow_mut();
            for (id, origin, size) in &service_frames {
                services.update_position(*id, *origin);
                services.update_dimensions(*id, size.width, size.height);
            }
        }
        let moved = self.update_positions(&entity_positions);

        self.signal.take();
        debug!(
            services = service_frames.len(),
            entities = entity_positions.len(),
            moved,
            density = ?self.density,
            "auto-layout applied"
        );
    }
}

impl CascadeTarget for LayoutStore {
    /// An entity or a service went away
    fn cascade_removed(&mut self, id: Uuid) {
        self.expanded.remove(&id);
        if self.filter == EntityFilter::Service(id) {
            debug!(service_id = %id, "filter fell back to all");
            self.filter = EntityFilter::All;
        }
    }
}

impl std::fmt::Debug for LayoutStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutStore")
            .field("mode", &self.mode)
            .field("filter", &self.filter)
            .field("expanded", &self.expanded.len())
            .field("density", &self.density)
            .field("auto_layout_requested", &self.signal.is_raised())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Rc<RefCell<EntityStore>>, Rc<RefCell<ServiceStore>>, LayoutStore) {
        let entities = Rc::new(RefCell::new(EntityStore::new()));
        let services = Rc::new(RefCell::new(ServiceStore::new()));
        let layout = LayoutStore::new(Rc::clone(&entities), Rc::clone(&services));
        (entities, services, layout)
    }

    #[test]
    fn test_signal_shared_between_clones() {
        let signal = AutoLayoutSignal::default();
        let other = signal.clone();
        other.raise();
        assert!(signal.is_raised());
        assert!(signal.take());
        assert!(!other.is_raised());
    }

    #[test]
    fn test_update_positions_forwards_to_entity_store() {
        let (entities, _, layout) = setup();
        let a = entities.borrow_mut().add("A").id;

        let changed = layout.update_positions(&[
            (a, Position::new(5.0, 6.0)),
            (Uuid::new_v4(), Position::zero()),
        ]);
        assert_eq!(changed, 1);
        assert_eq!(
            entities.borrow().get(a).unwrap().position,
            Position::new(5.0, 6.0)
        );
    }

    #[test]
    fn test_move_service_carries_entities() {
        let (entities, services, layout) = setup();
        let a = entities.borrow_mut().add("A");
        let s = services.borrow_mut().add("S");
        services.borrow_mut().assign_entity_to_service(a.id, s.id);

        assert!(layout.move_service(s.id, s.position.offset(30.0, -10.0)));
        assert_eq!(
            entities.borrow().get(a.id).unwrap().position,
            a.position.offset(30.0, -10.0)
        );
    }

    #[test]
    fn test_cascade_resets_filter_and_expanded() {
        let (entities, services, mut layout) = setup();
        let a = entities.borrow_mut().add("A").id;
        let s = services.borrow_mut().add("S").id;

        layout.toggle_expanded(a);
        layout.set_filter(EntityFilter::Service(s));
        assert_eq!(layout.filter(), EntityFilter::Service(s));

        layout.cascade_removed(a);
        layout.cascade_removed(s);
        assert!(!layout.is_expanded(a));
        assert_eq!(layout.filter(), EntityFilter::All);
    }

    #[test]
    fn test_filter_on_unknown_service_ignored() {
        let (_, _, mut layout) = setup();
        layout.set_filter(EntityFilter::Unassigned);
        layout.set_filter(EntityFilter::Service(Uuid::new_v4()));
        assert_eq!(layout.filter(), EntityFilter::Unassigned);
    }

    #[test]
    fn test_cleanup_deleted_entities() {
        let (_, _, mut layout) = setup();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        layout.toggle_expanded(a);
        layout.toggle_expanded(b);

        layout.cleanup_deleted_entities(&HashSet::from([b]));
        assert!(!layout.is_expanded(a));
        assert!(layout.is_expanded(b));
    }

    #[test]
    fn test_auto_layout_places_members_inside_container() {
        let (entities, services, mut layout) = setup();
        let members: Vec<EntityId> = (0..3)
            .map(|i| entities.borrow_mut().add(format!("M{}", i)).id)
            .collect();
        let loose = entities.borrow_mut().add("Loose").id;
        let s = services.borrow_mut().add("S").id;
        services.borrow_mut().assign_multiple(&members, s);
        layout.request_auto_layout();

        layout.apply_auto_layout();
        assert!(!layout.auto_layout_requested());

        let services = services.borrow();
        let service = services.get(s).unwrap();
        let entities = entities.borrow();
        let card = Size::entity_card();
        for id in &members {
            let p = entities.get(*id).unwrap().position;
            assert!(p.x >= service.position.x);
            assert!(p.y >= service.position.y + SERVICE_HEADER);
            assert!(p.x + card.width <= service.position.x + service.width);
            assert!(p.y + card.height <= service.position.y + service.height);
        }

        let loose_pos = entities.get(loose).unwrap().position;
        assert!(loose_pos.y > service.position.y + service.height);
    }

    #[test]
    fn test_density_changes_spacing() {
        let (entities, _, mut layout) = setup();
        let a = entities.borrow_mut().add("A").id;
        let b = entities.borrow_mut().add("B").id;

        layout.set_density(Density::Compact);
        layout.apply_auto_layout();
        let compact = entities.borrow().get(b).unwrap().position.x
            - entities.borrow().get(a).unwrap().position.x;

        layout.set_density(Density::Spacious);
        layout.apply_auto_layout();
        let spacious = entities.borrow().get(b).unwrap().position.x
            - entities.borrow().get(a).unwrap().position.x;

        assert!(spacious > compact);
    }
}
