//! Canvas synchronization
//!
//! `CanvasSync` keeps the renderer's node and edge lists in step with the
//! stores. A full rebuild happens only when the structural fingerprint
//! changes; otherwise three narrower passes patch nodes in place:
//!
//! 1. service containers get fresh member counts and names, and entity nodes
//!    their parent container,
//! 2. positions and container sizes, skipping nodes that are being dragged,
//! 3. selection and drop-target flags, once the renderer has reported its
//!    first measurement.
//!
//! Rebuilds are held back while a drag is in progress so the renderer never
//! loses the node under the pointer.

use crate::changes::NodeChange;
use crate::fingerprint::Fingerprint;
use crate::node::{CanvasEdge, CanvasGraph, CanvasNode, NodeData, NodeKind};
use blueprint_core::{EntityId, Position, ServiceId};
use blueprint_state::{CanvasMode, EntityFilter, ProjectView, Workspace};
use std::collections::HashSet;
use tracing::{debug, warn};
use uuid::Uuid;

/// What a call to [`CanvasSync::sync`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Nodes and edges were rebuilt from scratch
    Rebuilt,
    /// Existing nodes were patched in place
    Patched,
    /// The structure changed during a drag; the rebuild waits for the drag to end
    Deferred,
}

/// Store writes caused by a batch of renderer changes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeSummary {
    pub positions: usize,
    pub dimensions: usize,
    pub selections: usize,
    pub assignments: usize,
    pub ignored: usize,
}

#[derive(Debug, Default)]
pub struct CanvasSync {
    nodes: Vec<CanvasNode>,
    edges: Vec<CanvasEdge>,
    fingerprint: Option<Fingerprint>,
    measured: bool,
    dragging: HashSet<Uuid>,
    drop_target: Option<ServiceId>,
    rebuild_count: usize,
}

impl CanvasSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[CanvasNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[CanvasEdge] {
        &self.edges
    }

    pub fn node(&self, id: Uuid) -> Option<&CanvasNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn graph(&self) -> CanvasGraph {
        CanvasGraph {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }

    pub fn rebuild_count(&self) -> usize {
        self.rebuild_count
    }

    pub fn is_dragging(&self) -> bool {
        !self.dragging.is_empty()
    }

    pub fn is_measured(&self) -> bool {
        self.measured
    }

    pub fn drop_target(&self) -> Option<ServiceId> {
        self.drop_target
    }

    // ========================================================================
    // State -> canvas
    // ========================================================================

    /// Bring nodes and edges up to date with the view
    pub fn sync(&mut self, view: &ProjectView) -> SyncOutcome {
        let fingerprint = Fingerprint::of(view);
        if self.fingerprint != Some(fingerprint) {
            if self.is_dragging() {
                debug!(%fingerprint, dragging = self.dragging.len(), "rebuild deferred");
                return SyncOutcome::Deferred;
            }
            self.rebuild(view, fingerprint);
            if self.measured {
                self.apply_flags(view);
            }
            return SyncOutcome::Rebuilt;
        }

        self.refresh_containers(view);
        if self.measured {
            self.refresh_geometry(view);
            self.apply_flags(view);
        }
        SyncOutcome::Patched
    }

    /// The renderer has measured the initial nodes; geometry and flags are
    /// patched from now on
    pub fn mark_measured(&mut self, view: &ProjectView) {
        if !self.measured {
            debug!(nodes = self.nodes.len(), "canvas measured");
        }
        self.measured = true;
        self.refresh_geometry(view);
        self.apply_flags(view);
    }

    /// Highlight a service node as the target of the current drag.
    /// Ignored unless the id names a service node on the canvas.
    pub fn set_drop_target(&mut self, service: Option<ServiceId>) {
        if service.is_some_and(|id| !self.nodes.iter().any(|n| n.id == id && n.is_service())) {
            return;
        }
        self.drop_target = service;
        for node in self.nodes.iter_mut().filter(|n| n.is_service()) {
            node.drop_target = self.measured && self.drop_target == Some(node.id);
        }
    }

    fn rebuild(&mut self, view: &ProjectView, fingerprint: Fingerprint) {
        let mut nodes = Vec::new();
        let mut edges = Vec::new();

        match view.mode {
            CanvasMode::Entities => {
                nodes.extend(
                    view.visible_entities()
                        .map(|e| CanvasNode::entity(e, None, view.expanded.contains(&e.id))),
                );
                let visible: HashSet<EntityId> = nodes.iter().map(|n| n.id).collect();
                edges.extend(
                    view.relations
                        .iter()
                        .filter(|r| {
                            visible.contains(&r.source_entity_id)
                                && visible.contains(&r.target_entity_id)
                        })
                        .map(CanvasEdge::relation),
                );
            }
            CanvasMode::Services => {
                // Parents precede their children
                let services: Vec<_> = visible_services(view).collect();
                for service in &services {
                    nodes.push(CanvasNode::service(service, member_names(view, service.id)));
                }
                for entity in view.visible_entities() {
                    let container = view
                        .service_for_entity(entity.id)
                        .filter(|s| services.iter().any(|v| v.id == s.id));
                    nodes.push(CanvasNode::entity(
                        entity,
                        container,
                        view.expanded.contains(&entity.id),
                    ));
                }
                let visible: HashSet<ServiceId> = services.iter().map(|s| s.id).collect();
                edges.extend(
                    view.connections
                        .iter()
                        .filter(|c| {
                            visible.contains(&c.source_service_id)
                                && visible.contains(&c.target_service_id)
                        })
                        .map(CanvasEdge::connection),
                );
            }
        }

        self.nodes = nodes;
        self.edges = edges;
        self.fingerprint = Some(fingerprint);
        self.rebuild_count += 1;
        if self
            .drop_target
            .is_some_and(|id| !self.nodes.iter().any(|n| n.id == id))
        {
            self.drop_target = None;
        }
        debug!(
            %fingerprint,
            mode = ?view.mode,
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            "canvas rebuilt"
        );
    }

    /// Member counts and names on containers, parent links on entities
    fn refresh_containers(&mut self, view: &ProjectView) {
        let nested = view.mode == CanvasMode::Services;
        let shown: HashSet<ServiceId> = self
            .nodes
            .iter()
            .filter(|n| n.is_service())
            .map(|n| n.id)
            .collect();

        for node in &mut self.nodes {
            match &mut node.data {
                NodeData::Service(data) => {
                    let names = member_names(view, node.id);
                    if data.entity_names != names {
                        data.entity_count = names.len();
                        data.entity_names = names;
                    }
                }
                NodeData::Entity(data) => {
                    let owner = view.service_for_entity(node.id);
                    data.service_color = owner.map(|s| s.color.clone());
                    node.parent_id = owner
                        .map(|s| s.id)
                        .filter(|id| nested && shown.contains(id));
                }
            }
        }
    }

    /// Positions and container sizes from the stores, leaving dragged nodes alone
    fn refresh_geometry(&mut self, view: &ProjectView) {
        for node in &mut self.nodes {
            if self.dragging.contains(&node.id) {
                continue;
            }
            match node.kind {
                NodeKind::Entity => {
                    let Some(entity) = view.entity(node.id) else {
                        continue;
                    };
                    let origin = node
                        .parent_id
                        .and_then(|id| view.service(id))
                        .map(|s| s.position)
                        .unwrap_or_default();
                    node.position = entity.position - origin;
                }
                NodeKind::Service => {
                    let Some(service) = view.service(node.id) else {
                        continue;
                    };
                    node.position = service.position;
                    node.width = Some(service.width);
                    node.height = Some(service.height);
                }
            }
        }
    }

    fn apply_flags(&mut self, view: &ProjectView) {
        for node in &mut self.nodes {
            match node.kind {
                NodeKind::Entity => node.selected = view.is_entity_selected(node.id),
                NodeKind::Service => {
                    node.selected = view.selected_service == Some(node.id);
                    node.drop_target = self.drop_target == Some(node.id);
                }
            }
        }
    }

    // ========================================================================
    // Canvas -> state
    // ========================================================================

    /// Translate renderer events into store writes. Settles the workspace
    /// once no drag is in progress.
    pub fn apply_changes(&mut self, changes: &[NodeChange], workspace: &mut Workspace) -> ChangeSummary {
        let mut summary = ChangeSummary::default();

        for change in changes {
            let Some(index) = self.nodes.iter().position(|n| n.id == change.id()) else {
                warn!(id = %change.id(), "change for unknown node ignored");
                summary.ignored += 1;
                continue;
            };

            match *change {
                NodeChange::Position {
                    id,
                    position,
                    dragging,
                } => {
                    match dragging {
                        Some(true) => {
                            self.dragging.insert(id);
                        }
                        Some(false) => {
                            self.dragging.remove(&id);
                        }
                        None => {}
                    }
                    if let Some(position) = position {
                        self.nodes[index].position = position;
                        if self.write_position(index, position, workspace) {
                            summary.positions += 1;
                        }
                    }
                    if dragging == Some(false) && self.drop_on_target(index, workspace) {
                        summary.assignments += 1;
                    }
                }
                NodeChange::Dimensions { id, width, height } => {
                    let node = &mut self.nodes[index];
                    let (NodeKind::Service, Some(width), Some(height)) = (node.kind, width, height)
                    else {
                        summary.ignored += 1;
                        continue;
                    };
                    node.width = Some(width);
                    node.height = Some(height);
                    if workspace.update_service_dimensions(id, width, height) {
                        summary.dimensions += 1;
                    }
                }
                NodeChange::Select { id, selected } => {
                    if self.write_selection(index, id, selected, workspace) {
                        summary.selections += 1;
                    } else {
                        summary.ignored += 1;
                    }
                }
            }
        }

        if !self.is_dragging() {
            workspace.settle();
        }
        summary
    }

    fn write_position(&self, index: usize, position: Position, workspace: &mut Workspace) -> bool {
        let node = &self.nodes[index];
        match node.kind {
            NodeKind::Entity => {
                let origin = node
                    .parent_id
                    .and_then(|id| workspace.services().get(id).map(|s| s.position))
                    .unwrap_or_default();
                workspace.update_entity_positions(&[(node.id, origin + position)]) > 0
            }
            NodeKind::Service => workspace.move_service(node.id, position),
        }
    }

    /// Assign a dropped entity to the highlighted service
    fn drop_on_target(&mut self, index: usize, workspace: &mut Workspace) -> bool {
        let node = &self.nodes[index];
        if !node.is_entity() {
            return false;
        }
        let Some(service_id) = self.drop_target.take() else {
            return false;
        };
        for n in self.nodes.iter_mut().filter(|n| n.is_service()) {
            n.drop_target = false;
        }
        let entity_id = self.nodes[index].id;
        let assigned = workspace.assign_entity_to_service(entity_id, service_id);
        if assigned {
            debug!(%entity_id, %service_id, "entity dropped into service");
        }
        assigned
    }

    fn write_selection(
        &mut self,
        index: usize,
        id: Uuid,
        selected: bool,
        workspace: &mut Workspace,
    ) -> bool {
        match (self.nodes[index].kind, selected) {
            (NodeKind::Entity, true) => {
                if !workspace.entities().selection().contains(id) {
                    workspace.select_entity(Some(id));
                }
                self.nodes[index].selected = true;
                true
            }
            (NodeKind::Entity, false) => {
                if workspace.entities().selection().contains(id) {
                    debug!(%id, "deselect ignored, entity still selected");
                    return false;
                }
                self.nodes[index].selected = false;
                true
            }
            (NodeKind::Service, true) => {
                workspace.select_service(Some(id));
                self.nodes[index].selected = true;
                true
            }
            (NodeKind::Service, false) => {
                if workspace.services().selected() == Some(id) {
                    debug!(%id, "deselect ignored, service still selected");
                    return false;
                }
                self.nodes[index].selected = false;
                true
            }
        }
    }
}

fn visible_services(view: &ProjectView) -> impl Iterator<Item = &blueprint_ir::Service> + '_ {
    view.services.iter().filter(move |s| match view.filter {
        EntityFilter::Service(id) => s.id == id,
        EntityFilter::All | EntityFilter::Unassigned => true,
    })
}

fn member_names(view: &ProjectView, service_id: ServiceId) -> Vec<String> {
    view.service(service_id)
        .map(|s| {
            s.entity_ids
                .iter()
                .filter_map(|id| view.entity(*id))
                .map(|e| e.name.clone())
                .collect()
        })
        .unwrap_or_default()
}
