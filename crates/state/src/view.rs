//! Composed read model
//!
//! A `ProjectView` is an owned copy of everything a consumer (the canvas
//! layer, an exporter, a code generator) needs to read, taken in one go so
//! that no consumer has to hold borrows on several stores.

use crate::layout_store::{CanvasMode, Density, EntityFilter};
use blueprint_core::{EntityId, RelationId, ServiceId};
use blueprint_ir::{Entity, ProjectConfig, ProjectDocument, Relation, Service, ServiceConnection};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectView {
    pub project: ProjectConfig,
    pub entities: Vec<Entity>,
    pub relations: Vec<Relation>,
    pub services: Vec<Service>,
    pub connections: Vec<ServiceConnection>,

    pub selected_entity: Option<EntityId>,
    pub multi_selection: Vec<EntityId>,
    pub selected_service: Option<ServiceId>,
    pub selected_relation: Option<RelationId>,

    pub mode: CanvasMode,
    pub filter: EntityFilter,
    pub expanded: BTreeSet<EntityId>,
    pub density: Density,
}

impl ProjectView {
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn service(&self, id: ServiceId) -> Option<&Service> {
        self.services.iter().find(|s| s.id == id)
    }

    pub fn service_for_entity(&self, id: EntityId) -> Option<&Service> {
        self.services.iter().find(|s| s.contains(id))
    }

    /// Whether the entity is the primary selection or part of the multi-selection
    pub fn is_entity_selected(&self, id: EntityId) -> bool {
        self.selected_entity == Some(id) || self.multi_selection.contains(&id)
    }

    /// Entities that pass the active filter, in store order
    pub fn visible_entities(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.iter().filter(move |e| match self.filter {
            EntityFilter::All => true,
            EntityFilter::Unassigned => self.service_for_entity(e.id).is_none(),
            EntityFilter::Service(service_id) => self
                .service(service_id)
                .is_some_and(|s| s.contains(e.id)),
        })
    }

    /// The exportable part of the view
    pub fn to_document(&self) -> ProjectDocument {
        ProjectDocument {
            entities: self.entities.clone(),
            relations: self.relations.clone(),
            services: self.services.clone(),
            service_connections: self.connections.clone(),
            ..ProjectDocument::new(self.project.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn view_with(entities: Vec<Entity>, services: Vec<Service>) -> ProjectView {
        ProjectView {
            project: ProjectConfig::new("Shop"),
            entities,
            relations: Vec::new(),
            services,
            connections: Vec::new(),
            selected_entity: None,
            multi_selection: Vec::new(),
            selected_service: None,
            selected_relation: None,
            mode: CanvasMode::Entities,
            filter: EntityFilter::All,
            expanded: BTreeSet::new(),
            density: Density::Comfortable,
        }
    }

    #[test]
    fn test_visible_entities_follow_filter() {
        let user = Entity::new("User");
        let order = Entity::new("Order");
        let mut service = Service::new("Orders", "#10b981");
        service.insert_entity(order.id);
        let service_id = service.id;

        let mut view = view_with(vec![user.clone(), order.clone()], vec![service]);
        assert_eq!(view.visible_entities().count(), 2);

        view.filter = EntityFilter::Unassigned;
        let names: Vec<&str> = view.visible_entities().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["User"]);

        view.filter = EntityFilter::Service(service_id);
        let names: Vec<&str> = view.visible_entities().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Order"]);
    }

    #[test]
    fn test_to_document_carries_collections() {
        let view = view_with(vec![Entity::new("User")], vec![]);
        let doc = view.to_document();
        assert_eq!(doc.project.name, "Shop");
        assert_eq!(doc.entities, view.entities);
        assert!(doc.exported_at.is_none());
    }
}
