//! Canvas nodes and edges
//!
//! Derived from the stores on every rebuild and never authoritative. Nested
//! entity nodes carry positions relative to their parent service node.

use blueprint_core::{
    EngineError, EngineResult, EntityId, FieldType, Position, ServiceId, Size,
};
use blueprint_ir::{Entity, Relation, Service, ServiceConnection};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    Entity,
    Service,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasNode {
    pub id: Uuid,
    pub kind: NodeKind,
    /// Absolute, or relative to the parent when `parent_id` is set
    pub position: Position,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ServiceId>,
    pub selected: bool,
    pub drop_target: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    pub data: NodeData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeData {
    Entity(EntityNodeData),
    Service(ServiceNodeData),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityNodeData {
    pub name: String,
    pub table_name: String,
    pub fields: Vec<FieldSummary>,
    pub expanded: bool,
    /// Color of the owning service, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSummary {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub nullable: bool,
    pub unique: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceNodeData {
    pub name: String,
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub entity_count: usize,
    pub entity_names: Vec<String>,
}

impl CanvasNode {
    /// An entity card. `container` is the owning service when nested.
    pub fn entity(entity: &Entity, container: Option<&Service>, expanded: bool) -> Self {
        let (position, parent_id) = match container {
            Some(service) => (entity.position - service.position, Some(service.id)),
            None => (entity.position, None),
        };
        Self {
            id: entity.id,
            kind: NodeKind::Entity,
            position,
            parent_id,
            selected: false,
            drop_target: false,
            width: None,
            height: None,
            data: NodeData::Entity(EntityNodeData {
                name: entity.name.clone(),
                table_name: entity.table_name.clone(),
                fields: entity
                    .fields
                    .iter()
                    .map(|f| FieldSummary {
                        name: f.name.clone(),
                        field_type: f.field_type,
                        nullable: f.nullable,
                        unique: f.unique,
                    })
                    .collect(),
                expanded,
                service_color: container.map(|s| s.color.clone()),
            }),
        }
    }

    /// A service container
    pub fn service(service: &Service, entity_names: Vec<String>) -> Self {
        Self {
            id: service.id,
            kind: NodeKind::Service,
            position: service.position,
            parent_id: None,
            selected: false,
            drop_target: false,
            width: Some(service.width),
            height: Some(service.height),
            data: NodeData::Service(ServiceNodeData {
                name: service.name.clone(),
                color: service.color.clone(),
                description: service.description.clone(),
                entity_count: entity_names.len(),
                entity_names,
            }),
        }
    }

    pub fn is_entity(&self) -> bool {
        self.kind == NodeKind::Entity
    }

    pub fn is_service(&self) -> bool {
        self.kind == NodeKind::Service
    }

    pub fn size(&self) -> Option<Size> {
        Some(Size::new(self.width?, self.height?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EdgeKind {
    Relation,
    Connection,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasEdge {
    pub id: Uuid,
    pub source: Uuid,
    pub target: Uuid,
    pub kind: EdgeKind,
    pub label: String,
}

impl CanvasEdge {
    pub fn relation(relation: &Relation) -> Self {
        Self {
            id: relation.id,
            source: relation.source_entity_id,
            target: relation.target_entity_id,
            kind: EdgeKind::Relation,
            label: relation.label(),
        }
    }

    pub fn connection(connection: &ServiceConnection) -> Self {
        Self {
            id: connection.id,
            source: connection.source_service_id,
            target: connection.target_service_id,
            kind: EdgeKind::Connection,
            label: connection.communication_type.as_str().to_string(),
        }
    }

    pub fn touches(&self, id: EntityId) -> bool {
        self.source == id || self.target == id
    }
}

/// Nodes and edges as handed to a renderer
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CanvasGraph {
    pub nodes: Vec<CanvasNode>,
    pub edges: Vec<CanvasEdge>,
}

impl CanvasGraph {
    pub fn to_json(&self) -> EngineResult<String> {
        serde_json::to_string_pretty(self).map_err(EngineError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blueprint_ir::Field;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_nested_entity_is_relative_to_container() {
        let service = Service::new("Orders", "#10b981").at(100.0, 100.0);
        let entity = Entity::new("Order").at(160.0, 220.0);

        let node = CanvasNode::entity(&entity, Some(&service), false);
        assert_eq!(node.position, Position::new(60.0, 120.0));
        assert_eq!(node.parent_id, Some(service.id));

        let NodeData::Entity(data) = &node.data else {
            panic!("expected entity data");
        };
        assert_eq!(data.service_color.as_deref(), Some("#10b981"));
        assert_eq!(data.fields[0].name, "id");
    }

    #[test]
    fn test_service_node_has_dimensions() {
        let service = Service::new("Orders", "#10b981");
        let node = CanvasNode::service(&service, vec!["Order".into()]);
        assert_eq!(node.size(), Some(Size::default_service()));
        assert!(node.is_service());
    }

    #[test]
    fn test_graph_json_is_camel_case() {
        let entity = Entity::new("User").with_field(Field::new("email", FieldType::String));
        let graph = CanvasGraph {
            nodes: vec![CanvasNode::entity(&entity, None, true)],
            edges: vec![],
        };
        let json = graph.to_json().unwrap();
        assert!(json.contains("\"tableName\": \"users\""));
        assert!(json.contains("\"dropTarget\": false"));
        assert!(!json.contains("parentId"));
    }
}
