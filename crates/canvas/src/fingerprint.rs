//! Structural fingerprint of the canvas
//!
//! Covers what forces a node/edge rebuild: mode, filter, the visible entity
//! set and its structure, service identity, relations and connections.
//! Positions, dimensions, selection, the drop target and service membership
//! are left out; those are patched in place.

use blueprint_state::{CanvasMode, EntityFilter, ProjectView};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fingerprint(blake3::Hash);

impl Fingerprint {
    pub fn of(view: &ProjectView) -> Self {
        let mut hasher = Digest::default();

        hasher.tag(match view.mode {
            CanvasMode::Entities => 0,
            CanvasMode::Services => 1,
        });
        match view.filter {
            EntityFilter::All => hasher.tag(0),
            EntityFilter::Unassigned => hasher.tag(1),
            EntityFilter::Service(id) => {
                hasher.tag(2);
                hasher.bytes(id.as_bytes());
            }
        }

        for entity in view.visible_entities() {
            hasher.bytes(entity.id.as_bytes());
            hasher.text(&entity.name);
            hasher.text(&entity.table_name);
            hasher.tag(view.expanded.contains(&entity.id) as u8);
            hasher.count(entity.fields.len());
            for field in &entity.fields {
                hasher.bytes(field.id.as_bytes());
                hasher.text(&field.name);
                hasher.text(field.field_type.as_str());
                hasher.tag(field.nullable as u8);
                hasher.tag(field.unique as u8);
            }
        }

        hasher.count(view.services.len());
        for service in &view.services {
            hasher.bytes(service.id.as_bytes());
            hasher.text(&service.name);
            hasher.text(&service.color);
            hasher.text(service.description.as_deref().unwrap_or_default());
        }

        hasher.count(view.relations.len());
        for relation in &view.relations {
            hasher.bytes(relation.id.as_bytes());
            hasher.bytes(relation.source_entity_id.as_bytes());
            hasher.bytes(relation.target_entity_id.as_bytes());
            hasher.text(relation.relation_type.as_str());
            hasher.text(&relation.source_field_name);
        }

        hasher.count(view.connections.len());
        for connection in &view.connections {
            hasher.bytes(connection.id.as_bytes());
            hasher.bytes(connection.source_service_id.as_bytes());
            hasher.bytes(connection.target_service_id.as_bytes());
            hasher.text(connection.communication_type.as_str());
        }

        Self(hasher.finish())
    }

    pub fn to_hex(&self) -> String {
        self.0.to_hex().to_string()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..12])
    }
}

/// Length-prefixed writes so adjacent strings cannot run together
#[derive(Default)]
struct Digest(blake3::Hasher);

impl Digest {
    fn tag(&mut self, tag: u8) {
        self.0.update(&[tag]);
    }

    fn count(&mut self, n: usize) {
        self.0.update(&(n as u64).to_le_bytes());
    }

    fn bytes(&mut self, bytes: &[u8]) {
        self.0.update(bytes);
    }

    fn text(&mut self, s: &str) {
        self.count(s.len());
        self.0.update(s.as_bytes());
    }

    fn finish(&self) -> blake3::Hash {
        self.0.finalize()
    }
}
