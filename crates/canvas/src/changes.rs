//! Change events reported by the renderer

use blueprint_core::Position;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodeChange {
    /// A node moved. `dragging` is `Some(true)` while a drag is in progress
    /// and `Some(false)` on the event that ends it.
    Position {
        id: Uuid,
        #[serde(default)]
        position: Option<Position>,
        #[serde(default)]
        dragging: Option<bool>,
    },
    /// A node was measured or resized
    Dimensions {
        id: Uuid,
        #[serde(default)]
        width: Option<f32>,
        #[serde(default)]
        height: Option<f32>,
    },
    Select { id: Uuid, selected: bool },
}

impl NodeChange {
    pub fn id(&self) -> Uuid {
        match self {
            NodeChange::Position { id, .. }
            | NodeChange::Dimensions { id, .. }
            | NodeChange::Select { id, .. } => *id,
        }
    }

    /// A finished move
    pub fn moved(id: Uuid, position: Position) -> Self {
        NodeChange::Position {
            id,
            position: Some(position),
            dragging: None,
        }
    }

    /// An intermediate drag step
    pub fn drag(id: Uuid, position: Position) -> Self {
        NodeChange::Position {
            id,
            position: Some(position),
            dragging: Some(true),
        }
    }

    /// The event that ends a drag
    pub fn drag_end(id: Uuid, position: Position) -> Self {
        NodeChange::Position {
            id,
            position: Some(position),
            dragging: Some(false),
        }
    }

    pub fn resized(id: Uuid, width: f32, height: f32) -> Self {
        NodeChange::Dimensions {
            id,
            width: Some(width),
            height: Some(height),
        }
    }

    pub fn select(id: Uuid, selected: bool) -> Self {
        NodeChange::Select { id, selected }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_renderer_events() {
        let id = Uuid::new_v4();
        let json = format!(
            r#"[
                {{"type": "position", "id": "{id}", "position": {{"x": 1.0, "y": 2.0}}, "dragging": true}},
                {{"type": "dimensions", "id": "{id}", "width": 300.0}},
                {{"type": "select", "id": "{id}", "selected": false}}
            ]"#
        );
        let changes: Vec<NodeChange> = serde_json::from_str(&json).unwrap();
        assert_eq!(changes[0], NodeChange::drag(id, Position::new(1.0, 2.0)));
        assert_eq!(
            changes[1],
            NodeChange::Dimensions {
                id,
                width: Some(300.0),
                height: None
            }
        );
        assert_eq!(changes[2], NodeChange::select(id, false));
        assert!(changes.iter().all(|c| c.id() == id));
    }
}
