//! # Blueprint Canvas
//!
//! Reconciles a [`ProjectView`](blueprint_state::ProjectView) with the node
//! and edge lists of an external graph renderer, and translates the
//! renderer's change events back into store writes.
//!
//! ```no_run
//! use blueprint_canvas::{CanvasSync, NodeChange};
//! use blueprint_state::Workspace;
//!
//! let mut ws = Workspace::default();
//! let user = ws.add_entity("User");
//!
//! let mut canvas = CanvasSync::new();
//! canvas.sync(&ws.view());
//! canvas.mark_measured(&ws.view());
//!
//! let to = blueprint_core::Position::new(200.0, 120.0);
//! canvas.apply_changes(&[NodeChange::drag_end(user, to)], &mut ws);
//! ```

pub mod changes;
pub mod fingerprint;
pub mod node;
pub mod sync;

pub use changes::NodeChange;
pub use fingerprint::Fingerprint;
pub use node::{
    CanvasEdge, CanvasGraph, CanvasNode, EdgeKind, EntityNodeData, FieldSummary, NodeData,
    NodeKind, ServiceNodeData,
};
pub use sync::{CanvasSync, ChangeSummary, SyncOutcome};
