//! # Blueprint State
//!
//! Normalized in-memory stores for a Blueprint Studio project, the cascade
//! wiring between them, and undo/redo over the entity/relation graph.
//!
//! Removal cascades flow one way:
//!
//! ```text
//! EntityStore ──┬─> RelationStore
//!               ├─> ServiceStore ──┬─> ConnectionStore
//!               └─> LayoutStore    └─> LayoutStore
//! ```
//!
//! [`Workspace`] assembles the stores and is the usual entry point.

pub mod config;
pub mod connection_store;
pub mod entity_store;
pub mod history;
pub mod layout_store;
pub mod relation_store;
pub mod selection;
pub mod service_store;
pub mod view;
pub mod workspace;

use std::cell::RefCell;
use std::rc::Rc;

pub use config::EngineConfig;
pub use connection_store::ConnectionStore;
pub use entity_store::EntityStore;
pub use history::{GraphSnapshot, HistoryPhase, HistoryStore};
pub use layout_store::{AutoLayoutSignal, CanvasMode, Density, EntityFilter, LayoutStore};
pub use relation_store::RelationStore;
pub use selection::Selection;
pub use service_store::ServiceStore;
pub use view::ProjectView;
pub use workspace::Workspace;

/// Shared handle to a store
pub type Shared<T> = Rc<RefCell<T>>;
