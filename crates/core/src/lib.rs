//! # Blueprint Core
//!
//! Core types, traits, and error handling for Blueprint Studio.
//!
//! This crate provides the foundational building blocks used by the data
//! model, the stores and the canvas layer:
//!
//! - **Types**: identifiers, canvas geometry, field/relation vocabularies
//! - **Traits**: `Validatable` and the `RemovalListener` notification seam
//! - **Errors**: unified error handling with `EngineError` and `EngineResult`
//!

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use error::{EngineError, EngineResult, ResultExt};
pub use traits::{CascadeTarget, ListenerChain, RemovalListener, Validatable};
pub use types::{
    CascadeType, CommunicationType, ConnectionId, DefaultValue, EntityId, FetchType, FieldId,
    FieldType, Position, ReferentialAction, RelationId, RelationType, ServiceId, Size, Validation,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
