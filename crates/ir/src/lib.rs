//! # Blueprint IR
//!
//! The data model of a Blueprint Studio project.
//!
//! ## Core Concepts
//!
//! - **Entity**: A data model that maps to a database table (e.g., User, Order)
//! - **Field**: A property of an entity that maps to a column (e.g., email)
//! - **Relation**: A directed, typed association between two entities
//! - **Service**: A deployable container that owns a set of entities
//! - **ServiceConnection**: A directed communication link between services
//! - **ProjectDocument**: The exported form of the whole project
//!
//! The import path (`serialization::parse_document`) checks the raw JSON and
//! the cross-record references before returning a document.

pub mod connection;
pub mod entity;
pub mod field;
pub mod project;
pub mod relation;
pub mod serialization;
pub mod service;
pub mod validation;

// Re-export commonly used types at crate root
pub use connection::{ConnectionConfig, ConnectionPatch, ServiceConnection};
pub use entity::{DEFAULT_ENTITY_NAME, Entity, EntityConfig, EntityPatch, derive_table_name};
pub use field::{Field, FieldPatch, derive_column_name};
pub use project::{DocumentStats, ProjectConfig, ProjectDocument, default_package_name};
pub use relation::{ForeignKey, JoinTable, Relation, RelationPatch};
pub use serialization::{
    export_to_string, load_document, parse_document, parse_document_value, save_document,
};
pub use service::{DEFAULT_SERVICE_NAME, PALETTE, Service, ServiceConfig, ServicePatch};
pub use validation::{ValidationResult, ValidationRule, Validator, check_document_shape};

// Re-export core types that are commonly used with IR
pub use blueprint_core::{
    EngineError, EngineResult, FieldType, Position, RelationType, Size, Validatable,
};

/// Current schema version for project documents
pub const SCHEMA_VERSION: u32 = 1;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Convenient re-exports for common usage
pub mod prelude {
    pub use crate::{
        Entity, EntityPatch, Field, FieldPatch, ProjectConfig, ProjectDocument, Relation,
        RelationPatch, Service, ServiceConnection, ServicePatch,
    };
    pub use blueprint_core::{
        CommunicationType, EngineError, EngineResult, FieldType, Position, RelationType,
    };
}
