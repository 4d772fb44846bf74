//! Error types for Blueprint Studio
//!
//! This module provides unified error handling across the engine:
//! validation errors, import rejections, IO and serialization errors.
//!
//! Operations on stale ids are *not* errors in this engine; stores treat them
//! as no-ops. `EngineError` is reserved for inputs that are genuinely invalid.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for Blueprint Studio
#[derive(Debug, Error)]
pub enum EngineError {
    // ========================================================================
    // Validation Errors
    // ========================================================================
    /// General validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity validation failed
    #[error("Entity validation failed for '{entity}': {message}")]
    EntityValidation { entity: String, message: String },

    /// Field validation failed
    #[error("Field validation failed for '{entity}.{field}': {message}")]
    FieldValidation {
        entity: String,
        field: String,
        message: String,
    },

    /// Relation validation failed
    #[error("Relation validation failed: {0}")]
    RelationValidation(String),

    /// Service validation failed
    #[error("Service validation failed for '{service}': {message}")]
    ServiceValidation { service: String, message: String },

    /// An imported document violated the schema. Every violation is listed.
    #[error("Import rejected ({} violation(s)): {}", .0.len(), .0.join("; "))]
    ImportRejected(Vec<String>),

    // ========================================================================
    // Not Found Errors
    // ========================================================================
    /// Project file not found
    #[error("Project not found at path: {0}")]
    ProjectNotFound(PathBuf),

    // ========================================================================
    // Duplicate Errors
    // ========================================================================
    /// Duplicate field name
    #[error("Duplicate field name: '{field}' already exists in entity '{entity}'")]
    DuplicateField { entity: String, field: String },

    // ========================================================================
    // IO Errors
    // ========================================================================
    /// File IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File read error
    #[error("Failed to read file '{path}': {message}")]
    FileRead { path: PathBuf, message: String },

    /// File write error
    #[error("Failed to write file '{path}': {message}")]
    FileWrite { path: PathBuf, message: String },

    // ========================================================================
    // Serialization Errors
    // ========================================================================
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    /// Invalid project document format
    #[error("Invalid project document: {0}")]
    InvalidProjectFormat(String),

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ========================================================================
    // Generic Errors
    // ========================================================================
    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),

    /// Generic error with context
    #[error("{context}: {message}")]
    WithContext { context: String, message: String },
}

impl EngineError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        EngineError::Validation(msg.into())
    }

    /// Create an entity validation error
    pub fn entity_validation(entity: impl Into<String>, msg: impl Into<String>) -> Self {
        EngineError::EntityValidation {
            entity: entity.into(),
            message: msg.into(),
        }
    }

    /// Create a field validation error
    pub fn field_validation(
        entity: impl Into<String>,
        field: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        EngineError::FieldValidation {
            entity: entity.into(),
            field: field.into(),
            message: msg.into(),
        }
    }

    /// Create an import rejection from a list of violations
    pub fn import_rejected(violations: impl IntoIterator<Item = impl Into<String>>) -> Self {
        EngineError::ImportRejected(violations.into_iter().map(Into::into).collect())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        EngineError::Internal(msg.into())
    }

    /// Create an error with context
    pub fn with_context(context: impl Into<String>, msg: impl Into<String>) -> Self {
        EngineError::WithContext {
            context: context.into(),
            message: msg.into(),
        }
    }

    /// Check if this error is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            EngineError::Validation(_)
                | EngineError::EntityValidation { .. }
                | EngineError::FieldValidation { .. }
                | EngineError::RelationValidation(_)
                | EngineError::ServiceValidation { .. }
                | EngineError::ImportRejected(_)
                | EngineError::DuplicateField { .. }
        )
    }

    /// Check if this error is a not-found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, EngineError::ProjectNotFound(_))
    }

    /// Check if this error is an IO error
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            EngineError::Io(_) | EngineError::FileRead { .. } | EngineError::FileWrite { .. }
        )
    }

    /// Violations carried by an import rejection, empty for other errors
    pub fn violations(&self) -> &[String] {
        match self {
            EngineError::ImportRejected(v) => v,
            _ => &[],
        }
    }
}

/// Result type alias using EngineError
pub type EngineResult<T> = Result<T, EngineError>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn with_context<C: Into<String>>(self, context: C) -> EngineResult<T>;
}

impl<T, E: Into<EngineError>> ResultExt<T> for Result<T, E> {
    fn with_context<C: Into<String>>(self, context: C) -> EngineResult<T> {
        self.map_err(|e| {
            let err: EngineError = e.into();
            EngineError::WithContext {
                context: context.into(),
                message: err.to_string(),
            }
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let err = EngineError::validation("Name is required");
        assert!(err.is_validation());
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "Validation error: Name is required");
    }

    #[test]
    fn test_field_validation_error() {
        let err = EngineError::field_validation("User", "email", "Invalid email format");
        assert!(err.is_validation());
        assert_eq!(
            err.to_string(),
            "Field validation failed for 'User.email': Invalid email format"
        );
    }

    #[test]
    fn test_import_rejected_lists_every_violation() {
        let err = EngineError::import_rejected([
            "entities[0].name: expected a string",
            "relations[1].type: unknown relation type 'Sideways'",
        ]);
        assert!(err.is_validation());
        assert_eq!(err.violations().len(), 2);
        assert_eq!(
            err.to_string(),
            "Import rejected (2 violation(s)): entities[0].name: expected a string; \
             relations[1].type: unknown relation type 'Sideways'"
        );
    }

    #[test]
    fn test_not_found_errors() {
        let err = EngineError::ProjectNotFound(PathBuf::from("shop.json"));
        assert!(err.is_not_found());
        assert!(!err.is_validation());
        assert!(err.violations().is_empty());
        assert_eq!(err.to_string(), "Project not found at path: shop.json");
    }

    #[test]
    fn test_error_with_context() {
        let err = EngineError::with_context("Importing project", "unexpected end of input");
        assert_eq!(err.to_string(), "Importing project: unexpected end of input");
    }

    #[test]
    fn test_result_ext_wraps_json_errors() {
        let parsed: Result<serde_json::Value, serde_json::Error> = serde_json::from_str("{");
        let err = parsed.with_context("Parsing document").unwrap_err();
        assert!(err.to_string().starts_with("Parsing document: JSON serialization error"));
    }

    #[test]
    fn test_duplicate_field_error() {
        let err = EngineError::DuplicateField {
            entity: "User".to_string(),
            field: "email".to_string(),
        };
        assert!(err.is_validation());
        assert_eq!(
            err.to_string(),
            "Duplicate field name: 'email' already exists in entity 'User'"
        );
    }

    #[test]
    fn test_io_error_classification() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: EngineError = io_err.into();
        assert!(err.is_io());
    }
}
