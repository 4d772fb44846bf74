//! Serialization and deserialization of project documents
//!
//! Export writes camelCase JSON. Import parses, migrates and validates the
//! whole document before anything is handed to the stores, so a rejected
//! document never causes a partial update.

use crate::validation::{Validator, check_document_shape};
use crate::{ProjectDocument, SCHEMA_VERSION};
use blueprint_core::{EngineError, EngineResult};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

// ============================================================================
// Constants
// ============================================================================

/// File extension for Blueprint project documents
pub const PROJECT_EXTENSION: &str = "json";

// ============================================================================
// Export
// ============================================================================

/// Serialize a document to pretty JSON
pub fn export_to_string(doc: &ProjectDocument) -> EngineResult<String> {
    Ok(serde_json::to_string_pretty(doc)?)
}

/// Save a document to a file, creating parent directories as needed
pub fn save_document(doc: &ProjectDocument, path: impl AsRef<Path>) -> EngineResult<()> {
    let path = path.as_ref();
    let json = export_to_string(doc).map_err(|e| EngineError::FileWrite {
        path: path.to_path_buf(),
        message: format!("Failed to serialize project: {}", e),
    })?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| EngineError::FileWrite {
                path: parent.to_path_buf(),
                message: e.to_string(),
            })?;
        }
    }

    std::fs::write(path, json).map_err(|e| EngineError::FileWrite {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    debug!(path = %path.display(), "project document written");
    Ok(())
}

// ============================================================================
// Import
// ============================================================================

/// Parse, migrate and validate a document from JSON text.
///
/// Every violation is reported in a single `EngineError::ImportRejected`.
pub fn parse_document(json: &str) -> EngineResult<ProjectDocument> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| EngineError::InvalidProjectFormat(format!("Invalid JSON: {}", e)))?;
    parse_document_value(value)
}

/// Same as [`parse_document`] for an already parsed JSON value
pub fn parse_document_value(mut value: Value) -> EngineResult<ProjectDocument> {
    let shape = check_document_shape(&value);
    if shape.has_errors() {
        warn!(violations = shape.errors.len(), "import rejected by schema check");
        return Err(shape.to_result().err().unwrap_or_else(|| {
            EngineError::internal("schema check reported errors but produced no violations")
        }));
    }

    migrate(&mut value);

    let doc: ProjectDocument = serde_json::from_value(value)
        .map_err(|e| EngineError::import_rejected([format!("[$] {}", e)]))?;

    let rules = Validator::with_default_rules().validate(&doc);
    for warning in &rules.warnings {
        debug!(%warning, "import warning");
    }
    if rules.has_errors() {
        warn!(violations = rules.errors.len(), "import rejected by reference check");
    }
    rules.to_result()?;

    Ok(doc)
}

/// Load and validate a document from a file
pub fn load_document(path: impl AsRef<Path>) -> EngineResult<ProjectDocument> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(EngineError::ProjectNotFound(path.to_path_buf()));
    }

    let json = std::fs::read_to_string(path).map_err(|e| EngineError::FileRead {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    parse_document(&json)
}

/// Bring an older document up to the current schema version
fn migrate(value: &mut Value) {
    let Some(root) = value.as_object_mut() else {
        return;
    };
    let mut version = root
        .get("schemaVersion")
        .and_then(Value::as_u64)
        .unwrap_or(SCHEMA_VERSION as u64);

    while version < SCHEMA_VERSION as u64 {
        // Version 0 documents had no service layer
        if version == 0 {
            root.entry("services").or_insert_with(|| Value::Array(Vec::new()));
            root.entry("serviceConnections")
                .or_insert_with(|| Value::Array(Vec::new()));
        }
        version += 1;
    }

    root.insert("schemaVersion".to_string(), Value::from(SCHEMA_VERSION));
}

// ============================================================================
// Utility Functions
// ============================================================================

/// Get the default file name for a project
pub fn default_file_name(project_name: &str) -> String {
    let safe_name: String = project_name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!("{}.{}", safe_name.to_lowercase(), PROJECT_EXTENSION)
}

/// Ensure a path has the correct extension
pub fn ensure_extension(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();

    if path.extension().is_none_or(|e| e != PROJECT_EXTENSION) {
        let mut new_path = path.to_path_buf();
        new_path.set_extension(PROJECT_EXTENSION);
        new_path
    } else {
        path.to_path_buf()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::PALETTE;
    use crate::{Entity, Field, ProjectConfig, Relation, Service};
    use blueprint_core::FieldType;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    fn sample() -> ProjectDocument {
        let mut doc = ProjectDocument::new(
            ProjectConfig::new("Shop").with_option("framework", "axum"),
        );
        let user = Entity::new("User")
            .at(10.0, 20.0)
            .with_field(Field::new("email", FieldType::String).required().unique());
        let order = Entity::new("Order").at(300.0, 20.0);
        let mut billing = Service::new("Billing", PALETTE[0]).at(0.0, 400.0);
        billing.insert_entity(order.id);

        doc.relations
            .push(Relation::many_to_one(order.id, user.id).with_defaults("Order", "User"));
        doc.entities.push(user);
        doc.entities.push(order);
        doc.services.push(billing);
        doc
    }

    #[test]
    fn test_export_then_parse_reproduces_collections() {
        let doc = sample().stamped();
        let json = export_to_string(&doc).unwrap();
        let back = parse_document(&json).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn test_save_and_load_document() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("shop.json");

        let doc = sample();
        save_document(&doc, &path).unwrap();
        assert!(path.exists());

        let loaded = load_document(&path).unwrap();
        assert_eq!(loaded.entities.len(), 2);
        assert_eq!(loaded.project.name, "Shop");
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_document("/nonexistent/path/project.json");
        assert!(matches!(result, Err(EngineError::ProjectNotFound(_))));
    }

    #[test]
    fn test_invalid_json_is_format_error() {
        let err = parse_document("{ not json").unwrap_err();
        assert!(matches!(err, EngineError::InvalidProjectFormat(_)));
    }

    #[test]
    fn test_rejection_lists_all_violations() {
        let err = parse_document(
            r#"{ "project": {}, "entities": [ { "id": "x", "name": "" } ], "relations": [] }"#,
        )
        .unwrap_err();

        let violations = err.violations();
        assert!(violations.len() >= 4, "{:?}", violations);
        assert!(violations.iter().any(|v| v.starts_with("[entities[0].id]")));
        assert!(violations.iter().any(|v| v.starts_with("[entities[0].name]")));
        assert!(violations.iter().any(|v| v.starts_with("[entities[0].tableName]")));
        assert!(violations.iter().any(|v| v.starts_with("[entities[0].position]")));
    }

    #[test]
    fn test_migrates_version_zero() {
        let doc = json!({
            "schemaVersion": 0,
            "project": { "name": "Legacy" },
            "entities": [],
            "relations": []
        });
        let parsed = parse_document_value(doc).unwrap();
        assert_eq!(parsed.schema_version, SCHEMA_VERSION);
        assert!(parsed.services.is_empty());
    }

    #[test]
    fn test_unknown_project_keys_survive() {
        let json = r#"{
            "project": { "name": "Shop", "futureSetting": { "a": 1 } },
            "entities": [],
            "relations": []
        }"#;
        let doc = parse_document(json).unwrap();
        assert_eq!(doc.project.version, "0.1.0");

        let again = parse_document(&export_to_string(&doc).unwrap()).unwrap();
        assert_eq!(again.project.extra["futureSetting"], json!({ "a": 1 }));
    }

    #[test]
    fn test_default_file_name() {
        assert_eq!(default_file_name("My Shop"), "my_shop.json");
        assert_eq!(ensure_extension("shop"), PathBuf::from("shop.json"));
        assert_eq!(ensure_extension("shop.json"), PathBuf::from("shop.json"));
    }
}
