//! Entity definitions for data models
//!
//! This module contains the `Entity` struct, its configuration and the
//! `EntityPatch` used for partial updates.

use crate::field::{Field, FieldPatch};
use blueprint_core::{EngineError, EngineResult, EntityId, FieldId, Position, Validatable};
use heck::ToSnakeCase;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Name given to an entity created without a usable one
pub const DEFAULT_ENTITY_NAME: &str = "Entity";

// ============================================================================
// Entity
// ============================================================================

/// Represents a data entity (maps to a database table)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    /// Unique identifier for this entity
    pub id: EntityId,

    /// Entity name (e.g., "User", "BlogPost")
    pub name: String,

    /// Database table name (e.g., "users", "blog_posts")
    pub table_name: String,

    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Absolute position on the canvas
    pub position: Position,

    /// Fields (columns) in this entity
    #[serde(default)]
    pub fields: Vec<Field>,

    /// Entity configuration options
    #[serde(default)]
    pub config: EntityConfig,
}

impl Entity {
    /// Create a new entity with the given name and a UUID primary key
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let table_name = derive_table_name(&name);

        Self {
            id: Uuid::new_v4(),
            name,
            table_name,
            description: None,
            position: Position::zero(),
            fields: vec![Field::primary_key()],
            config: EntityConfig::default(),
        }
    }

    // ========================================================================
    // Builder methods
    // ========================================================================

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the position using x, y coordinates
    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.position = Position::new(x, y);
        self
    }

    /// Add a field using builder pattern. Duplicate names are silently skipped.
    pub fn with_field(mut self, field: Field) -> Self {
        let _ = self.add_field(field);
        self
    }

    // ========================================================================
    // Field management
    // ========================================================================

    /// Add a field, rejecting an invalid field or a derived name that
    /// already exists
    pub fn add_field(&mut self, field: Field) -> EngineResult<FieldId> {
        field
            .validate()
            .map_err(|e| EngineError::field_validation(&self.name, &field.name, e.to_string()))?;

        let derived = field.derived_name();
        if self.fields.iter().any(|f| f.derived_name() == derived) {
            return Err(EngineError::DuplicateField {
                entity: self.name.clone(),
                field: field.name,
            });
        }
        let id = field.id;
        self.fields.push(field);
        Ok(id)
    }

    /// Update a field by ID. `Ok(false)` when the field is unknown or unchanged.
    pub fn update_field(&mut self, field_id: FieldId, patch: FieldPatch) -> EngineResult<bool> {
        if let Some(name) = &patch.name {
            let derived = crate::field::derive_column_name(name);
            if self
                .fields
                .iter()
                .any(|f| f.id != field_id && f.derived_name() == derived)
            {
                return Err(EngineError::DuplicateField {
                    entity: self.name.clone(),
                    field: name.clone(),
                });
            }
        }

        let Some(field) = self.fields.iter_mut().find(|f| f.id == field_id) else {
            return Ok(false);
        };
        let mut next = field.clone();
        if !next.apply(patch) {
            return Ok(false);
        }
        next.validate()
            .map_err(|e| EngineError::field_validation(&self.name, &next.name, e.to_string()))?;
        *field = next;
        Ok(true)
    }

    /// Remove a field by ID
    pub fn remove_field(&mut self, field_id: FieldId) -> Option<Field> {
        let pos = self.fields.iter().position(|f| f.id == field_id)?;
        Some(self.fields.remove(pos))
    }

    /// Get a field by ID
    pub fn get_field(&self, field_id: FieldId) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == field_id)
    }

    /// Get a field by name
    pub fn get_field_by_name(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Check if entity has a specific field name
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    /// Get the number of fields
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    // ========================================================================
    // Updates
    // ========================================================================

    /// Apply a partial update. Returns `true` if anything changed.
    ///
    /// A rename recomputes `table_name` unless it was set explicitly.
    pub fn apply(&mut self, patch: EntityPatch) -> bool {
        let before = self.clone();

        if let Some(name) = patch.name {
            if self.table_name == derive_table_name(&self.name) {
                self.table_name = derive_table_name(&name);
            }
            self.name = name;
        }
        if let Some(table_name) = patch.table_name {
            self.table_name = table_name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(position) = patch.position {
            self.position = position;
        }
        if let Some(config) = patch.config {
            self.config = config;
        }

        *self != before
    }

    /// Apply a partial update, keeping the entity unchanged when the result
    /// would not validate
    pub fn update(&mut self, patch: EntityPatch) -> EngineResult<bool> {
        let mut next = self.clone();
        if !next.apply(patch) {
            return Ok(false);
        }
        next.validate()?;
        *self = next;
        Ok(true)
    }

    /// Move the entity by a delta
    pub fn translate(&mut self, delta: Position) {
        self.position += delta;
    }
}

impl Validatable for Entity {
    fn validate(&self) -> EngineResult<()> {
        if self.name.trim().is_empty() {
            return Err(EngineError::entity_validation(
                &self.name,
                "Entity name cannot be empty",
            ));
        }

        if self.table_name.trim().is_empty() {
            return Err(EngineError::entity_validation(
                &self.name,
                "Table name cannot be empty",
            ));
        }

        for field in &self.fields {
            field.validate().map_err(|e| {
                EngineError::field_validation(&self.name, &field.name, e.to_string())
            })?;
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.derived_name()) {
                return Err(EngineError::DuplicateField {
                    entity: self.name.clone(),
                    field: field.name.clone(),
                });
            }
        }

        Ok(())
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::new(DEFAULT_ENTITY_NAME)
    }
}

// ============================================================================
// EntityConfig
// ============================================================================

/// Generation options for an entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EntityConfig {
    /// Auto-generate created_at/updated_at columns
    pub timestamps: bool,

    /// Use soft delete (deleted_at) instead of hard delete
    pub soft_delete: bool,

    /// Generate API endpoints for this entity
    pub generate_api: bool,
}

impl Default for EntityConfig {
    fn default() -> Self {
        Self {
            timestamps: true,
            soft_delete: false,
            generate_api: true,
        }
    }
}

// ============================================================================
// EntityPatch
// ============================================================================

/// Partial update for an entity; `None` leaves the attribute untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityPatch {
    pub name: Option<String>,
    pub table_name: Option<String>,
    /// `Some(None)` clears the description
    pub description: Option<Option<String>>,
    pub position: Option<Position>,
    pub config: Option<EntityConfig>,
}

impl EntityPatch {
    /// Patch that renames the entity
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Patch that moves the entity
    pub fn position(position: Position) -> Self {
        Self {
            position: Some(position),
            ..Default::default()
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Derive a table name from an entity name (snake_case plural)
pub fn derive_table_name(name: &str) -> String {
    let snake = name.trim().to_snake_case();

    if snake.is_empty() {
        snake
    } else if snake.ends_with('s')
        || snake.ends_with('x')
        || snake.ends_with("ch")
        || snake.ends_with("sh")
    {
        format!("{}es", snake)
    } else if snake.ends_with('y')
        && !snake.ends_with("ey")
        && !snake.ends_with("ay")
        && !snake.ends_with("oy")
    {
        format!("{}ies", &snake[..snake.len() - 1])
    } else {
        format!("{}s", snake)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use blueprint_core::{FieldType, Validation};

    #[test]
    fn test_entity_new() {
        let entity = Entity::new("User");
        assert_eq!(entity.name, "User");
        assert_eq!(entity.table_name, "users");
        assert_eq!(entity.field_count(), 1);
        assert!(entity.has_field("id"));
    }

    #[test]
    fn test_derive_table_name() {
        assert_eq!(derive_table_name("User"), "users");
        assert_eq!(derive_table_name("BlogPost"), "blog_posts");
        assert_eq!(derive_table_name("Category"), "categories");
        assert_eq!(derive_table_name("Box"), "boxes");
        assert_eq!(derive_table_name("Key"), "keys");
        assert_eq!(derive_table_name(""), "");
    }

    #[test]
    fn test_add_field_rejects_duplicate_derived_name() {
        let mut entity = Entity::new("User");
        entity
            .add_field(Field::new("firstName", FieldType::String))
            .unwrap();

        let err = entity
            .add_field(Field::new("first_name", FieldType::Text))
            .unwrap_err();
        assert!(matches!(err, EngineError::DuplicateField { .. }));
        assert_eq!(entity.field_count(), 2);
    }

    #[test]
    fn test_update_field_rename_collision() {
        let mut entity = Entity::new("User");
        let email = entity
            .add_field(Field::new("email", FieldType::String))
            .unwrap();

        assert!(entity.update_field(email, FieldPatch::rename("id")).is_err());
        assert!(entity.update_field(email, FieldPatch::rename("mail")).unwrap());
        assert_eq!(entity.get_field(email).unwrap().column_name, "mail");
    }

    #[test]
    fn test_update_unknown_field_is_noop() {
        let mut entity = Entity::new("User");
        let changed = entity
            .update_field(Uuid::new_v4(), FieldPatch::rename("ghost"))
            .unwrap();
        assert!(!changed);
    }

    #[test]
    fn test_remove_field() {
        let mut entity = Entity::new("User");
        let id = entity
            .add_field(Field::new("temp", FieldType::String))
            .unwrap();
        assert!(entity.remove_field(id).is_some());
        assert!(!entity.has_field("temp"));
        assert!(entity.remove_field(id).is_none());
    }

    #[test]
    fn test_rename_follows_derived_table_name() {
        let mut entity = Entity::new("User");
        assert!(entity.apply(EntityPatch::rename("Customer")));
        assert_eq!(entity.table_name, "customers");

        entity.apply(EntityPatch {
            table_name: Some("tbl_customer".to_string()),
            ..Default::default()
        });
        entity.apply(EntityPatch::rename("Client"));
        assert_eq!(entity.table_name, "tbl_customer");
    }

    #[test]
    fn test_identical_patch_reports_no_change() {
        let mut entity = Entity::new("User").at(10.0, 20.0);
        assert!(!entity.apply(EntityPatch::position(Position::new(10.0, 20.0))));
        assert!(!entity.apply(EntityPatch::rename("User")));
    }

    #[test]
    fn test_entity_validation() {
        assert!(Entity::new("User").validate().is_ok());

        let mut invalid = Entity::new("User");
        invalid.name = String::new();
        assert!(invalid.validate().is_err());

        let mut dup = Entity::new("User");
        dup.fields.push(Field::new("id", FieldType::Long));
        assert!(dup.validate().is_err());
    }

    #[test]
    fn test_add_field_rejects_invalid_field() {
        let mut entity = Entity::new("Account");
        let code = Field::new("code", FieldType::String)
            .with_validation(Validation::MinLength(10))
            .with_validation(Validation::MaxLength(2));

        let err = entity.add_field(code).unwrap_err();
        assert!(matches!(err, EngineError::FieldValidation { .. }));
        assert!(!entity.has_field("code"));
        assert!(entity.add_field(Field::new("  ", FieldType::String)).is_err());
    }

    #[test]
    fn test_update_field_keeps_field_when_result_is_invalid() {
        let mut entity = Entity::new("Account");
        let code = entity
            .add_field(Field::new("code", FieldType::String).with_validation(Validation::MaxLength(2)))
            .unwrap();

        let patch = FieldPatch {
            validations: Some(vec![Validation::MinLength(10), Validation::MaxLength(2)]),
            ..Default::default()
        };
        assert!(entity.update_field(code, patch).is_err());
        assert_eq!(
            entity.get_field(code).unwrap().validations,
            vec![Validation::MaxLength(2)]
        );
        assert!(entity.validate().is_ok());
    }

    #[test]
    fn test_update_rejects_empty_name() {
        let mut entity = Entity::new("User");
        assert!(entity.update(EntityPatch::rename("")).is_err());
        assert!(entity.update(EntityPatch::rename("!!")).is_err());
        assert_eq!(entity.name, "User");
        assert_eq!(entity.table_name, "users");

        assert!(entity.update(EntityPatch::rename("Member")).unwrap());
        assert_eq!(entity.table_name, "members");
        assert!(!entity.update(EntityPatch::rename("Member")).unwrap());
    }

    #[test]
    fn test_translate() {
        let mut entity = Entity::new("User").at(100.0, 100.0);
        entity.translate(Position::new(50.0, -25.0));
        assert_eq!(entity.position, Position::new(150.0, 75.0));
    }
}
