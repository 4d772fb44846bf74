//! Field definitions for entity properties
//!
//! This module contains the `Field` struct and the `FieldPatch` used for
//! partial updates. A field is owned by exactly one entity and is only ever
//! created, changed or removed through that entity's field operations.

use blueprint_core::{
    DefaultValue, EngineError, EngineResult, FieldId, FieldType, Validatable, Validation,
};
use heck::ToSnakeCase;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Field
// ============================================================================

/// Represents a field within an entity (maps to a database column)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Unique identifier for this field
    pub id: FieldId,

    /// Field name as typed by the user
    pub name: String,

    /// Database column name, derived from `name` unless overridden
    pub column_name: String,

    /// Data type of the field
    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Whether NULL is allowed
    pub nullable: bool,

    /// Whether the value must be unique
    pub unique: bool,

    /// Validation rules for the field
    #[serde(default)]
    pub validations: Vec<Validation>,

    /// Default value for the field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<DefaultValue>,
}

impl Field {
    /// Create a new field with the given name and data type
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        let name = name.into();
        let column_name = derive_column_name(&name);

        Self {
            id: Uuid::new_v4(),
            name,
            column_name,
            field_type,
            nullable: true,
            unique: false,
            validations: Vec::new(),
            default_value: None,
        }
    }

    /// Create a UUID primary key field
    pub fn primary_key() -> Self {
        let mut field = Self::new("id", FieldType::Uuid);
        field.nullable = false;
        field.unique = true;
        field
    }

    // ========================================================================
    // Builder methods
    // ========================================================================

    /// Mark the field as NOT NULL
    pub fn required(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Mark the field as unique
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Set a default value
    pub fn with_default(mut self, default: DefaultValue) -> Self {
        self.default_value = Some(default);
        self
    }

    /// Add a validation rule
    pub fn with_validation(mut self, validation: Validation) -> Self {
        self.validations.push(validation);
        self
    }

    /// Override the column name
    pub fn with_column_name(mut self, column_name: impl Into<String>) -> Self {
        self.column_name = column_name.into();
        self
    }

    // ========================================================================
    // Naming
    // ========================================================================

    /// The identifier generators use for this field (snake_case of `name`)
    pub fn derived_name(&self) -> String {
        derive_column_name(&self.name)
    }

    /// Whether `column_name` was set explicitly rather than derived
    pub fn has_column_override(&self) -> bool {
        self.column_name != derive_column_name(&self.name)
    }

    /// Apply a partial update. Returns `true` if anything changed.
    ///
    /// Renaming recomputes `column_name` unless it was overridden or the
    /// patch sets it explicitly.
    pub fn apply(&mut self, patch: FieldPatch) -> bool {
        let before = self.clone();

        if let Some(name) = patch.name {
            if !self.has_column_override() {
                self.column_name = derive_column_name(&name);
            }
            self.name = name;
        }
        if let Some(column_name) = patch.column_name {
            self.column_name = column_name;
        }
        if let Some(field_type) = patch.field_type {
            self.field_type = field_type;
        }
        if let Some(nullable) = patch.nullable {
            self.nullable = nullable;
        }
        if let Some(unique) = patch.unique {
            self.unique = unique;
        }
        if let Some(validations) = patch.validations {
            self.validations = validations;
        }
        if let Some(default_value) = patch.default_value {
            self.default_value = default_value;
        }

        *self != before
    }
}

impl Validatable for Field {
    fn validate(&self) -> EngineResult<()> {
        if self.name.trim().is_empty() {
            return Err(EngineError::validation("Field name cannot be empty"));
        }

        if self.column_name.trim().is_empty() {
            return Err(EngineError::validation(format!(
                "Column name of field '{}' cannot be empty",
                self.name
            )));
        }

        let min = self.validations.iter().find_map(|v| match v {
            Validation::MinLength(n) => Some(*n),
            _ => None,
        });
        let max = self.validations.iter().find_map(|v| match v {
            Validation::MaxLength(n) => Some(*n),
            _ => None,
        });
        if let (Some(min), Some(max)) = (min, max) {
            if min > max {
                return Err(EngineError::validation(format!(
                    "Field '{}' has min length {} greater than max length {}",
                    self.name, min, max
                )));
            }
        }

        Ok(())
    }
}

impl Default for Field {
    fn default() -> Self {
        Self::new("field", FieldType::String)
    }
}

// ============================================================================
// FieldPatch
// ============================================================================

/// Partial update for a field; `None` leaves the attribute untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldPatch {
    pub name: Option<String>,
    pub column_name: Option<String>,
    pub field_type: Option<FieldType>,
    pub nullable: Option<bool>,
    pub unique: Option<bool>,
    pub validations: Option<Vec<Validation>>,
    /// `Some(None)` clears the default
    pub default_value: Option<Option<DefaultValue>>,
}

impl FieldPatch {
    /// Patch that renames the field
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Derive a column name from a field name (snake_case)
pub fn derive_column_name(name: &str) -> String {
    name.trim().to_snake_case()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_new_derives_column() {
        let field = Field::new("firstName", FieldType::String);
        assert_eq!(field.column_name, "first_name");
        assert!(field.nullable);
        assert!(!field.has_column_override());
    }

    #[test]
    fn test_primary_key() {
        let pk = Field::primary_key();
        assert_eq!(pk.name, "id");
        assert_eq!(pk.field_type, FieldType::Uuid);
        assert!(!pk.nullable);
        assert!(pk.unique);
    }

    #[test]
    fn test_rename_recomputes_derived_column() {
        let mut field = Field::new("email", FieldType::String);
        assert!(field.apply(FieldPatch::rename("emailAddress")));
        assert_eq!(field.column_name, "email_address");
    }

    #[test]
    fn test_rename_keeps_overridden_column() {
        let mut field = Field::new("email", FieldType::String).with_column_name("mail");
        assert!(field.has_column_override());
        field.apply(FieldPatch::rename("emailAddress"));
        assert_eq!(field.column_name, "mail");
    }

    #[test]
    fn test_identical_patch_reports_no_change() {
        let mut field = Field::new("age", FieldType::Integer);
        let changed = field.apply(FieldPatch {
            field_type: Some(FieldType::Integer),
            nullable: Some(true),
            ..Default::default()
        });
        assert!(!changed);
    }

    #[test]
    fn test_field_validation() {
        assert!(Field::new("title", FieldType::String).validate().is_ok());

        let mut empty = Field::new("x", FieldType::String);
        empty.name = "  ".to_string();
        assert!(empty.validate().is_err());

        let inverted = Field::new("code", FieldType::String)
            .with_validation(Validation::MinLength(10))
            .with_validation(Validation::MaxLength(2));
        assert!(inverted.validate().is_err());
    }

    #[test]
    fn test_field_serde_uses_type_key() {
        let field = Field::new("createdAt", FieldType::DateTime)
            .required()
            .with_default(DefaultValue::Now);
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(json["type"], "dateTime");
        assert_eq!(json["columnName"], "created_at");
        assert_eq!(json["nullable"], false);

        let back: Field = serde_json::from_value(json).unwrap();
        assert_eq!(back, field);
    }
}
