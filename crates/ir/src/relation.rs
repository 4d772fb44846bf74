//! Relation definitions between entities
//!
//! This module contains the `Relation` struct and related types for defining
//! directed, typed associations between entities (foreign key relationships).

use crate::entity::derive_table_name;
use blueprint_core::{
    CascadeType, EngineError, EngineResult, EntityId, FetchType, ReferentialAction, RelationId,
    RelationType, Validatable,
};
use heck::ToSnakeCase;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Relation
// ============================================================================

/// Represents a relation between two entities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    /// Unique identifier for this relation
    pub id: RelationId,

    /// Cardinality of the relation
    #[serde(rename = "type")]
    pub relation_type: RelationType,

    /// ID of the source entity (the "from" side)
    pub source_entity_id: EntityId,

    /// ID of the target entity (the "to" side)
    pub target_entity_id: EntityId,

    /// Property name on the source entity (e.g., "author" for Post -> User)
    pub source_field_name: String,

    /// Whether the inverse side is navigable as well
    #[serde(default)]
    pub bidirectional: bool,

    /// Loading strategy
    #[serde(default)]
    pub fetch_type: FetchType,

    /// Operations propagated from source to target
    #[serde(default)]
    pub cascade: Vec<CascadeType>,

    /// Foreign key column on the owning side
    pub foreign_key: ForeignKey,

    /// Junction table for many-to-many relations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_table: Option<JoinTable>,
}

impl Relation {
    /// Create a new relation between two entities
    pub fn new(
        source_entity_id: EntityId,
        target_entity_id: EntityId,
        relation_type: RelationType,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            relation_type,
            source_entity_id,
            target_entity_id,
            source_field_name: String::new(),
            bidirectional: false,
            fetch_type: FetchType::default(),
            cascade: Vec::new(),
            foreign_key: ForeignKey::default(),
            join_table: None,
        }
    }

    /// Create a one-to-one relation
    pub fn one_to_one(source: EntityId, target: EntityId) -> Self {
        Self::new(source, target, RelationType::OneToOne)
    }

    /// Create a one-to-many relation
    pub fn one_to_many(source: EntityId, target: EntityId) -> Self {
        Self::new(source, target, RelationType::OneToMany)
    }

    /// Create a many-to-one relation
    pub fn many_to_one(source: EntityId, target: EntityId) -> Self {
        Self::new(source, target, RelationType::ManyToOne)
    }

    /// Create a many-to-many relation
    pub fn many_to_many(source: EntityId, target: EntityId) -> Self {
        Self::new(source, target, RelationType::ManyToMany)
    }

    /// Fill in naming defaults from the endpoint entity names.
    ///
    /// Sets the source field name and foreign key column when they are empty,
    /// and a join table for many-to-many relations that have none.
    pub fn with_defaults(mut self, source_name: &str, target_name: &str) -> Self {
        let target_snake = target_name.trim().to_snake_case();

        if self.source_field_name.is_empty() {
            self.source_field_name = if self.relation_type.is_to_many() {
                derive_table_name(target_name)
            } else {
                target_snake.clone()
            };
        }

        if self.foreign_key.column_name.is_empty() {
            self.foreign_key.column_name = format!("{}_id", target_snake);
        }

        if self.relation_type.requires_join_table() && self.join_table.is_none() {
            self.join_table = Some(JoinTable::between(source_name, target_name));
        }

        self
    }

    // ========================================================================
    // Builder methods
    // ========================================================================

    /// Set the source field name
    pub fn with_field_name(mut self, name: impl Into<String>) -> Self {
        self.source_field_name = name.into();
        self
    }

    /// Make the relation navigable from both sides
    pub fn bidirectional(mut self) -> Self {
        self.bidirectional = true;
        self
    }

    /// Set the fetch type
    pub fn with_fetch(mut self, fetch_type: FetchType) -> Self {
        self.fetch_type = fetch_type;
        self
    }

    /// Add a cascade operation
    pub fn with_cascade(mut self, cascade: CascadeType) -> Self {
        if !self.cascade.contains(&cascade) {
            self.cascade.push(cascade);
        }
        self
    }

    /// Set the on delete action
    pub fn on_delete(mut self, action: ReferentialAction) -> Self {
        self.foreign_key.on_delete = action;
        self
    }

    /// Set the on update action
    pub fn on_update(mut self, action: ReferentialAction) -> Self {
        self.foreign_key.on_update = action;
        self
    }

    // ========================================================================
    // Query methods
    // ========================================================================

    /// Check if this relation touches the given entity on either side
    pub fn involves_entity(&self, entity_id: EntityId) -> bool {
        self.source_entity_id == entity_id || self.target_entity_id == entity_id
    }

    /// Check if this is a self-referential relation
    pub fn is_self_referential(&self) -> bool {
        self.source_entity_id == self.target_entity_id
    }

    /// Get the other entity ID given one side of the relation
    pub fn other_entity(&self, entity_id: EntityId) -> Option<EntityId> {
        if self.source_entity_id == entity_id {
            Some(self.target_entity_id)
        } else if self.target_entity_id == entity_id {
            Some(self.source_entity_id)
        } else {
            None
        }
    }

    /// Short label for display, e.g. "author (* >─── 1)"
    pub fn label(&self) -> String {
        if self.source_field_name.is_empty() {
            self.relation_type.arrow_symbol().to_string()
        } else {
            format!(
                "{} ({})",
                self.source_field_name,
                self.relation_type.arrow_symbol()
            )
        }
    }

    /// Apply a partial update. Returns `true` if anything changed.
    pub fn apply(&mut self, patch: RelationPatch) -> bool {
        let before = self.clone();

        if let Some(relation_type) = patch.relation_type {
            self.relation_type = relation_type;
        }
        if let Some(name) = patch.source_field_name {
            self.source_field_name = name;
        }
        if let Some(bidirectional) = patch.bidirectional {
            self.bidirectional = bidirectional;
        }
        if let Some(fetch_type) = patch.fetch_type {
            self.fetch_type = fetch_type;
        }
        if let Some(cascade) = patch.cascade {
            self.cascade = cascade;
        }
        if let Some(foreign_key) = patch.foreign_key {
            self.foreign_key = foreign_key;
        }
        if let Some(join_table) = patch.join_table {
            self.join_table = join_table;
        }

        *self != before
    }
}

impl Validatable for Relation {
    fn validate(&self) -> EngineResult<()> {
        if self.relation_type.requires_join_table() {
            if let Some(join) = &self.join_table {
                if join.name.trim().is_empty() {
                    return Err(EngineError::RelationValidation(
                        "Join table name cannot be empty".to_string(),
                    ));
                }
            }
        } else if self.foreign_key.column_name.trim().is_empty() {
            return Err(EngineError::RelationValidation(format!(
                "Relation '{}' needs a foreign key column",
                self.label()
            )));
        }

        if self.foreign_key.on_delete == ReferentialAction::SetNull && !self.foreign_key.nullable {
            return Err(EngineError::RelationValidation(
                "ON DELETE SET NULL requires a nullable foreign key".to_string(),
            ));
        }

        Ok(())
    }
}

// ============================================================================
// ForeignKey
// ============================================================================

/// Foreign key column definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKey {
    /// Column holding the reference
    pub column_name: String,

    /// Whether the column allows NULL
    #[serde(default = "default_true")]
    pub nullable: bool,

    /// Referential action on delete
    #[serde(default)]
    pub on_delete: ReferentialAction,

    /// Referential action on update
    #[serde(default)]
    pub on_update: ReferentialAction,
}

impl Default for ForeignKey {
    fn default() -> Self {
        Self {
            column_name: String::new(),
            nullable: true,
            on_delete: ReferentialAction::default(),
            on_update: ReferentialAction::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

// ============================================================================
// JoinTable
// ============================================================================

/// Junction table for a many-to-many relation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinTable {
    pub name: String,
    pub join_column: String,
    pub inverse_join_column: String,
}

impl JoinTable {
    /// Default junction table between two entities, e.g. `post_tags`
    pub fn between(source_name: &str, target_name: &str) -> Self {
        let source = source_name.trim().to_snake_case();
        Self {
            name: format!("{}_{}", source, derive_table_name(target_name)),
            join_column: format!("{}_id", source),
            inverse_join_column: format!("{}_id", target_name.trim().to_snake_case()),
        }
    }
}

// ============================================================================
// RelationPatch
// ============================================================================

/// Partial update for a relation; endpoints are immutable
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelationPatch {
    pub relation_type: Option<RelationType>,
    pub source_field_name: Option<String>,
    pub bidirectional: Option<bool>,
    pub fetch_type: Option<FetchType>,
    pub cascade: Option<Vec<CascadeType>>,
    pub foreign_key: Option<ForeignKey>,
    /// `Some(None)` drops the join table
    pub join_table: Option<Option<JoinTable>>,
}

// ============================================================================
// Tests
// ============================================================================
