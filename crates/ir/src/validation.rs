//! Validation rules and utilities for project documents
//!
//! Two layers run on import:
//!
//! - `check_document_shape` walks the raw JSON and reports every type, id and
//!   enum violation with its path (e.g. `entities[2].fields[0].type`).
//! - `Validator` runs cross-record rules on the typed document: dangling
//!   references, duplicate ids and the one-service-per-entity rule.
//!
//! Both collect every problem instead of stopping at the first.

use crate::ProjectDocument;
use crate::SCHEMA_VERSION;
use blueprint_core::{
    CascadeType, CommunicationType, EngineError, EngineResult, FetchType, FieldType,
    ReferentialAction, RelationType, Validatable,
};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

// ============================================================================
// ValidationResult
// ============================================================================

/// Result of a validation operation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether the validation passed
    pub valid: bool,

    /// List of errors (empty if valid)
    pub errors: Vec<ValidationError>,

    /// List of warnings (non-fatal issues)
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    /// Create a successful validation result
    pub fn ok() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Add an error to the result
    pub fn add_error(&mut self, error: ValidationError) {
        self.valid = false;
        self.errors.push(error);
    }

    /// Add a warning to the result
    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Merge another validation result into this one
    pub fn merge(&mut self, other: ValidationResult) {
        if !other.valid {
            self.valid = false;
        }
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Check if there are any warnings
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Convert to EngineResult; every error becomes one import violation
    pub fn to_result(self) -> EngineResult<()> {
        if self.valid {
            Ok(())
        } else {
            Err(EngineError::import_rejected(
                self.errors.iter().map(ToString::to_string),
            ))
        }
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::ok()
    }
}

// ============================================================================
// ValidationError
// ============================================================================

/// A validation error
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Error code for programmatic handling
    pub code: ValidationErrorCode,

    /// Human-readable error message
    pub message: String,

    /// JSON path to the problematic element (e.g., "entities[0].name")
    pub path: Option<String>,

    /// Suggested fix
    pub suggestion: Option<String>,
}

impl ValidationError {
    /// Create a new validation error
    pub fn new(code: ValidationErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
            suggestion: None,
        }
    }

    /// Add a path to the error
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Add a suggestion to the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(path) = &self.path {
            write!(f, "[{}] {}", path, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

/// Error codes for validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationErrorCode {
    // Shape errors
    MissingKey,
    WrongType,
    InvalidId,
    InvalidEnumValue,
    UnsupportedSchemaVersion,

    // Record errors
    EmptyName,
    DuplicateId,
    DuplicateFieldName,
    InvalidEntity,
    InvalidService,

    // Reference errors
    DanglingRelation,
    DanglingAssignment,
    MultipleOwners,
    DanglingConnection,
    MissingJoinTable,
}

// ============================================================================
// ValidationWarning
// ============================================================================

/// A validation warning (non-fatal issue)
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// Warning code
    pub code: ValidationWarningCode,

    /// Human-readable warning message
    pub message: String,

    /// Path to the element
    pub path: Option<String>,
}

impl ValidationWarning {
    /// Create a new warning
    pub fn new(code: ValidationWarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
        }
    }

    /// Add a path
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(path) = &self.path {
            write!(f, "[{}] Warning: {}", path, self.message)
        } else {
            write!(f, "Warning: {}", self.message)
        }
    }
}

/// Warning codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationWarningCode {
    DuplicateEntityName,
    NoPrimaryKey,
    NoRelations,
    IncompleteRelation,
    SelfConnection,
}

// ============================================================================
// Shape check (raw JSON)
// ============================================================================

/// Walk the raw document and report every structural violation.
pub fn check_document_shape(doc: &Value) -> ValidationResult {
    let mut walker = ShapeWalker::default();

    let Some(root) = doc.as_object() else {
        walker.error(
            ValidationErrorCode::WrongType,
            "$",
            "document must be a JSON object",
        );
        return walker.result;
    };

    if let Some(version) = root.get("schemaVersion") {
        match version.as_u64() {
            Some(v) if v <= SCHEMA_VERSION as u64 => {}
            Some(v) => walker.error(
                ValidationErrorCode::UnsupportedSchemaVersion,
                "schemaVersion",
                format!("schema version {} is newer than supported {}", v, SCHEMA_VERSION),
            ),
            None => walker.error(
                ValidationErrorCode::WrongType,
                "schemaVersion",
                "expected a non-negative integer",
            ),
        }
    }

    match root.get("project") {
        Some(Value::Object(project)) => walker.check_project(project),
        Some(_) => walker.error(ValidationErrorCode::WrongType, "project", "expected an object"),
        None => walker.error(ValidationErrorCode::MissingKey, "project", "missing required key"),
    }

    walker.each(root, "entities", true, ShapeWalker::check_entity);
    walker.each(root, "relations", true, ShapeWalker::check_relation);
    walker.each(root, "services", false, ShapeWalker::check_service);
    walker.each(root, "serviceConnections", false, ShapeWalker::check_connection);

    walker.result
}

#[derive(Default)]
struct ShapeWalker {
    result: ValidationResult,
}

impl ShapeWalker {
    fn error(&mut self, code: ValidationErrorCode, path: &str, message: impl Into<String>) {
        self.result
            .add_error(ValidationError::new(code, message).with_path(path));
    }

    /// Visit every object in an array-valued key
    fn each(
        &mut self,
        obj: &Map<String, Value>,
        key: &str,
        required: bool,
        check: fn(&mut Self, &Map<String, Value>, &str),
    ) {
        match obj.get(key) {
            Some(Value::Array(items)) => {
                for (i, item) in items.iter().enumerate() {
                    let path = format!("{}[{}]", key, i);
                    match item.as_object() {
                        Some(record) => check(self, record, &path),
                        None => self.error(ValidationErrorCode::WrongType, &path, "expected an object"),
                    }
                }
            }
            Some(_) => self.error(ValidationErrorCode::WrongType, key, "expected an array"),
            None if required => {
                self.error(ValidationErrorCode::MissingKey, key, "missing required key")
            }
            None => {}
        }
    }

    fn nested_each(
        &mut self,
        obj: &Map<String, Value>,
        parent: &str,
        key: &str,
        check: fn(&mut Self, &Map<String, Value>, &str),
    ) {
        match obj.get(key) {
            Some(Value::Array(items)) => {
                for (i, item) in items.iter().enumerate() {
                    let path = format!("{}.{}[{}]", parent, key, i);
                    match item.as_object() {
                        Some(record) => check(self, record, &path),
                        None => self.error(ValidationErrorCode::WrongType, &path, "expected an object"),
                    }
                }
            }
            Some(_) => self.error(
                ValidationErrorCode::WrongType,
                &format!("{}.{}", parent, key),
                "expected an array",
            ),
            None => {}
        }
    }

    fn string(&mut self, obj: &Map<String, Value>, parent: &str, key: &str, required: bool) {
        let path = format!("{}.{}", parent, key);
        match obj.get(key) {
            Some(Value::String(_)) => {}
            Some(Value::Null) | None if !required => {}
            Some(_) => self.error(ValidationErrorCode::WrongType, &path, "expected a string"),
            None => self.error(ValidationErrorCode::MissingKey, &path, "missing required key"),
        }
    }

    fn name(&mut self, obj: &Map<String, Value>, parent: &str) {
        self.string(obj, parent, "name", true);
        if let Some(Value::String(name)) = obj.get("name") {
            if name.trim().is_empty() {
                self.error(
                    ValidationErrorCode::EmptyName,
                    &format!("{}.name", parent),
                    "name cannot be empty",
                );
            }
        }
    }

    fn boolean(&mut self, obj: &Map<String, Value>, parent: &str, key: &str) {
        if let Some(value) = obj.get(key) {
            if !value.is_boolean() {
                self.error(
                    ValidationErrorCode::WrongType,
                    &format!("{}.{}", parent, key),
                    "expected a boolean",
                );
            }
        }
    }

    fn number(&mut self, obj: &Map<String, Value>, parent: &str, key: &str, required: bool) {
        let path = format!("{}.{}", parent, key);
        match obj.get(key) {
            Some(Value::Number(_)) => {}
            None if !required => {}
            Some(_) => self.error(ValidationErrorCode::WrongType, &path, "expected a number"),
            None => self.error(ValidationErrorCode::MissingKey, &path, "missing required key"),
        }
    }

    fn uuid(&mut self, obj: &Map<String, Value>, parent: &str, key: &str) {
        let path = format!("{}.{}", parent, key);
        match obj.get(key) {
            Some(Value::String(s)) if Uuid::parse_str(s).is_ok() => {}
            Some(Value::String(s)) => self.error(
                ValidationErrorCode::InvalidId,
                &path,
                format!("'{}' is not a valid UUID", s),
            ),
            Some(_) => self.error(ValidationErrorCode::WrongType, &path, "expected a UUID string"),
            None => self.error(ValidationErrorCode::MissingKey, &path, "missing required key"),
        }
    }

    fn uuid_list(&mut self, obj: &Map<String, Value>, parent: &str, key: &str) {
        match obj.get(key) {
            Some(Value::Array(items)) => {
                for (i, item) in items.iter().enumerate() {
                    let ok = item.as_str().is_some_and(|s| Uuid::parse_str(s).is_ok());
                    if !ok {
                        self.error(
                            ValidationErrorCode::InvalidId,
                            &format!("{}.{}[{}]", parent, key, i),
                            "expected a UUID string",
                        );
                    }
                }
            }
            Some(_) => self.error(
                ValidationErrorCode::WrongType,
                &format!("{}.{}", parent, key),
                "expected an array",
            ),
            None => {}
        }
    }

    fn enumeration<T>(
        &mut self,
        obj: &Map<String, Value>,
        parent: &str,
        key: &str,
        required: bool,
        parse: fn(&str) -> Option<T>,
    ) {
        let path = format!("{}.{}", parent, key);
        match obj.get(key) {
            Some(Value::String(s)) if parse(s).is_some() => {}
            Some(Value::String(s)) => self.error(
                ValidationErrorCode::InvalidEnumValue,
                &path,
                format!("unknown value '{}'", s),
            ),
            None if !required => {}
            Some(_) => self.error(ValidationErrorCode::WrongType, &path, "expected a string"),
            None => self.error(ValidationErrorCode::MissingKey, &path, "missing required key"),
        }
    }

    fn position(&mut self, obj: &Map<String, Value>, parent: &str) {
        let path = format!("{}.position", parent);
        match obj.get("position") {
            Some(Value::Object(pos)) => {
                self.number(pos, &path, "x", true);
                self.number(pos, &path, "y", true);
            }
            Some(_) => self.error(ValidationErrorCode::WrongType, &path, "expected an object"),
            None => self.error(ValidationErrorCode::MissingKey, &path, "missing required key"),
        }
    }

    fn object(&mut self, obj: &Map<String, Value>, parent: &str, key: &str) -> Option<Map<String, Value>> {
        match obj.get(key) {
            Some(Value::Object(inner)) => Some(inner.clone()),
            Some(_) => {
                self.error(
                    ValidationErrorCode::WrongType,
                    &format!("{}.{}", parent, key),
                    "expected an object",
                );
                None
            }
            None => None,
        }
    }

    // ------------------------------------------------------------------------

    fn check_project(&mut self, project: &Map<String, Value>) {
        for key in ["name", "description", "version", "packageName"] {
            self.string(project, "project", key, false);
        }
        self.object(project, "project", "options");
    }

    fn check_entity(&mut self, entity: &Map<String, Value>, path: &str) {
        self.uuid(entity, path, "id");
        self.name(entity, path);
        self.string(entity, path, "tableName", true);
        self.string(entity, path, "description", false);
        self.position(entity, path);
        self.nested_each(entity, path, "fields", Self::check_field);
        if let Some(config) = self.object(entity, path, "config") {
            let config_path = format!("{}.config", path);
            for key in ["timestamps", "softDelete", "generateApi"] {
                self.boolean(&config, &config_path, key);
            }
        }
    }

    fn check_field(&mut self, field: &Map<String, Value>, path: &str) {
        self.uuid(field, path, "id");
        self.name(field, path);
        self.string(field, path, "columnName", true);
        self.enumeration(field, path, "type", true, FieldType::parse);
        self.boolean(field, path, "nullable");
        self.boolean(field, path, "unique");
        if let Some(value) = field.get("validations") {
            if !value.is_array() {
                self.error(
                    ValidationErrorCode::WrongType,
                    &format!("{}.validations", path),
                    "expected an array",
                );
            }
        }
    }

    fn check_relation(&mut self, relation: &Map<String, Value>, path: &str) {
        self.uuid(relation, path, "id");
        self.enumeration(relation, path, "type", true, RelationType::parse);
        self.uuid(relation, path, "sourceEntityId");
        self.uuid(relation, path, "targetEntityId");
        self.string(relation, path, "sourceFieldName", true);
        self.boolean(relation, path, "bidirectional");
        self.enumeration(relation, path, "fetchType", false, FetchType::parse);

        match relation.get("cascade") {
            Some(Value::Array(items)) => {
                for (i, item) in items.iter().enumerate() {
                    if item.as_str().and_then(CascadeType::parse).is_none() {
                        self.error(
                            ValidationErrorCode::InvalidEnumValue,
                            &format!("{}.cascade[{}]", path, i),
                            format!("unknown cascade type {}", item),
                        );
                    }
                }
            }
            Some(_) => self.error(
                ValidationErrorCode::WrongType,
                &format!("{}.cascade", path),
                "expected an array",
            ),
            None => {}
        }

        let fk_path = format!("{}.foreignKey", path);
        match relation.get("foreignKey") {
            Some(Value::Object(fk)) => {
                self.string(fk, &fk_path, "columnName", true);
                self.boolean(fk, &fk_path, "nullable");
                self.enumeration(fk, &fk_path, "onDelete", false, ReferentialAction::parse);
                self.enumeration(fk, &fk_path, "onUpdate", false, ReferentialAction::parse);
            }
            Some(_) => self.error(ValidationErrorCode::WrongType, &fk_path, "expected an object"),
            None => self.error(ValidationErrorCode::MissingKey, &fk_path, "missing required key"),
        }

        if let Some(join) = self.object(relation, path, "joinTable") {
            let join_path = format!("{}.joinTable", path);
            for key in ["name", "joinColumn", "inverseJoinColumn"] {
                self.string(&join, &join_path, key, true);
            }
        }
    }

    fn check_service(&mut self, service: &Map<String, Value>, path: &str) {
        self.uuid(service, path, "id");
        self.name(service, path);
        self.string(service, path, "color", true);
        self.string(service, path, "description", false);
        self.position(service, path);
        self.number(service, path, "width", true);
        self.number(service, path, "height", true);
        self.uuid_list(service, path, "entityIds");
        if let Some(config) = self.object(service, path, "config") {
            let config_path = format!("{}.config", path);
            self.number(&config, &config_path, "port", false);
            self.string(&config, &config_path, "basePath", false);
            self.string(&config, &config_path, "database", false);
        }
    }

    fn check_connection(&mut self, connection: &Map<String, Value>, path: &str) {
        self.uuid(connection, path, "id");
        self.uuid(connection, path, "sourceServiceId");
        self.uuid(connection, path, "targetServiceId");
        self.enumeration(
            connection,
            path,
            "communicationType",
            false,
            CommunicationType::parse,
        );
        if let Some(config) = self.object(connection, path, "config") {
            let config_path = format!("{}.config", path);
            self.number(&config, &config_path, "timeoutMs", false);
            self.number(&config, &config_path, "retries", false);
        }
    }
}

// ============================================================================
// ValidationRule Trait
// ============================================================================

/// Trait for cross-record validation rules
pub trait ValidationRule {
    /// Get the rule name
    fn name(&self) -> &'static str;

    /// Get the rule description
    fn description(&self) -> &'static str;

    /// Validate a document and return the result
    fn validate(&self, doc: &ProjectDocument) -> ValidationResult;
}

// ============================================================================
// Validator
// ============================================================================

/// Document validator that runs multiple validation rules
#[derive(Default)]
pub struct Validator {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl Validator {
    /// Create a new validator
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Create a validator with default rules
    pub fn with_default_rules() -> Self {
        let mut validator = Self::new();
        validator.add_rule(Box::new(EntitiesRule));
        validator.add_rule(Box::new(RelationsRule));
        validator.add_rule(Box::new(ServicesRule));
        validator.add_rule(Box::new(ConnectionsRule));
        validator
    }

    /// Add a validation rule
    pub fn add_rule(&mut self, rule: Box<dyn ValidationRule>) {
        self.rules.push(rule);
    }

    /// Number of registered rules
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Validate a document with all rules
    pub fn validate(&self, doc: &ProjectDocument) -> ValidationResult {
        let mut result = ValidationResult::ok();
        for rule in &self.rules {
            result.merge(rule.validate(doc));
        }
        result
    }

    /// Validate and return Result
    pub fn validate_result(&self, doc: &ProjectDocument) -> EngineResult<()> {
        self.validate(doc).to_result()
    }
}

fn duplicate_ids<'a>(
    result: &mut ValidationResult,
    collection: &str,
    ids: impl Iterator<Item = &'a Uuid>,
) {
    let mut seen = HashSet::new();
    for (i, id) in ids.enumerate() {
        if !seen.insert(*id) {
            result.add_error(
                ValidationError::new(
                    ValidationErrorCode::DuplicateId,
                    format!("id {} appears more than once", id),
                )
                .with_path(format!("{}[{}].id", collection, i)),
            );
        }
    }
}

// ============================================================================
// Built-in Validation Rules
// ============================================================================

/// Rule: entities are unique and internally consistent
pub struct EntitiesRule;

impl ValidationRule for EntitiesRule {
    fn name(&self) -> &'static str {
        "entities"
    }

    fn description(&self) -> &'static str {
        "Validates entity ids, field names and primary keys"
    }

    fn validate(&self, doc: &ProjectDocument) -> ValidationResult {
        let mut result = ValidationResult::ok();
        duplicate_ids(&mut result, "entities", doc.entities.iter().map(|e| &e.id));

        let mut names: HashMap<String, usize> = HashMap::new();
        for (i, entity) in doc.entities.iter().enumerate() {
            let path = format!("entities[{}]", i);

            if let Err(e) = entity.validate() {
                let code = match e {
                    EngineError::DuplicateField { .. } => ValidationErrorCode::DuplicateFieldName,
                    _ => ValidationErrorCode::InvalidEntity,
                };
                result.add_error(ValidationError::new(code, e.to_string()).with_path(&path));
            }

            if let Some(first) = names.insert(entity.name.to_lowercase(), i) {
                result.add_warning(
                    ValidationWarning::new(
                        ValidationWarningCode::DuplicateEntityName,
                        format!(
                            "Entity '{}' has the same name as entities[{}]",
                            entity.name, first
                        ),
                    )
                    .with_path(&path),
                );
            }

            if !entity.fields.iter().any(|f| f.name == "id") {
                result.add_warning(
                    ValidationWarning::new(
                        ValidationWarningCode::NoPrimaryKey,
                        format!("Entity '{}' has no 'id' field", entity.name),
                    )
                    .with_path(&path),
                );
            }
        }

        result
    }
}

/// Rule: relations reference existing entities
pub struct RelationsRule;

impl ValidationRule for RelationsRule {
    fn name(&self) -> &'static str {
        "relations"
    }

    fn description(&self) -> &'static str {
        "Validates that relations reference existing entities"
    }

    fn validate(&self, doc: &ProjectDocument) -> ValidationResult {
        let mut result = ValidationResult::ok();
        duplicate_ids(&mut result, "relations", doc.relations.iter().map(|r| &r.id));

        let entity_ids: HashSet<Uuid> = doc.entities.iter().map(|e| e.id).collect();

        for (i, relation) in doc.relations.iter().enumerate() {
            let path = format!("relations[{}]", i);

            for (key, id) in [
                ("sourceEntityId", relation.source_entity_id),
                ("targetEntityId", relation.target_entity_id),
            ] {
                if !entity_ids.contains(&id) {
                    result.add_error(
                        ValidationError::new(
                            ValidationErrorCode::DanglingRelation,
                            format!("references unknown entity {}", id),
                        )
                        .with_path(format!("{}.{}", path, key)),
                    );
                }
            }

            if relation.relation_type.requires_join_table() && relation.join_table.is_none() {
                result.add_error(
                    ValidationError::new(
                        ValidationErrorCode::MissingJoinTable,
                        "many-to-many relation must specify a join table",
                    )
                    .with_path(format!("{}.joinTable", path))
                    .with_suggestion("add {name, joinColumn, inverseJoinColumn}"),
                );
            }

            if let Err(e) = relation.validate() {
                result.add_warning(
                    ValidationWarning::new(ValidationWarningCode::IncompleteRelation, e.to_string())
                        .with_path(&path),
                );
            }
        }

        if doc.relations.is_empty() && doc.entities.len() > 1 {
            result.add_warning(ValidationWarning::new(
                ValidationWarningCode::NoRelations,
                "Project has multiple entities but no relations defined",
            ));
        }

        result
    }
}

/// Rule: service assignments reference existing entities, one owner each
pub struct ServicesRule;

impl ValidationRule for ServicesRule {
    fn name(&self) -> &'static str {
        "services"
    }

    fn description(&self) -> &'static str {
        "Validates service assignments and the single-owner rule"
    }

    fn validate(&self, doc: &ProjectDocument) -> ValidationResult {
        let mut result = ValidationResult::ok();
        duplicate_ids(&mut result, "services", doc.services.iter().map(|s| &s.id));

        let entity_ids: HashSet<Uuid> = doc.entities.iter().map(|e| e.id).collect();
        let mut owners: HashMap<Uuid, usize> = HashMap::new();

        for (i, service) in doc.services.iter().enumerate() {
            let path = format!("services[{}]", i);

            if let Err(e) = service.validate() {
                result.add_error(
                    ValidationError::new(ValidationErrorCode::InvalidService, e.to_string())
                        .with_path(&path),
                );
            }

            for (j, entity_id) in service.entity_ids.iter().enumerate() {
                let id_path = format!("{}.entityIds[{}]", path, j);
                if !entity_ids.contains(entity_id) {
                    result.add_error(
                        ValidationError::new(
                            ValidationErrorCode::DanglingAssignment,
                            format!("references unknown entity {}", entity_id),
                        )
                        .with_path(&id_path),
                    );
                }
                match owners.insert(*entity_id, i) {
                    Some(first) if first != i => result.add_error(
                        ValidationError::new(
                            ValidationErrorCode::MultipleOwners,
                            format!(
                                "entity {} is already assigned to services[{}]",
                                entity_id, first
                            ),
                        )
                        .with_path(&id_path),
                    ),
                    Some(_) => result.add_error(
                        ValidationError::new(
                            ValidationErrorCode::DuplicateId,
                            format!("entity {} is listed twice", entity_id),
                        )
                        .with_path(&id_path),
                    ),
                    None => {}
                }
            }
        }

        result
    }
}

/// Rule: connections reference existing services
pub struct ConnectionsRule;

impl ValidationRule for ConnectionsRule {
    fn name(&self) -> &'static str {
        "connections"
    }

    fn description(&self) -> &'static str {
        "Validates that service connections reference existing services"
    }

    fn validate(&self, doc: &ProjectDocument) -> ValidationResult {
        let mut result = ValidationResult::ok();
        duplicate_ids(
            &mut result,
            "serviceConnections",
            doc.service_connections.iter().map(|c| &c.id),
        );

        let service_ids: HashSet<Uuid> = doc.services.iter().map(|s| s.id).collect();

        for (i, connection) in doc.service_connections.iter().enumerate() {
            let path = format!("serviceConnections[{}]", i);

            for (key, id) in [
                ("sourceServiceId", connection.source_service_id),
                ("targetServiceId", connection.target_service_id),
            ] {
                if !service_ids.contains(&id) {
                    result.add_error(
                        ValidationError::new(
                            ValidationErrorCode::DanglingConnection,
                            format!("references unknown service {}", id),
                        )
                        .with_path(format!("{}.{}", path, key)),
                    );
                }
            }

            if connection.source_service_id == connection.target_service_id {
                result.add_warning(
                    ValidationWarning::new(
                        ValidationWarningCode::SelfConnection,
                        "service is connected to itself",
                    )
                    .with_path(&path),
                );
            }
        }

        result
    }
}

// ============================================================================
// Tests
// ============================================================================
