//! Core types used throughout Blueprint Studio
//!
//! Identifiers, canvas geometry and the small closed vocabularies (field
//! types, relation kinds, referential actions, communication styles) shared
//! by the data model, the stores and the canvas layer.

use serde::{Deserialize, Serialize};

// ============================================================================
// Unique Identifiers
// ============================================================================

/// Identifier of an entity
pub type EntityId = uuid::Uuid;

/// Identifier of a field within an entity
pub type FieldId = uuid::Uuid;

/// Identifier of a relation between two entities
pub type RelationId = uuid::Uuid;

/// Identifier of a service
pub type ServiceId = uuid::Uuid;

/// Identifier of a connection between two services
pub type ConnectionId = uuid::Uuid;

// ============================================================================
// Geometry Types
// ============================================================================

/// Position on the 2D canvas
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    /// Create a new position
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Create a position at the origin (0, 0)
    pub fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    /// Add an offset to this position
    pub fn offset(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Check whether this position is the zero vector
    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::ops::Add for Position {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl std::ops::Sub for Position {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl std::ops::AddAssign for Position {
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
    }
}

/// Size of a component on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    /// Create a new size
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Fixed size of entity cards
    pub fn entity_card() -> Self {
        Self {
            width: 240.0,
            height: 180.0,
        }
    }

    /// Initial size of service containers
    pub fn default_service() -> Self {
        Self {
            width: 560.0,
            height: 420.0,
        }
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::entity_card()
    }
}

// ============================================================================
// Field Types
// ============================================================================

/// Data types supported for entity fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    #[default]
    String,
    Text,
    Integer,
    Long,
    Float,
    Double,
    Boolean,
    Uuid,
    Date,
    Time,
    DateTime,
    Bytes,
    Json,
    Enum,
}

impl FieldType {
    /// Wire name used in project documents
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Text => "text",
            FieldType::Integer => "integer",
            FieldType::Long => "long",
            FieldType::Float => "float",
            FieldType::Double => "double",
            FieldType::Boolean => "boolean",
            FieldType::Uuid => "uuid",
            FieldType::Date => "date",
            FieldType::Time => "time",
            FieldType::DateTime => "dateTime",
            FieldType::Bytes => "bytes",
            FieldType::Json => "json",
            FieldType::Enum => "enum",
        }
    }

    /// Parse a wire name
    pub fn parse(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|t| t.as_str() == s)
    }

    /// Check if this type holds numbers
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            FieldType::Integer | FieldType::Long | FieldType::Float | FieldType::Double
        )
    }

    /// Get all field types
    pub fn all() -> &'static [FieldType] {
        &[
            FieldType::String,
            FieldType::Text,
            FieldType::Integer,
            FieldType::Long,
            FieldType::Float,
            FieldType::Double,
            FieldType::Boolean,
            FieldType::Uuid,
            FieldType::Date,
            FieldType::Time,
            FieldType::DateTime,
            FieldType::Bytes,
            FieldType::Json,
            FieldType::Enum,
        ]
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Relation Types
// ============================================================================

/// Cardinality of a relation between two entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RelationType {
    /// One record relates to exactly one other record
    OneToOne,
    /// One record relates to many others (e.g., User has many Orders)
    OneToMany,
    /// Many records relate to one (inverse of OneToMany)
    #[default]
    ManyToOne,
    /// Many-to-many through a join table
    ManyToMany,
}

impl RelationType {
    /// Wire name used in project documents
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationType::OneToOne => "OneToOne",
            RelationType::OneToMany => "OneToMany",
            RelationType::ManyToOne => "ManyToOne",
            RelationType::ManyToMany => "ManyToMany",
        }
    }

    /// Parse a wire name
    pub fn parse(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|t| t.as_str() == s)
    }

    /// Get arrow symbol for edge labels
    pub fn arrow_symbol(&self) -> &'static str {
        match self {
            RelationType::OneToOne => "1 ─── 1",
            RelationType::OneToMany => "1 ───< *",
            RelationType::ManyToOne => "* >─── 1",
            RelationType::ManyToMany => "* >──< *",
        }
    }

    /// Check if this relation needs a join table
    pub fn requires_join_table(&self) -> bool {
        matches!(self, RelationType::ManyToMany)
    }

    /// Check if the source side holds a collection
    pub fn is_to_many(&self) -> bool {
        matches!(self, RelationType::OneToMany | RelationType::ManyToMany)
    }

    /// Get the inverse relation type
    pub fn inverse(&self) -> Self {
        match self {
            RelationType::OneToOne => RelationType::OneToOne,
            RelationType::OneToMany => RelationType::ManyToOne,
            RelationType::ManyToOne => RelationType::OneToMany,
            RelationType::ManyToMany => RelationType::ManyToMany,
        }
    }

    /// Get all relation types
    pub fn all() -> &'static [RelationType] {
        &[
            RelationType::OneToOne,
            RelationType::OneToMany,
            RelationType::ManyToOne,
            RelationType::ManyToMany,
        ]
    }
}

impl std::fmt::Display for RelationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Loading strategy for the related side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum FetchType {
    #[default]
    Lazy,
    Eager,
}

impl FetchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchType::Lazy => "lazy",
            FetchType::Eager => "eager",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "lazy" => Some(FetchType::Lazy),
            "eager" => Some(FetchType::Eager),
            _ => None,
        }
    }
}

/// Operations propagated from the owning side to the related side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CascadeType {
    All,
    Persist,
    Merge,
    Remove,
    Refresh,
    Detach,
}

impl CascadeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CascadeType::All => "all",
            CascadeType::Persist => "persist",
            CascadeType::Merge => "merge",
            CascadeType::Remove => "remove",
            CascadeType::Refresh => "refresh",
            CascadeType::Detach => "detach",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        [
            CascadeType::All,
            CascadeType::Persist,
            CascadeType::Merge,
            CascadeType::Remove,
            CascadeType::Refresh,
            CascadeType::Detach,
        ]
        .into_iter()
        .find(|c| c.as_str() == s)
    }
}

// ============================================================================
// Referential Actions
// ============================================================================

/// Actions for foreign key constraints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ReferentialAction {
    /// Delete related records when parent is deleted
    Cascade,
    /// Set foreign key to NULL when parent is deleted
    SetNull,
    /// Prevent deletion if related records exist
    #[default]
    Restrict,
    /// Do nothing (database default)
    NoAction,
    /// Set to default value
    SetDefault,
}

impl ReferentialAction {
    /// Wire name used in project documents
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferentialAction::Cascade => "cascade",
            ReferentialAction::SetNull => "setNull",
            ReferentialAction::Restrict => "restrict",
            ReferentialAction::NoAction => "noAction",
            ReferentialAction::SetDefault => "setDefault",
        }
    }

    /// Parse a wire name
    pub fn parse(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|a| a.as_str() == s)
    }

    /// Get SQL keyword
    pub fn to_sql(&self) -> &'static str {
        match self {
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::NoAction => "NO ACTION",
            ReferentialAction::SetDefault => "SET DEFAULT",
        }
    }

    /// Get all referential actions
    pub fn all() -> &'static [ReferentialAction] {
        &[
            ReferentialAction::Cascade,
            ReferentialAction::SetNull,
            ReferentialAction::Restrict,
            ReferentialAction::NoAction,
            ReferentialAction::SetDefault,
        ]
    }
}

impl std::fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_sql())
    }
}

// ============================================================================
// Service Communication
// ============================================================================

/// How one service talks to another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum CommunicationType {
    /// Synchronous HTTP/JSON calls
    #[default]
    Rest,
    /// Synchronous gRPC calls
    Grpc,
    /// Point-to-point message queue
    Messaging,
    /// Published domain events
    Events,
}

impl CommunicationType {
    /// Wire name used in project documents
    pub fn as_str(&self) -> &'static str {
        match self {
            CommunicationType::Rest => "rest",
            CommunicationType::Grpc => "grpc",
            CommunicationType::Messaging => "messaging",
            CommunicationType::Events => "events",
        }
    }

    /// Parse a wire name
    pub fn parse(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|c| c.as_str() == s)
    }

    /// Check whether the caller waits for the callee
    pub fn is_synchronous(&self) -> bool {
        matches!(self, CommunicationType::Rest | CommunicationType::Grpc)
    }

    /// Get all communication types
    pub fn all() -> &'static [CommunicationType] {
        &[
            CommunicationType::Rest,
            CommunicationType::Grpc,
            CommunicationType::Messaging,
            CommunicationType::Events,
        ]
    }
}

impl std::fmt::Display for CommunicationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Validation Types
// ============================================================================

/// Field validation rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Validation {
    /// Field must have a value
    Required,
    /// Minimum string length
    MinLength(usize),
    /// Maximum string length
    MaxLength(usize),
    /// Minimum numeric value
    Min(f64),
    /// Maximum numeric value
    Max(f64),
    /// Regex pattern validation
    Pattern { regex: String },
    /// Valid email address
    Email,
    /// Valid URL
    Url,
}

impl Validation {
    /// Get a user-friendly error message
    pub fn error_message(&self) -> String {
        match self {
            Validation::Required => "This field is required".to_string(),
            Validation::MinLength(n) => format!("Minimum length is {} characters", n),
            Validation::MaxLength(n) => format!("Maximum length is {} characters", n),
            Validation::Min(n) => format!("Minimum value is {}", n),
            Validation::Max(n) => format!("Maximum value is {}", n),
            Validation::Pattern { regex } => format!("Must match pattern {}", regex),
            Validation::Email => "Must be a valid email address".to_string(),
            Validation::Url => "Must be a valid URL".to_string(),
        }
    }
}

impl std::fmt::Display for Validation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Validation::Required => write!(f, "required"),
            Validation::MinLength(n) => write!(f, "min_length({})", n),
            Validation::MaxLength(n) => write!(f, "max_length({})", n),
            Validation::Min(n) => write!(f, "min({})", n),
            Validation::Max(n) => write!(f, "max({})", n),
            Validation::Pattern { regex } => write!(f, "pattern({})", regex),
            Validation::Email => write!(f, "email"),
            Validation::Url => write!(f, "url"),
        }
    }
}

/// Default value of a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum DefaultValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    /// Current timestamp at insert time
    Now,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_position_add_sub() {
        let p1 = Position::new(10.0, 20.0);
        let p2 = Position::new(5.0, 5.0);
        assert_eq!(p1 + p2, Position::new(15.0, 25.0));
        assert_eq!(p1 - p2, Position::new(5.0, 15.0));

        let mut p3 = p1;
        p3 += p2;
        assert_eq!(p3, Position::new(15.0, 25.0));
    }

    #[test]
    fn test_position_offset() {
        let pos = Position::new(10.0, 20.0);
        assert_eq!(pos.offset(5.0, -10.0), Position::new(15.0, 10.0));
        assert!(Position::zero().is_zero());
        assert!(!pos.is_zero());
    }

    #[test]
    fn test_field_type_wire_names() {
        for ty in FieldType::all() {
            assert_eq!(FieldType::parse(ty.as_str()), Some(*ty));
        }
        assert_eq!(FieldType::parse("varchar"), None);
        assert_eq!(
            serde_json::to_string(&FieldType::DateTime).unwrap(),
            "\"dateTime\""
        );
        assert!(FieldType::Double.is_numeric());
        assert!(!FieldType::Uuid.is_numeric());
    }

    #[test]
    fn test_relation_type() {
        assert_eq!(RelationType::parse("ManyToOne"), Some(RelationType::ManyToOne));
        assert_eq!(RelationType::parse("manyToOne"), None);
        assert_eq!(RelationType::OneToMany.inverse(), RelationType::ManyToOne);
        assert_eq!(RelationType::OneToOne.inverse(), RelationType::OneToOne);
        assert!(RelationType::ManyToMany.requires_join_table());
        assert!(!RelationType::OneToMany.requires_join_table());
        assert_eq!(
            serde_json::to_string(&RelationType::OneToMany).unwrap(),
            "\"OneToMany\""
        );
    }

    #[test]
    fn test_referential_action() {
        assert_eq!(ReferentialAction::Cascade.to_sql(), "CASCADE");
        assert_eq!(ReferentialAction::parse("setNull"), Some(ReferentialAction::SetNull));
        assert_eq!(
            serde_json::to_string(&ReferentialAction::NoAction).unwrap(),
            "\"noAction\""
        );
    }

    #[test]
    fn test_communication_type() {
        assert!(CommunicationType::Grpc.is_synchronous());
        assert!(!CommunicationType::Events.is_synchronous());
        assert_eq!(
            CommunicationType::parse("messaging"),
            Some(CommunicationType::Messaging)
        );
    }

    #[test]
    fn test_cascade_and_fetch_parse() {
        assert_eq!(CascadeType::parse("remove"), Some(CascadeType::Remove));
        assert_eq!(CascadeType::parse("explode"), None);
        assert_eq!(FetchType::parse("eager"), Some(FetchType::Eager));
    }

    #[test]
    fn test_validation_serde_shape() {
        let rules = vec![Validation::Required, Validation::MinLength(3)];
        let json = serde_json::to_string(&rules).unwrap();
        assert_eq!(json, r#"["required",{"minLength":3}]"#);
        let back: Vec<Validation> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rules);
    }

    #[test]
    fn test_default_value_serde_shape() {
        let json = serde_json::to_string(&DefaultValue::Now).unwrap();
        assert_eq!(json, r#"{"kind":"now"}"#);
        let json = serde_json::to_string(&DefaultValue::Integer(7)).unwrap();
        assert_eq!(json, r#"{"kind":"integer","value":7}"#);
    }
}
