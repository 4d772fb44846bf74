//! Project configuration and the exported project document
//!
//! `ProjectDocument` is the unit of import, export and reset. It carries the
//! project settings plus every domain collection.

use crate::{Entity, Relation, SCHEMA_VERSION, Service, ServiceConnection};
use blueprint_core::{EntityId, ServiceId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// ============================================================================
// ProjectConfig
// ============================================================================

/// Project-level settings
///
/// Keys this version does not know about are kept in `extra` and written back
/// on export, so documents from newer tools survive a round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectConfig {
    /// Project name
    pub name: String,

    /// Project description
    pub description: String,

    /// Project version (semver)
    pub version: String,

    /// Package name used by generators
    pub package_name: String,

    /// Target-specific generator options
    pub options: BTreeMap<String, Value>,

    /// Unrecognized keys, preserved verbatim
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ProjectConfig {
    /// Create a config with the given name and default settings
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let package_name = default_package_name(&name);
        Self {
            name,
            package_name,
            ..Default::default()
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Set the package name
    pub fn with_package_name(mut self, name: impl Into<String>) -> Self {
        self.package_name = name.into();
        self
    }

    /// Set a generator option
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Get a generator option
    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: "Untitled Project".to_string(),
            description: String::new(),
            version: "0.1.0".to_string(),
            package_name: "untitled_project".to_string(),
            options: BTreeMap::new(),
            extra: BTreeMap::new(),
        }
    }
}

/// Package name derived from a project name (lowercase, underscores)
pub fn default_package_name(name: &str) -> String {
    let safe: String = name
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    if safe.is_empty() {
        "untitled_project".to_string()
    } else {
        safe
    }
}

// ============================================================================
// ProjectDocument
// ============================================================================

/// The exported form of a whole project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDocument {
    /// Schema version for migration purposes
    #[serde(default = "current_schema_version")]
    pub schema_version: u32,

    /// When the document was written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<DateTime<Utc>>,

    pub project: ProjectConfig,

    #[serde(default)]
    pub entities: Vec<Entity>,

    #[serde(default)]
    pub relations: Vec<Relation>,

    #[serde(default)]
    pub services: Vec<Service>,

    #[serde(default)]
    pub service_connections: Vec<ServiceConnection>,
}

fn current_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl ProjectDocument {
    /// Create an empty document for a project
    pub fn new(project: ProjectConfig) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            exported_at: None,
            project,
            entities: Vec::new(),
            relations: Vec::new(),
            services: Vec::new(),
            service_connections: Vec::new(),
        }
    }

    /// Stamp the export time
    pub fn stamped(mut self) -> Self {
        self.exported_at = Some(Utc::now());
        self
    }

    /// Get an entity by ID
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    /// Get an entity by name
    pub fn entity_by_name(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name == name)
    }

    /// Get a service by ID
    pub fn service(&self, id: ServiceId) -> Option<&Service> {
        self.services.iter().find(|s| s.id == id)
    }

    /// The service an entity is assigned to, if any
    pub fn service_for_entity(&self, entity_id: EntityId) -> Option<&Service> {
        self.services.iter().find(|s| s.contains(entity_id))
    }

    /// Check if the document holds no records
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
            && self.relations.is_empty()
            && self.services.is_empty()
            && self.service_connections.is_empty()
    }

    /// Counts for display
    pub fn stats(&self) -> DocumentStats {
        let assigned = self
            .entities
            .iter()
            .filter(|e| self.service_for_entity(e.id).is_some())
            .count();

        DocumentStats {
            entities: self.entities.len(),
            fields: self.entities.iter().map(|e| e.fields.len()).sum(),
            relations: self.relations.len(),
            services: self.services.len(),
            connections: self.service_connections.len(),
            unassigned_entities: self.entities.len() - assigned,
        }
    }
}

impl Default for ProjectDocument {
    fn default() -> Self {
        Self::new(ProjectConfig::default())
    }
}

/// Record counts of a document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStats {
    pub entities: usize,
    pub fields: usize,
    pub relations: usize,
    pub services: usize,
    pub connections: usize,
    pub unassigned_entities: usize,
}

// ============================================================================
// Tests
// ============================================================================
