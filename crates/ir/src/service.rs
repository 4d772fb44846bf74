//! Service definitions
//!
//! A service is a deployable unit drawn as a container on the canvas. It owns
//! a set of entities; every entity belongs to at most one service.

use blueprint_core::{
    EngineError, EngineResult, EntityId, Position, ServiceId, Size, Validatable,
};
use heck::ToKebabCase;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Colors handed out to new services, in order
pub const PALETTE: &[&str] = &[
    "#6366f1", "#10b981", "#f59e0b", "#ef4444", "#8b5cf6", "#06b6d4", "#ec4899", "#84cc16",
];

/// First port handed to a new service
pub const BASE_PORT: u16 = 8080;

/// Name given to a service created without one
pub const DEFAULT_SERVICE_NAME: &str = "Service";

// ============================================================================
// Service
// ============================================================================

/// A service container on the canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    /// Unique identifier for this service
    pub id: ServiceId,

    /// Service name (e.g., "Billing")
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Display color (hex)
    pub color: String,

    /// Absolute position of the container's top-left corner
    pub position: Position,

    pub width: f32,
    pub height: f32,

    /// Entities assigned to this service, in assignment order
    #[serde(default)]
    pub entity_ids: Vec<EntityId>,

    #[serde(default)]
    pub config: ServiceConfig,
}

impl Service {
    /// Create a new service with the given name and color
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        let name = name.into();
        let size = Size::default_service();
        let config = ServiceConfig::for_name(&name);

        Self {
            id: Uuid::new_v4(),
            name,
            description: None,
            color: color.into(),
            position: Position::zero(),
            width: size.width,
            height: size.height,
            entity_ids: Vec::new(),
            config,
        }
    }

    /// Set the position using x, y coordinates
    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.position = Position::new(x, y);
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Container size
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Check if the entity is assigned to this service
    pub fn contains(&self, entity_id: EntityId) -> bool {
        self.entity_ids.contains(&entity_id)
    }

    /// Add an entity if not already present. Returns `true` if it was added.
    pub fn insert_entity(&mut self, entity_id: EntityId) -> bool {
        if self.contains(entity_id) {
            false
        } else {
            self.entity_ids.push(entity_id);
            true
        }
    }

    /// Remove an entity. Returns `true` if it was present.
    pub fn remove_entity(&mut self, entity_id: EntityId) -> bool {
        let before = self.entity_ids.len();
        self.entity_ids.retain(|id| *id != entity_id);
        self.entity_ids.len() != before
    }

    /// Apply a partial update. Returns `true` if anything changed.
    pub fn apply(&mut self, patch: ServicePatch) -> bool {
        let before = self.clone();

        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(color) = patch.color {
            self.color = color;
        }
        if let Some(position) = patch.position {
            self.position = position;
        }
        if let Some(config) = patch.config {
            self.config = config;
        }

        *self != before
    }

    /// Apply a partial update, keeping the service unchanged when the result
    /// would not validate
    pub fn update(&mut self, patch: ServicePatch) -> EngineResult<bool> {
        let mut next = self.clone();
        if !next.apply(patch) {
            return Ok(false);
        }
        next.validate()?;
        *self = next;
        Ok(true)
    }
}

impl Validatable for Service {
    fn validate(&self) -> EngineResult<()> {
        if self.name.trim().is_empty() {
            return Err(EngineError::ServiceValidation {
                service: self.name.clone(),
                message: "Service name cannot be empty".to_string(),
            });
        }

        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(EngineError::ServiceValidation {
                service: self.name.clone(),
                message: format!("Invalid size {}x{}", self.width, self.height),
            });
        }

        if self.config.port == 0 {
            return Err(EngineError::ServiceValidation {
                service: self.name.clone(),
                message: "Port cannot be 0".to_string(),
            });
        }

        Ok(())
    }
}

// ============================================================================
// ServiceConfig
// ============================================================================

/// Deployment settings for a service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    /// Route prefix, e.g. "/api/billing"
    #[serde(default)]
    pub base_path: String,

    /// Dedicated database name, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
}

impl ServiceConfig {
    /// Config with a base path derived from the service name
    pub fn for_name(name: &str) -> Self {
        Self {
            port: BASE_PORT,
            base_path: format!("/api/{}", name.trim().to_kebab_case()),
            database: None,
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: BASE_PORT,
            base_path: "/api".to_string(),
            database: None,
        }
    }
}

fn default_port() -> u16 {
    BASE_PORT
}

// ============================================================================
// ServicePatch
// ============================================================================

/// Partial update for a service.
///
/// Membership and dimensions are changed through dedicated store operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServicePatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub color: Option<String>,
    pub position: Option<Position>,
    pub config: Option<ServiceConfig>,
}

impl ServicePatch {
    /// Patch that renames the service
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_new() {
        let service = Service::new("Order Management", PALETTE[0]);
        assert_eq!(service.color, "#6366f1");
        assert_eq!(service.config.base_path, "/api/order-management");
        assert_eq!(service.size(), Size::default_service());
        assert!(service.entity_ids.is_empty());
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut service = Service::new("Billing", PALETTE[1]);
        let id = Uuid::new_v4();
        assert!(service.insert_entity(id));
        assert!(!service.insert_entity(id));
        assert_eq!(service.entity_ids, vec![id]);

        assert!(service.remove_entity(id));
        assert!(!service.remove_entity(id));
    }

    #[test]
    fn test_apply_patch() {
        let mut service = Service::new("Billing", PALETTE[1]);
        assert!(service.apply(ServicePatch::rename("Payments")));
        assert!(!service.apply(ServicePatch::rename("Payments")));
        assert_eq!(service.name, "Payments");
    }

    #[test]
    fn test_validation() {
        assert!(Service::new("Billing", PALETTE[1]).validate().is_ok());

        let mut bad = Service::new("Billing", PALETTE[1]);
        bad.width = 0.0;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_update_rejects_invalid_result() {
        let mut service = Service::new("Billing", PALETTE[1]);
        assert!(service.update(ServicePatch::rename(" ")).is_err());
        assert_eq!(service.name, "Billing");

        let mut config = service.config.clone();
        config.port = 0;
        let patch = ServicePatch {
            config: Some(config),
            ..Default::default()
        };
        assert!(service.update(patch).is_err());
        assert_eq!(service.config.port, 8080);

        assert!(service.update(ServicePatch::rename("Payments")).unwrap());
    }

    #[test]
    fn test_serde_camel_case() {
        let mut service = Service::new("Billing", PALETTE[2]);
        service.insert_entity(Uuid::new_v4());
        let json = serde_json::to_value(&service).unwrap();
        assert!(json["entityIds"].is_array());
        assert_eq!(json["config"]["basePath"], "/api/billing");

        let back: Service = serde_json::from_value(json).unwrap();
        assert_eq!(back, service);
    }
}
