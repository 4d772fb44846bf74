//! Directed communication links between services

use blueprint_core::{
    CommunicationType, ConnectionId, EngineError, EngineResult, ServiceId, Validatable,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A directed link from one service to another
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceConnection {
    pub id: ConnectionId,
    pub source_service_id: ServiceId,
    pub target_service_id: ServiceId,
    #[serde(default)]
    pub communication_type: CommunicationType,
    #[serde(default)]
    pub config: ConnectionConfig,
}

impl ServiceConnection {
    /// Create a new connection
    pub fn new(
        source_service_id: ServiceId,
        target_service_id: ServiceId,
        communication_type: CommunicationType,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_service_id,
            target_service_id,
            communication_type,
            config: ConnectionConfig::default(),
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.config.description = Some(description.into());
        self
    }

    /// Check if this connection touches the given service on either side
    pub fn involves_service(&self, service_id: ServiceId) -> bool {
        self.source_service_id == service_id || self.target_service_id == service_id
    }

    /// Apply a partial update. Returns `true` if anything changed.
    pub fn apply(&mut self, patch: ConnectionPatch) -> bool {
        let before = self.clone();

        if let Some(communication_type) = patch.communication_type {
            self.communication_type = communication_type;
        }
        if let Some(config) = patch.config {
            self.config = config;
        }

        *self != before
    }
}

impl Validatable for ServiceConnection {
    fn validate(&self) -> EngineResult<()> {
        if self.source_service_id == self.target_service_id {
            return Err(EngineError::validation(
                "A service cannot be connected to itself",
            ));
        }
        if self.config.timeout_ms == 0 {
            return Err(EngineError::validation("Connection timeout must be positive"));
        }
        Ok(())
    }
}

/// Call settings for a connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectionConfig {
    pub timeout_ms: u32,
    pub retries: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5000,
            retries: 3,
            description: None,
        }
    }
}

/// Partial update for a connection; endpoints are immutable
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectionPatch {
    pub communication_type: Option<CommunicationType>,
    pub config: Option<ConnectionConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_new() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let conn = ServiceConnection::new(a, b, CommunicationType::Grpc);
        assert!(conn.involves_service(a));
        assert!(conn.involves_service(b));
        assert!(!conn.involves_service(Uuid::new_v4()));
        assert_eq!(conn.config.timeout_ms, 5000);
        assert!(conn.validate().is_ok());
    }

    #[test]
    fn test_self_connection_is_invalid() {
        let a = Uuid::new_v4();
        assert!(!ServiceConnection::new(a, a, CommunicationType::Rest).is_valid());
    }

    #[test]
    fn test_config_defaults_when_missing() {
        let json = serde_json::json!({
            "id": Uuid::new_v4(),
            "sourceServiceId": Uuid::new_v4(),
            "targetServiceId": Uuid::new_v4(),
            "communicationType": "events"
        });
        let conn: ServiceConnection = serde_json::from_value(json).unwrap();
        assert_eq!(conn.communication_type, CommunicationType::Events);
        assert_eq!(conn.config, ConnectionConfig::default());
    }
}
