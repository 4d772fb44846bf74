//! Service-connection store
//!
//! Directed links between services. A connection never outlives either of
//! its endpoint services.

use blueprint_core::{CascadeTarget, ConnectionId, ServiceId};
use blueprint_ir::{ConnectionPatch, ServiceConnection};
use tracing::debug;
use uuid::Uuid;

/// Owns every service connection
#[derive(Debug, Default)]
pub struct ConnectionStore {
    connections: Vec<ServiceConnection>,
    revision: u64,
}

impl ConnectionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Connection by id
    pub fn get(&self, id: ConnectionId) -> Option<&ServiceConnection> {
        self.connections.iter().find(|c| c.id == id)
    }

    /// Every connection, in insertion order
    pub fn all(&self) -> &[ServiceConnection] {
        &self.connections
    }

    /// Number of connections
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Whether the store holds no connections
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Bumped on every change to the connection collection
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Connections with the service on either end
    pub fn connections_for_service(&self, service_id: ServiceId) -> Vec<&ServiceConnection> {
        self.connections
            .iter()
            .filter(|c| c.involves_service(service_id))
            .collect()
    }

    /// Append a connection as given. Endpoints are not checked here.
    pub fn add(&mut self, connection: ServiceConnection) -> ConnectionId {
        let id = connection.id;
        debug!(
            %id,
            source = %connection.source_service_id,
            target = %connection.target_service_id,
            kind = %connection.communication_type,
            "connection added"
        );
        self.connections.push(connection);
        self.revision += 1;
        id
    }

    /// Patch a connection. Returns `true` if anything changed.
    pub fn update(&mut self, id: ConnectionId, patch: ConnectionPatch) -> bool {
        let changed = self
            .connections
            .iter_mut()
            .find(|c| c.id == id)
            .is_some_and(|c| c.apply(patch));
        if changed {
            self.revision += 1;
        }
        changed
    }

    /// Remove a connection by id
    pub fn remove(&mut self, id: ConnectionId) -> Option<ServiceConnection> {
        let pos = self.connections.iter().position(|c| c.id == id)?;
        self.revision += 1;
        Some(self.connections.remove(pos))
    }

    /// Drop every connection touching the service. Returns how many went.
    pub fn remove_for_service(&mut self, service_id: ServiceId) -> usize {
        let before = self.connections.len();
        self.connections.retain(|c| !c.involves_service(service_id));
        let removed = before - self.connections.len();
        if removed > 0 {
            debug!(%service_id, removed, "connections cascaded");
            self.revision += 1;
        }
        removed
    }

    /// Replace every connection
    pub fn set_connections(&mut self, connections: Vec<ServiceConnection>) {
        self.connections = connections;
        self.revision += 1;
    }
}

impl CascadeTarget for ConnectionStore {
    fn cascade_removed(&mut self, id: Uuid) {
        self.remove_for_service(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blueprint_core::CommunicationType;

    #[test]
    fn test_cascade_drops_both_directions() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let mut store = ConnectionStore::new();
        store.add(ServiceConnection::new(a, b, CommunicationType::Rest));
        store.add(ServiceConnection::new(c, a, CommunicationType::Events));
        let keep = store.add(ServiceConnection::new(b, c, CommunicationType::Grpc));

        store.cascade_removed(a);
        assert_eq!(store.len(), 1);
        assert_eq!(store.all()[0].id, keep);
        assert_eq!(store.connections_for_service(b).len(), 1);
    }

    #[test]
    fn test_update_remove() {
        let mut store = ConnectionStore::new();
        let id = store.add(ServiceConnection::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            CommunicationType::Rest,
        ));

        assert!(store.update(
            id,
            ConnectionPatch {
                communication_type: Some(CommunicationType::Messaging),
                ..Default::default()
            }
        ));
        assert_eq!(
            store.get(id).unwrap().communication_type,
            CommunicationType::Messaging
        );
        assert!(store.remove(id).is_some());
        assert!(store.remove(id).is_none());
    }
}
