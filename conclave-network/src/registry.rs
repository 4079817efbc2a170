//! Validator registry and connection bookkeeping

use conclave_core::NodeId;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Per-validator bookkeeping
#[derive(Debug, Clone)]
struct ValidatorInfo {
    connected: bool,
}

/// Registry of the known validator set and which members are currently
/// reachable.
///
/// The registry also records this node's own identity. The full validator
/// set includes self; the connected-peer view excludes it, since a node never
/// holds a channel to itself.
#[derive(Debug)]
pub struct ValidatorRegistry {
    self_id: NodeId,
    validators: RwLock<HashMap<NodeId, ValidatorInfo>>,
}

impl ValidatorRegistry {
    /// Create a registry for a node with the given identity
    pub fn new(self_id: NodeId) -> Self {
        Self {
            self_id,
            validators: RwLock::new(HashMap::new()),
        }
    }

    /// This node's own identity
    pub fn self_id(&self) -> &NodeId {
        &self.self_id
    }

    /// Add a validator to the known set (disconnected until marked otherwise)
    pub fn add_validator(&self, id: NodeId) {
        self.validators
            .write()
            .entry(id)
            .or_insert(ValidatorInfo { connected: false });
    }

    /// Remove a validator from the known set
    pub fn remove_validator(&self, id: &NodeId) {
        self.validators.write().remove(id);
    }

    /// Mark a validator's channel as up
    pub fn mark_connected(&self, id: &NodeId) {
        if let Some(info) = self.validators.write().get_mut(id) {
            info.connected = true;
        }
    }

    /// Mark a validator's channel as down
    pub fn mark_disconnected(&self, id: &NodeId) {
        if let Some(info) = self.validators.write().get_mut(id) {
            info.connected = false;
        }
    }

    /// Whether the identity is a known validator with a live channel
    pub fn is_connected(&self, id: &NodeId) -> bool {
        self.validators
            .read()
            .get(id)
            .map(|info| info.connected)
            .unwrap_or(false)
    }

    /// Whether the identity belongs to the known validator set
    pub fn is_known(&self, id: &NodeId) -> bool {
        self.validators.read().contains_key(id)
    }

    /// Whether this node itself is part of the validator set
    pub fn is_self_validator(&self) -> bool {
        self.is_known(&self.self_id)
    }

    /// Currently connected validator peers, excluding self
    pub fn connected_peers(&self) -> Vec<NodeId> {
        self.validators
            .read()
            .iter()
            .filter(|(id, info)| info.connected && **id != self.self_id)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// All known validators, ascending by identity.
    ///
    /// Every node derives the same sequence from the same set, so decisions
    /// based on positions in it are reproducible without coordination.
    pub fn validators_sorted(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.validators.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of known validators
    pub fn len(&self) -> usize {
        self.validators.read().len()
    }

    /// Whether the known set is empty
    pub fn is_empty(&self) -> bool {
        self.validators.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with(self_ip: &str, others: &[&str]) -> ValidatorRegistry {
        let registry = ValidatorRegistry::new(NodeId::from(self_ip));
        registry.add_validator(NodeId::from(self_ip));
        for ip in others {
            let id = NodeId::from(*ip);
            registry.add_validator(id.clone());
            registry.mark_connected(&id);
        }
        registry
    }

    #[test]
    fn test_registry_basic() {
        let registry = ValidatorRegistry::new(NodeId::from("10.0.0.1"));
        assert!(registry.is_empty());
        assert!(!registry.is_self_validator());

        registry.add_validator(NodeId::from("10.0.0.1"));
        registry.add_validator(NodeId::from("10.0.0.2"));
        assert_eq!(registry.len(), 2);
        assert!(registry.is_self_validator());

        registry.remove_validator(&NodeId::from("10.0.0.2"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_connected_peers_excludes_self() {
        let registry = registry_with("10.0.0.1", &["10.0.0.2", "10.0.0.3"]);
        registry.mark_connected(&NodeId::from("10.0.0.1"));

        let mut peers = registry.connected_peers();
        peers.sort();
        assert_eq!(
            peers,
            vec![NodeId::from("10.0.0.2"), NodeId::from("10.0.0.3")]
        );
    }

    #[test]
    fn test_connection_flags() {
        let registry = registry_with("10.0.0.1", &["10.0.0.2"]);
        let peer = NodeId::from("10.0.0.2");

        assert!(registry.is_connected(&peer));
        registry.mark_disconnected(&peer);
        assert!(!registry.is_connected(&peer));
        assert!(registry.connected_peers().is_empty());

        // Unknown identities are never connected
        assert!(!registry.is_connected(&NodeId::from("10.9.9.9")));
    }

    #[test]
    fn test_validators_sorted() {
        let registry = registry_with("10.0.0.3", &["10.0.0.1", "10.0.0.2"]);
        assert_eq!(
            registry.validators_sorted(),
            vec![
                NodeId::from("10.0.0.1"),
                NodeId::from("10.0.0.2"),
                NodeId::from("10.0.0.3"),
            ]
        );
    }
}
