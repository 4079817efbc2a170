//! Shared view of the chain head
//!
//! The scheduler, the elector, and the networking layer all observe the most
//! recently seen block through this cache. Only single-field reads and writes
//! cross this boundary; consumers that need a consistency check re-derive it
//! from fresh reads instead of holding compound state here.

use crate::types::{Hash, NodeId, Timestamp};
use parking_lot::RwLock;

#[derive(Debug, Default)]
struct HeadInfo {
    block_time: Option<Timestamp>,
    block_hash: Option<Hash>,
    producer: Option<NodeId>,
}

/// Last-known block generation time, hash, and producing identity
#[derive(Debug, Default)]
pub struct ChainView {
    head: RwLock<HeadInfo>,
}

impl ChainView {
    /// Create an empty chain view (no block observed yet)
    pub fn new() -> Self {
        Self::default()
    }

    /// Generation time of the last observed block
    pub fn block_time(&self) -> Option<Timestamp> {
        self.head.read().block_time
    }

    /// Record the generation time of the latest block
    pub fn set_block_time(&self, time: Timestamp) {
        self.head.write().block_time = Some(time);
    }

    /// Hash of the last observed block
    pub fn block_hash(&self) -> Option<Hash> {
        self.head.read().block_hash
    }

    /// Record the hash of the latest block
    pub fn set_block_hash(&self, hash: Hash) {
        self.head.write().block_hash = Some(hash);
    }

    /// Identity currently believed to be producing blocks
    pub fn producer(&self) -> Option<NodeId> {
        self.head.read().producer.clone()
    }

    /// Record the identity now responsible for producing blocks
    pub fn set_producer(&self, id: NodeId) {
        self.head.write().producer = Some(id);
    }
}
