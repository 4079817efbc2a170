//! Consensus protocol messages
//!
//! Wire contract: a `LeaderQuery` is sent point-to-point to one validator and
//! expects a single `LeaderReply` whose payload is either the responder's
//! recorded leader identity or the literal [`NO_MASTER`]. Leadership changes
//! are gossiped as `LeaderAnnounce`.

use conclave_core::NodeId;
use serde::{Deserialize, Serialize};

/// Sentinel payload meaning "responder has no current leader recorded"
pub const NO_MASTER: &str = "NO_MASTER";

/// Messages exchanged between validators for leader coordination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsensusMessage {
    /// Ask one peer which validator it currently considers the leader
    LeaderQuery,
    /// Reply to a leader query: an identity string or [`NO_MASTER`]
    LeaderReply { payload: String },
    /// Gossiped claim that leadership moved to the named validator
    LeaderAnnounce { leader: String },
}

impl ConsensusMessage {
    /// Reply naming a concrete leader
    pub fn reply_known(leader: &NodeId) -> Self {
        Self::LeaderReply {
            payload: leader.as_str().to_string(),
        }
    }

    /// Reply stating that no leader is currently recorded
    pub fn reply_none() -> Self {
        Self::LeaderReply {
            payload: NO_MASTER.to_string(),
        }
    }

    /// Announce a leadership change
    pub fn announce(leader: &NodeId) -> Self {
        Self::LeaderAnnounce {
            leader: leader.as_str().to_string(),
        }
    }
}
