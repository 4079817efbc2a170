//! Basic validator-network types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp in seconds since Unix epoch
pub type Timestamp = u64;

/// Current wall-clock time in whole seconds
pub fn now_secs() -> Timestamp {
    chrono::Utc::now().timestamp().max(0) as Timestamp
}

/// Validator identity: the node's network address string.
///
/// Identities are compared and sorted by their string form, which makes the
/// sort order reproducible on every node without coordination.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(String);

impl NodeId {
    /// Create a new identity from a network address string
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    /// Get the underlying address string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(addr: &str) -> Self {
        Self(addr.to_string())
    }
}

impl From<String> for NodeId {
    fn from(addr: String) -> Self {
        Self(addr)
    }
}

/// 32-byte block hash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hash([u8; 32]);

impl Hash {
    /// Create a new hash from byte array
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the underlying byte array
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Create from hex string
    pub fn from_hex(hex: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(hex)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut out = [0u8; 32];
        out.copy_from_slice(&bytes);
        Ok(Self(out))
    }

    /// Zero hash (all bytes are 0)
    pub fn zero() -> Self {
        Self([0u8; 32])
    }
}

impl Default for Hash {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl From<[u8; 32]> for Hash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
