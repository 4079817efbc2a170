//! Core types for the conclave validator node
//!
//! This crate provides the fundamental building blocks shared by the
//! consensus and networking layers:
//! - Basic types (NodeId, Hash, Timestamp)
//! - The shared chain view cache (last block time/hash/producer)

pub mod chain_view;
pub mod types;

// Re-export commonly used types
pub use chain_view::*;
pub use types::*;
