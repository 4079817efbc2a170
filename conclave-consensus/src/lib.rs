//! Validator coordination engine
//!
//! This crate drives block production for a permissioned validator set:
//! - `LeaderElector` discovers the current leader by quorum vote, detects
//!   leader failure, computes deterministic successors, and validates
//!   leadership claims observed from peers.
//! - `BlockScheduler` owns the block cadence timer, the genesis bootstrap,
//!   and the liveness watchdog that triggers failover.
//! - `ConsensusService` wires both together behind the message entry point
//!   the networking layer dispatches into.

pub mod config;
pub mod elector;
pub mod error;
pub mod scheduler;
pub mod service;
pub mod traits;
pub mod vote;

pub use config::ConsensusConfig;
pub use elector::{LeaderElector, LeaderSnapshot, VotePhase};
pub use error::{ConsensusError, ConsensusResult};
pub use scheduler::{BlockScheduler, ProductionGate};
pub use service::ConsensusService;
pub use traits::BlockAssembler;
pub use vote::{Vote, VoteTally};
