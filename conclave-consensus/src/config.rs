//! Consensus configuration

use crate::{ConsensusError, ConsensusResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Consensus configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusConfig {
    /// Block generation cadence in seconds
    pub round_secs: u64,
    /// Whether this node is the designated genesis authority
    pub genesis_authority: bool,
    /// Deadline for a single leader query, in milliseconds
    pub peer_query_timeout_ms: u64,
    /// Overall deadline for one election round, in milliseconds
    pub election_timeout_ms: u64,
    /// Pause between leader-discovery attempts, in seconds
    pub discovery_retry_secs: u64,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            round_secs: 10,
            genesis_authority: false,
            peer_query_timeout_ms: 2_000,
            election_timeout_ms: 8_000,
            discovery_retry_secs: 3,
        }
    }
}

impl ConsensusConfig {
    /// Create a configuration with the given block cadence
    pub fn new(round_secs: u64) -> Self {
        Self {
            round_secs,
            ..Self::default()
        }
    }

    /// Load configuration from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> ConsensusResult<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| ConsensusError::Config(format!("Failed to read config file: {}", e)))?;

        let config: ConsensusConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> ConsensusResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), content)
            .map_err(|e| ConsensusError::Config(format!("Failed to write config file: {}", e)))?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> ConsensusResult<()> {
        if self.round_secs < 3 {
            return Err(ConsensusError::Config(
                "Round duration must be at least 3 seconds".to_string(),
            ));
        }

        if self.peer_query_timeout_ms == 0 {
            return Err(ConsensusError::Config(
                "Peer query timeout must be greater than 0".to_string(),
            ));
        }

        if self.election_timeout_ms < self.peer_query_timeout_ms {
            return Err(ConsensusError::Config(
                "Election timeout must not be shorter than the peer query timeout".to_string(),
            ));
        }

        if self.discovery_retry_secs == 0 {
            return Err(ConsensusError::Config(
                "Discovery retry interval must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Block cadence as a Duration
    pub fn round_duration(&self) -> Duration {
        Duration::from_secs(self.round_secs)
    }

    /// Watchdog wake interval: one third of the block cadence
    pub fn liveness_check_interval(&self) -> Duration {
        Duration::from_secs(self.round_secs / 3)
    }

    /// Elapsed time since the last block after which the leader is
    /// considered unresponsive
    pub fn staleness_threshold_secs(&self) -> u64 {
        self.round_secs + self.round_secs / 3
    }

    /// Per-peer query deadline as a Duration
    pub fn peer_query_timeout(&self) -> Duration {
        Duration::from_millis(self.peer_query_timeout_ms)
    }

    /// Whole-election deadline as a Duration
    pub fn election_timeout(&self) -> Duration {
        Duration::from_millis(self.election_timeout_ms)
    }

    /// Pause between discovery attempts as a Duration
    pub fn discovery_retry(&self) -> Duration {
        Duration::from_secs(self.discovery_retry_secs)
    }

    /// Mark this node as the genesis authority
    pub fn with_genesis_authority(mut self, genesis: bool) -> Self {
        self.genesis_authority = genesis;
        self
    }
}
