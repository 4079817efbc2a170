//! Consensus error types

use thiserror::Error;

/// Consensus error type
#[derive(Error, Debug)]
pub enum ConsensusError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Successor computation requires a non-empty validator set
    #[error("Validator set is empty")]
    EmptyValidatorSet,

    /// A quorum converged on an identity that is not a known validator
    #[error("Unknown validator: {0}")]
    UnknownValidator(String),

    /// Messaging layer failure
    #[error("Network error: {0}")]
    Network(#[from] conclave_network::NetworkError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Other error
    #[error("Consensus error: {0}")]
    Other(String),
}

impl From<anyhow::Error> for ConsensusError {
    fn from(err: anyhow::Error) -> Self {
        ConsensusError::Other(err.to_string())
    }
}

/// Result type for consensus operations
pub type ConsensusResult<T> = Result<T, ConsensusError>;
