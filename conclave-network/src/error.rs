//! Network error types

use thiserror::Error;

pub type NetworkResult<T> = Result<T, NetworkError>;

#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Query channel closed: {0}")]
    ChannelClosed(String),

    #[error("Peer not found: {0}")]
    PeerNotFound(String),

    #[error("Network timeout")]
    Timeout,

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
