//! Leader-query dispatch channel
//!
//! The elector fans out leader queries through a [`QueryHandle`]; the node's
//! transport backend drains the command receiver, performs the point-to-point
//! exchange, and answers through the per-request reply sender. Keeping the
//! transport behind a channel lets the consensus layer stay independent of
//! the wire implementation.

use crate::{NetworkError, NetworkResult};
use conclave_core::NodeId;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

/// Commands consumed by the transport backend
#[derive(Debug)]
pub enum QueryCommand {
    /// Ask `peer` which validator it currently considers the leader.
    ///
    /// The reply payload is the peer's recorded leader identity, or the
    /// `NO_MASTER` sentinel when it has none.
    LeaderQuery {
        peer: NodeId,
        reply: oneshot::Sender<NetworkResult<String>>,
    },
}

/// Sending half of the query channel, held by the consensus layer
#[derive(Debug, Clone)]
pub struct QueryHandle {
    tx: mpsc::UnboundedSender<QueryCommand>,
}

impl QueryHandle {
    /// Create a handle along with the receiver the transport must drain
    pub fn new() -> (Self, mpsc::UnboundedReceiver<QueryCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Request the current leader from a single peer and await its reply
    pub async fn request_leader(&self, peer: NodeId) -> NetworkResult<String> {
        debug!(%peer, "Dispatching leader query");
        let (reply_tx, reply_rx) = oneshot::channel();

        self.tx
            .send(QueryCommand::LeaderQuery {
                peer,
                reply: reply_tx,
            })
            .map_err(|_| NetworkError::ChannelClosed("query dispatch".to_string()))?;

        reply_rx
            .await
            .map_err(|_| NetworkError::ChannelClosed("query reply".to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::NO_MASTER;

    #[tokio::test]
    async fn test_request_leader_round_trip() {
        let (handle, mut rx) = QueryHandle::new();

        // Stand-in transport: answers every query with a fixed leader,
        // except one peer it claims not to know.
        let responder = tokio::spawn(async move {
            while let Some(cmd) = rx.recv().await {
                match cmd {
                    QueryCommand::LeaderQuery { peer, reply } => {
                        let result = if peer.as_str() == "10.0.0.9" {
                            Err(NetworkError::PeerNotFound(peer.to_string()))
                        } else if peer.as_str() == "10.0.0.8" {
                            Err(NetworkError::Timeout)
                        } else if peer.as_str() == "10.0.0.3" {
                            Ok(NO_MASTER.to_string())
                        } else {
                            Ok("10.0.0.2".to_string())
                        };
                        let _ = reply.send(result);
                    }
                }
            }
        });

        let payload = handle.request_leader(NodeId::from("10.0.0.2")).await.unwrap();
        assert_eq!(payload, "10.0.0.2");

        let payload = handle.request_leader(NodeId::from("10.0.0.3")).await.unwrap();
        assert_eq!(payload, NO_MASTER);

        let err = handle.request_leader(NodeId::from("10.0.0.9")).await;
        assert!(matches!(err, Err(NetworkError::PeerNotFound(_))));

        let err = handle.request_leader(NodeId::from("10.0.0.8")).await;
        assert!(matches!(err, Err(NetworkError::Timeout)));

        responder.abort();
    }

    #[tokio::test]
    async fn test_request_leader_channel_closed() {
        let (handle, rx) = QueryHandle::new();
        drop(rx);

        let err = handle.request_leader(NodeId::from("10.0.0.2")).await;
        assert!(matches!(err, Err(NetworkError::ChannelClosed(_))));
    }

    #[tokio::test]
    async fn test_dropped_reply_is_an_error() {
        let (handle, mut rx) = QueryHandle::new();

        let responder = tokio::spawn(async move {
            while let Some(cmd) = rx.recv().await {
                match cmd {
                    // Drop the reply sender without answering
                    QueryCommand::LeaderQuery { .. } => {}
                }
            }
        });

        let err = handle.request_leader(NodeId::from("10.0.0.2")).await;
        assert!(matches!(err, Err(NetworkError::ChannelClosed(_))));

        responder.abort();
    }
}
