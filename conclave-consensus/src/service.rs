//! Consensus service facade
//!
//! Wires the elector and the scheduler together and exposes the single
//! message entry point the node's networking layer dispatches into.

use crate::config::ConsensusConfig;
use crate::elector::LeaderElector;
use crate::scheduler::{BlockScheduler, ProductionGate};
use crate::traits::BlockAssembler;
use crate::ConsensusResult;
use conclave_core::{ChainView, NodeId};
use conclave_network::{ConsensusMessage, QueryHandle, ValidatorRegistry};
use std::sync::Arc;
use tracing::{debug, warn};

/// Top-level consensus service owning the elector and the scheduler
pub struct ConsensusService {
    elector: Arc<LeaderElector>,
    scheduler: BlockScheduler,
}

impl ConsensusService {
    /// Wire up a consensus service from its collaborators
    pub fn new(
        config: ConsensusConfig,
        registry: Arc<ValidatorRegistry>,
        chain: Arc<ChainView>,
        assembler: Arc<dyn BlockAssembler>,
        query: QueryHandle,
    ) -> Self {
        let config = Arc::new(config);
        let gate = Arc::new(ProductionGate::new());
        let elector = Arc::new(LeaderElector::new(
            config.clone(),
            registry.clone(),
            chain.clone(),
            query,
            gate.clone(),
        ));
        let scheduler = BlockScheduler::new(
            config,
            registry,
            chain,
            assembler,
            elector.clone(),
            gate,
        );

        Self { elector, scheduler }
    }

    /// Start block production and leader discovery
    pub fn start(&self) -> ConsensusResult<()> {
        self.scheduler.start()
    }

    /// Stop all background tasks and wait for them to exit
    pub async fn shutdown(&self) {
        self.scheduler.shutdown().await
    }

    /// The leader elector, for callers that need leadership snapshots
    pub fn elector(&self) -> &Arc<LeaderElector> {
        &self.elector
    }

    /// Handle one consensus message from a peer, producing the reply to send
    /// back, if any.
    pub async fn handle_message(&self, message: ConsensusMessage) -> Option<ConsensusMessage> {
        match message {
            ConsensusMessage::LeaderQuery => {
                let vote = self.elector.local_vote().await;
                Some(ConsensusMessage::LeaderReply {
                    payload: vote.to_wire(),
                })
            }
            ConsensusMessage::LeaderAnnounce { leader } => {
                let claimed = NodeId::from(leader);
                if self.elector.validate_claim(&claimed).await {
                    debug!(leader = %claimed, "Leadership claim accepted");
                } else {
                    warn!(leader = %claimed, "Leadership claim rejected");
                }
                None
            }
            // Replies to our own queries travel on the query channel, not here
            ConsensusMessage::LeaderReply { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elector::VotePhase;
    use conclave_core::Timestamp;
    use conclave_network::NO_MASTER;

    struct NullAssembler;

    impl BlockAssembler for NullAssembler {
        fn pack(&self, _timestamp: Timestamp) -> anyhow::Result<()> {
            Ok(())
        }

        fn build_genesis(&self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn service(self_ip: &str, peer_ips: &[&str]) -> (ConsensusService, Arc<ChainView>) {
        let registry = Arc::new(ValidatorRegistry::new(NodeId::from(self_ip)));
        registry.add_validator(NodeId::from(self_ip));
        for ip in peer_ips {
            let id = NodeId::from(*ip);
            registry.add_validator(id.clone());
            registry.mark_connected(&id);
        }
        let chain = Arc::new(ChainView::new());
        let (query, _rx) = QueryHandle::new();
        let service = ConsensusService::new(
            ConsensusConfig::default(),
            registry,
            chain.clone(),
            Arc::new(NullAssembler),
            query,
        );
        (service, chain)
    }

    #[tokio::test]
    async fn test_query_answered_with_no_master_before_discovery() {
        let (service, _chain) = service("10.0.0.1", &["10.0.0.2"]);

        let reply = service
            .handle_message(ConsensusMessage::LeaderQuery)
            .await
            .unwrap();

        assert_eq!(
            reply,
            ConsensusMessage::LeaderReply {
                payload: NO_MASTER.to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_query_answered_with_leader_after_discovery() {
        let (service, _chain) = service("10.0.0.1", &[]);

        service.elector().discover_leader().await.unwrap();

        let reply = service
            .handle_message(ConsensusMessage::LeaderQuery)
            .await
            .unwrap();

        assert_eq!(reply, ConsensusMessage::reply_known(&NodeId::from("10.0.0.1")));
    }

    #[tokio::test]
    async fn test_announce_routes_through_claim_validation() {
        let (service, chain) = service("10.0.0.1", &["10.0.0.2", "10.0.0.3"]);

        // With no reachable transport the election stays open; this node is
        // mid-election with 10.0.0.2 recorded as the producing identity when
        // a peer announces 10.0.0.2's ring successor.
        assert_eq!(service.elector().discover_leader().await.unwrap(), None);
        chain.set_producer(NodeId::from("10.0.0.2"));

        let reply = service
            .handle_message(ConsensusMessage::announce(&NodeId::from("10.0.0.3")))
            .await;

        assert!(reply.is_none());
        assert_eq!(
            service.elector().leader().await,
            Some(NodeId::from("10.0.0.3"))
        );
    }

    #[tokio::test]
    async fn test_replies_are_ignored_here() {
        let (service, _chain) = service("10.0.0.1", &[]);

        let reply = service
            .handle_message(ConsensusMessage::reply_none())
            .await;
        assert!(reply.is_none());

        let snapshot = service.elector().snapshot().await;
        assert_eq!(snapshot.phase, VotePhase::NotNeeded);
    }
}
