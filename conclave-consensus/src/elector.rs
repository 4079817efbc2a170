//! Leader election and failover
//!
//! The elector runs the quorum protocol that keeps the validator set agreed
//! on a single block producer: discovery by majority vote at startup,
//! staleness-triggered failover to a deterministic successor, and validation
//! of leadership claims gossiped by peers.

use crate::config::ConsensusConfig;
use crate::scheduler::ProductionGate;
use crate::vote::{Vote, VoteTally};
use crate::{ConsensusError, ConsensusResult};
use conclave_core::{ChainView, NodeId};
use conclave_network::{QueryHandle, ValidatorRegistry};
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, info, warn};

/// Leadership vote phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VotePhase {
    /// No election has been required yet
    NotNeeded,
    /// An election or failover is in progress
    Electing,
    /// A leader is settled
    Stable,
}

/// Leadership state, guarded by the elector's exclusive lock
#[derive(Debug)]
struct LeaderState {
    current: Option<NodeId>,
    phase: VotePhase,
}

/// Stable snapshot of the leadership state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderSnapshot {
    pub leader: Option<NodeId>,
    pub phase: VotePhase,
}

/// Quorum-based leader elector
pub struct LeaderElector {
    config: Arc<ConsensusConfig>,
    registry: Arc<ValidatorRegistry>,
    chain: Arc<ChainView>,
    query: QueryHandle,
    gate: Arc<ProductionGate>,
    state: Mutex<LeaderState>,
}

impl LeaderElector {
    /// Create an elector with no leader recorded yet
    pub fn new(
        config: Arc<ConsensusConfig>,
        registry: Arc<ValidatorRegistry>,
        chain: Arc<ChainView>,
        query: QueryHandle,
        gate: Arc<ProductionGate>,
    ) -> Self {
        Self {
            config,
            registry,
            chain,
            query,
            gate,
            state: Mutex::new(LeaderState {
                current: None,
                phase: VotePhase::NotNeeded,
            }),
        }
    }

    /// Currently recorded leader
    pub async fn leader(&self) -> Option<NodeId> {
        self.state.lock().await.current.clone()
    }

    /// Snapshot of leader and vote phase
    pub async fn snapshot(&self) -> LeaderSnapshot {
        let state = self.state.lock().await;
        LeaderSnapshot {
            leader: state.current.clone(),
            phase: state.phase,
        }
    }

    /// The vote this node answers a peer's leader query with
    pub async fn local_vote(&self) -> Vote {
        match self.state.lock().await.current.clone() {
            Some(leader) => Vote::Leader(leader),
            None => Vote::NoneKnown,
        }
    }

    /// Discover the current leader by querying every connected validator
    /// peer and waiting for a strict majority to agree.
    ///
    /// Returns `Ok(None)` when no identity reaches quorum within the
    /// election deadline; the caller retries.
    pub async fn discover_leader(&self) -> ConsensusResult<Option<NodeId>> {
        let peers = self.registry.connected_peers();

        if peers.is_empty() {
            // Necessarily the sole validator online
            if !self.registry.is_self_validator() {
                debug!("No validator peers connected and node is not a validator");
                return Ok(None);
            }
            let self_id = self.registry.self_id().clone();
            info!(leader = %self_id, "No validator peers connected, assuming leadership");
            let mut state = self.state.lock().await;
            self.assign(&mut state, self_id.clone());
            return Ok(Some(self_id));
        }

        self.state.lock().await.phase = VotePhase::Electing;

        info!(
            peers = peers.len(),
            "Requesting current leader from validator peers"
        );

        let mut tally = VoteTally::new(peers.len());
        let per_peer = self.config.peer_query_timeout();
        let mut pending: FuturesUnordered<_> = peers
            .into_iter()
            .map(|peer| {
                let query = self.query.clone();
                async move {
                    let result = timeout(per_peer, query.request_leader(peer.clone())).await;
                    (peer, result)
                }
            })
            .collect();

        let deadline = Instant::now() + self.config.election_timeout();
        let mut winner = None;

        loop {
            match timeout_at(deadline, pending.next()).await {
                Ok(Some((peer, Ok(Ok(payload))))) => {
                    debug!(%peer, vote = %payload, "Leader query answered");
                    if let Some(id) = tally.record(Vote::from_wire(&payload)) {
                        winner = Some(id);
                        break;
                    }
                }
                Ok(Some((peer, Ok(Err(e))))) => {
                    warn!(%peer, error = %e, "Leader query failed, counting as abstention");
                }
                Ok(Some((peer, Err(_)))) => {
                    warn!(%peer, "Leader query timed out, counting as abstention");
                }
                // All peers accounted for
                Ok(None) => break,
                Err(_) => {
                    warn!(
                        answered = tally.total_votes(),
                        "Election deadline reached before quorum"
                    );
                    break;
                }
            }
        }

        let Some(winner) = winner.or_else(|| tally.decide()) else {
            info!("No identity reached quorum, leaving election open");
            return Ok(None);
        };

        match self.lookup(&winner) {
            Ok(winner) => {
                let mut state = self.state.lock().await;
                self.assign(&mut state, winner.clone());
                Ok(Some(winner))
            }
            Err(e) => {
                warn!(error = %e, "Quorum converged on an unusable identity, leaving election open");
                Ok(None)
            }
        }
    }

    /// React to the liveness watchdog declaring the current leader
    /// unresponsive: hand leadership to the deterministic successor.
    pub async fn handle_leader_timeout(&self) -> ConsensusResult<()> {
        let mut state = self.state.lock().await;
        match state.current.clone() {
            Some(current) => self.fail_over(&mut state, &current),
            None => {
                // No baseline to derive a successor from
                drop(state);
                self.discover_leader().await?;
                Ok(())
            }
        }
    }

    /// Validate a leadership claim observed from a peer.
    ///
    /// The claim is accepted only when this node independently arrives at the
    /// same successor, so concurrent failure detections cannot diverge.
    pub async fn validate_claim(&self, claimed: &NodeId) -> bool {
        let mut state = self.state.lock().await;

        if state.current.as_ref() == Some(claimed) {
            return true;
        }

        if !self.registry.is_connected(claimed) {
            warn!(%claimed, "Rejecting leadership claim for an unreachable identity");
            return false;
        }

        match state.phase {
            VotePhase::Electing => {
                // Both sides detected the failure; agree only if the claim
                // matches the successor this node would compute.
                let Some(baseline) = self.chain.producer() else {
                    return false;
                };
                let validators = self.registry.validators_sorted();
                match successor(&validators, &baseline) {
                    Ok(expected) if expected == *claimed => {
                        info!(leader = %expected, "Accepting leadership claim matching local successor");
                        self.assign(&mut state, expected);
                        true
                    }
                    Ok(expected) => {
                        warn!(%claimed, %expected, "Rejecting leadership claim diverging from local successor");
                        false
                    }
                    Err(e) => {
                        warn!(error = %e, "Cannot compute successor to validate claim");
                        false
                    }
                }
            }
            VotePhase::Stable | VotePhase::NotNeeded => match state.current.clone() {
                Some(current) => {
                    if let Err(e) = self.fail_over(&mut state, &current) {
                        warn!(error = %e, "Local failover failed while validating claim");
                        return false;
                    }
                    state.current.as_ref() == Some(claimed)
                }
                None => {
                    // No local leader at all; resynchronize first. The lock
                    // is released so discovery can run its fan-out.
                    drop(state);
                    if let Err(e) = self.discover_leader().await {
                        warn!(error = %e, "Discovery failed while validating claim");
                        return false;
                    }
                    self.state.lock().await.current.as_ref() == Some(claimed)
                }
            },
        }
    }

    /// Hand leadership to the successor of `current`, unless the shared
    /// chain view shows that leadership has already moved on.
    fn fail_over(&self, state: &mut LeaderState, current: &NodeId) -> ConsensusResult<()> {
        let producing = self.chain.producer();
        if producing.as_ref() != Some(current) {
            debug!(
                ?producing,
                %current,
                "Recorded leader no longer matches the producing identity, skipping failover"
            );
            return Ok(());
        }

        state.phase = VotePhase::Electing;
        let validators = self.registry.validators_sorted();
        let next = successor(&validators, current)?;
        info!(failed = %current, %next, "Leader unresponsive, failing over to successor");
        self.assign(state, next);
        Ok(())
    }

    /// Record a settled leader and gate local production on whether the
    /// leader is this node.
    fn assign(&self, state: &mut LeaderState, leader: NodeId) {
        let is_self = leader == *self.registry.self_id();
        state.current = Some(leader.clone());
        state.phase = VotePhase::Stable;
        self.chain.set_producer(leader.clone());

        if is_self {
            self.gate.enable();
            info!(%leader, "This node is now the block producer");
        } else {
            self.gate.disable();
            info!(%leader, "Following block producer");
        }
    }

    fn lookup(&self, id: &NodeId) -> ConsensusResult<NodeId> {
        if self.registry.is_known(id) {
            Ok(id.clone())
        } else {
            Err(ConsensusError::UnknownValidator(id.to_string()))
        }
    }
}

/// Deterministic successor of `current` in the ring formed by sorting the
/// validator set ascending by identity.
///
/// A current leader that is no longer part of the set restarts the ring at
/// its first element.
pub fn successor(validators: &[NodeId], current: &NodeId) -> ConsensusResult<NodeId> {
    if validators.is_empty() {
        return Err(ConsensusError::EmptyValidatorSet);
    }

    let next = match validators.iter().position(|v| v == current) {
        Some(index) => validators[(index + 1) % validators.len()].clone(),
        None => validators[0].clone(),
    };
    Ok(next)
}
