//! Election votes and quorum tallying

use conclave_core::NodeId;
use conclave_network::NO_MASTER;
use std::collections::HashMap;

/// One peer's answer to a leader query
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Vote {
    /// The peer names a concrete leader
    Leader(NodeId),
    /// The peer has no leader recorded
    NoneKnown,
}

impl Vote {
    /// Lift a wire payload into a vote (`NO_MASTER` maps to `NoneKnown`)
    pub fn from_wire(payload: &str) -> Self {
        if payload == NO_MASTER {
            Vote::NoneKnown
        } else {
            Vote::Leader(NodeId::from(payload))
        }
    }

    /// Render the vote as a wire payload
    pub fn to_wire(&self) -> String {
        match self {
            Vote::Leader(id) => id.as_str().to_string(),
            Vote::NoneKnown => NO_MASTER.to_string(),
        }
    }
}

/// Vote counts for one election round.
///
/// The tally lives only for the duration of a single election and is
/// discarded once a decision is reached.
#[derive(Debug)]
pub struct VoteTally {
    peer_count: usize,
    counts: HashMap<Vote, usize>,
}

impl VoteTally {
    /// Create a tally for an election over `peer_count` queried peers
    pub fn new(peer_count: usize) -> Self {
        Self {
            peer_count,
            counts: HashMap::new(),
        }
    }

    /// Strict-majority threshold: a bucket must exceed this count to win
    pub fn threshold(&self) -> usize {
        self.peer_count / 2
    }

    /// Record one vote.
    ///
    /// Returns the winning identity as soon as a concrete-leader bucket
    /// strictly exceeds the quorum threshold; collection can stop at that
    /// point.
    pub fn record(&mut self, vote: Vote) -> Option<NodeId> {
        let threshold = self.threshold();
        let count = self.counts.entry(vote.clone()).or_insert(0);
        *count += 1;
        let count = *count;

        match vote {
            Vote::Leader(id) if count > threshold => Some(id),
            _ => None,
        }
    }

    /// Number of votes recorded so far
    pub fn total_votes(&self) -> usize {
        self.counts.values().sum()
    }

    /// Decide after all responses are in.
    ///
    /// Peers that answered `NoneKnown` abstain from the concrete choice, so
    /// the threshold is recomputed over the remaining electorate; a majority
    /// of "no leader known" must not block convergence once enough concrete
    /// votes agree.
    pub fn decide(&self) -> Option<NodeId> {
        let none_votes = self.counts.get(&Vote::NoneKnown).copied().unwrap_or(0);
        let effective_threshold = self.peer_count.saturating_sub(none_votes) / 2;

        self.counts
            .iter()
            .filter_map(|(vote, count)| match vote {
                Vote::Leader(id) if *count > effective_threshold => Some((id, *count)),
                _ => None,
            })
            .max_by_key(|(_, count)| *count)
            .map(|(id, _)| id.clone())
    }
}
