//! Collaborator seams consumed by the consensus engine

use conclave_core::Timestamp;

/// Builds and disseminates blocks on behalf of the scheduler.
///
/// Transaction selection, block serialization, hashing, signing, and
/// broadcast all live behind this seam; the scheduler only decides *when* a
/// block should exist.
pub trait BlockAssembler: Send + Sync {
    /// Build and broadcast the next block for the given round timestamp.
    ///
    /// Implementations are expected to update the shared chain view once the
    /// block is accepted.
    fn pack(&self, timestamp: Timestamp) -> anyhow::Result<()>;

    /// Build the one-time genesis block.
    ///
    /// Only the designated genesis authority ever invokes this, and it does
    /// so without peer validation or quorum.
    fn build_genesis(&self) -> anyhow::Result<()>;
}
