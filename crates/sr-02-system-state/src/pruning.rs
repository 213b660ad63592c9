//! # Pruning Consumer Interface
//!
//! The housekeeping job that prunes historical batch data runs outside
//! this crate; the core only tells it how far finality has advanced. The
//! node wires its pruner in here; tests and light configurations use the
//! no-op.

use tracing::debug;

/// Consumer of finality notifications, implemented by the node's
/// batch-pruning housekeeping job.
pub trait PruningConsumer: Send + Sync {
    /// Called after a block is finalized; everything at or below
    /// `block_number` is safe to prune.
    fn on_block_finalized(&self, block_number: u64, timestamp: u64);
}

/// Discards every notification.
pub struct NoopPruner;

impl PruningConsumer for NoopPruner {
    fn on_block_finalized(&self, block_number: u64, timestamp: u64) {
        debug!(block_number, timestamp, "finality notification dropped");
    }
}
