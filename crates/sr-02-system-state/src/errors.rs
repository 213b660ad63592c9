//! # Error Types

use sr_01_storage::StorageError;
use thiserror::Error;

/// Errors from the system state container.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    /// The state was never initialized (version 0).
    #[error("system state is uninitialized")]
    Uninitialized,

    /// `initialize` was called on a chain that already has state.
    #[error("system state is already initialized")]
    AlreadyInitialized,

    /// A chain cannot start at version 0.
    #[error("cannot initialize to version 0")]
    InvalidInitialVersion,

    /// The chain reached a version this node has no migration for. This
    /// is fatal for block production: the node software must be upgraded.
    #[error("the chain is upgrading to unsupported version {version}, please upgrade to the latest node software")]
    NodeOutOfDate {
        /// The version with no defined migration.
        version: u64,
    },

    /// The serialized chain config could not be encoded or decoded.
    #[error("invalid chain config: {0}")]
    BadChainConfig(String),

    /// The storage layer failed outside a migration.
    #[error(transparent)]
    Storage(#[from] StorageError),
}
