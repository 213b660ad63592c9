//! # State Database Port
//!
//! The outbound interface to the node's account state: per-account storage
//! slots, code, balances, the block's log set, and the compiled-module
//! database.
//!
//! Implementations use interior mutability so that a single handle can be
//! shared by the storage layer, the program registry, and host-call
//! sessions. Block execution is single-threaded, but independent top-level
//! executions (replay, read-only simulation) may hold separate handles
//! concurrently, so implementations must be `Send + Sync`.

use shared_types::{Address, Bytes, Hash, U256};
use std::sync::Arc;

/// A log entry appended to the current block's log set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Address of the contract that emitted the log.
    pub address: Address,
    /// Indexed 32-byte topics (0 to 4 of them).
    pub topics: Vec<Hash>,
    /// Opaque data payload.
    pub data: Bytes,
    /// Block number the log was emitted in.
    pub block_number: u64,
}

/// Shared handle to a state database.
pub type StateDb = Arc<dyn StateDatabase>;

/// Account state, code, logs, and the compiled-module store.
pub trait StateDatabase: Send + Sync {
    /// Current value of a storage slot (zero if never written).
    fn get_state(&self, address: Address, key: Hash) -> Hash;

    /// Value of a storage slot at the start of the current transaction.
    /// Used by the storage-write pricing rules.
    fn get_committed_state(&self, address: Address, key: Hash) -> Hash;

    /// Writes a storage slot.
    fn set_state(&self, address: Address, key: Hash, value: Hash);

    /// Account code (empty for externally owned accounts).
    fn get_code(&self, address: Address) -> Bytes;

    /// Replaces account code.
    fn set_code(&self, address: Address, code: Bytes);

    /// Keccak-256 of the account code.
    fn code_hash(&self, address: Address) -> Hash;

    /// Account balance in wei.
    fn get_balance(&self, address: Address) -> U256;

    /// True if the account has code or a nonzero balance.
    fn exists(&self, address: Address) -> bool;

    /// True if the account is empty per the EVM definition.
    fn is_empty(&self, address: Address) -> bool {
        !self.exists(address)
    }

    /// Appends a log entry to the current block's log set.
    fn add_log(&self, entry: LogEntry);

    /// Stores a compiled program artifact keyed by (version, code hash).
    /// The store is append-only, write-once.
    fn add_compiled_module(&self, version: u32, code_hash: Hash, module: Bytes);

    /// Fetches a compiled program artifact.
    fn compiled_module(&self, version: u32, code_hash: Hash) -> Option<Bytes>;
}
