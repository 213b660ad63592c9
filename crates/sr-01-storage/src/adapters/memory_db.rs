//! # Memory Database
//!
//! An in-memory [`StateDatabase`] used by the test suites and by tools
//! that replay state transitions without a node attached. Nothing is
//! persisted beyond the lifetime of the instance.

use crate::ports::database::{LogEntry, StateDatabase, StateDb};
use parking_lot::RwLock;
use shared_types::{keccak256, Address, Bytes, Hash, U256};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
struct AccountEntry {
    balance: U256,
    code: Option<Bytes>,
    storage: HashMap<Hash, Hash>,
    committed: HashMap<Hash, Hash>,
}

/// In-memory account state, logs, and compiled-module store.
#[derive(Default)]
pub struct MemoryDatabase {
    accounts: RwLock<HashMap<Address, AccountEntry>>,
    logs: RwLock<Vec<LogEntry>>,
    modules: RwLock<HashMap<(u32, Hash), Bytes>>,
}

impl MemoryDatabase {
    /// Creates an empty database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty database behind a shared handle.
    #[must_use]
    pub fn shared() -> StateDb {
        Arc::new(Self::new())
    }

    /// Sets an account balance directly (test setup).
    pub fn set_balance(&self, address: Address, balance: U256) {
        self.accounts.write().entry(address).or_default().balance = balance;
    }

    /// Snapshot of the accumulated log set.
    #[must_use]
    pub fn logs(&self) -> Vec<LogEntry> {
        self.logs.read().clone()
    }

    /// Marks the current slot values as the committed (start-of-transaction)
    /// values, as a node does between transactions.
    pub fn commit_transaction(&self) {
        let mut accounts = self.accounts.write();
        for entry in accounts.values_mut() {
            entry.committed = entry.storage.clone();
        }
    }
}

impl StateDatabase for MemoryDatabase {
    fn get_state(&self, address: Address, key: Hash) -> Hash {
        self.accounts
            .read()
            .get(&address)
            .and_then(|entry| entry.storage.get(&key).copied())
            .unwrap_or(Hash::ZERO)
    }

    fn get_committed_state(&self, address: Address, key: Hash) -> Hash {
        self.accounts
            .read()
            .get(&address)
            .and_then(|entry| entry.committed.get(&key).copied())
            .unwrap_or(Hash::ZERO)
    }

    fn set_state(&self, address: Address, key: Hash, value: Hash) {
        let mut accounts = self.accounts.write();
        let entry = accounts.entry(address).or_default();
        if value.is_zero() {
            entry.storage.remove(&key);
        } else {
            entry.storage.insert(key, value);
        }
    }

    fn get_code(&self, address: Address) -> Bytes {
        self.accounts
            .read()
            .get(&address)
            .and_then(|entry| entry.code.clone())
            .unwrap_or_default()
    }

    fn set_code(&self, address: Address, code: Bytes) {
        self.accounts.write().entry(address).or_default().code = Some(code);
    }

    fn code_hash(&self, address: Address) -> Hash {
        keccak256(&self.get_code(address))
    }

    fn get_balance(&self, address: Address) -> U256 {
        self.accounts
            .read()
            .get(&address)
            .map(|entry| entry.balance)
            .unwrap_or_default()
    }

    fn exists(&self, address: Address) -> bool {
        self.accounts
            .read()
            .get(&address)
            .map(|entry| entry.code.is_some() || !entry.balance.is_zero())
            .unwrap_or(false)
    }

    fn add_log(&self, entry: LogEntry) {
        self.logs.write().push(entry);
    }

    fn add_compiled_module(&self, version: u32, code_hash: Hash, module: Bytes) {
        self.modules.write().insert((version, code_hash), module);
    }

    fn compiled_module(&self, version: u32, code_hash: Hash) -> Option<Bytes> {
        self.modules.read().get(&(version, code_hash)).cloned()
    }
}

// =============================================================================
// TESTS
// =============================================================================
