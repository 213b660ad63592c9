//! # Host Operation Pricing
//!
//! Warm/cold access-list pricing for storage and account touches, the
//! same schedule ordinary EVM opcodes pay under the Berlin rules, plus
//! the base cost of the unified call primitive.

use shared_types::{Address, Hash, U256};
use sr_01_storage::StateDatabase;
use std::collections::HashSet;

/// Gas costs shared with the EVM opcode table.
pub mod costs {
    /// Cold storage slot access surcharge.
    pub const COLD_SLOAD: u64 = 2100;
    /// Warm storage or account access.
    pub const WARM_ACCESS: u64 = 100;
    /// Cold account access.
    pub const COLD_ACCOUNT_ACCESS: u64 = 2600;
    /// Storage write turning zero into nonzero.
    pub const SSTORE_SET: u64 = 20_000;
    /// Storage write changing a committed nonzero value.
    pub const SSTORE_RESET: u64 = 2900;
    /// Surcharge for a value-carrying call.
    pub const CALL_VALUE: u64 = 9000;
    /// Surcharge for a value transfer to a nonexistent account.
    pub const CALL_NEW_ACCOUNT: u64 = 25_000;
    /// Stipend granted to the callee of a value-carrying call.
    pub const CALL_STIPEND: u64 = 2300;
    /// Base contract creation cost.
    pub const CREATE: u64 = 32_000;
    /// Hashing cost per word of salted-creation init code.
    pub const KECCAK256_WORD: u64 = 6;
}

/// Access status for storage slots and accounts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessStatus {
    /// First access in this transaction.
    Cold,
    /// Already accessed in this transaction.
    Warm,
}

/// Per-transaction warm/cold tracking for accounts and storage slots.
#[derive(Default)]
pub struct AccessSets {
    accounts: HashSet<Address>,
    slots: HashSet<(Address, Hash)>,
}

impl AccessSets {
    /// Creates an empty access set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks an account accessed, returning its previous status.
    pub fn touch_account(&mut self, address: Address) -> AccessStatus {
        if self.accounts.insert(address) {
            AccessStatus::Cold
        } else {
            AccessStatus::Warm
        }
    }

    /// Marks a storage slot accessed, returning its previous status.
    pub fn touch_slot(&mut self, address: Address, key: Hash) -> AccessStatus {
        if self.slots.insert((address, key)) {
            AccessStatus::Cold
        } else {
            AccessStatus::Warm
        }
    }
}

/// Cost of a storage load under the warm/cold rules.
pub fn storage_load_cost(access: &mut AccessSets, address: Address, key: Hash) -> u64 {
    match access.touch_slot(address, key) {
        AccessStatus::Cold => costs::COLD_SLOAD + costs::WARM_ACCESS,
        AccessStatus::Warm => costs::WARM_ACCESS,
    }
}

/// Cost of a storage store under the warm/cold and original-value rules.
pub fn storage_store_cost(
    db: &dyn StateDatabase,
    access: &mut AccessSets,
    address: Address,
    key: Hash,
    value: Hash,
) -> u64 {
    let cold_surcharge = match access.touch_slot(address, key) {
        AccessStatus::Cold => costs::COLD_SLOAD,
        AccessStatus::Warm => 0,
    };
    let current = db.get_state(address, key);
    let original = db.get_committed_state(address, key);

    let base = if current == value || original != current {
        // no-op writes and dirty slots pay the warm rate
        costs::WARM_ACCESS
    } else if original.is_zero() {
        costs::SSTORE_SET
    } else {
        costs::SSTORE_RESET
    };
    cold_surcharge + base
}

/// Cost of touching an account (balance and code-hash reads).
pub fn account_touch_cost(access: &mut AccessSets, address: Address) -> u64 {
    match access.touch_account(address) {
        AccessStatus::Cold => costs::COLD_ACCOUNT_ACCESS,
        AccessStatus::Warm => costs::WARM_ACCESS,
    }
}

/// Base cost of the unified call primitive: the account touch, plus the
/// value-transfer surcharges for a plain call.
pub fn call_access_cost(
    db: &dyn StateDatabase,
    access: &mut AccessSets,
    target: Address,
    value: U256,
    transfers_value: bool,
) -> u64 {
    let mut cost = account_touch_cost(access, target);
    if transfers_value && !value.is_zero() {
        cost += costs::CALL_VALUE;
        if !db.exists(target) {
            cost += costs::CALL_NEW_ACCOUNT;
        }
    }
    cost
}

// =============================================================================
// TESTS
// =============================================================================
