//! # L2 Fee Pricing
//!
//! Execution-gas pricing for the chain itself: the sustained speed limit,
//! the per-block gas ceiling, and the current base fee.

use shared_types::U256;
use sr_01_storage::{Storage, StorageBackedU256, StorageBackedU64, StorageError};

/// Sustained gas per second seeded when pricing defaults are installed.
pub const INITIAL_SPEED_LIMIT_PER_SECOND: u64 = 7_000_000;

/// Per-block gas ceiling seeded when pricing defaults are installed.
pub const INITIAL_PER_BLOCK_GAS_LIMIT: u64 = 32_000_000;

/// Starting base fee, in wei.
pub const INITIAL_BASE_FEE_WEI: u64 = 100_000_000;

const SPEED_LIMIT_OFFSET: u64 = 0;
const PER_BLOCK_GAS_LIMIT_OFFSET: u64 = 1;
const BASE_FEE_OFFSET: u64 = 2;

/// The L2 pricing sub-state.
pub struct L2PricingState {
    speed_limit_per_second: StorageBackedU64,
    per_block_gas_limit: StorageBackedU64,
    base_fee_wei: StorageBackedU256,
}

impl L2PricingState {
    /// Writes the initial layout.
    pub fn initialize(sto: &Storage) -> Result<(), StorageError> {
        let state = Self::open(sto);
        state.base_fee_wei.set(U256::from(INITIAL_BASE_FEE_WEI))?;
        Ok(())
    }

    /// Opens the sub-state against its subspace.
    #[must_use]
    pub fn open(sto: &Storage) -> Self {
        Self {
            speed_limit_per_second: sto.open_backed_u64(SPEED_LIMIT_OFFSET),
            per_block_gas_limit: sto.open_backed_u64(PER_BLOCK_GAS_LIMIT_OFFSET),
            base_fee_wei: sto.open_backed_u256(BASE_FEE_OFFSET),
        }
    }

    /// Sustained gas per second the chain targets.
    pub fn speed_limit_per_second(&self) -> Result<u64, StorageError> {
        self.speed_limit_per_second.get()
    }

    /// Sets the speed limit.
    pub fn set_speed_limit_per_second(&self, limit: u64) -> Result<(), StorageError> {
        self.speed_limit_per_second.set(limit)
    }

    /// Hard cap on gas per block.
    pub fn per_block_gas_limit(&self) -> Result<u64, StorageError> {
        self.per_block_gas_limit.get()
    }

    /// Sets the per-block gas cap.
    pub fn set_per_block_gas_limit(&self, limit: u64) -> Result<(), StorageError> {
        self.per_block_gas_limit.set(limit)
    }

    /// Current base fee in wei.
    pub fn base_fee_wei(&self) -> Result<U256, StorageError> {
        self.base_fee_wei.get()
    }

    /// Sets the base fee.
    pub fn set_base_fee_wei(&self, fee: U256) -> Result<(), StorageError> {
        self.base_fee_wei.set(fee)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sr_01_storage::adapters::memory_db::MemoryDatabase;
    use sr_01_storage::SystemBurner;

    #[test]
    fn test_defaults_after_initialize() {
        let sto = Storage::new(MemoryDatabase::shared(), SystemBurner::new(false));
        L2PricingState::initialize(&sto).unwrap();
        let state = L2PricingState::open(&sto);
        assert_eq!(state.base_fee_wei().unwrap(), U256::from(INITIAL_BASE_FEE_WEI));
        // speed limits are seeded later, by the upgrade path
        assert_eq!(state.speed_limit_per_second().unwrap(), 0);
    }
}
