//! # L1 Fee Pricing
//!
//! Tracks what the chain owes its batch poster for parent-chain data and
//! the parameters that amortize those costs over transactions. Only the
//! fields the container's lifecycle and migrations touch are modeled
//! here; the per-batch accounting loop belongs to the surrounding node.

use shared_types::{Address, U256};
use sr_01_storage::{
    Storage, StorageBackedAddress, StorageBackedU256, StorageBackedU64, StorageError,
};

/// The sequencer's batch posting account.
pub const BATCH_POSTER_ADDRESS: Address = Address([
    0xa4, 0xb0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0xf6, 0xc6,
]);

/// Escrow account holding collected L1 fees until distribution.
pub const FUNDS_POOL_ADDRESS: Address = Address([
    0xa4, 0xb0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0xf6,
]);

/// Per-batch gas default seeded for chains created before version 11.
pub const INITIAL_PER_BATCH_GAS_COST_V6: u64 = 100_000;

/// Corrected per-batch gas default applied by the version 11 migration.
pub const INITIAL_PER_BATCH_GAS_COST_V12: u64 = 210_000;

/// Equilibration target seeded when pricing defaults are installed.
#[must_use]
pub fn initial_equilibration_units() -> U256 {
    // one day of parent-chain calldata at the initial price
    U256::from(60u64) * U256::from(1_000_000_000_000u64)
}

const REWARDS_RECIPIENT_OFFSET: u64 = 0;
const LAST_SURPLUS_OFFSET: u64 = 1;
const PER_BATCH_GAS_COST_OFFSET: u64 = 2;
const AMORTIZED_COST_CAP_OFFSET: u64 = 3;
const FEES_AVAILABLE_OFFSET: u64 = 4;
const EQUILIBRATION_UNITS_OFFSET: u64 = 5;
const PRICE_PER_UNIT_OFFSET: u64 = 6;

/// The L1 pricing sub-state.
pub struct L1PricingState {
    rewards_recipient: StorageBackedAddress,
    last_surplus: StorageBackedU256,
    per_batch_gas_cost: StorageBackedU64,
    amortized_cost_cap_bips: StorageBackedU64,
    fees_available: StorageBackedU256,
    equilibration_units: StorageBackedU256,
    price_per_unit: StorageBackedU256,
}

impl L1PricingState {
    /// Writes the initial layout.
    pub fn initialize(
        sto: &Storage,
        rewards_recipient: Address,
        initial_price_per_unit: U256,
    ) -> Result<(), StorageError> {
        let state = Self::open(sto);
        state.rewards_recipient.set(rewards_recipient)?;
        state.price_per_unit.set(initial_price_per_unit)?;
        Ok(())
    }

    /// Opens the sub-state against its subspace.
    #[must_use]
    pub fn open(sto: &Storage) -> Self {
        Self {
            rewards_recipient: sto.open_backed_address(REWARDS_RECIPIENT_OFFSET),
            last_surplus: sto.open_backed_u256(LAST_SURPLUS_OFFSET),
            per_batch_gas_cost: sto.open_backed_u64(PER_BATCH_GAS_COST_OFFSET),
            amortized_cost_cap_bips: sto.open_backed_u64(AMORTIZED_COST_CAP_OFFSET),
            fees_available: sto.open_backed_u256(FEES_AVAILABLE_OFFSET),
            equilibration_units: sto.open_backed_u256(EQUILIBRATION_UNITS_OFFSET),
            price_per_unit: sto.open_backed_u256(PRICE_PER_UNIT_OFFSET),
        }
    }

    /// Account receiving the batch poster's reward share.
    pub fn rewards_recipient(&self) -> Result<Address, StorageError> {
        self.rewards_recipient.get()
    }

    /// Sets the rewards recipient.
    pub fn set_rewards_recipient(&self, recipient: Address) -> Result<(), StorageError> {
        self.rewards_recipient.set(recipient)
    }

    /// The surplus recorded at the last pricing update.
    pub fn last_surplus(&self) -> Result<U256, StorageError> {
        self.last_surplus.get()
    }

    /// Sets the recorded surplus.
    pub fn set_last_surplus(&self, surplus: U256) -> Result<(), StorageError> {
        self.last_surplus.set(surplus)
    }

    /// Estimated gas charged per posted batch.
    pub fn per_batch_gas_cost(&self) -> Result<u64, StorageError> {
        self.per_batch_gas_cost.get()
    }

    /// Sets the per-batch gas estimate.
    pub fn set_per_batch_gas_cost(&self, cost: u64) -> Result<(), StorageError> {
        self.per_batch_gas_cost.set(cost)
    }

    /// Cap on amortized cost recovery, in bips (0 disables the cap).
    pub fn amortized_cost_cap_bips(&self) -> Result<u64, StorageError> {
        self.amortized_cost_cap_bips.get()
    }

    /// Sets the amortized cost cap.
    pub fn set_amortized_cost_cap_bips(&self, bips: u64) -> Result<(), StorageError> {
        self.amortized_cost_cap_bips.set(bips)
    }

    /// L1 fees collected and not yet distributed.
    pub fn fees_available(&self) -> Result<U256, StorageError> {
        self.fees_available.get()
    }

    /// Sets the available fee balance.
    pub fn set_fees_available(&self, fees: U256) -> Result<(), StorageError> {
        self.fees_available.set(fees)
    }

    /// Units over which price corrections equilibrate.
    pub fn equilibration_units(&self) -> Result<U256, StorageError> {
        self.equilibration_units.get()
    }

    /// Sets the equilibration units.
    pub fn set_equilibration_units(&self, units: U256) -> Result<(), StorageError> {
        self.equilibration_units.set(units)
    }

    /// Current price per data unit.
    pub fn price_per_unit(&self) -> Result<U256, StorageError> {
        self.price_per_unit.get()
    }

    /// Sets the price per data unit.
    pub fn set_price_per_unit(&self, price: U256) -> Result<(), StorageError> {
        self.price_per_unit.set(price)
    }
}
