//! # System State Container
//!
//! The root of the chain's system state: the global version, the pending
//! upgrade, the chain identity, the fee accounts, and a handle to every
//! sub-state. Created once per chain at genesis, re-opened at every
//! block, never deleted.

use crate::config::{ChainConfig, InitMessage};
use crate::errors::StateError;
use crate::migrations::{ActivationSchedule, MigrationContext, MigrationTable};
use crate::substates::l1_pricing::BATCH_POSTER_ADDRESS;
use crate::substates::{
    AddressSet, AddressTable, Blockhashes, L1PricingState, L2PricingState, RetryableState,
    SendAccumulator,
};
use shared_types::{Address, Bytes, Hash, U256};
use sr_01_storage::{
    Burner, StateDb, Storage, StorageBackedAddress, StorageBackedBytes, StorageBackedU256,
    StorageBackedU64, StorageError, SystemBurner,
};
use sr_03_programs::Programs;
use std::sync::Arc;
use tracing::{error, info};

// root slot offsets
const VERSION_OFFSET: u64 = 0;
const UPGRADE_VERSION_OFFSET: u64 = 1;
const UPGRADE_TIMESTAMP_OFFSET: u64 = 2;
const NETWORK_FEE_ACCOUNT_OFFSET: u64 = 3;
const CHAIN_ID_OFFSET: u64 = 4;
const GENESIS_BLOCK_NUM_OFFSET: u64 = 5;
const INFRA_FEE_ACCOUNT_OFFSET: u64 = 6;

// sub-state subspaces
const L1_PRICING_SUBSPACE: &[u8] = &[0];
const L2_PRICING_SUBSPACE: &[u8] = &[1];
const RETRYABLES_SUBSPACE: &[u8] = &[2];
const ADDRESS_TABLE_SUBSPACE: &[u8] = &[3];
const CHAIN_OWNER_SUBSPACE: &[u8] = &[4];
const SEND_ACCUMULATOR_SUBSPACE: &[u8] = &[5];
const BLOCKHASHES_SUBSPACE: &[u8] = &[6];
const CHAIN_CONFIG_SUBSPACE: &[u8] = &[7];

/// Subspace of the program registry. Public so node components that hold
/// only a database handle (routers, tracers) can open the registry
/// without the whole container.
pub const PROGRAMS_SUBSPACE: &[u8] = &[8];

/// Placeholder code installed at activation addresses: one invalid
/// opcode, enough to satisfy call-target-must-have-code checks.
const PLACEHOLDER_CODE: [u8; 1] = [0xFE];

/// Version at which secondary pricing defaults are installed for
/// first-time chains.
const PRICING_DEFAULTS_VERSION: u64 = 6;

/// Version whose migration already carries the corrected per-batch cost.
const CORRECTED_BATCH_COST_VERSION: u64 = 11;

/// The system state, backed by the chain's persistent state database.
/// Mutations write through immediately, so the database always holds the
/// definitive state.
pub struct SystemState {
    version: u64,
    upgrade_version: StorageBackedU64,
    upgrade_timestamp: StorageBackedU64,
    network_fee_account: StorageBackedAddress,
    infra_fee_account: StorageBackedAddress,
    chain_id: StorageBackedU256,
    chain_config: StorageBackedBytes,
    genesis_block_num: StorageBackedU64,
    l1_pricing: L1PricingState,
    l2_pricing: L2PricingState,
    retryables: RetryableState,
    address_table: AddressTable,
    chain_owners: AddressSet,
    send_accumulator: SendAccumulator,
    blockhashes: Blockhashes,
    programs: Programs,
    backing: Storage,
}

impl SystemState {
    /// Opens the state, failing with `Uninitialized` on a fresh chain.
    pub fn open(db: StateDb, burner: Arc<dyn Burner>) -> Result<Self, StateError> {
        let backing = Storage::new(db, burner);
        let version = backing.get_u64_by_u64(VERSION_OFFSET)?;
        if version == 0 {
            return Err(StateError::Uninitialized);
        }
        Ok(Self::load(backing, version))
    }

    /// Opens the state for a system-internal path (block hooks), with an
    /// unlimited burner. `read_only` refuses writes at the storage layer.
    pub fn open_system(db: StateDb, read_only: bool) -> Result<Self, StateError> {
        Self::open(db, SystemBurner::new(read_only))
    }

    fn load(backing: Storage, version: u64) -> Self {
        Self {
            version,
            upgrade_version: backing.open_backed_u64(UPGRADE_VERSION_OFFSET),
            upgrade_timestamp: backing.open_backed_u64(UPGRADE_TIMESTAMP_OFFSET),
            network_fee_account: backing.open_backed_address(NETWORK_FEE_ACCOUNT_OFFSET),
            infra_fee_account: backing.open_backed_address(INFRA_FEE_ACCOUNT_OFFSET),
            chain_id: backing.open_backed_u256(CHAIN_ID_OFFSET),
            chain_config: backing.open_backed_bytes(CHAIN_CONFIG_SUBSPACE),
            genesis_block_num: backing.open_backed_u64(GENESIS_BLOCK_NUM_OFFSET),
            l1_pricing: L1PricingState::open(&backing.open_sub_storage(L1_PRICING_SUBSPACE)),
            l2_pricing: L2PricingState::open(&backing.open_sub_storage(L2_PRICING_SUBSPACE)),
            retryables: RetryableState::open(&backing.open_sub_storage(RETRYABLES_SUBSPACE)),
            address_table: AddressTable::open(&backing.open_sub_storage(ADDRESS_TABLE_SUBSPACE)),
            chain_owners: AddressSet::open(&backing.open_sub_storage(CHAIN_OWNER_SUBSPACE)),
            send_accumulator: SendAccumulator::open(
                &backing.open_sub_storage(SEND_ACCUMULATOR_SUBSPACE),
            ),
            blockhashes: Blockhashes::open(&backing.open_sub_storage(BLOCKHASHES_SUBSPACE)),
            programs: Programs::open(&backing.open_sub_storage(PROGRAMS_SUBSPACE)),
            backing,
        }
    }

    // =========================================================================
    // INITIALIZATION
    // =========================================================================

    /// Creates the system state at genesis and drives it to the
    /// configured initial version.
    pub fn initialize(
        db: StateDb,
        burner: Arc<dyn Burner>,
        config: &ChainConfig,
        init: &InitMessage,
        migrations: &MigrationTable,
        activations: &ActivationSchedule,
    ) -> Result<Self, StateError> {
        let sto = Storage::new(db.clone(), burner.clone());
        if sto.get_u64_by_u64(VERSION_OFFSET)? != 0 {
            return Err(StateError::AlreadyInitialized);
        }
        let desired_version = config.initial_version;
        if desired_version == 0 {
            return Err(StateError::InvalidInitialVersion);
        }

        // may be the zero address
        let initial_owner = config.initial_chain_owner;

        sto.set_u64_by_u64(VERSION_OFFSET, 1)?;
        sto.set_u64_by_u64(UPGRADE_VERSION_OFFSET, 0)?;
        sto.set_u64_by_u64(UPGRADE_TIMESTAMP_OFFSET, 0)?;
        // chains created before version 2 start with no fee recipient
        let fee_account = if desired_version >= 2 {
            initial_owner
        } else {
            Address::ZERO
        };
        sto.set_by_u64(NETWORK_FEE_ACCOUNT_OFFSET, fee_account.to_hash())?;
        sto.set_by_u64(CHAIN_ID_OFFSET, Hash::from_u256(config.chain_id))?;
        sto.open_backed_bytes(CHAIN_CONFIG_SUBSPACE)
            .set(&init.serialized_chain_config)?;
        sto.set_u64_by_u64(GENESIS_BLOCK_NUM_OFFSET, config.genesis_block_number)?;

        let rewards_recipient = if desired_version >= 2 {
            initial_owner
        } else {
            BATCH_POSTER_ADDRESS
        };
        L1PricingState::initialize(
            &sto.open_sub_storage(L1_PRICING_SUBSPACE),
            rewards_recipient,
            init.initial_base_fee,
        )?;
        L2PricingState::initialize(&sto.open_sub_storage(L2_PRICING_SUBSPACE))?;
        RetryableState::initialize(&sto.open_sub_storage(RETRYABLES_SUBSPACE))?;
        AddressTable::initialize(&sto.open_sub_storage(ADDRESS_TABLE_SUBSPACE))?;
        SendAccumulator::initialize(&sto.open_sub_storage(SEND_ACCUMULATOR_SUBSPACE))?;
        Blockhashes::initialize(&sto.open_sub_storage(BLOCKHASHES_SUBSPACE))?;

        let owners = sto.open_sub_storage(CHAIN_OWNER_SUBSPACE);
        AddressSet::initialize(&owners)?;
        AddressSet::open(&owners).add(initial_owner)?;

        let mut state = Self::open(db, burner)?;
        if desired_version > 1 {
            state.upgrade(desired_version, true, config, migrations, activations)?;
        }
        info!(version = state.version, "initialized system state");
        Ok(state)
    }

    // =========================================================================
    // THE UPGRADE STATE MACHINE
    // =========================================================================

    /// Schedules an upgrade. No validation happens here; the target is
    /// checked only when the upgrade actually runs.
    pub fn schedule_upgrade(&self, version: u64, timestamp: u64) -> Result<(), StateError> {
        self.upgrade_version.set(version)?;
        self.upgrade_timestamp.set(timestamp)?;
        Ok(())
    }

    /// The pending (version, activation timestamp), zeroes when none.
    pub fn scheduled_upgrade(&self) -> Result<(u64, u64), StateError> {
        Ok((self.upgrade_version.get()?, self.upgrade_timestamp.get()?))
    }

    /// Runs the pending upgrade when its activation time has arrived.
    /// Called once per block.
    pub fn upgrade_if_necessary(
        &mut self,
        current_timestamp: u64,
        config: &ChainConfig,
        migrations: &MigrationTable,
        activations: &ActivationSchedule,
    ) -> Result<(), StateError> {
        let (upgrade_to, flag_day) = self.scheduled_upgrade()?;
        if self.version < upgrade_to && current_timestamp >= flag_day {
            return self.upgrade(upgrade_to, false, config, migrations, activations);
        }
        Ok(())
    }

    /// Drives the version from its current value up to `target`, one
    /// migration step at a time. Each completed step persists its version
    /// before the next begins, so an aborted upgrade leaves the state at
    /// the last fully completed version. A target already reached is a
    /// no-op.
    pub fn upgrade(
        &mut self,
        target: u64,
        first_time: bool,
        config: &ChainConfig,
        migrations: &MigrationTable,
        activations: &ActivationSchedule,
    ) -> Result<(), StateError> {
        let ctx = MigrationContext { first_time, config };
        while self.version < target {
            // built-ins introduced by this upgrade need code at their
            // addresses for call-target checks
            for address in activations.addresses_for(self.version) {
                self.database().set_code(*address, PLACEHOLDER_CODE.to_vec());
            }

            let Some(step) = migrations.step(self.version) else {
                return Err(StateError::NodeOutOfDate {
                    version: self.version + 1,
                });
            };
            if let Err(err) = (step.apply)(self, &ctx) {
                match err {
                    StateError::NodeOutOfDate { .. } => return Err(err),
                    other => {
                        // a half-applied migration would desynchronize
                        // consensus state across nodes
                        error!(
                            version = self.version,
                            step = step.summary,
                            %other,
                            "migration failed"
                        );
                        panic!(
                            "failed to upgrade version {} to {}: {other}",
                            self.version,
                            self.version + 1
                        );
                    }
                }
            }
            info!(
                from = self.version,
                to = self.version + 1,
                step = step.summary,
                "applied migration"
            );
            self.version += 1;
            self.restrict(self.backing.set_u64_by_u64(VERSION_OFFSET, self.version));
        }

        if first_time && target >= PRICING_DEFAULTS_VERSION {
            if target < CORRECTED_BATCH_COST_VERSION {
                self.restrict(self.l1_pricing.set_per_batch_gas_cost(
                    crate::substates::l1_pricing::INITIAL_PER_BATCH_GAS_COST_V6,
                ));
            }
            if config.engine_enabled(target) {
                self.restrict(Programs::initialize(
                    &self.backing.open_sub_storage(PROGRAMS_SUBSPACE),
                ));
            }
            self.restrict(
                self.l1_pricing
                    .set_equilibration_units(crate::substates::l1_pricing::initial_equilibration_units()),
            );
            self.restrict(self.l2_pricing.set_speed_limit_per_second(
                crate::substates::l2_pricing::INITIAL_SPEED_LIMIT_PER_SECOND,
            ));
            self.restrict(self.l2_pricing.set_per_block_gas_limit(
                crate::substates::l2_pricing::INITIAL_PER_BLOCK_GAS_LIMIT,
            ));
        }

        Ok(())
    }

    /// Panics on storage failure. Used only on system paths where a
    /// failed write would diverge consensus state.
    fn restrict<T>(&self, result: Result<T, StorageError>) -> T {
        match result {
            Ok(value) => value,
            Err(err) => {
                error!(%err, "storage failure in a system path");
                panic!("storage failure in a system path: {err}");
            }
        }
    }

    // =========================================================================
    // FIELDS
    // =========================================================================

    /// The current system state version.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Overrides the stored version. Test harness use only.
    pub fn set_version(&mut self, version: u64) -> Result<(), StateError> {
        self.version = version;
        self.backing.set_u64_by_u64(VERSION_OFFSET, version)?;
        Ok(())
    }

    /// The account receiving network fees.
    pub fn network_fee_account(&self) -> Result<Address, StateError> {
        Ok(self.network_fee_account.get()?)
    }

    /// Sets the network fee account.
    pub fn set_network_fee_account(&self, account: Address) -> Result<(), StateError> {
        Ok(self.network_fee_account.set(account)?)
    }

    /// The account receiving infrastructure fees.
    pub fn infra_fee_account(&self) -> Result<Address, StateError> {
        Ok(self.infra_fee_account.get()?)
    }

    /// Sets the infrastructure fee account.
    pub fn set_infra_fee_account(&self, account: Address) -> Result<(), StateError> {
        Ok(self.infra_fee_account.set(account)?)
    }

    /// The chain id.
    pub fn chain_id(&self) -> Result<U256, StateError> {
        Ok(self.chain_id.get()?)
    }

    /// The serialized chain config stored at genesis.
    pub fn chain_config_bytes(&self) -> Result<Bytes, StateError> {
        Ok(self.chain_config.get()?)
    }

    /// Replaces the serialized chain config.
    pub fn set_chain_config_bytes(&self, bytes: &[u8]) -> Result<(), StateError> {
        Ok(self.chain_config.set(bytes)?)
    }

    /// The genesis block number on the parent chain.
    pub fn genesis_block_number(&self) -> Result<u64, StateError> {
        Ok(self.genesis_block_num.get()?)
    }

    /// Keccak-256 charged to this container's burner.
    pub fn keccak(&self, data: &[u8]) -> Result<Hash, StateError> {
        Ok(self.backing.keccak(data)?)
    }

    // =========================================================================
    // SUB-STATES
    // =========================================================================

    /// The L1 fee pricer.
    #[must_use]
    pub fn l1_pricing(&self) -> &L1PricingState {
        &self.l1_pricing
    }

    /// The L2 fee pricer.
    #[must_use]
    pub fn l2_pricing(&self) -> &L2PricingState {
        &self.l2_pricing
    }

    /// The retryable-ticket state.
    #[must_use]
    pub fn retryables(&self) -> &RetryableState {
        &self.retryables
    }

    /// The address compression table.
    #[must_use]
    pub fn address_table(&self) -> &AddressTable {
        &self.address_table
    }

    /// The chain-owner set.
    #[must_use]
    pub fn chain_owners(&self) -> &AddressSet {
        &self.chain_owners
    }

    /// The outgoing-message accumulator.
    #[must_use]
    pub fn send_accumulator(&self) -> &SendAccumulator {
        &self.send_accumulator
    }

    /// The parent-chain block-hash ring.
    #[must_use]
    pub fn blockhashes(&self) -> &Blockhashes {
        &self.blockhashes
    }

    /// The compiled-program registry.
    #[must_use]
    pub fn programs(&self) -> &Programs {
        &self.programs
    }

    /// The state database behind this container.
    #[must_use]
    pub fn database(&self) -> StateDb {
        self.backing.database()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::standard_migrations;
    use sr_01_storage::adapters::memory_db::MemoryDatabase;

    fn config(initial_version: u64) -> ChainConfig {
        ChainConfig {
            chain_id: U256::from(777u64),
            initial_version,
            initial_chain_owner: Address::new([0x0A; 20]),
            genesis_block_number: 123,
            debug_mode: false,
            engine_from_version: Some(PRICING_DEFAULTS_VERSION),
        }
    }

    fn initialize(initial_version: u64) -> (SystemState, StateDb) {
        let db = MemoryDatabase::shared();
        let cfg = config(initial_version);
        let init = InitMessage::new(&cfg, U256::from(50)).unwrap();
        let state = SystemState::initialize(
            db.clone(),
            SystemBurner::new(false),
            &cfg,
            &init,
            &standard_migrations(),
            &ActivationSchedule::new(),
        )
        .unwrap();
        (state, db)
    }

    #[test]
    fn test_open_uninitialized_fails() {
        let db = MemoryDatabase::shared();
        assert!(matches!(
            SystemState::open_system(db, false),
            Err(StateError::Uninitialized)
        ));
    }

    #[test]
    fn test_initialize_version_one() {
        let (state, db) = initialize(1);
        assert_eq!(state.version(), 1);
        assert_eq!(state.chain_id().unwrap(), U256::from(777u64));
        assert_eq!(state.genesis_block_number().unwrap(), 123);
        // pre-v2 chains start with no fee recipient
        assert_eq!(state.network_fee_account().unwrap(), Address::ZERO);
        assert_eq!(
            state.l1_pricing().rewards_recipient().unwrap(),
            BATCH_POSTER_ADDRESS
        );
        assert!(state
            .chain_owners()
            .is_member(Address::new([0x0A; 20]))
            .unwrap());

        // the container can be re-opened from the same database
        let reopened = SystemState::open_system(db, false).unwrap();
        assert_eq!(reopened.version(), 1);
    }

    #[test]
    fn test_initialize_twice_fails() {
        let (_, db) = initialize(1);
        let cfg = config(1);
        let init = InitMessage::new(&cfg, U256::from(50)).unwrap();
        assert!(matches!(
            SystemState::initialize(
                db,
                SystemBurner::new(false),
                &cfg,
                &init,
                &standard_migrations(),
                &ActivationSchedule::new(),
            ),
            Err(StateError::AlreadyInitialized)
        ));
    }

    #[test]
    fn test_initialize_version_zero_rejected() {
        let db = MemoryDatabase::shared();
        let cfg = config(0);
        let init = InitMessage::new(&cfg, U256::from(50)).unwrap();
        assert!(matches!(
            SystemState::initialize(
                db,
                SystemBurner::new(false),
                &cfg,
                &init,
                &standard_migrations(),
                &ActivationSchedule::new(),
            ),
            Err(StateError::InvalidInitialVersion)
        ));
    }

    #[test]
    fn test_first_time_migration_seeds_defaults() {
        let (state, _) = initialize(PRICING_DEFAULTS_VERSION);
        assert_eq!(state.version(), PRICING_DEFAULTS_VERSION);
        // v2+ chains grant fee accounts to the owner
        assert_eq!(
            state.network_fee_account().unwrap(),
            Address::new([0x0A; 20])
        );
        assert_eq!(
            state.l2_pricing().speed_limit_per_second().unwrap(),
            crate::substates::l2_pricing::INITIAL_SPEED_LIMIT_PER_SECOND
        );
        assert_eq!(
            state.l2_pricing().per_block_gas_limit().unwrap(),
            crate::substates::l2_pricing::INITIAL_PER_BLOCK_GAS_LIMIT
        );
        assert_eq!(
            state.l1_pricing().per_batch_gas_cost().unwrap(),
            crate::substates::l1_pricing::INITIAL_PER_BATCH_GAS_COST_V6
        );
        // the engine was bootstrapped with default parameters
        assert_eq!(state.programs().engine_version().unwrap(), 1);
    }

    #[test]
    fn test_scheduled_upgrade_waits_for_flag_day() {
        let (mut state, _) = initialize(1);
        state.schedule_upgrade(6, 1000).unwrap();
        assert_eq!(state.scheduled_upgrade().unwrap(), (6, 1000));

        let cfg = config(1);
        let migrations = standard_migrations();
        let activations = ActivationSchedule::new();
        state
            .upgrade_if_necessary(999, &cfg, &migrations, &activations)
            .unwrap();
        assert_eq!(state.version(), 1);

        state
            .upgrade_if_necessary(1000, &cfg, &migrations, &activations)
            .unwrap();
        assert_eq!(state.version(), 6);
    }

    #[test]
    fn test_upgrade_is_stepwise_and_idempotent() {
        let (mut state, _) = initialize(1);
        let cfg = config(1);
        let migrations = standard_migrations();
        let activations = ActivationSchedule::new();
        state.upgrade(4, false, &cfg, &migrations, &activations).unwrap();
        assert_eq!(state.version(), 4);
        // upgrading to an already-reached target is a no-op
        state.upgrade(4, false, &cfg, &migrations, &activations).unwrap();
        assert_eq!(state.version(), 4);
        state.upgrade(2, false, &cfg, &migrations, &activations).unwrap();
        assert_eq!(state.version(), 4);
    }

    #[test]
    fn test_unsupported_version_is_fatal_and_clean() {
        let (mut state, db) = initialize(1);
        let cfg = config(1);
        let migrations = standard_migrations();
        let activations = ActivationSchedule::new();

        // v10 is debug-gated, so a non-debug chain stalls at 10
        let err = state
            .upgrade(15, false, &cfg, &migrations, &activations)
            .unwrap_err();
        assert_eq!(err, StateError::NodeOutOfDate { version: 11 });
        assert_eq!(state.version(), 10);
        // the stored version matches the in-memory one exactly
        let reopened = SystemState::open_system(db, false).unwrap();
        assert_eq!(reopened.version(), 10);
    }

    #[test]
    fn test_unsupported_version_with_no_steps_leaves_version_unchanged() {
        let (mut state, _) = initialize(1);
        let cfg = config(1);
        let empty = MigrationTable::new();
        let activations = ActivationSchedule::new();
        let err = state
            .upgrade(2, false, &cfg, &empty, &activations)
            .unwrap_err();
        assert_eq!(err, StateError::NodeOutOfDate { version: 2 });
        assert_eq!(state.version(), 1);
    }

    #[test]
    fn test_activation_schedule_installs_placeholder_code() {
        let (mut state, db) = initialize(1);
        let cfg = config(1);
        let migrations = standard_migrations();
        let mut activations = ActivationSchedule::new();
        let builtin = Address::new([0x70; 20]);
        activations.insert(2, vec![builtin]);

        state.upgrade(3, false, &cfg, &migrations, &activations).unwrap();
        assert_eq!(db.get_code(builtin), PLACEHOLDER_CODE.to_vec());
    }

    #[test]
    fn test_debug_gated_migration_runs_on_debug_chains() {
        let (mut state, _) = initialize(1);
        let mut cfg = config(1);
        cfg.debug_mode = true;
        let migrations = standard_migrations();
        let activations = ActivationSchedule::new();
        state.upgrade(11, false, &cfg, &migrations, &activations).unwrap();
        assert_eq!(state.version(), 11);
        // the mistaken amortization cap was zeroed
        assert_eq!(state.l1_pricing().amortized_cost_cap_bips().unwrap(), 0);
        // the owner list was cleared for re-registration
        assert_eq!(state.chain_owners().size().unwrap(), 0);
    }

    #[test]
    fn test_fee_account_setters() {
        let (state, _) = initialize(2);
        let account = Address::new([0xEE; 20]);
        state.set_infra_fee_account(account).unwrap();
        assert_eq!(state.infra_fee_account().unwrap(), account);
    }
}
