//! End-to-end coverage of the version upgrade state machine.

#![cfg(test)]

use super::harness::{chain_config, owner};
use shared_types::{Address, U256};
use sr_01_storage::adapters::memory_db::MemoryDatabase;
use sr_01_storage::SystemBurner;
use sr_02_system_state::substates::l1_pricing;
use sr_02_system_state::substates::l2_pricing;
use sr_02_system_state::{
    standard_migrations, ActivationSchedule, ChainConfig, InitMessage, StateError, SystemState,
};

fn init_at_version(initial_version: u64) -> (SystemState, ChainConfig) {
    let db = MemoryDatabase::shared();
    let mut config = chain_config();
    config.initial_version = initial_version;
    let init = InitMessage::new(&config, U256::from(100)).unwrap();
    let state = SystemState::initialize(
        db,
        SystemBurner::new(false),
        &config,
        &init,
        &standard_migrations(),
        &ActivationSchedule::new(),
    )
    .unwrap();
    (state, config)
}

#[test]
fn scheduled_upgrade_runs_only_at_the_flag_day() {
    let (mut state, config) = init_at_version(1);
    assert_eq!(state.version(), 1);

    let flag_day = 1_700_000_000;
    state.schedule_upgrade(6, flag_day).unwrap();
    let migrations = standard_migrations();
    let activations = ActivationSchedule::new();

    // one block per timestamp below the flag day: nothing moves
    for timestamp in [0, flag_day - 100, flag_day - 1] {
        state
            .upgrade_if_necessary(timestamp, &config, &migrations, &activations)
            .unwrap();
        assert_eq!(state.version(), 1);
    }

    // at the flag day the chain steps to exactly the scheduled version
    state
        .upgrade_if_necessary(flag_day, &config, &migrations, &activations)
        .unwrap();
    assert_eq!(state.version(), 6);

    // subsequent blocks are no-ops
    state
        .upgrade_if_necessary(flag_day + 1, &config, &migrations, &activations)
        .unwrap();
    assert_eq!(state.version(), 6);
}

#[test]
fn upgrades_are_exact_sequences_of_single_steps() {
    // for every reachable v1 < v2, upgrading lands on exactly v2, and
    // upgrading again through intermediate targets is stable
    let migrations = standard_migrations();
    let activations = ActivationSchedule::new();
    for target in 2..=10u64 {
        let (mut state, config) = init_at_version(1);
        state
            .upgrade(target, false, &config, &migrations, &activations)
            .unwrap();
        assert_eq!(state.version(), target);
    }

    // stepping one version at a time reaches the same end state
    let (mut state, config) = init_at_version(1);
    for target in 2..=10u64 {
        state
            .upgrade(target, false, &config, &migrations, &activations)
            .unwrap();
        assert_eq!(state.version(), target);
    }
}

#[test]
fn unsupported_target_fails_without_partial_steps() {
    let migrations = standard_migrations();
    let activations = ActivationSchedule::new();

    // v10 is debug-gated: a production chain progresses to 10, then halts
    let (mut state, config) = init_at_version(1);
    let err = state
        .upgrade(20, false, &config, &migrations, &activations)
        .unwrap_err();
    assert_eq!(err, StateError::NodeOutOfDate { version: 11 });
    assert_eq!(state.version(), 10);

    // already at the last supported version: the version does not move
    let err = state
        .upgrade(11, false, &config, &migrations, &activations)
        .unwrap_err();
    assert_eq!(err, StateError::NodeOutOfDate { version: 11 });
    assert_eq!(state.version(), 10);
}

#[test]
fn first_time_chains_seed_pricing_defaults() {
    let (state, _) = init_at_version(6);
    assert_eq!(state.version(), 6);
    assert_eq!(
        state.l2_pricing().speed_limit_per_second().unwrap(),
        l2_pricing::INITIAL_SPEED_LIMIT_PER_SECOND
    );
    assert_eq!(
        state.l2_pricing().per_block_gas_limit().unwrap(),
        l2_pricing::INITIAL_PER_BLOCK_GAS_LIMIT
    );
    assert_eq!(
        state.l1_pricing().per_batch_gas_cost().unwrap(),
        l1_pricing::INITIAL_PER_BATCH_GAS_COST_V6
    );
    assert_eq!(
        state.l1_pricing().equilibration_units().unwrap(),
        l1_pricing::initial_equilibration_units()
    );
    // the engine subsystem was bootstrapped
    assert_eq!(state.programs().engine_version().unwrap(), 1);
}

#[test]
fn fee_recipient_policy_depends_on_initial_version() {
    let (state, _) = init_at_version(1);
    assert_eq!(state.network_fee_account().unwrap(), Address::ZERO);
    assert_eq!(
        state.l1_pricing().rewards_recipient().unwrap(),
        l1_pricing::BATCH_POSTER_ADDRESS
    );

    let (state, _) = init_at_version(2);
    assert_eq!(state.network_fee_account().unwrap(), owner());
    assert_eq!(state.l1_pricing().rewards_recipient().unwrap(), owner());
}

#[test]
fn version_nine_backfills_the_fee_pool() {
    let typed = std::sync::Arc::new(MemoryDatabase::new());
    let db: sr_01_storage::StateDb = typed.clone();
    let mut config = chain_config();
    config.initial_version = 1;
    let init = InitMessage::new(&config, U256::from(100)).unwrap();
    let mut state = SystemState::initialize(
        db,
        SystemBurner::new(false),
        &config,
        &init,
        &standard_migrations(),
        &ActivationSchedule::new(),
    )
    .unwrap();

    // fund the pool before the chain crosses version 9
    let pool_balance = U256::from(123_456_789u64);
    typed.set_balance(l1_pricing::FUNDS_POOL_ADDRESS, pool_balance);

    let migrations = standard_migrations();
    let activations = ActivationSchedule::new();
    state
        .upgrade(10, false, &config, &migrations, &activations)
        .unwrap();
    assert_eq!(state.l1_pricing().fees_available().unwrap(), pool_balance);
}
