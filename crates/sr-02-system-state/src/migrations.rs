//! # Migration Table
//!
//! Each version has exactly one, permanent, auditable migration action:
//! the step applied when leaving that version. The table is configuration
//! data supplied by the chain, not logic derived by the node, and a
//! version nobody has implemented halts the upgrade rather than guessing.
//!
//! [`standard_migrations`] is this chain's historical policy; other
//! chains supply their own table.

use crate::config::ChainConfig;
use crate::errors::StateError;
use crate::substates::l1_pricing::INITIAL_PER_BATCH_GAS_COST_V12;
use crate::system_state::SystemState;
use shared_types::{Address, U256};
use std::collections::BTreeMap;

/// Context handed to every migration step.
pub struct MigrationContext<'a> {
    /// True while driving a freshly initialized chain up to its
    /// configured starting version.
    pub first_time: bool,
    /// The chain configuration.
    pub config: &'a ChainConfig,
}

/// A state-mutating migration function. Storage failures returned from a
/// step are consensus-fatal; only [`StateError::NodeOutOfDate`] aborts
/// the upgrade cleanly.
pub type MigrationFn = fn(&SystemState, &MigrationContext<'_>) -> Result<(), StateError>;

/// One version's migration action.
pub struct MigrationStep {
    /// Short description, for logs and audits.
    pub summary: &'static str,
    /// The action applied when leaving the version.
    pub apply: MigrationFn,
}

/// The version-indexed migration table.
#[derive(Default)]
pub struct MigrationTable {
    steps: BTreeMap<u64, MigrationStep>,
}

impl MigrationTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the step applied when leaving `version`.
    pub fn insert(&mut self, version: u64, step: MigrationStep) {
        self.steps.insert(version, step);
    }

    /// The step for leaving `version`, if one is defined.
    #[must_use]
    pub fn step(&self, version: u64) -> Option<&MigrationStep> {
        self.steps.get(&version)
    }

    /// The highest version this table can take a chain to.
    #[must_use]
    pub fn max_supported_version(&self) -> u64 {
        self.steps.keys().next_back().map_or(1, |last| last + 1)
    }
}

/// Addresses that receive placeholder executable code when the chain
/// leaves a given version, so call-target-must-have-code checks pass for
/// built-ins introduced by that upgrade.
#[derive(Default)]
pub struct ActivationSchedule {
    by_version: BTreeMap<u64, Vec<Address>>,
}

impl ActivationSchedule {
    /// Creates an empty schedule.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `addresses` for activation when leaving `version`.
    pub fn insert(&mut self, version: u64, addresses: Vec<Address>) {
        self.by_version.insert(version, addresses);
    }

    /// Addresses activated when leaving `version`.
    #[must_use]
    pub fn addresses_for(&self, version: u64) -> &[Address] {
        self.by_version
            .get(&version)
            .map_or(&[], Vec::as_slice)
    }
}

// =============================================================================
// THE CHAIN'S HISTORICAL TABLE
// =============================================================================

fn v1_seed_last_surplus(state: &SystemState, _ctx: &MigrationContext<'_>) -> Result<(), StateError> {
    state.l1_pricing().set_last_surplus(U256::zero())?;
    Ok(())
}

fn v2_seed_batch_costs(state: &SystemState, _ctx: &MigrationContext<'_>) -> Result<(), StateError> {
    state.l1_pricing().set_per_batch_gas_cost(0)?;
    state.l1_pricing().set_amortized_cost_cap_bips(u64::MAX)?;
    Ok(())
}

fn no_state_changes(_state: &SystemState, _ctx: &MigrationContext<'_>) -> Result<(), StateError> {
    Ok(())
}

fn v9_backfill_fee_pool(state: &SystemState, _ctx: &MigrationContext<'_>) -> Result<(), StateError> {
    let balance = state
        .database()
        .get_balance(crate::substates::l1_pricing::FUNDS_POOL_ADDRESS);
    state.l1_pricing().set_fees_available(balance)?;
    Ok(())
}

fn v10_rectify_pricing(state: &SystemState, ctx: &MigrationContext<'_>) -> Result<(), StateError> {
    if !ctx.config.debug_mode {
        // not finalized; only debug chains may take this step
        return Err(StateError::NodeOutOfDate { version: 11 });
    }
    state
        .l1_pricing()
        .set_per_batch_gas_cost(INITIAL_PER_BATCH_GAS_COST_V12)?;

    // the cap was mistakenly seeded to the maximum; zero disables it
    if state.l1_pricing().amortized_cost_cap_bips()? == u64::MAX {
        state.l1_pricing().set_amortized_cost_cap_bips(0)?;
    }

    // an earlier data-modeling defect corrupted the owner mapping; clear
    // the list so owners re-register, except on fresh chains
    if !ctx.first_time {
        state.chain_owners().clear()?;
    }
    Ok(())
}

/// This chain's historical migration policy, versions 1 through 10.
#[must_use]
pub fn standard_migrations() -> MigrationTable {
    let mut table = MigrationTable::new();
    table.insert(
        1,
        MigrationStep {
            summary: "seed the L1 pricer's surplus tracking",
            apply: v1_seed_last_surplus,
        },
    );
    table.insert(
        2,
        MigrationStep {
            summary: "seed per-batch gas cost and the amortization cap",
            apply: v2_seed_batch_costs,
        },
    );
    for version in 3..=8 {
        table.insert(
            version,
            MigrationStep {
                summary: "no state changes needed",
                apply: no_state_changes,
            },
        );
    }
    table.insert(
        9,
        MigrationStep {
            summary: "backfill the fee pool balance into the L1 pricer",
            apply: v9_backfill_fee_pool,
        },
    );
    table.insert(
        10,
        MigrationStep {
            summary: "rectify pricing defaults and the owner list (debug only)",
            apply: v10_rectify_pricing,
        },
    );
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_table_shape() {
        let table = standard_migrations();
        for version in 1..=10 {
            assert!(table.step(version).is_some(), "missing step {version}");
        }
        assert!(table.step(11).is_none());
        assert_eq!(table.max_supported_version(), 11);
    }

    #[test]
    fn test_activation_schedule_lookup() {
        let mut schedule = ActivationSchedule::new();
        schedule.insert(3, vec![Address::new([1u8; 20])]);
        assert_eq!(schedule.addresses_for(3).len(), 1);
        assert!(schedule.addresses_for(4).is_empty());
    }
}
