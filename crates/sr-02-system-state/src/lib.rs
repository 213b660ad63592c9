//! # SR-02 System State - Versioned Chain State Container
//!
//! ## Purpose
//!
//! Owns the chain-level system state: the global format version and its
//! one-way upgrade state machine, the chain identity, the fee accounts,
//! and every sub-state object (fee pricing, retryable tickets, the
//! address table, the owner set, the send accumulator, the block-hash
//! ring, and the program registry).
//!
//! ## Invariants
//!
//! | Invariant | Enforcement |
//! |-----------|-------------|
//! | version only increases | `SystemState::upgrade` loop |
//! | version 0 means "not created" | `SystemState::open` / `initialize` |
//! | migrations are strictly sequential | one integer step per loop pass |
//! | no partial version step | version persisted only after its step |
//! | migration storage failure is fatal | `SystemState::restrict` panics |
//!
//! Every mutation goes through the storage-burn accounting device of
//! `sr-01-storage`; opening the state is cheap and opening it read-only
//! refuses writes at the storage layer.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod errors;
pub mod migrations;
pub mod pruning;
pub mod substates;
pub mod system_state;

pub use config::{ChainConfig, InitMessage};
pub use errors::StateError;
pub use migrations::{
    standard_migrations, ActivationSchedule, MigrationContext, MigrationStep, MigrationTable,
};
pub use pruning::{NoopPruner, PruningConsumer};
pub use system_state::SystemState;
