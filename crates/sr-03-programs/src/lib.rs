//! # SR-03 Programs - Compiled Program Registry
//!
//! ## Purpose
//!
//! Tracks which accounts hold compiled program modules and at which engine
//! version, compiles account code into executable artifacts, and bridges a
//! running program's host calls back into Ethereum-equivalent semantics.
//!
//! ## Lifecycle
//!
//! 1. An account's code carries the module magic prefix and a compressed
//!    module body (`codec`).
//! 2. `compile_program` validates and compiles the module for the live
//!    engine version and records the new version for the address.
//! 3. `call_program` checks the recorded version against the live one,
//!    prices the memory footprint, registers a host-call session, and runs
//!    the artifact under the execution engine.
//!
//! A program compiled at version X is callable only while the global
//! engine version is still X; bumping the version forces recompilation
//! even though the account code is unchanged.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api_impl;
pub mod codec;
pub mod errors;
pub mod params;
pub mod ports;
pub mod pricing;
pub mod registry;

pub use api_impl::{EvmApiImpl, TxContext};
pub use codec::{decode_module, encode_module, is_module_code, MAX_MODULE_SIZE, MODULE_MAGIC};
pub use errors::ProgramError;
pub use params::EngineParams;
pub use ports::{CallKind, CallOutcome, CallResult, CallRouter, CreateOutcome, HostioTracer};
pub use registry::{ExecutionScope, Programs};
