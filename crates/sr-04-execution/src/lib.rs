//! # SR-04 Execution - Metered Program Execution Engine
//!
//! ## Purpose
//!
//! Compiles contract modules into validated, cost-annotated artifacts and
//! executes them under strict ink metering with EVM-equivalent host
//! operations. Running module code cannot touch host state directly: every
//! permitted side effect goes through a numbered host operation dispatched
//! via an opaque per-call session handle.
//!
//! ## Execution Safety Limits
//!
//! | Limit | Value | Purpose |
//! |-------|-------|---------|
//! | value stack | 4096 slots | bound interpreter memory |
//! | call depth | `VmParams::max_call_depth` | bound recursion |
//! | linear memory | 128 pages (64 KiB each) | bound heap growth |
//! | ink | converted from the caller's gas | bound run time |
//!
//! Every instruction costs at least one ink, so execution always
//! terminates. A trap never escapes this crate: every failure is mapped to
//! one of the five [`ExecutionStatus`] codes.
//!
//! ## Components
//!
//! | Component | Location | Purpose |
//! |-----------|----------|---------|
//! | Engine | `engine.rs` | compile / call entry points |
//! | Machine | `vm/machine.rs` | metered interpreter |
//! | Module | `vm/module.rs` | decode + validate + artifact |
//! | Bridge | `bridge.rs` | host-call session table |
//! | `EvmApi` | `api.rs` | host operation port |
//! | Memory model | `memory.rs` | page growth pricing |
//! | Assembler | `asm.rs` | module bytecode builder |

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod asm;
pub mod bridge;
pub mod cache;
pub mod context;
pub mod engine;
pub mod errors;
pub mod memory;
pub mod status;
pub mod vm;

pub use api::{CallStatus, EvmApi, HostError, HostOp};
pub use bridge::{ApiHandle, SessionGuard};
pub use context::{CompileParams, EvmData, VmParams};
pub use engine::{call, compile, ModuleInfo};
pub use errors::CompileError;
pub use memory::MemoryModel;
pub use status::ExecutionStatus;
