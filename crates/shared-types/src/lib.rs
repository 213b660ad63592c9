//! # Shared Types
//!
//! Value objects and small helpers shared by every Stratum core crate.
//!
//! The chain's domain primitives are defined once here so that the storage
//! layer, the system state container, the program registry, and the
//! execution engine all agree on what an address, a hash, and a word are.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod hashing;
pub mod math;
pub mod types;

pub use hashing::{keccak256, keccak_concat};
pub use types::{Address, Bytes, Hash, U256};
