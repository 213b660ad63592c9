//! # Adapters
//!
//! Concrete implementations of the storage ports.

pub mod memory_db;
