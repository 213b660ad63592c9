//! # SR-01 Keyed Storage - Slot-Addressed System Storage
//!
//! ## Purpose
//!
//! Provides the keyed storage layer under the system state: typed accessors
//! (u64, U256, address, byte-string, bool) over a persistent slot-addressed
//! key space, organized into disjoint subspaces by hashed prefix.
//!
//! Every read and write is paid for through a [`burner::Burner`], the gas
//! accounting device shared by system and user code paths.
//!
//! ## Layout
//!
//! | Component | Location | Purpose |
//! |-----------|----------|---------|
//! | `StateDatabase` | `ports/database.rs` | Outbound port to the node's state trie |
//! | `Storage` | `storage.rs` | Subspace-prefixed slot access |
//! | Typed accessors | `backed.rs` | Storage-backed scalar/byte fields |
//! | Burners | `burner.rs` | Gas accounting for storage access |
//! | `MemoryDatabase` | `adapters/memory_db.rs` | In-memory adapter for tests |

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod backed;
pub mod burner;
pub mod errors;
pub mod ports;
pub mod storage;

pub use backed::{
    StorageBackedAddress, StorageBackedBool, StorageBackedBytes, StorageBackedU256,
    StorageBackedU64,
};
pub use burner::{Burner, GasBurner, SystemBurner};
pub use errors::StorageError;
pub use ports::database::{LogEntry, StateDatabase, StateDb};
pub use storage::Storage;
