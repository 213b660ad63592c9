//! # Storage Burners
//!
//! Gas accounting for storage access. Every slot read, slot write, and
//! hash computed through [`crate::Storage`] burns gas through one of these
//! devices, so system code and user code pay by the same schedule.

use crate::errors::StorageError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Gas burned per storage slot read.
pub const STORAGE_READ_COST: u64 = 800;
/// Gas burned per storage slot write (nonzero value).
pub const STORAGE_WRITE_COST: u64 = 20_000;
/// Gas burned per storage slot write of zero.
pub const STORAGE_WRITE_ZERO_COST: u64 = 5_000;
/// Base gas burned per Keccak-256 invocation.
pub const KECCAK_BASE_COST: u64 = 30;
/// Gas burned per 32-byte word hashed.
pub const KECCAK_WORD_COST: u64 = 6;

/// The gas accounting device behind a [`crate::Storage`] handle.
pub trait Burner: Send + Sync {
    /// Burns `amount` gas, failing if the budget is exhausted.
    fn burn(&self, amount: u64) -> Result<(), StorageError>;

    /// Total gas burned so far.
    fn burned(&self) -> u64;

    /// Remaining budget, if this burner has one.
    fn gas_left(&self) -> Option<u64> {
        None
    }

    /// True if writes through this burner must be refused.
    fn read_only(&self) -> bool {
        false
    }
}

// =============================================================================
// SYSTEM BURNER
// =============================================================================

/// Unlimited burner for system-internal paths (block hooks, migrations).
///
/// Burn never fails; the total is tracked so block production can account
/// for system overhead. Storage failures reached through a system burner
/// are consensus-fatal and handled by the caller.
pub struct SystemBurner {
    burned: AtomicU64,
    read_only: bool,
}

impl SystemBurner {
    /// Creates a system burner. `read_only` refuses writes, for opening
    /// the state during simulation.
    pub fn new(read_only: bool) -> Arc<Self> {
        Arc::new(Self {
            burned: AtomicU64::new(0),
            read_only,
        })
    }
}

impl Burner for SystemBurner {
    fn burn(&self, amount: u64) -> Result<(), StorageError> {
        self.burned.fetch_add(amount, Ordering::Relaxed);
        Ok(())
    }

    fn burned(&self) -> u64 {
        self.burned.load(Ordering::Relaxed)
    }

    fn read_only(&self) -> bool {
        self.read_only
    }
}

// =============================================================================
// GAS BURNER
// =============================================================================

/// Finite burner backed by a caller's remaining gas.
pub struct GasBurner {
    remaining: AtomicU64,
    burned: AtomicU64,
}

impl GasBurner {
    /// Creates a burner with the given gas budget.
    pub fn new(gas: u64) -> Arc<Self> {
        Arc::new(Self {
            remaining: AtomicU64::new(gas),
            burned: AtomicU64::new(0),
        })
    }

    /// Gas not yet burned.
    pub fn remaining(&self) -> u64 {
        self.remaining.load(Ordering::Relaxed)
    }
}

impl Burner for GasBurner {
    fn burn(&self, amount: u64) -> Result<(), StorageError> {
        let updated = self
            .remaining
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                current.checked_sub(amount)
            });
        match updated {
            Ok(_) => {
                self.burned.fetch_add(amount, Ordering::Relaxed);
                Ok(())
            }
            Err(left) => {
                debug!(amount, left, "storage gas budget exhausted");
                Err(StorageError::OutOfGas)
            }
        }
    }

    fn burned(&self) -> u64 {
        self.burned.load(Ordering::Relaxed)
    }

    fn gas_left(&self) -> Option<u64> {
        Some(self.remaining())
    }
}

// =============================================================================
// TESTS
// =============================================================================
