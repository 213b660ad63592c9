//! # Subspace Storage
//!
//! Slot access over the system state account, partitioned into disjoint
//! subspaces by hashed key prefix.
//!
//! ## Slot mapping
//!
//! A logical key maps to the absolute slot
//! `keccak(prefix ++ key[..31])` with the final byte of the logical key
//! preserved, so runs of up to 256 consecutive logical keys stay adjacent
//! in the hashed space. A child subspace's prefix is
//! `keccak(parent_prefix ++ id)`, which keeps sibling subspaces disjoint.

use crate::backed::{
    StorageBackedAddress, StorageBackedBool, StorageBackedBytes, StorageBackedU256,
    StorageBackedU64,
};
use crate::burner::{
    Burner, KECCAK_BASE_COST, KECCAK_WORD_COST, STORAGE_READ_COST, STORAGE_WRITE_COST,
    STORAGE_WRITE_ZERO_COST,
};
use crate::errors::StorageError;
use crate::ports::database::StateDb;
use shared_types::{keccak_concat, math::words_for_bytes, Address, Hash};
use std::sync::Arc;

/// The account that owns every system state slot.
pub const STATE_ACCOUNT: Address = Address([
    0xa4, 0xb0, 0x5f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xff, 0xff, 0xff, 0x00, 0x05,
]);

/// A subspace-prefixed view of the system state account's slots.
///
/// Cloning is cheap; clones share the database handle and burner.
#[derive(Clone)]
pub struct Storage {
    db: StateDb,
    prefix: Vec<u8>,
    burner: Arc<dyn Burner>,
}

impl Storage {
    /// Opens the root storage space.
    pub fn new(db: StateDb, burner: Arc<dyn Burner>) -> Self {
        Self {
            db,
            prefix: Vec::new(),
            burner,
        }
    }

    /// Opens the child subspace identified by `id`.
    #[must_use]
    pub fn open_sub_storage(&self, id: &[u8]) -> Storage {
        Storage {
            db: self.db.clone(),
            prefix: keccak_concat(&[&self.prefix, id]).as_bytes().to_vec(),
            burner: self.burner.clone(),
        }
    }

    /// The database handle behind this storage space.
    #[must_use]
    pub fn database(&self) -> StateDb {
        self.db.clone()
    }

    /// The burner paying for access through this storage space.
    #[must_use]
    pub fn burner(&self) -> Arc<dyn Burner> {
        self.burner.clone()
    }

    fn map_slot(&self, key: Hash) -> Hash {
        let mut mapped = keccak_concat(&[&self.prefix, &key.as_bytes()[..31]]).0;
        mapped[31] = key.as_bytes()[31];
        Hash(mapped)
    }

    // =========================================================================
    // SLOT ACCESS
    // =========================================================================

    /// Reads the slot at `key`.
    pub fn get(&self, key: Hash) -> Result<Hash, StorageError> {
        self.burner.burn(STORAGE_READ_COST)?;
        Ok(self.db.get_state(STATE_ACCOUNT, self.map_slot(key)))
    }

    /// Writes the slot at `key`.
    pub fn set(&self, key: Hash, value: Hash) -> Result<(), StorageError> {
        if self.burner.read_only() {
            return Err(StorageError::WriteProtection);
        }
        let cost = if value.is_zero() {
            STORAGE_WRITE_ZERO_COST
        } else {
            STORAGE_WRITE_COST
        };
        self.burner.burn(cost)?;
        self.db.set_state(STATE_ACCOUNT, self.map_slot(key), value);
        Ok(())
    }

    /// Reads the slot at the small integer offset `key`.
    pub fn get_by_u64(&self, key: u64) -> Result<Hash, StorageError> {
        self.get(Hash::from_u64(key))
    }

    /// Writes the slot at the small integer offset `key`.
    pub fn set_by_u64(&self, key: u64, value: Hash) -> Result<(), StorageError> {
        self.set(Hash::from_u64(key), value)
    }

    /// Reads a u64 stored at the small integer offset `key`.
    pub fn get_u64_by_u64(&self, key: u64) -> Result<u64, StorageError> {
        Ok(self.get_by_u64(key)?.to_u64())
    }

    /// Writes a u64 at the small integer offset `key`.
    pub fn set_u64_by_u64(&self, key: u64, value: u64) -> Result<(), StorageError> {
        self.set_by_u64(key, Hash::from_u64(value))
    }

    /// Zeroes the slot at `key`.
    pub fn clear(&self, key: Hash) -> Result<(), StorageError> {
        self.set(key, Hash::ZERO)
    }

    // =========================================================================
    // HASHING
    // =========================================================================

    /// Keccak-256 paid for through this storage space's burner.
    pub fn keccak(&self, data: &[u8]) -> Result<Hash, StorageError> {
        let cost = KECCAK_BASE_COST + KECCAK_WORD_COST * words_for_bytes(data.len() as u64);
        self.burner.burn(cost)?;
        Ok(shared_types::keccak256(data))
    }

    // =========================================================================
    // TYPED ACCESSORS
    // =========================================================================

    /// Opens a storage-backed u64 at the given slot offset.
    #[must_use]
    pub fn open_backed_u64(&self, offset: u64) -> StorageBackedU64 {
        StorageBackedU64::new(self.clone(), offset)
    }

    /// Opens a storage-backed U256 at the given slot offset.
    #[must_use]
    pub fn open_backed_u256(&self, offset: u64) -> StorageBackedU256 {
        StorageBackedU256::new(self.clone(), offset)
    }

    /// Opens a storage-backed address at the given slot offset.
    #[must_use]
    pub fn open_backed_address(&self, offset: u64) -> StorageBackedAddress {
        StorageBackedAddress::new(self.clone(), offset)
    }

    /// Opens a storage-backed bool at the given slot offset.
    #[must_use]
    pub fn open_backed_bool(&self, offset: u64) -> StorageBackedBool {
        StorageBackedBool::new(self.clone(), offset)
    }

    /// Opens a storage-backed byte string living in its own subspace.
    #[must_use]
    pub fn open_backed_bytes(&self, id: &[u8]) -> StorageBackedBytes {
        StorageBackedBytes::new(self.open_sub_storage(id))
    }
}

// =============================================================================
// TESTS
// =============================================================================
