//! # Storage-Backed Fields
//!
//! Typed accessors over single slots (or a dedicated subspace, for byte
//! strings). Opening one is free; every get/set pays storage gas through
//! the parent storage's burner.

use crate::errors::StorageError;
use crate::storage::Storage;
use shared_types::{Address, Bytes, Hash, U256};

// =============================================================================
// SCALAR FIELDS
// =============================================================================

/// A u64 stored in one slot.
#[derive(Clone)]
pub struct StorageBackedU64 {
    storage: Storage,
    offset: u64,
}

impl StorageBackedU64 {
    pub(crate) fn new(storage: Storage, offset: u64) -> Self {
        Self { storage, offset }
    }

    /// Reads the field.
    pub fn get(&self) -> Result<u64, StorageError> {
        self.storage.get_u64_by_u64(self.offset)
    }

    /// Writes the field.
    pub fn set(&self, value: u64) -> Result<(), StorageError> {
        self.storage.set_u64_by_u64(self.offset, value)
    }
}

/// A U256 stored in one slot, big-endian.
#[derive(Clone)]
pub struct StorageBackedU256 {
    storage: Storage,
    offset: u64,
}

impl StorageBackedU256 {
    pub(crate) fn new(storage: Storage, offset: u64) -> Self {
        Self { storage, offset }
    }

    /// Reads the field.
    pub fn get(&self) -> Result<U256, StorageError> {
        Ok(self.storage.get_by_u64(self.offset)?.to_u256())
    }

    /// Writes the field.
    pub fn set(&self, value: U256) -> Result<(), StorageError> {
        self.storage.set_by_u64(self.offset, Hash::from_u256(value))
    }
}

/// An address stored in one slot, right-aligned.
#[derive(Clone)]
pub struct StorageBackedAddress {
    storage: Storage,
    offset: u64,
}

impl StorageBackedAddress {
    pub(crate) fn new(storage: Storage, offset: u64) -> Self {
        Self { storage, offset }
    }

    /// Reads the field.
    pub fn get(&self) -> Result<Address, StorageError> {
        Ok(self.storage.get_by_u64(self.offset)?.to_address())
    }

    /// Writes the field.
    pub fn set(&self, value: Address) -> Result<(), StorageError> {
        self.storage.set_by_u64(self.offset, value.to_hash())
    }
}

/// A bool stored in one slot (zero = false, anything else = true).
#[derive(Clone)]
pub struct StorageBackedBool {
    storage: Storage,
    offset: u64,
}

impl StorageBackedBool {
    pub(crate) fn new(storage: Storage, offset: u64) -> Self {
        Self { storage, offset }
    }

    /// Reads the field.
    pub fn get(&self) -> Result<bool, StorageError> {
        Ok(!self.storage.get_by_u64(self.offset)?.is_zero())
    }

    /// Writes the field.
    pub fn set(&self, value: bool) -> Result<(), StorageError> {
        self.storage
            .set_by_u64(self.offset, Hash::from_u64(u64::from(value)))
    }
}

// =============================================================================
// BYTE STRINGS
// =============================================================================

/// A variable-length byte string in its own subspace: slot 0 holds the
/// length, slots 1.. hold 32-byte chunks.
#[derive(Clone)]
pub struct StorageBackedBytes {
    storage: Storage,
}

impl StorageBackedBytes {
    pub(crate) fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Reads the whole byte string.
    pub fn get(&self) -> Result<Bytes, StorageError> {
        let len = self.storage.get_u64_by_u64(0)? as usize;
        let mut out = Vec::with_capacity(len);
        let mut slot = 1u64;
        while out.len() < len {
            let chunk = self.storage.get_by_u64(slot)?;
            let take = (len - out.len()).min(32);
            out.extend_from_slice(&chunk.as_bytes()[..take]);
            slot += 1;
        }
        Ok(out)
    }

    /// Replaces the whole byte string, zeroing any trailing chunks left
    /// over from a longer previous value.
    pub fn set(&self, value: &[u8]) -> Result<(), StorageError> {
        let old_len = self.storage.get_u64_by_u64(0)? as u64;
        let old_chunks = old_len.div_ceil(32);
        self.storage.set_u64_by_u64(0, value.len() as u64)?;

        let mut slot = 1u64;
        for chunk in value.chunks(32) {
            let mut word = [0u8; 32];
            word[..chunk.len()].copy_from_slice(chunk);
            self.storage.set_by_u64(slot, Hash(word))?;
            slot += 1;
        }
        while slot <= old_chunks {
            self.storage.set_by_u64(slot, Hash::ZERO)?;
            slot += 1;
        }
        Ok(())
    }

    /// Length of the stored byte string.
    pub fn size(&self) -> Result<u64, StorageError> {
        self.storage.get_u64_by_u64(0)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory_db::MemoryDatabase;
    use crate::burner::SystemBurner;

    fn open() -> Storage {
        Storage::new(MemoryDatabase::shared(), SystemBurner::new(false))
    }

    #[test]
    fn test_u64_field() {
        let field = open().open_backed_u64(3);
        assert_eq!(field.get().unwrap(), 0);
        field.set(99).unwrap();
        assert_eq!(field.get().unwrap(), 99);
    }

    #[test]
    fn test_address_field() {
        let field = open().open_backed_address(0);
        let addr = Address::new([5u8; 20]);
        field.set(addr).unwrap();
        assert_eq!(field.get().unwrap(), addr);
    }

    #[test]
    fn test_u256_field() {
        let field = open().open_backed_u256(1);
        let value = U256::from(1u64) << 200;
        field.set(value).unwrap();
        assert_eq!(field.get().unwrap(), value);
    }

    #[test]
    fn test_bool_field() {
        let field = open().open_backed_bool(2);
        assert!(!field.get().unwrap());
        field.set(true).unwrap();
        assert!(field.get().unwrap());
    }

    #[test]
    fn test_bytes_roundtrip() {
        let field = open().open_backed_bytes(b"cfg");
        let payload: Vec<u8> = (0..100).collect();
        field.set(&payload).unwrap();
        assert_eq!(field.get().unwrap(), payload);
        assert_eq!(field.size().unwrap(), 100);
    }

    #[test]
    fn test_bytes_shrink_clears_tail() {
        let field = open().open_backed_bytes(b"cfg");
        field.set(&[0xFF; 100]).unwrap();
        field.set(&[0x01; 10]).unwrap();
        assert_eq!(field.get().unwrap(), vec![0x01; 10]);
        // a fresh grow back must not resurrect stale tail bytes
        field.set(&[0x02; 100]).unwrap();
        assert_eq!(field.get().unwrap(), vec![0x02; 100]);
    }
}
