//! # Address Table
//!
//! Compression table mapping addresses to small indices, so calldata can
//! reference a registered address by index instead of 20 bytes.

use shared_types::{Address, Hash};
use sr_01_storage::{Storage, StorageError};

const SIZE_OFFSET: u64 = 0;
const BY_ADDRESS_SUBSPACE: &[u8] = &[1];
const BY_INDEX_SUBSPACE: &[u8] = &[2];

/// The address table sub-state.
pub struct AddressTable {
    backing: Storage,
    by_address: Storage,
    by_index: Storage,
}

impl AddressTable {
    /// Writes the initial layout.
    pub fn initialize(sto: &Storage) -> Result<(), StorageError> {
        sto.set_u64_by_u64(SIZE_OFFSET, 0)
    }

    /// Opens the sub-state against its subspace.
    #[must_use]
    pub fn open(sto: &Storage) -> Self {
        Self {
            backing: sto.clone(),
            by_address: sto.open_sub_storage(BY_ADDRESS_SUBSPACE),
            by_index: sto.open_sub_storage(BY_INDEX_SUBSPACE),
        }
    }

    /// Number of registered addresses.
    pub fn size(&self) -> Result<u64, StorageError> {
        self.backing.get_u64_by_u64(SIZE_OFFSET)
    }

    /// Registers `address`, returning its index. Registering an address
    /// twice returns the existing index.
    pub fn register(&self, address: Address) -> Result<u64, StorageError> {
        if let Some(index) = self.lookup(address)? {
            return Ok(index);
        }
        let index = self.size()?;
        // stored shifted by one so zero means "absent"
        self.by_address.set(address.to_hash(), Hash::from_u64(index + 1))?;
        self.by_index.set(Hash::from_u64(index), address.to_hash())?;
        self.backing.set_u64_by_u64(SIZE_OFFSET, index + 1)?;
        Ok(index)
    }

    /// Index of `address`, if registered.
    pub fn lookup(&self, address: Address) -> Result<Option<u64>, StorageError> {
        let slot = self.by_address.get(address.to_hash())?.to_u64();
        Ok(slot.checked_sub(1))
    }

    /// Address at `index`, if in range.
    pub fn lookup_index(&self, index: u64) -> Result<Option<Address>, StorageError> {
        if index >= self.size()? {
            return Ok(None);
        }
        Ok(Some(self.by_index.get(Hash::from_u64(index))?.to_address()))
    }
}
