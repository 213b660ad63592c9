//! # Address Set
//!
//! The chain-owner set: a storage-backed set of addresses with O(1)
//! membership and swap-remove deletion.

use shared_types::{Address, Hash};
use sr_01_storage::{Storage, StorageError};

const SIZE_OFFSET: u64 = 0;
const BY_INDEX_SUBSPACE: &[u8] = &[1];
const INDEX_OF_SUBSPACE: &[u8] = &[2];

/// A storage-backed set of addresses.
pub struct AddressSet {
    backing: Storage,
    by_index: Storage,
    index_of: Storage,
}

impl AddressSet {
    /// Writes the initial layout.
    pub fn initialize(sto: &Storage) -> Result<(), StorageError> {
        sto.set_u64_by_u64(SIZE_OFFSET, 0)
    }

    /// Opens the sub-state against its subspace.
    #[must_use]
    pub fn open(sto: &Storage) -> Self {
        Self {
            backing: sto.clone(),
            by_index: sto.open_sub_storage(BY_INDEX_SUBSPACE),
            index_of: sto.open_sub_storage(INDEX_OF_SUBSPACE),
        }
    }

    /// Number of members.
    pub fn size(&self) -> Result<u64, StorageError> {
        self.backing.get_u64_by_u64(SIZE_OFFSET)
    }

    /// True if `address` is a member.
    pub fn is_member(&self, address: Address) -> Result<bool, StorageError> {
        Ok(self.index_of.get(address.to_hash())?.to_u64() != 0)
    }

    /// Adds `address`; a no-op if already present.
    pub fn add(&self, address: Address) -> Result<(), StorageError> {
        if self.is_member(address)? {
            return Ok(());
        }
        let size = self.size()?;
        self.by_index.set(Hash::from_u64(size), address.to_hash())?;
        self.index_of.set(address.to_hash(), Hash::from_u64(size + 1))?;
        self.backing.set_u64_by_u64(SIZE_OFFSET, size + 1)
    }

    /// Removes `address` by swapping the last member into its slot.
    /// A no-op if not present.
    pub fn remove(&self, address: Address) -> Result<(), StorageError> {
        let slot = self.index_of.get(address.to_hash())?.to_u64();
        if slot == 0 {
            return Ok(());
        }
        let index = slot - 1;
        let last = self.size()? - 1;
        if index != last {
            let moved = self.by_index.get(Hash::from_u64(last))?;
            self.by_index.set(Hash::from_u64(index), moved)?;
            self.index_of.set(moved, Hash::from_u64(index + 1))?;
        }
        self.by_index.clear(Hash::from_u64(last))?;
        self.index_of.clear(address.to_hash())?;
        self.backing.set_u64_by_u64(SIZE_OFFSET, last)
    }

    /// All members, in index order.
    pub fn all_members(&self) -> Result<Vec<Address>, StorageError> {
        let size = self.size()?;
        let mut members = Vec::with_capacity(size as usize);
        for index in 0..size {
            members.push(self.by_index.get(Hash::from_u64(index))?.to_address());
        }
        Ok(members)
    }

    /// Empties the set.
    pub fn clear(&self) -> Result<(), StorageError> {
        let size = self.size()?;
        for index in 0..size {
            let member = self.by_index.get(Hash::from_u64(index))?;
            self.index_of.clear(member)?;
            self.by_index.clear(Hash::from_u64(index))?;
        }
        self.backing.set_u64_by_u64(SIZE_OFFSET, 0)
    }
}
