//! # Send Accumulator
//!
//! Append-only Merkle accumulator over outgoing (L2-to-L1) messages.
//! Stores the leaf count and one partial root per tree level; appending
//! merges complete subtrees upward exactly once per level carry.

use shared_types::{keccak_concat, Hash};
use sr_01_storage::{Storage, StorageError};

const SIZE_OFFSET: u64 = 0;
const PARTIALS_SUBSPACE: &[u8] = &[1];

/// The send accumulator sub-state.
pub struct SendAccumulator {
    backing: Storage,
    partials: Storage,
}

impl SendAccumulator {
    /// Writes the initial layout.
    pub fn initialize(sto: &Storage) -> Result<(), StorageError> {
        sto.set_u64_by_u64(SIZE_OFFSET, 0)
    }

    /// Opens the sub-state against its subspace.
    #[must_use]
    pub fn open(sto: &Storage) -> Self {
        Self {
            backing: sto.clone(),
            partials: sto.open_sub_storage(PARTIALS_SUBSPACE),
        }
    }

    /// Number of accumulated leaves.
    pub fn size(&self) -> Result<u64, StorageError> {
        self.backing.get_u64_by_u64(SIZE_OFFSET)
    }

    /// Appends a leaf, merging complete subtrees upward.
    pub fn append(&self, leaf: Hash) -> Result<(), StorageError> {
        let size = self.size()?;
        self.backing.set_u64_by_u64(SIZE_OFFSET, size + 1)?;

        let mut hash = leaf;
        let mut level = 0u64;
        let mut remaining = size;
        while remaining & 1 == 1 {
            let partial = self.partials.get_by_u64(level)?;
            hash = keccak_concat(&[partial.as_bytes(), hash.as_bytes()]);
            self.partials.set_by_u64(level, Hash::ZERO)?;
            remaining >>= 1;
            level += 1;
        }
        self.partials.set_by_u64(level, hash)
    }

    /// Root over everything accumulated so far. Folds the partials from
    /// the lowest level upward, so the root is deterministic for any
    /// leaf count.
    pub fn root(&self) -> Result<Hash, StorageError> {
        let size = self.size()?;
        if size == 0 {
            return Ok(Hash::ZERO);
        }
        let levels = 64 - size.leading_zeros() as u64;
        let mut acc = Hash::ZERO;
        for level in 0..levels {
            let partial = self.partials.get_by_u64(level)?;
            if !partial.is_zero() {
                acc = keccak_concat(&[partial.as_bytes(), acc.as_bytes()]);
            }
        }
        Ok(acc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sr_01_storage::adapters::memory_db::MemoryDatabase;
    use sr_01_storage::SystemBurner;

    fn accumulator() -> SendAccumulator {
        let sto = Storage::new(MemoryDatabase::shared(), SystemBurner::new(false));
        SendAccumulator::initialize(&sto).unwrap();
        SendAccumulator::open(&sto)
    }

    #[test]
    fn test_append_counts_and_changes_root() {
        let acc = accumulator();
        assert_eq!(acc.size().unwrap(), 0);
        assert_eq!(acc.root().unwrap(), Hash::ZERO);

        let mut roots = Vec::new();
        for i in 0..8u64 {
            acc.append(Hash::from_u64(i + 1)).unwrap();
            roots.push(acc.root().unwrap());
        }
        assert_eq!(acc.size().unwrap(), 8);
        // every append moves the root
        for pair in roots.windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
    }

    #[test]
    fn test_same_leaves_same_root() {
        let a = accumulator();
        let b = accumulator();
        for i in 0..5u64 {
            a.append(Hash::from_u64(i)).unwrap();
            b.append(Hash::from_u64(i)).unwrap();
        }
        assert_eq!(a.root().unwrap(), b.root().unwrap());
    }

    #[test]
    fn test_carry_chain_clears_lower_partials() {
        let acc = accumulator();
        // four appends complete a full subtree of height two
        for i in 0..4u64 {
            acc.append(Hash::from_u64(i + 1)).unwrap();
        }
        assert!(acc.partials.get_by_u64(0).unwrap().is_zero());
        assert!(acc.partials.get_by_u64(1).unwrap().is_zero());
        assert!(!acc.partials.get_by_u64(2).unwrap().is_zero());
    }
}
