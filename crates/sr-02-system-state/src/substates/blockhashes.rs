//! # Block-Hash Ring
//!
//! The last 256 parent-chain block hashes, stored in a fixed ring. Gaps
//! between recorded blocks are filled with synthetic hashes so the window
//! is always fully populated and deterministic across nodes.

use shared_types::{keccak_concat, Hash};
use sr_01_storage::{Storage, StorageError};

/// Number of hashes retained.
pub const RING_SIZE: u64 = 256;

const NEXT_BLOCK_NUMBER_OFFSET: u64 = 0;
const HASHES_SUBSPACE: &[u8] = &[1];

/// The block-hash ring sub-state.
pub struct Blockhashes {
    backing: Storage,
    hashes: Storage,
}

impl Blockhashes {
    /// Writes the initial layout.
    pub fn initialize(sto: &Storage) -> Result<(), StorageError> {
        sto.set_u64_by_u64(NEXT_BLOCK_NUMBER_OFFSET, 0)
    }

    /// Opens the sub-state against its subspace.
    #[must_use]
    pub fn open(sto: &Storage) -> Self {
        Self {
            backing: sto.clone(),
            hashes: sto.open_sub_storage(HASHES_SUBSPACE),
        }
    }

    /// The next parent-chain block number expected.
    pub fn next_block_number(&self) -> Result<u64, StorageError> {
        self.backing.get_u64_by_u64(NEXT_BLOCK_NUMBER_OFFSET)
    }

    /// Hash of `number`, when inside the retained window.
    pub fn block_hash(&self, number: u64) -> Result<Option<Hash>, StorageError> {
        let next = self.next_block_number()?;
        if number >= next || number + RING_SIZE < next {
            return Ok(None);
        }
        Ok(Some(self.hashes.get_by_u64(number % RING_SIZE)?))
    }

    /// Records the hash of a newly observed parent-chain block, filling
    /// any gap with synthetic hashes. Recording an old block is a no-op.
    pub fn record_new_block(&self, number: u64, hash: Hash) -> Result<(), StorageError> {
        let next = self.next_block_number()?;
        if number < next {
            return Ok(());
        }
        let gap_start = number.saturating_sub(RING_SIZE - 1).max(next);
        for missing in gap_start..number {
            let synthetic =
                keccak_concat(&[b"synthetic block hash", &missing.to_be_bytes()]);
            self.hashes.set_by_u64(missing % RING_SIZE, synthetic)?;
        }
        self.hashes.set_by_u64(number % RING_SIZE, hash)?;
        self.backing.set_u64_by_u64(NEXT_BLOCK_NUMBER_OFFSET, number + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sr_01_storage::adapters::memory_db::MemoryDatabase;
    use sr_01_storage::SystemBurner;

    fn ring() -> Blockhashes {
        let sto = Storage::new(MemoryDatabase::shared(), SystemBurner::new(false));
        Blockhashes::initialize(&sto).unwrap();
        Blockhashes::open(&sto)
    }

    #[test]
    fn test_record_and_window() {
        let ring = ring();
        ring.record_new_block(10, Hash::from_u64(0xA)).unwrap();
        assert_eq!(ring.next_block_number().unwrap(), 11);
        assert_eq!(ring.block_hash(10).unwrap(), Some(Hash::from_u64(0xA)));
        // the future is not available
        assert_eq!(ring.block_hash(11).unwrap(), None);
    }

    #[test]
    fn test_gap_filling_is_deterministic() {
        let a = ring();
        let b = ring();
        a.record_new_block(5, Hash::from_u64(1)).unwrap();
        a.record_new_block(9, Hash::from_u64(2)).unwrap();
        b.record_new_block(5, Hash::from_u64(1)).unwrap();
        b.record_new_block(9, Hash::from_u64(2)).unwrap();
        for number in 5..=9 {
            assert_eq!(a.block_hash(number).unwrap(), b.block_hash(number).unwrap());
            assert!(a.block_hash(number).unwrap().is_some());
        }
    }

    #[test]
    fn test_old_blocks_fall_out_of_the_window() {
        let ring = ring();
        ring.record_new_block(0, Hash::from_u64(1)).unwrap();
        ring.record_new_block(300, Hash::from_u64(2)).unwrap();
        assert_eq!(ring.block_hash(0).unwrap(), None);
        assert_eq!(ring.block_hash(300).unwrap(), Some(Hash::from_u64(2)));
        assert!(ring.block_hash(44).unwrap().is_none());
        assert!(ring.block_hash(45).unwrap().is_some());
        assert!(ring.block_hash(299).unwrap().is_some());
    }

    #[test]
    fn test_recording_the_past_is_a_noop() {
        let ring = ring();
        ring.record_new_block(10, Hash::from_u64(1)).unwrap();
        ring.record_new_block(5, Hash::from_u64(9)).unwrap();
        assert_eq!(ring.next_block_number().unwrap(), 11);
        assert_eq!(ring.block_hash(10).unwrap(), Some(Hash::from_u64(1)));
    }
}
