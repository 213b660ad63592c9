//! # Hashing
//!
//! Keccak-256 helpers shared by the storage layer and the host bridge.

use crate::types::Hash;
use sha3::{Digest, Keccak256};

/// Keccak-256 of a single byte slice.
#[must_use]
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let digest = hasher.finalize();
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&digest);
    Hash(bytes)
}

/// Keccak-256 over the concatenation of several slices, without allocating
/// the concatenation.
#[must_use]
pub fn keccak_concat(parts: &[&[u8]]) -> Hash {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    let digest = hasher.finalize();
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&digest);
    Hash(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keccak_empty() {
        // keccak256("") is a well-known constant
        let expected = "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470";
        assert_eq!(hex::encode(keccak256(&[]).as_bytes()), expected);
    }

    #[test]
    fn test_keccak_concat_matches_flat() {
        let flat = keccak256(b"hello world");
        let split = keccak_concat(&[b"hello", b" ", b"world"]);
        assert_eq!(flat, split);
    }
}
