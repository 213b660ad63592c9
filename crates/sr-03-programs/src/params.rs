//! # Engine Parameters
//!
//! Global execution-pricing settings, stored as one fixed-width record in
//! a single storage slot. Every getter and setter is a whole-record
//! read-modify-write; a block executes single-threaded, so no field-level
//! concurrency is needed.

use shared_types::Hash;

/// Default ink per gas in basis points (1 gas buys 1 ink).
pub const DEFAULT_INK_PRICE_BIPS: u64 = 10_000;

/// Default module call-frame depth limit.
pub const DEFAULT_MAX_CALL_DEPTH: u32 = 1024;

/// Default flat ink surcharge per host operation.
pub const DEFAULT_HOSTIO_INK_COST: u64 = 8400;

/// Global execution-pricing settings.
///
/// Packed big-endian into one 32-byte slot:
///
/// ```text
/// [0..4]   engine version, u32
/// [4..12]  ink price, bips, u64
/// [12..16] max call depth, u32
/// [16..24] hostio ink cost, u64
/// [24..32] reserved, zero
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineParams {
    /// Compiled-code generation number. Distinct from the chain protocol
    /// version; bumping it forces every program to recompile.
    pub version: u32,
    /// Ink per gas, in basis points.
    pub ink_price_bips: u64,
    /// Maximum module call-frame depth.
    pub max_call_depth: u32,
    /// Flat ink surcharge per host operation.
    pub hostio_ink_cost: u64,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            version: 1,
            ink_price_bips: DEFAULT_INK_PRICE_BIPS,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            hostio_ink_cost: DEFAULT_HOSTIO_INK_COST,
        }
    }
}

impl EngineParams {
    /// Packs the record into its storage slot form.
    #[must_use]
    pub fn pack(&self) -> Hash {
        let mut bytes = [0u8; 32];
        bytes[0..4].copy_from_slice(&self.version.to_be_bytes());
        bytes[4..12].copy_from_slice(&self.ink_price_bips.to_be_bytes());
        bytes[12..16].copy_from_slice(&self.max_call_depth.to_be_bytes());
        bytes[16..24].copy_from_slice(&self.hostio_ink_cost.to_be_bytes());
        Hash(bytes)
    }

    /// Unpacks a record from its storage slot form.
    #[must_use]
    pub fn unpack(slot: Hash) -> Self {
        let bytes = slot.as_bytes();
        let mut u32buf = [0u8; 4];
        let mut u64buf = [0u8; 8];
        u32buf.copy_from_slice(&bytes[0..4]);
        let version = u32::from_be_bytes(u32buf);
        u64buf.copy_from_slice(&bytes[4..12]);
        let ink_price_bips = u64::from_be_bytes(u64buf);
        u32buf.copy_from_slice(&bytes[12..16]);
        let max_call_depth = u32::from_be_bytes(u32buf);
        u64buf.copy_from_slice(&bytes[16..24]);
        let hostio_ink_cost = u64::from_be_bytes(u64buf);
        Self {
            version,
            ink_price_bips,
            max_call_depth,
            hostio_ink_cost,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_roundtrip() {
        let params = EngineParams {
            version: 7,
            ink_price_bips: 123_456,
            max_call_depth: 512,
            hostio_ink_cost: 999,
        };
        assert_eq!(EngineParams::unpack(params.pack()), params);
    }

    #[test]
    fn test_defaults() {
        let params = EngineParams::default();
        assert_eq!(params.version, 1);
        assert_eq!(params.ink_price_bips, DEFAULT_INK_PRICE_BIPS);
    }

    #[test]
    fn test_reserved_bytes_stay_zero() {
        let packed = EngineParams::default().pack();
        assert_eq!(&packed.as_bytes()[24..], &[0u8; 8]);
    }
}
