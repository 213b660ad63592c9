//! # Execution Context Blocks
//!
//! The flat parameter blocks handed to the engine for every invocation:
//! pricing parameters and the EVM block/transaction context. Both are
//! plain data so they can cross the engine boundary without borrowing
//! host state.

use shared_types::{Address, Hash, U256};

/// Basis points denominator for the ink price.
pub const BIPS: u64 = 10_000;

/// Pricing and limit parameters for one invocation.
#[derive(Clone, Copy, Debug)]
pub struct VmParams {
    /// Engine version the artifact was compiled for.
    pub version: u32,
    /// Maximum module call-frame depth.
    pub max_call_depth: u32,
    /// Ink per gas, in basis points (10 000 = 1 ink per gas).
    pub ink_price_bips: u64,
    /// Flat ink surcharge per host operation.
    pub hostio_ink_cost: u64,
    /// True on debug-mode chains (enables instrumented opcodes).
    pub debug: bool,
}

impl VmParams {
    /// Converts a gas amount into ink, rounding down.
    #[must_use]
    pub fn gas_to_ink(&self, gas: u64) -> u64 {
        gas.saturating_mul(self.ink_price_bips) / BIPS
    }

    /// Converts an ink amount back into gas, rounding down so a module
    /// can never mint gas through conversion slack.
    #[must_use]
    pub fn ink_to_gas(&self, ink: u64) -> u64 {
        ink.saturating_mul(BIPS) / self.ink_price_bips.max(1)
    }
}

/// Compilation parameters.
#[derive(Clone, Copy, Debug)]
pub struct CompileParams {
    /// Engine version to compile for.
    pub version: u32,
    /// Maximum linear-memory footprint a module may declare.
    pub page_limit: u16,
    /// True on debug-mode chains (permits instrumented opcodes).
    pub debug: bool,
}

/// EVM block and transaction context visible to a running module.
#[derive(Clone, Debug, Default)]
pub struct EvmData {
    /// Base fee of the current block.
    pub block_base_fee: U256,
    /// Chain id.
    pub chain_id: U256,
    /// Coinbase of the current block.
    pub block_coinbase: Address,
    /// Gas limit of the current block.
    pub block_gas_limit: u64,
    /// Number of the current block.
    pub block_number: u64,
    /// Timestamp of the current block.
    pub block_timestamp: u64,
    /// Randomness seed of the current block.
    pub prev_randao: Hash,
    /// The acting (storage-owning) contract address.
    pub contract_address: Address,
    /// Immediate caller of the acting contract.
    pub msg_sender: Address,
    /// Value carried by the current call.
    pub msg_value: U256,
    /// Gas price of the enclosing transaction.
    pub tx_gas_price: U256,
    /// Origin of the enclosing transaction.
    pub tx_origin: Address,
    /// True when detailed host-call tracing is enabled.
    pub tracing: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(bips: u64) -> VmParams {
        VmParams {
            version: 1,
            max_call_depth: 1024,
            ink_price_bips: bips,
            hostio_ink_cost: 100,
            debug: false,
        }
    }

    #[test]
    fn test_unit_price_is_identity() {
        let p = params(BIPS);
        assert_eq!(p.gas_to_ink(12_345), 12_345);
        assert_eq!(p.ink_to_gas(12_345), 12_345);
    }

    #[test]
    fn test_conversion_never_mints_gas() {
        for bips in [1, 7, 100, 9_999, 10_000, 30_000] {
            let p = params(bips);
            for gas in [0u64, 1, 63, 1_000, 1_000_000] {
                assert!(p.ink_to_gas(p.gas_to_ink(gas)) <= gas);
            }
        }
    }

    #[test]
    fn test_cheaper_ink_scales_down() {
        // 5 000 bips: two gas buy one ink
        let p = params(5_000);
        assert_eq!(p.gas_to_ink(100), 50);
        assert_eq!(p.ink_to_gas(50), 100);
    }
}
