//! # Host Operation Port
//!
//! The interface a running module reaches through the bridge. Each method
//! reproduces one Ethereum EVM behavior exactly; the concrete
//! implementation lives with the program registry, next to the EVM it
//! bridges into.
//!
//! Costs are returned in gas (the machine converts to ink when charging);
//! a method that can fail returns a typed [`HostError`], which the machine
//! surfaces as a revert carrying the error text.

use shared_types::{Address, Hash, U256};
use thiserror::Error;

/// Errors a host operation can raise against the running module.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HostError {
    /// A state-mutating operation was attempted in a read-only context.
    #[error("write operation in static context")]
    WriteProtection,

    /// The log buffer is shorter than its declared topics require.
    #[error("emit log data too small: {have} bytes for {topics} topics")]
    LogDataTooShort {
        /// Bytes provided.
        have: usize,
        /// Topics declared.
        topics: u32,
    },

    /// The storage layer failed beneath the host operation.
    #[error("storage failure: {0}")]
    Storage(String),
}

/// Outcome of a nested call as observed by the calling module.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum CallStatus {
    /// The callee returned normally.
    Success = 0,
    /// The callee reverted; return data carries the reason.
    Revert = 1,
    /// The callee failed without return data.
    Failure = 2,
}

/// Opcode-equivalents recorded by the host-call reporting channel.
///
/// Discriminants match the corresponding EVM opcode where one exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum HostOp {
    Keccak = 0x20,
    Balance = 0x31,
    CodeHash = 0x3F,
    ReturnDataCopy = 0x3E,
    StorageLoad = 0x54,
    StorageStore = 0x55,
    Log = 0xA0,
    Create1 = 0xF0,
    Call = 0xF1,
    DelegateCall = 0xF4,
    Create2 = 0xF5,
    StaticCall = 0xFA,
    /// Linear memory growth; no EVM equivalent.
    AddPages = 0xFF,
}

/// Host operations available to a running module.
///
/// One boxed instance backs exactly one in-flight invocation; it is
/// registered in the bridge's session table before the machine starts and
/// dropped when the invocation returns.
pub trait EvmApi: Send {
    /// Reads the 32-byte value at `key` in the acting contract's storage.
    /// Returns the value and the warm/cold access cost in gas.
    fn get_bytes32(&mut self, key: Hash) -> (Hash, u64);

    /// Stores `value` at `key` in the acting contract's storage.
    /// Returns the access cost in gas, or `WriteProtection` in a static
    /// context.
    fn set_bytes32(&mut self, key: Hash, value: Hash) -> Result<u64, HostError>;

    /// Calls the contract at `contract`, forwarding at most `gas`.
    /// Returns the return data length, the gas cost, and the call status.
    fn contract_call(
        &mut self,
        contract: Address,
        calldata: Vec<u8>,
        gas: u64,
        value: U256,
    ) -> (u32, u64, CallStatus);

    /// Delegate-calls the contract at `contract`.
    fn delegate_call(&mut self, contract: Address, calldata: Vec<u8>, gas: u64)
        -> (u32, u64, CallStatus);

    /// Static-calls the contract at `contract`.
    fn static_call(&mut self, contract: Address, calldata: Vec<u8>, gas: u64)
        -> (u32, u64, CallStatus);

    /// Deploys a contract from `code`. Returns the new address (`None` on
    /// failure), the return data length, and the gas cost.
    fn create1(&mut self, code: Vec<u8>, endowment: U256, gas: u64) -> (Option<Address>, u32, u64);

    /// Deploys a contract from `code` at a salt-determined address.
    fn create2(
        &mut self,
        code: Vec<u8>,
        endowment: U256,
        salt: Hash,
        gas: u64,
    ) -> (Option<Address>, u32, u64);

    /// Slice of the most recently captured return data. Out-of-range
    /// requests yield an empty or truncated result, never an error.
    fn get_return_data(&mut self, offset: u32, size: u32) -> Vec<u8>;

    /// Length of the most recently captured return data.
    fn return_data_len(&self) -> u32;

    /// Emits a log: `topics` 32-byte hashes at the front of `data`, the
    /// rest is the payload.
    fn emit_log(&mut self, data: Vec<u8>, topics: u32) -> Result<(), HostError>;

    /// Balance of `address` and the account touch cost in gas.
    fn account_balance(&mut self, address: Address) -> (Hash, u64);

    /// Code hash of `address` (zero for empty accounts) and the account
    /// touch cost in gas.
    fn account_codehash(&mut self, address: Address) -> (Hash, u64);

    /// Prices growth of the module's linear memory by `pages`, updating
    /// the transaction's open/ever page counters.
    fn add_pages(&mut self, pages: u16) -> u64;

    /// Reporting channel for offline replay. Must be a no-op (and must not
    /// affect metering) when tracing is disabled.
    fn report_hostio(&mut self, op: HostOp, gas: u64, cost: u64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_error_display() {
        assert_eq!(
            HostError::WriteProtection.to_string(),
            "write operation in static context"
        );
        let err = HostError::LogDataTooShort { have: 10, topics: 2 };
        assert!(err.to_string().contains("10"));
        assert!(err.to_string().contains('2'));
    }

    #[test]
    fn test_host_op_discriminants_match_evm() {
        assert_eq!(HostOp::StorageLoad as u8, 0x54);
        assert_eq!(HostOp::Call as u8, 0xF1);
        assert_eq!(HostOp::Create2 as u8, 0xF5);
    }
}
