//! # Ports
//!
//! Outbound interfaces the host bridge depends on: the surrounding EVM
//! (for nested calls and creations) and the optional execution tracer.

use shared_types::{Address, Bytes, Hash, U256};
use sr_04_execution::HostOp;

/// The kind of nested call a program requested.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallKind {
    /// Plain call; may carry value.
    Call,
    /// Delegate call; runs the callee's code in the caller's context.
    DelegateCall,
    /// Static call; the callee runs read-only.
    StaticCall,
}

/// How a nested call or creation concluded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallResult {
    /// Completed normally.
    Success,
    /// Reverted; output carries the revert reason.
    Revert,
    /// Failed without usable output (trap, out of gas, depth).
    Failure,
}

/// Result of a nested call.
#[derive(Clone, Debug)]
pub struct CallOutcome {
    /// Return data from the callee.
    pub output: Bytes,
    /// Gas the callee handed back.
    pub gas_left: u64,
    /// How the callee concluded.
    pub result: CallResult,
}

/// Result of a contract creation.
#[derive(Clone, Debug)]
pub struct CreateOutcome {
    /// Deployed address, when creation succeeded.
    pub address: Option<Address>,
    /// Return data (meaningful only for reverts).
    pub output: Bytes,
    /// Gas handed back.
    pub gas_left: u64,
    /// How the creation concluded.
    pub result: CallResult,
}

/// The surrounding EVM, as consumed by the host bridge. The node's
/// interpreter implements this; nested calls routed through it may
/// themselves re-enter the program engine.
pub trait CallRouter: Send + Sync {
    /// Executes a nested call with the gas already reduced by the base
    /// cost and the 63/64ths retention.
    fn call(
        &self,
        kind: CallKind,
        caller: Address,
        target: Address,
        input: &[u8],
        gas: u64,
        value: U256,
    ) -> CallOutcome;

    /// Executes a contract creation. `salt` selects salted creation.
    fn create(
        &self,
        caller: Address,
        code: &[u8],
        value: U256,
        salt: Option<Hash>,
        gas: u64,
    ) -> CreateOutcome;
}

/// Sink for the host-call reporting channel, used for offline replay and
/// debugging. Only consulted when tracing is enabled for the transaction.
pub trait HostioTracer: Send + Sync {
    /// Records one host call: its opcode-equivalent, the gas remaining
    /// after it, and the gas it charged.
    fn record(&self, op: HostOp, gas: u64, cost: u64);
}
