//! # Host Bridge Implementation
//!
//! The concrete [`EvmApi`] behind a program invocation: every host
//! operation a module issues lands here and is translated into the exact
//! Ethereum-equivalent behavior, including warm/cold pricing, the
//! 63/64ths gas retention on nested calls, the value-transfer stipend,
//! and write protection under static context.

use crate::ports::{CallKind, CallResult, CallRouter, HostioTracer};
use crate::pricing::{
    self,
    costs::{CALL_STIPEND, CREATE, KECCAK256_WORD},
    AccessSets,
};
use parking_lot::Mutex;
use shared_types::{math::words_for_bytes, Address, Hash, U256};
use sr_01_storage::{LogEntry, StateDb};
use sr_04_execution::{CallStatus, EvmApi, HostError, HostOp, MemoryModel};
use std::sync::Arc;

// =============================================================================
// TRANSACTION CONTEXT
// =============================================================================

/// Memory page counters for one transaction.
#[derive(Clone, Copy, Debug, Default)]
pub struct PageCounters {
    /// Pages currently open across all active program frames.
    pub open: u16,
    /// High-water mark of pages allocated in this transaction.
    pub ever: u16,
}

/// State shared by every host-call session of one transaction: the
/// warm/cold access sets and the memory page counters. Nested program
/// frames each get their own session but share this context.
#[derive(Default)]
pub struct TxContext {
    access: Mutex<AccessSets>,
    pages: Mutex<PageCounters>,
}

impl TxContext {
    /// Creates a fresh per-transaction context.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Runs `f` against the transaction's access sets.
    pub fn with_access<R>(&self, f: impl FnOnce(&mut AccessSets) -> R) -> R {
        f(&mut self.access.lock())
    }

    /// Current page counters.
    #[must_use]
    pub fn page_counters(&self) -> PageCounters {
        *self.pages.lock()
    }

    /// Opens `pages` more pages, returning the counters before the update.
    pub fn open_pages(&self, pages: u16) -> PageCounters {
        let mut counters = self.pages.lock();
        let prior = *counters;
        counters.open = counters.open.saturating_add(pages);
        counters.ever = counters.ever.max(counters.open);
        prior
    }

    /// Restores the open-page count when a program frame returns. The
    /// high-water mark persists for the rest of the transaction.
    pub fn restore_open_pages(&self, open: u16) {
        self.pages.lock().open = open;
    }
}

// =============================================================================
// API IMPLEMENTATION
// =============================================================================

/// Host-side state for one program invocation.
pub struct EvmApiImpl {
    db: StateDb,
    tx: Arc<TxContext>,
    router: Arc<dyn CallRouter>,
    tracer: Option<Arc<dyn HostioTracer>>,
    model: MemoryModel,
    acting_address: Address,
    read_only: bool,
    block_number: u64,
    return_data: Vec<u8>,
}

impl EvmApiImpl {
    /// Builds the session state for a call into `acting_address`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        db: StateDb,
        tx: Arc<TxContext>,
        router: Arc<dyn CallRouter>,
        tracer: Option<Arc<dyn HostioTracer>>,
        model: MemoryModel,
        acting_address: Address,
        read_only: bool,
        block_number: u64,
    ) -> Self {
        Self {
            db,
            tx,
            router,
            tracer,
            model,
            acting_address,
            read_only,
            block_number,
            return_data: Vec::new(),
        }
    }

    /// The unified nested-call primitive. The implementation matches the
    /// EVM's call family: base access cost first, then the 63/64ths
    /// retention, then the stipend for value transfers. The retained
    /// sixty-fourth flows back to the caller through the cost formula
    /// `cost = start_gas - (gas_left + one64th)`.
    fn do_call(
        &mut self,
        kind: CallKind,
        contract: Address,
        input: Vec<u8>,
        mut gas: u64,
        value: U256,
    ) -> (u32, u64, CallStatus) {
        let transfers_value = kind == CallKind::Call;

        // read-only calls are not payable; fail before any gas is spent
        if self.read_only && transfers_value && !value.is_zero() {
            self.return_data.clear();
            return (0, 0, CallStatus::Failure);
        }

        let start_gas = gas;
        let base_cost = self.tx.with_access(|access| {
            pricing::call_access_cost(&*self.db, access, contract, value, transfers_value)
        });
        if gas < base_cost {
            self.return_data.clear();
            return (0, gas, CallStatus::Failure);
        }
        gas -= base_cost;

        // the 63/64ths rule
        let one64th = gas / 64;
        gas -= one64th;

        // value transfers grant the callee a stipend
        if transfers_value && !value.is_zero() {
            gas = gas.saturating_add(CALL_STIPEND);
        }

        let outcome = self
            .router
            .call(kind, self.acting_address, contract, &input, gas, value);
        self.return_data = outcome.output;

        // the caller gets the retained sixty-fourth back
        let cost = start_gas.saturating_sub(outcome.gas_left.saturating_add(one64th));
        let status = match outcome.result {
            CallResult::Success => CallStatus::Success,
            CallResult::Revert => CallStatus::Revert,
            CallResult::Failure => CallStatus::Failure,
        };
        (self.return_data.len() as u32, cost, status)
    }

    fn do_create(
        &mut self,
        code: Vec<u8>,
        endowment: U256,
        salt: Option<Hash>,
        mut gas: u64,
    ) -> (Option<Address>, u32, u64) {
        if self.read_only {
            self.return_data.clear();
            return (None, 0, 0);
        }

        let start_gas = gas;
        let mut base_cost = CREATE;
        if salt.is_some() {
            base_cost =
                base_cost.saturating_add(KECCAK256_WORD * words_for_bytes(code.len() as u64));
        }
        if gas < base_cost {
            self.return_data.clear();
            return (None, 0, gas);
        }
        gas -= base_cost;

        let one64th = gas / 64;
        gas -= one64th;

        let outcome = self
            .router
            .create(self.acting_address, &code, endowment, salt, gas);
        let address = match outcome.result {
            CallResult::Success => outcome.address,
            _ => None,
        };
        // return data is only preserved for the revert case
        self.return_data = match outcome.result {
            CallResult::Revert => outcome.output,
            _ => Vec::new(),
        };
        let cost = start_gas.saturating_sub(outcome.gas_left.saturating_add(one64th));
        (address, self.return_data.len() as u32, cost)
    }
}

impl EvmApi for EvmApiImpl {
    fn get_bytes32(&mut self, key: Hash) -> (Hash, u64) {
        let cost = self
            .tx
            .with_access(|access| pricing::storage_load_cost(access, self.acting_address, key));
        (self.db.get_state(self.acting_address, key), cost)
    }

    fn set_bytes32(&mut self, key: Hash, value: Hash) -> Result<u64, HostError> {
        if self.read_only {
            return Err(HostError::WriteProtection);
        }
        let cost = self.tx.with_access(|access| {
            pricing::storage_store_cost(&*self.db, access, self.acting_address, key, value)
        });
        self.db.set_state(self.acting_address, key, value);
        Ok(cost)
    }

    fn contract_call(
        &mut self,
        contract: Address,
        calldata: Vec<u8>,
        gas: u64,
        value: U256,
    ) -> (u32, u64, CallStatus) {
        self.do_call(CallKind::Call, contract, calldata, gas, value)
    }

    fn delegate_call(
        &mut self,
        contract: Address,
        calldata: Vec<u8>,
        gas: u64,
    ) -> (u32, u64, CallStatus) {
        self.do_call(CallKind::DelegateCall, contract, calldata, gas, U256::zero())
    }

    fn static_call(
        &mut self,
        contract: Address,
        calldata: Vec<u8>,
        gas: u64,
    ) -> (u32, u64, CallStatus) {
        self.do_call(CallKind::StaticCall, contract, calldata, gas, U256::zero())
    }

    fn create1(&mut self, code: Vec<u8>, endowment: U256, gas: u64) -> (Option<Address>, u32, u64) {
        self.do_create(code, endowment, None, gas)
    }

    fn create2(
        &mut self,
        code: Vec<u8>,
        endowment: U256,
        salt: Hash,
        gas: u64,
    ) -> (Option<Address>, u32, u64) {
        self.do_create(code, endowment, Some(salt), gas)
    }

    fn get_return_data(&mut self, offset: u32, size: u32) -> Vec<u8> {
        let start = (offset as usize).min(self.return_data.len());
        let end = start.saturating_add(size as usize).min(self.return_data.len());
        self.return_data[start..end].to_vec()
    }

    fn return_data_len(&self) -> u32 {
        self.return_data.len() as u32
    }

    fn emit_log(&mut self, data: Vec<u8>, topics: u32) -> Result<(), HostError> {
        if self.read_only {
            return Err(HostError::WriteProtection);
        }
        let topics_len = 32usize * topics as usize;
        if data.len() < topics_len {
            return Err(HostError::LogDataTooShort {
                have: data.len(),
                topics,
            });
        }
        let hashes = data[..topics_len]
            .chunks(32)
            .filter_map(Hash::from_slice)
            .collect();
        self.db.add_log(LogEntry {
            address: self.acting_address,
            topics: hashes,
            data: data[topics_len..].to_vec(),
            block_number: self.block_number,
        });
        Ok(())
    }

    fn account_balance(&mut self, address: Address) -> (Hash, u64) {
        let cost = self
            .tx
            .with_access(|access| pricing::account_touch_cost(access, address));
        (Hash::from_u256(self.db.get_balance(address)), cost)
    }

    fn account_codehash(&mut self, address: Address) -> (Hash, u64) {
        let cost = self
            .tx
            .with_access(|access| pricing::account_touch_cost(access, address));
        // empty accounts read as the zero hash
        let hash = if self.db.is_empty(address) {
            Hash::ZERO
        } else {
            self.db.code_hash(address)
        };
        (hash, cost)
    }

    fn add_pages(&mut self, pages: u16) -> u64 {
        let prior = self.tx.open_pages(pages);
        self.model.gas_cost(pages, prior.open, prior.ever)
    }

    fn report_hostio(&mut self, op: HostOp, gas: u64, cost: u64) {
        if let Some(tracer) = &self.tracer {
            tracer.record(op, gas, cost);
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
