//! # Host-Call Bridge
//!
//! The session table that stands between running module code and host
//! state. Module code cannot hold references into the host, so each
//! in-flight invocation is registered under a freshly allocated integer
//! handle in a process-wide concurrent map; every host operation looks the
//! session up by handle.
//!
//! Handles come from a single atomic counter, so they stay unique across
//! concurrent top-level executions (parallel replay, read-only
//! simulations). Within one execution all host calls are strictly
//! sequential; the table alone needs to be concurrency-safe.

use crate::api::{CallStatus, EvmApi, HostError, HostOp};
use dashmap::DashMap;
use lazy_static::lazy_static;
use parking_lot::Mutex;
use shared_types::{Address, Hash, U256};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::error;

type Session = Arc<Mutex<Box<dyn EvmApi>>>;

lazy_static! {
    static ref SESSIONS: DashMap<u64, Session> = DashMap::new();
}

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

/// Opaque handle addressing one in-flight host-call session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ApiHandle(u64);

/// Raised when a handle no longer addresses a live session. This cannot
/// happen in correct operation; the machine degrades it to a failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("no host-call session for handle {0}")]
pub struct SessionMissing(u64);

/// Registers a session and returns its handle.
pub fn register_session(api: Box<dyn EvmApi>) -> ApiHandle {
    let id = NEXT_HANDLE.fetch_add(1, Ordering::Relaxed);
    SESSIONS.insert(id, Arc::new(Mutex::new(api)));
    ApiHandle(id)
}

/// Removes a session. Safe to call more than once.
pub fn drop_session(handle: ApiHandle) {
    SESSIONS.remove(&handle.0);
}

/// Number of live sessions (diagnostics and tests).
#[must_use]
pub fn session_count() -> usize {
    SESSIONS.len()
}

/// Drops its session when it goes out of scope, on every exit path.
pub struct SessionGuard(ApiHandle);

impl SessionGuard {
    /// Registers `api` and guards the resulting session.
    pub fn register(api: Box<dyn EvmApi>) -> Self {
        Self(register_session(api))
    }

    /// The guarded handle.
    #[must_use]
    pub fn handle(&self) -> ApiHandle {
        self.0
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        drop_session(self.0);
    }
}

fn with_session<R>(
    handle: ApiHandle,
    f: impl FnOnce(&mut dyn EvmApi) -> R,
) -> Result<R, SessionMissing> {
    // clone the session out so the map shard is not held across the host
    // call; a nested call may register a new session mid-dispatch
    let session: Option<Session> = SESSIONS.get(&handle.0).map(|entry| entry.value().clone());
    match session {
        Some(session) => {
            let mut api = session.lock();
            Ok(f(api.as_mut()))
        }
        None => {
            error!(handle = handle.0, "host call against dead session");
            Err(SessionMissing(handle.0))
        }
    }
}

// =============================================================================
// DISPATCH TABLE
// =============================================================================
// One wrapper per host operation. These are the only entry points module
// code reaches host state through.

/// Storage read.
pub fn get_bytes32(handle: ApiHandle, key: Hash) -> Result<(Hash, u64), SessionMissing> {
    with_session(handle, |api| api.get_bytes32(key))
}

/// Storage write.
pub fn set_bytes32(
    handle: ApiHandle,
    key: Hash,
    value: Hash,
) -> Result<Result<u64, HostError>, SessionMissing> {
    with_session(handle, |api| api.set_bytes32(key, value))
}

/// Plain contract call.
pub fn contract_call(
    handle: ApiHandle,
    contract: Address,
    calldata: Vec<u8>,
    gas: u64,
    value: U256,
) -> Result<(u32, u64, CallStatus), SessionMissing> {
    with_session(handle, |api| api.contract_call(contract, calldata, gas, value))
}

/// Delegate call.
pub fn delegate_call(
    handle: ApiHandle,
    contract: Address,
    calldata: Vec<u8>,
    gas: u64,
) -> Result<(u32, u64, CallStatus), SessionMissing> {
    with_session(handle, |api| api.delegate_call(contract, calldata, gas))
}

/// Static call.
pub fn static_call(
    handle: ApiHandle,
    contract: Address,
    calldata: Vec<u8>,
    gas: u64,
) -> Result<(u32, u64, CallStatus), SessionMissing> {
    with_session(handle, |api| api.static_call(contract, calldata, gas))
}

/// Contract creation.
pub fn create1(
    handle: ApiHandle,
    code: Vec<u8>,
    endowment: U256,
    gas: u64,
) -> Result<(Option<Address>, u32, u64), SessionMissing> {
    with_session(handle, |api| api.create1(code, endowment, gas))
}

/// Salted contract creation.
pub fn create2(
    handle: ApiHandle,
    code: Vec<u8>,
    endowment: U256,
    salt: Hash,
    gas: u64,
) -> Result<(Option<Address>, u32, u64), SessionMissing> {
    with_session(handle, |api| api.create2(code, endowment, salt, gas))
}

/// Return-data slice.
pub fn get_return_data(
    handle: ApiHandle,
    offset: u32,
    size: u32,
) -> Result<Vec<u8>, SessionMissing> {
    with_session(handle, |api| api.get_return_data(offset, size))
}

/// Return-data length.
pub fn return_data_len(handle: ApiHandle) -> Result<u32, SessionMissing> {
    with_session(handle, |api| api.return_data_len())
}

/// Log emission.
pub fn emit_log(
    handle: ApiHandle,
    data: Vec<u8>,
    topics: u32,
) -> Result<Result<(), HostError>, SessionMissing> {
    with_session(handle, |api| api.emit_log(data, topics))
}

/// Account balance.
pub fn account_balance(handle: ApiHandle, address: Address) -> Result<(Hash, u64), SessionMissing> {
    with_session(handle, |api| api.account_balance(address))
}

/// Account code hash.
pub fn account_codehash(handle: ApiHandle, address: Address) -> Result<(Hash, u64), SessionMissing> {
    with_session(handle, |api| api.account_codehash(address))
}

/// Linear-memory growth pricing.
pub fn add_pages(handle: ApiHandle, pages: u16) -> Result<u64, SessionMissing> {
    with_session(handle, |api| api.add_pages(pages))
}

/// Host-call reporting (tracing only).
pub fn report_hostio(
    handle: ApiHandle,
    op: HostOp,
    gas: u64,
    cost: u64,
) -> Result<(), SessionMissing> {
    with_session(handle, |api| api.report_hostio(op, gas, cost))
}

// =============================================================================
// TESTS
// =============================================================================
