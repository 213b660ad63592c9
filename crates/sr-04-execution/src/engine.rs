//! # Engine Entry Points
//!
//! `compile` turns raw module bytecode into a stored artifact; `call`
//! runs a stored artifact against a host-call session. Both take flat
//! parameter blocks and communicate results by value, so callers never
//! lend the engine live references into host state.

use crate::bridge::ApiHandle;
use crate::cache;
use crate::context::{CompileParams, EvmData, VmParams};
use crate::errors::CompileError;
use crate::status::ExecutionStatus;
use crate::vm::machine::Machine;
use crate::vm::module::CompiledModule;
use shared_types::Hash;
use tracing::error;

/// Facts about a compiled module the registry records next to its version.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModuleInfo {
    /// Declared linear-memory footprint in pages.
    pub footprint: u16,
}

/// Compiles raw module bytecode into a serialized artifact.
pub fn compile(
    module_bytes: &[u8],
    params: &CompileParams,
) -> Result<(Vec<u8>, ModuleInfo), CompileError> {
    let module = CompiledModule::compile(module_bytes, params)?;
    let info = ModuleInfo {
        footprint: module.footprint,
    };
    let artifact =
        bincode::serialize(&module).map_err(|err| CompileError::Encode(err.to_string()))?;
    Ok((artifact, info))
}

/// Runs a compiled artifact.
///
/// `gas` is the caller's remaining gas; it is decremented in place and
/// zeroed on any status that consumes the whole budget. The returned
/// buffer carries the payload on `Success` and `Revert` and is empty
/// otherwise. This function never panics on malformed input: a corrupt or
/// version-skewed artifact degrades to `Failure`.
pub fn call(
    code_hash: Hash,
    artifact: &[u8],
    calldata: &[u8],
    params: &VmParams,
    evm: &EvmData,
    handle: ApiHandle,
    gas: &mut u64,
) -> (ExecutionStatus, Vec<u8>) {
    let module = match cache::load(params.version, code_hash, artifact) {
        Ok(module) => module,
        Err(err) => {
            error!(%err, %code_hash, "compiled artifact failed to load");
            *gas = 0;
            return (ExecutionStatus::Failure, Vec::new());
        }
    };
    if module.engine_version != params.version {
        error!(
            artifact = module.engine_version,
            live = params.version,
            "artifact version does not match live engine version"
        );
        *gas = 0;
        return (ExecutionStatus::Failure, Vec::new());
    }

    let mut machine = Machine::new(&module, params, evm, handle, *gas, calldata);
    let (status, output) = machine.run();
    *gas = if status.consumes_all_gas() {
        0
    } else {
        machine.gas_left()
    };
    (status, output)
}

// =============================================================================
// TESTS
// =============================================================================
