//! # Program Registry
//!
//! Per-program compiled-version bookkeeping and the compile/call entry
//! points. The registry lives in its own subspace of the system state and
//! holds the global [`EngineParams`] record plus one record per program
//! address: the engine version it was last compiled at and its declared
//! memory footprint.

use crate::api_impl::{EvmApiImpl, TxContext};
use crate::codec;
use crate::errors::ProgramError;
use crate::params::EngineParams;
use crate::ports::{CallRouter, HostioTracer};
use shared_types::{Address, Bytes, Hash};
use sr_01_storage::{StateDb, Storage, StorageError};
use sr_04_execution::{
    bridge::SessionGuard, memory::PAGE_LIMIT, CompileParams, EvmData, ExecutionStatus,
    MemoryModel, VmParams,
};
use std::sync::Arc;
use tracing::{error, info};

/// Slot holding the packed [`EngineParams`] record.
const PARAMS_OFFSET: u64 = 0;

/// Everything a program invocation needs from its surroundings: the state
/// database, the surrounding EVM, the per-transaction context, the block
/// context template, and the caller's mutable gas counter.
pub struct ExecutionScope<'a> {
    /// State database handle.
    pub db: StateDb,
    /// The surrounding EVM for nested calls.
    pub router: Arc<dyn CallRouter>,
    /// Shared per-transaction access sets and page counters.
    pub tx: Arc<TxContext>,
    /// Block and transaction context; per-call fields are filled in by
    /// `call_program`.
    pub evm_data: EvmData,
    /// True under static-call context.
    pub read_only: bool,
    /// True on debug-mode chains.
    pub debug: bool,
    /// Optional host-call reporting sink.
    pub tracer: Option<Arc<dyn HostioTracer>>,
    /// The caller's remaining gas, decremented in place.
    pub gas: &'a mut u64,
}

/// The compiled-program registry, opened against its subspace.
pub struct Programs {
    backing: Storage,
    program_records: Storage,
}

impl Programs {
    /// Writes the registry's initial layout: the default parameter record.
    pub fn initialize(sto: &Storage) -> Result<(), StorageError> {
        sto.set_by_u64(PARAMS_OFFSET, EngineParams::default().pack())
    }

    /// Opens the registry against its subspace.
    #[must_use]
    pub fn open(sto: &Storage) -> Self {
        Self {
            backing: sto.clone(),
            program_records: sto.open_sub_storage(&[]),
        }
    }

    // =========================================================================
    // SETTINGS
    // =========================================================================

    /// The global execution-pricing settings.
    pub fn params(&self) -> Result<EngineParams, StorageError> {
        Ok(EngineParams::unpack(self.backing.get_by_u64(PARAMS_OFFSET)?))
    }

    /// Replaces the whole settings record.
    pub fn set_params(&self, params: &EngineParams) -> Result<(), StorageError> {
        self.backing.set_by_u64(PARAMS_OFFSET, params.pack())
    }

    /// The live engine version.
    pub fn engine_version(&self) -> Result<u32, StorageError> {
        Ok(self.params()?.version)
    }

    /// Bumps the engine version, forcing every program to recompile.
    pub fn set_engine_version(&self, version: u32) -> Result<(), StorageError> {
        let mut params = self.params()?;
        params.version = version;
        self.set_params(&params)
    }

    /// The ink price in bips.
    pub fn ink_price_bips(&self) -> Result<u64, StorageError> {
        Ok(self.params()?.ink_price_bips)
    }

    /// Sets the ink price in bips.
    pub fn set_ink_price_bips(&self, bips: u64) -> Result<(), StorageError> {
        let mut params = self.params()?;
        params.ink_price_bips = bips;
        self.set_params(&params)
    }

    /// The module call-depth limit.
    pub fn max_call_depth(&self) -> Result<u32, StorageError> {
        Ok(self.params()?.max_call_depth)
    }

    /// Sets the module call-depth limit.
    pub fn set_max_call_depth(&self, depth: u32) -> Result<(), StorageError> {
        let mut params = self.params()?;
        params.max_call_depth = depth;
        self.set_params(&params)
    }

    /// The per-hostio ink surcharge.
    pub fn hostio_ink_cost(&self) -> Result<u64, StorageError> {
        Ok(self.params()?.hostio_ink_cost)
    }

    /// Sets the per-hostio ink surcharge.
    pub fn set_hostio_ink_cost(&self, cost: u64) -> Result<(), StorageError> {
        let mut params = self.params()?;
        params.hostio_ink_cost = cost;
        self.set_params(&params)
    }

    // =========================================================================
    // PROGRAM RECORDS
    // =========================================================================

    fn record_key(&self, address: Address) -> Hash {
        address.to_hash()
    }

    fn program_record(&self, address: Address) -> Result<(u32, u16), StorageError> {
        let word = self.program_records.get(self.record_key(address))?.to_u64();
        Ok(((word >> 16) as u32, (word & 0xFFFF) as u16))
    }

    fn set_program_record(
        &self,
        address: Address,
        version: u32,
        footprint: u16,
    ) -> Result<(), StorageError> {
        let word = (u64::from(version) << 16) | u64::from(footprint);
        self.program_records
            .set(self.record_key(address), Hash::from_u64(word))
    }

    /// The engine version `address` was last compiled at (0 = never).
    pub fn program_version(&self, address: Address) -> Result<u32, StorageError> {
        Ok(self.program_record(address)?.0)
    }

    // =========================================================================
    // COMPILE
    // =========================================================================

    /// Compiles the module at `address` for the live engine version.
    ///
    /// Fails with `UpToDate` when the recorded version is already current,
    /// so version checks stay cheap for the common case. On success the
    /// artifact is stored in the code database keyed by (code hash,
    /// version) and the address's record is updated.
    pub fn compile_program(
        &self,
        db: &StateDb,
        address: Address,
        debug: bool,
    ) -> Result<u32, ProgramError> {
        let params = self.params()?;
        let (recorded, _) = self.program_record(address)?;
        if recorded >= params.version {
            return Err(ProgramError::UpToDate);
        }

        let code = db.get_code(address);
        let module = codec::decode_module(&code)?;
        let compile_params = CompileParams {
            version: params.version,
            page_limit: PAGE_LIMIT,
            debug,
        };
        let (artifact, module_info) = sr_04_execution::compile(&module, &compile_params)?;

        let code_hash = db.code_hash(address);
        db.add_compiled_module(params.version, code_hash, artifact);
        self.set_program_record(address, params.version, module_info.footprint)?;
        info!(
            program = %address,
            version = params.version,
            footprint = module_info.footprint,
            "compiled program module"
        );
        Ok(params.version)
    }

    // =========================================================================
    // CALL
    // =========================================================================

    /// Runs the program at `address` with the given calldata.
    ///
    /// The recorded version must equal the live engine version exactly:
    /// 0 means the program was never compiled, and any older version means
    /// a recompile is required after a version bump, even though the
    /// account code itself is unchanged.
    pub fn call_program(
        &self,
        scope: &mut ExecutionScope<'_>,
        address: Address,
        calldata: &[u8],
    ) -> Result<Bytes, ProgramError> {
        let params = self.params()?;
        let (recorded, footprint) = self.program_record(address)?;
        if recorded == 0 {
            return Err(ProgramError::NotCompiled);
        }
        if recorded != params.version {
            return Err(ProgramError::OutOfDate {
                recorded,
                live: params.version,
            });
        }

        let start_gas = *scope.gas;
        let model = MemoryModel::default();

        // one-time footprint charge: entering a program opens its declared
        // pages, priced against what the transaction already allocated
        let prior = scope.tx.open_pages(footprint);
        let entry_cost = model.gas_cost(footprint, prior.open, prior.ever);
        if *scope.gas < entry_cost {
            scope.tx.restore_open_pages(prior.open);
            *scope.gas = 0;
            return Err(ProgramError::OutOfGas);
        }
        *scope.gas -= entry_cost;

        let code_hash = scope.db.code_hash(address);
        let Some(artifact) = scope.db.compiled_module(params.version, code_hash) else {
            error!(program = %address, version = params.version, "artifact missing");
            scope.tx.restore_open_pages(prior.open);
            return Err(ProgramError::MissingArtifact);
        };

        let vm_params = VmParams {
            version: params.version,
            max_call_depth: params.max_call_depth,
            ink_price_bips: params.ink_price_bips,
            hostio_ink_cost: params.hostio_ink_cost,
            debug: scope.debug,
        };
        let mut evm_data = scope.evm_data.clone();
        evm_data.contract_address = address;
        evm_data.tracing = scope.tracer.is_some();

        let api = EvmApiImpl::new(
            scope.db.clone(),
            scope.tx.clone(),
            scope.router.clone(),
            scope.tracer.clone(),
            model,
            address,
            scope.read_only,
            evm_data.block_number,
        );
        let guard = SessionGuard::register(Box::new(api));
        let (status, output) = sr_04_execution::call(
            code_hash,
            &artifact,
            calldata,
            &vm_params,
            &evm_data,
            guard.handle(),
            scope.gas,
        );
        scope.tx.restore_open_pages(prior.open);

        if *scope.gas > start_gas {
            error!(
                start = start_gas,
                left = *scope.gas,
                "program gas did not decrease"
            );
            *scope.gas = 0;
            return Err(ProgramError::Failed);
        }

        match status {
            ExecutionStatus::Success => Ok(output),
            ExecutionStatus::Revert => Err(ProgramError::Revert(output)),
            ExecutionStatus::Failure => Err(ProgramError::Failed),
            ExecutionStatus::OutOfGas => Err(ProgramError::OutOfGas),
            ExecutionStatus::OutOfStack => Err(ProgramError::DepthExceeded),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
