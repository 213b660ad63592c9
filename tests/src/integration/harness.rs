//! Shared fixtures: a chain with the engine enabled, a router that
//! re-enters the registry for program-to-program calls, and module
//! deployment helpers.

use shared_types::{Address, Hash, U256};
use sr_01_storage::adapters::memory_db::MemoryDatabase;
use sr_01_storage::{StateDb, Storage, SystemBurner};
use sr_02_system_state::system_state::PROGRAMS_SUBSPACE;
use sr_02_system_state::{
    standard_migrations, ActivationSchedule, ChainConfig, InitMessage, SystemState,
};
use sr_03_programs::{
    codec, CallKind, CallOutcome, CallResult, CallRouter, CreateOutcome, ExecutionScope,
    ProgramError, Programs, TxContext,
};
use sr_04_execution::asm::ModuleBuilder;
use sr_04_execution::vm::instr::op;
use sr_04_execution::EvmData;
use std::sync::Arc;

/// Version the fixtures initialize chains at; the engine is enabled from
/// this version onward.
pub const CHAIN_VERSION: u64 = 6;

/// The fixture chain owner.
pub fn owner() -> Address {
    Address::new([0x0A; 20])
}

/// A chain config with the engine enabled from [`CHAIN_VERSION`].
pub fn chain_config() -> ChainConfig {
    ChainConfig {
        chain_id: U256::from(412_346u64),
        initial_version: CHAIN_VERSION,
        initial_chain_owner: owner(),
        genesis_block_number: 0,
        debug_mode: false,
        engine_from_version: Some(CHAIN_VERSION),
    }
}

/// Initializes a fresh chain and returns its state and database.
pub fn init_chain() -> (SystemState, StateDb) {
    let db = MemoryDatabase::shared();
    let config = chain_config();
    let init = InitMessage::new(&config, U256::from(100)).unwrap();
    let state = SystemState::initialize(
        db.clone(),
        SystemBurner::new(false),
        &config,
        &init,
        &standard_migrations(),
        &ActivationSchedule::new(),
    )
    .unwrap();
    (state, db)
}

/// Router that treats every call target as a program and re-enters the
/// registry, so program-to-program calls work in tests without a full
/// EVM attached.
pub struct LoopbackRouter {
    pub db: StateDb,
    pub tx: Arc<TxContext>,
}

impl CallRouter for LoopbackRouter {
    fn call(
        &self,
        kind: CallKind,
        _caller: Address,
        target: Address,
        input: &[u8],
        gas: u64,
        _value: U256,
    ) -> CallOutcome {
        let sto =
            Storage::new(self.db.clone(), SystemBurner::new(false)).open_sub_storage(PROGRAMS_SUBSPACE);
        let programs = Programs::open(&sto);
        let mut gas_left = gas;
        let mut scope = ExecutionScope {
            db: self.db.clone(),
            router: Arc::new(LoopbackRouter {
                db: self.db.clone(),
                tx: self.tx.clone(),
            }),
            tx: self.tx.clone(),
            evm_data: EvmData::default(),
            read_only: kind == CallKind::StaticCall,
            debug: false,
            tracer: None,
            gas: &mut gas_left,
        };
        match programs.call_program(&mut scope, target, input) {
            Ok(output) => CallOutcome {
                output,
                gas_left,
                result: CallResult::Success,
            },
            Err(ProgramError::Revert(output)) => CallOutcome {
                output,
                gas_left,
                result: CallResult::Revert,
            },
            Err(_) => CallOutcome {
                output: Vec::new(),
                gas_left: 0,
                result: CallResult::Failure,
            },
        }
    }

    fn create(
        &self,
        _caller: Address,
        _code: &[u8],
        _value: U256,
        _salt: Option<Hash>,
        _gas: u64,
    ) -> CreateOutcome {
        CreateOutcome {
            address: None,
            output: Vec::new(),
            gas_left: 0,
            result: CallResult::Failure,
        }
    }
}

/// Deploys raw module bytecode as account code at `address`.
pub fn deploy_module(db: &StateDb, address: Address, module: &[u8]) {
    db.set_code(address, codec::encode_module(module).unwrap());
}

/// A module that returns the Keccak-256 of its calldata.
pub fn keccak_module() -> Vec<u8> {
    let mut builder = ModuleBuilder::new(1);
    builder.push(0).op(op::READ_ARGS);
    builder.push(0).op(op::ARGS_LEN).push(4096).op(op::KECCAK);
    builder.push(4096).push(32).op(op::RETURN);
    builder.build()
}

/// A module that echoes its calldata.
pub fn echo_module() -> Vec<u8> {
    let mut builder = ModuleBuilder::new(1);
    builder.push(0).op(op::READ_ARGS);
    builder.push(0).op(op::ARGS_LEN).op(op::RETURN);
    builder.build()
}

/// A module that stores calldata word 0 (key) and word 1 (value), then
/// returns the freshly reloaded value.
pub fn storage_module() -> Vec<u8> {
    let mut builder = ModuleBuilder::new(1);
    builder.push(0).op(op::READ_ARGS);
    builder.push(0).push(32).op(op::STORAGE_STORE);
    builder.push(0).push(64).op(op::STORAGE_LOAD);
    builder.push(64).push(32).op(op::RETURN);
    builder.build()
}

/// Calls a program through a fresh transaction scope.
pub fn call_program(
    state: &SystemState,
    db: &StateDb,
    address: Address,
    calldata: &[u8],
    gas: &mut u64,
    read_only: bool,
) -> Result<Vec<u8>, ProgramError> {
    let tx = TxContext::new();
    let mut scope = ExecutionScope {
        db: db.clone(),
        router: Arc::new(LoopbackRouter {
            db: db.clone(),
            tx: tx.clone(),
        }),
        tx,
        evm_data: EvmData::default(),
        read_only,
        debug: false,
        tracer: None,
        gas,
    };
    state.programs().call_program(&mut scope, address, calldata)
}
