//! # Metered Machine
//!
//! The interpreter. Runs one compiled module invocation against a
//! host-call session handle, charging ink per instruction and buying gas
//! for every host operation. Traps never escape: [`Machine::run`] always
//! produces one of the five execution statuses.

use crate::api::{HostError, HostOp};
use crate::bridge::{self, ApiHandle};
use crate::context::{EvmData, VmParams};
use crate::memory::{PAGE_LIMIT, PAGE_SIZE};
use crate::status::ExecutionStatus;
use crate::vm::costs::{data_ink, instr_ink, keccak_ink};
use crate::vm::instr::Instr;
use crate::vm::module::CompiledModule;
use shared_types::{keccak256, Address, Hash, U256};
use tracing::debug;

/// Value stack slot limit.
pub const STACK_LIMIT: usize = 4096;

/// Gas that must remain before a storage write may be attempted.
pub const SSTORE_SENTRY_GAS: u64 = 2300;

enum Trap {
    OutOfInk,
    OutOfStack,
    StackUnderflow,
    MemoryOutOfBounds,
    DivideByZero,
    Unreachable,
    SessionLost,
    Host(HostError),
}

/// One in-flight module invocation.
pub struct Machine<'a> {
    module: &'a CompiledModule,
    params: &'a VmParams,
    evm: &'a EvmData,
    handle: ApiHandle,
    args: &'a [u8],
    ink: u64,
    stack: Vec<u64>,
    frames: Vec<(u16, u32)>,
    memory: Vec<u8>,
    outs: Vec<u8>,
}

impl<'a> Machine<'a> {
    /// Prepares an invocation with the given gas budget and calldata.
    pub fn new(
        module: &'a CompiledModule,
        params: &'a VmParams,
        evm: &'a EvmData,
        handle: ApiHandle,
        gas: u64,
        args: &'a [u8],
    ) -> Self {
        Self {
            module,
            params,
            evm,
            handle,
            args,
            ink: params.gas_to_ink(gas),
            stack: Vec::new(),
            frames: Vec::new(),
            memory: vec![0; module.footprint as usize * PAGE_SIZE],
            outs: Vec::new(),
        }
    }

    /// Gas equivalent of the remaining ink.
    #[must_use]
    pub fn gas_left(&self) -> u64 {
        self.params.ink_to_gas(self.ink)
    }

    /// Runs the module to completion.
    pub fn run(&mut self) -> (ExecutionStatus, Vec<u8>) {
        match self.exec() {
            Ok(status) => (status, std::mem::take(&mut self.outs)),
            Err(Trap::OutOfInk) => (ExecutionStatus::OutOfGas, Vec::new()),
            Err(Trap::OutOfStack) => (ExecutionStatus::OutOfStack, Vec::new()),
            Err(Trap::Host(err)) => {
                // host-side refusals surface as a revert carrying the text
                (ExecutionStatus::Revert, err.to_string().into_bytes())
            }
            Err(trap) => {
                let reason = match trap {
                    Trap::StackUnderflow => "stack underflow",
                    Trap::MemoryOutOfBounds => "memory access out of bounds",
                    Trap::DivideByZero => "division by zero",
                    Trap::Unreachable => "unreachable executed",
                    Trap::SessionLost => "host session lost",
                    _ => "trap",
                };
                debug!(reason, "module trapped");
                (ExecutionStatus::Failure, Vec::new())
            }
        }
    }

    #[allow(clippy::too_many_lines)]
    fn exec(&mut self) -> Result<ExecutionStatus, Trap> {
        let mut func: u16 = 0;
        let mut pc: u32 = 0;

        loop {
            let instrs = &self.module.funcs[func as usize];
            let Some(&instr) = instrs.get(pc as usize) else {
                // falling off the end of a function is an implicit return
                match self.frames.pop() {
                    Some((ret_func, ret_pc)) => {
                        func = ret_func;
                        pc = ret_pc;
                        continue;
                    }
                    None => return Ok(ExecutionStatus::Success),
                }
            };
            pc += 1;
            self.buy_ink(instr_ink(self.module.engine_version, &instr))?;

            match instr {
                Instr::Unreachable => return Err(Trap::Unreachable),
                Instr::Nop => {}
                Instr::Push(value) => self.push(value)?,
                Instr::Pop => {
                    self.pop()?;
                }
                Instr::Dup => {
                    let top = *self.stack.last().ok_or(Trap::StackUnderflow)?;
                    self.push(top)?;
                }
                Instr::Swap => {
                    let len = self.stack.len();
                    if len < 2 {
                        return Err(Trap::StackUnderflow);
                    }
                    self.stack.swap(len - 1, len - 2);
                }

                Instr::Add => self.binop(u64::wrapping_add)?,
                Instr::Sub => self.binop(u64::wrapping_sub)?,
                Instr::Mul => self.binop(u64::wrapping_mul)?,
                Instr::DivU => {
                    let b = self.pop()?;
                    let a = self.pop()?;
                    if b == 0 {
                        return Err(Trap::DivideByZero);
                    }
                    self.push(a / b)?;
                }
                Instr::RemU => {
                    let b = self.pop()?;
                    let a = self.pop()?;
                    if b == 0 {
                        return Err(Trap::DivideByZero);
                    }
                    self.push(a % b)?;
                }
                Instr::And => self.binop(|a, b| a & b)?,
                Instr::Or => self.binop(|a, b| a | b)?,
                Instr::Xor => self.binop(|a, b| a ^ b)?,
                Instr::Shl => self.binop(|a, b| a.wrapping_shl(b as u32 & 63))?,
                Instr::ShrU => self.binop(|a, b| a.wrapping_shr(b as u32 & 63))?,
                Instr::Eq => self.binop(|a, b| u64::from(a == b))?,
                Instr::LtU => self.binop(|a, b| u64::from(a < b))?,
                Instr::GtU => self.binop(|a, b| u64::from(a > b))?,
                Instr::Eqz => {
                    let a = self.pop()?;
                    self.push(u64::from(a == 0))?;
                }

                Instr::Jump(target) => pc = target,
                Instr::JumpIf(target) => {
                    if self.pop()? != 0 {
                        pc = target;
                    }
                }
                Instr::Call(index) => {
                    if self.frames.len() as u32 + 1 >= self.params.max_call_depth {
                        return Err(Trap::OutOfStack);
                    }
                    self.frames.push((func, pc));
                    func = index;
                    pc = 0;
                }
                Instr::Ret => match self.frames.pop() {
                    Some((ret_func, ret_pc)) => {
                        func = ret_func;
                        pc = ret_pc;
                    }
                    None => return Ok(ExecutionStatus::Success),
                },

                Instr::MemLoad => {
                    let addr = self.pop()?;
                    let bytes = self.mem_slice(addr, 8)?;
                    let mut buf = [0u8; 8];
                    buf.copy_from_slice(bytes);
                    self.push(u64::from_le_bytes(buf))?;
                }
                Instr::MemStore => {
                    let value = self.pop()?;
                    let addr = self.pop()?;
                    self.mem_write(addr, &value.to_le_bytes())?;
                }
                Instr::MemSize => {
                    let pages = (self.memory.len() / PAGE_SIZE) as u64;
                    self.push(pages)?;
                }
                Instr::MemGrow => self.mem_grow()?,

                Instr::ArgsLen => {
                    self.buy_ink(self.params.hostio_ink_cost)?;
                    self.push(self.args.len() as u64)?;
                }
                Instr::ReadArgs => {
                    self.buy_ink(self.params.hostio_ink_cost)?;
                    self.buy_ink(data_ink(self.args.len() as u64))?;
                    let dst = self.pop()?;
                    let args = self.args;
                    self.mem_write(dst, args)?;
                }
                Instr::Keccak => {
                    self.buy_ink(self.params.hostio_ink_cost)?;
                    let dst = self.pop()?;
                    let len = self.pop()?;
                    let src = self.pop()?;
                    self.buy_ink(keccak_ink(len))?;
                    let hash = keccak256(self.mem_slice(src, len)?);
                    self.mem_write(dst, hash.as_bytes())?;
                    self.report(HostOp::Keccak, 0);
                }

                Instr::StorageLoad => self.storage_load()?,
                Instr::StorageStore => self.storage_store()?,
                Instr::CallContract => self.call_contract(CallKind::Call)?,
                Instr::DelegateCall => self.call_contract(CallKind::Delegate)?,
                Instr::StaticCall => self.call_contract(CallKind::Static)?,
                Instr::Create1 => self.create(false)?,
                Instr::Create2 => self.create(true)?,

                Instr::ReturnDataLen => {
                    self.buy_ink(self.params.hostio_ink_cost)?;
                    let len = bridge::return_data_len(self.handle).map_err(|_| Trap::SessionLost)?;
                    self.push(u64::from(len))?;
                }
                Instr::ReadReturnData => {
                    self.buy_ink(self.params.hostio_ink_cost)?;
                    let len = self.pop()?;
                    let offset = self.pop()?;
                    let dst = self.pop()?;
                    let data = bridge::get_return_data(
                        self.handle,
                        offset.min(u64::from(u32::MAX)) as u32,
                        len.min(u64::from(u32::MAX)) as u32,
                    )
                    .map_err(|_| Trap::SessionLost)?;
                    self.buy_ink(data_ink(data.len() as u64))?;
                    self.mem_write(dst, &data)?;
                    self.push(data.len() as u64)?;
                    self.report(HostOp::ReturnDataCopy, 0);
                }
                Instr::EmitLog => self.emit_log()?,

                Instr::AccountBalance => {
                    let (value, cost) = {
                        let addr = self.account_operand()?;
                        bridge::account_balance(self.handle, addr).map_err(|_| Trap::SessionLost)?
                    };
                    self.finish_word_read(value, cost, HostOp::Balance)?;
                }
                Instr::AccountCodeHash => {
                    let (value, cost) = {
                        let addr = self.account_operand()?;
                        bridge::account_codehash(self.handle, addr).map_err(|_| Trap::SessionLost)?
                    };
                    self.finish_word_read(value, cost, HostOp::CodeHash)?;
                }

                Instr::EvmGasLeft => {
                    let gas = self.gas_left();
                    self.push(gas)?;
                }
                Instr::EvmInkLeft => {
                    let ink = self.ink;
                    self.push(ink)?;
                }
                Instr::BlockNumber => self.push(self.evm.block_number)?,
                Instr::BlockTimestamp => self.push(self.evm.block_timestamp)?,
                Instr::BlockGasLimit => self.push(self.evm.block_gas_limit)?,
                Instr::BlockCoinbase => {
                    let addr = self.evm.block_coinbase;
                    self.write_address_operand(addr)?;
                }
                Instr::BlockBaseFee => {
                    let word = Hash::from_u256(self.evm.block_base_fee);
                    self.write_word_operand(word)?;
                }
                Instr::ChainId => {
                    let word = Hash::from_u256(self.evm.chain_id);
                    self.write_word_operand(word)?;
                }
                Instr::RandaoSeed => {
                    let word = self.evm.prev_randao;
                    self.write_word_operand(word)?;
                }
                Instr::TxOrigin => {
                    let addr = self.evm.tx_origin;
                    self.write_address_operand(addr)?;
                }
                Instr::MsgSender => {
                    let addr = self.evm.msg_sender;
                    self.write_address_operand(addr)?;
                }
                Instr::MsgValue => {
                    let word = Hash::from_u256(self.evm.msg_value);
                    self.write_word_operand(word)?;
                }
                Instr::ContractAddress => {
                    let addr = self.evm.contract_address;
                    self.write_address_operand(addr)?;
                }

                Instr::DebugPrint => {
                    let len = self.pop()?;
                    let ptr = self.pop()?;
                    if !self.params.debug {
                        return Err(Trap::Unreachable);
                    }
                    let text = String::from_utf8_lossy(self.mem_slice(ptr, len)?).into_owned();
                    debug!(module = %self.evm.contract_address, "{text}");
                }

                Instr::Return => {
                    self.take_output()?;
                    return Ok(ExecutionStatus::Success);
                }
                Instr::Revert => {
                    self.take_output()?;
                    return Ok(ExecutionStatus::Revert);
                }
            }
        }
    }

    // =========================================================================
    // HOST OPERATIONS
    // =========================================================================

    fn storage_load(&mut self) -> Result<(), Trap> {
        self.buy_ink(self.params.hostio_ink_cost)?;
        let dst = self.pop()?;
        let key_ptr = self.pop()?;
        let key = self.read_word(key_ptr)?;
        let (value, cost) = bridge::get_bytes32(self.handle, key).map_err(|_| Trap::SessionLost)?;
        self.buy_gas(cost)?;
        self.mem_write(dst, value.as_bytes())?;
        self.report(HostOp::StorageLoad, cost);
        Ok(())
    }

    fn storage_store(&mut self) -> Result<(), Trap> {
        self.buy_ink(self.params.hostio_ink_cost)?;
        if self.gas_left() < SSTORE_SENTRY_GAS {
            return Err(Trap::OutOfInk);
        }
        let val_ptr = self.pop()?;
        let key_ptr = self.pop()?;
        let key = self.read_word(key_ptr)?;
        let value = self.read_word(val_ptr)?;
        let cost = bridge::set_bytes32(self.handle, key, value)
            .map_err(|_| Trap::SessionLost)?
            .map_err(Trap::Host)?;
        self.buy_gas(cost)?;
        self.report(HostOp::StorageStore, cost);
        Ok(())
    }

    fn call_contract(&mut self, kind: CallKind) -> Result<(), Trap> {
        self.buy_ink(self.params.hostio_ink_cost)?;
        let gas_req = self.pop()?;
        let value = match kind {
            CallKind::Call => {
                let value_ptr = self.pop()?;
                self.read_word(value_ptr)?.to_u256()
            }
            _ => U256::zero(),
        };
        let data_len = self.pop()?;
        let data_ptr = self.pop()?;
        let addr_ptr = self.pop()?;
        let contract = self.read_address(addr_ptr)?;
        let data = self.mem_slice(data_ptr, data_len)?.to_vec();
        self.buy_ink(data_ink(data_len))?;

        // a module may request more gas than it has; clamp to the budget
        let gas = gas_req.min(self.gas_left());
        let (_, cost, status) = match kind {
            CallKind::Call => bridge::contract_call(self.handle, contract, data, gas, value),
            CallKind::Delegate => bridge::delegate_call(self.handle, contract, data, gas),
            CallKind::Static => bridge::static_call(self.handle, contract, data, gas),
        }
        .map_err(|_| Trap::SessionLost)?;
        self.buy_gas(cost)?;
        self.push(status as u64)?;
        self.report(kind.host_op(), cost);
        Ok(())
    }

    fn create(&mut self, salted: bool) -> Result<(), Trap> {
        self.buy_ink(self.params.hostio_ink_cost)?;
        let addr_dst = self.pop()?;
        let salt = if salted {
            let salt_ptr = self.pop()?;
            Some(self.read_word(salt_ptr)?)
        } else {
            None
        };
        let value_ptr = self.pop()?;
        let value = self.read_word(value_ptr)?.to_u256();
        let code_len = self.pop()?;
        let code_ptr = self.pop()?;
        let code = self.mem_slice(code_ptr, code_len)?.to_vec();
        self.buy_ink(data_ink(code_len))?;

        let gas = self.gas_left();
        let (created, _, cost) = match salt {
            Some(salt) => bridge::create2(self.handle, code, value, salt, gas),
            None => bridge::create1(self.handle, code, value, gas),
        }
        .map_err(|_| Trap::SessionLost)?;
        self.buy_gas(cost)?;
        let ok = created.is_some();
        self.mem_write(addr_dst, created.unwrap_or(Address::ZERO).as_bytes())?;
        self.push(u64::from(!ok))?;
        self.report(if salted { HostOp::Create2 } else { HostOp::Create1 }, cost);
        Ok(())
    }

    fn emit_log(&mut self) -> Result<(), Trap> {
        self.buy_ink(self.params.hostio_ink_cost)?;
        let topics = self.pop()?;
        let len = self.pop()?;
        let ptr = self.pop()?;
        let data = self.mem_slice(ptr, len)?.to_vec();
        self.buy_ink(data_ink(len))?;
        bridge::emit_log(
            self.handle,
            data,
            topics.min(u64::from(u32::MAX)) as u32,
        )
        .map_err(|_| Trap::SessionLost)?
        .map_err(Trap::Host)?;
        self.report(HostOp::Log, 0);
        Ok(())
    }

    fn mem_grow(&mut self) -> Result<(), Trap> {
        let requested = self.pop()?;
        let old_pages = (self.memory.len() / PAGE_SIZE) as u64;
        if requested == 0 {
            return self.push(old_pages);
        }
        let new_pages = old_pages.saturating_add(requested);
        if new_pages > u64::from(PAGE_LIMIT) {
            return Err(Trap::MemoryOutOfBounds);
        }
        self.buy_ink(self.params.hostio_ink_cost)?;
        let cost = bridge::add_pages(self.handle, requested as u16)
            .map_err(|_| Trap::SessionLost)?;
        self.buy_gas(cost)?;
        self.memory.resize(new_pages as usize * PAGE_SIZE, 0);
        self.push(old_pages)?;
        self.report(HostOp::AddPages, cost);
        Ok(())
    }

    fn account_operand(&mut self) -> Result<Address, Trap> {
        self.buy_ink(self.params.hostio_ink_cost)?;
        let dst = self.pop()?;
        let addr_ptr = self.pop()?;
        let addr = self.read_address(addr_ptr)?;
        // re-push the destination for finish_word_read
        self.push(dst)?;
        Ok(addr)
    }

    fn finish_word_read(&mut self, value: Hash, cost: u64, op: HostOp) -> Result<(), Trap> {
        let dst = self.pop()?;
        self.buy_gas(cost)?;
        self.mem_write(dst, value.as_bytes())?;
        self.report(op, cost);
        Ok(())
    }

    fn take_output(&mut self) -> Result<(), Trap> {
        let len = self.pop()?;
        let ptr = self.pop()?;
        self.buy_ink(data_ink(len))?;
        self.outs = self.mem_slice(ptr, len)?.to_vec();
        Ok(())
    }

    fn report(&mut self, op: HostOp, cost: u64) {
        if self.evm.tracing {
            let gas = self.gas_left();
            // best-effort: tracing must never abort execution
            let _ = bridge::report_hostio(self.handle, op, gas, cost);
        }
    }

    // =========================================================================
    // PRIMITIVES
    // =========================================================================

    fn buy_ink(&mut self, amount: u64) -> Result<(), Trap> {
        if self.ink < amount {
            self.ink = 0;
            return Err(Trap::OutOfInk);
        }
        self.ink -= amount;
        Ok(())
    }

    fn buy_gas(&mut self, gas: u64) -> Result<(), Trap> {
        self.buy_ink(self.params.gas_to_ink(gas))
    }

    fn push(&mut self, value: u64) -> Result<(), Trap> {
        if self.stack.len() >= STACK_LIMIT {
            return Err(Trap::OutOfStack);
        }
        self.stack.push(value);
        Ok(())
    }

    fn pop(&mut self) -> Result<u64, Trap> {
        self.stack.pop().ok_or(Trap::StackUnderflow)
    }

    fn binop(&mut self, f: impl Fn(u64, u64) -> u64) -> Result<(), Trap> {
        let b = self.pop()?;
        let a = self.pop()?;
        self.push(f(a, b))
    }

    fn mem_slice(&self, ptr: u64, len: u64) -> Result<&[u8], Trap> {
        let end = ptr.checked_add(len).ok_or(Trap::MemoryOutOfBounds)?;
        if end > self.memory.len() as u64 {
            return Err(Trap::MemoryOutOfBounds);
        }
        Ok(&self.memory[ptr as usize..end as usize])
    }

    fn mem_write(&mut self, ptr: u64, data: &[u8]) -> Result<(), Trap> {
        let end = ptr
            .checked_add(data.len() as u64)
            .ok_or(Trap::MemoryOutOfBounds)?;
        if end > self.memory.len() as u64 {
            return Err(Trap::MemoryOutOfBounds);
        }
        self.memory[ptr as usize..end as usize].copy_from_slice(data);
        Ok(())
    }

    fn read_word(&self, ptr: u64) -> Result<Hash, Trap> {
        let bytes = self.mem_slice(ptr, 32)?;
        Hash::from_slice(bytes).ok_or(Trap::MemoryOutOfBounds)
    }

    fn read_address(&self, ptr: u64) -> Result<Address, Trap> {
        let bytes = self.mem_slice(ptr, 20)?;
        Address::from_slice(bytes).ok_or(Trap::MemoryOutOfBounds)
    }

    fn write_word_operand(&mut self, word: Hash) -> Result<(), Trap> {
        let dst = self.pop()?;
        self.mem_write(dst, word.as_bytes())
    }

    fn write_address_operand(&mut self, addr: Address) -> Result<(), Trap> {
        let dst = self.pop()?;
        self.mem_write(dst, addr.as_bytes())
    }
}

#[derive(Clone, Copy)]
enum CallKind {
    Call,
    Delegate,
    Static,
}

impl CallKind {
    fn host_op(self) -> HostOp {
        match self {
            Self::Call => HostOp::Call,
            Self::Delegate => HostOp::DelegateCall,
            Self::Static => HostOp::StaticCall,
        }
    }
}
