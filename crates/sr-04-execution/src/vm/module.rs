//! # Module Compilation
//!
//! Decodes raw module bytecode, validates every instruction, remaps jump
//! targets from byte offsets to instruction indices, and produces the
//! serialized artifact stored in the code database.
//!
//! ## Wire format
//!
//! ```text
//! [0]     format version (currently 1)
//! [1..3]  declared memory footprint, pages, u16 LE
//! [3..5]  function count, u16 LE (function 0 is the entry point)
//! then per function: code length u32 LE, code bytes
//! ```

use crate::context::CompileParams;
use crate::errors::CompileError;
use crate::vm::instr::{op, Instr};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Module wire-format version this engine accepts.
pub const FORMAT_VERSION: u8 = 1;

/// Absolute cap on raw module size, enforced independently of the
/// account-code codec's decompression bound.
pub const MODULE_SIZE_LIMIT: usize = 128 * 1024;

/// Cap on functions per module.
pub const MAX_FUNCS: usize = 1024;

/// A validated, executable module.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompiledModule {
    /// Engine version this artifact was compiled for.
    pub engine_version: u32,
    /// Declared linear-memory footprint in pages.
    pub footprint: u16,
    /// Function bodies; index 0 is the entry point.
    pub funcs: Vec<Vec<Instr>>,
}

impl CompiledModule {
    /// Decodes and validates `bytes` against `params`.
    pub fn compile(bytes: &[u8], params: &CompileParams) -> Result<Self, CompileError> {
        if bytes.len() > MODULE_SIZE_LIMIT {
            return Err(CompileError::TooLarge {
                size: bytes.len(),
                limit: MODULE_SIZE_LIMIT,
            });
        }
        if bytes.len() < 5 {
            return Err(CompileError::Truncated);
        }
        if bytes[0] != FORMAT_VERSION {
            return Err(CompileError::FormatVersion(bytes[0]));
        }
        let footprint = u16::from_le_bytes([bytes[1], bytes[2]]);
        if footprint > params.page_limit {
            return Err(CompileError::FootprintTooLarge {
                pages: footprint,
                limit: params.page_limit,
            });
        }
        let func_count = u16::from_le_bytes([bytes[3], bytes[4]]) as usize;
        if func_count == 0 {
            return Err(CompileError::NoFunctions);
        }
        if func_count > MAX_FUNCS {
            return Err(CompileError::InvalidFunction(func_count as u16));
        }

        let mut pos = 5usize;
        let mut funcs = Vec::with_capacity(func_count);
        for _ in 0..func_count {
            let len = read_u32(bytes, &mut pos)? as usize;
            let end = pos.checked_add(len).ok_or(CompileError::Truncated)?;
            if end > bytes.len() {
                return Err(CompileError::Truncated);
            }
            funcs.push(decode_func(&bytes[pos..end], func_count as u16, params)?);
            pos = end;
        }

        Ok(Self {
            engine_version: params.version,
            footprint,
            funcs,
        })
    }
}

fn read_u32(bytes: &[u8], pos: &mut usize) -> Result<u32, CompileError> {
    let end = pos.checked_add(4).ok_or(CompileError::Truncated)?;
    if end > bytes.len() {
        return Err(CompileError::Truncated);
    }
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[*pos..end]);
    *pos = end;
    Ok(u32::from_le_bytes(buf))
}

fn decode_func(
    code: &[u8],
    func_count: u16,
    params: &CompileParams,
) -> Result<Vec<Instr>, CompileError> {
    let mut instrs = Vec::new();
    let mut offsets = HashMap::new();
    let mut jump_sites = Vec::new();
    let mut pos = 0usize;

    while pos < code.len() {
        offsets.insert(pos as u32, instrs.len() as u32);
        let opcode = code[pos];
        pos += 1;
        let instr = match opcode {
            op::UNREACHABLE => Instr::Unreachable,
            op::NOP => Instr::Nop,
            op::PUSH => {
                let end = pos.checked_add(8).ok_or(CompileError::Truncated)?;
                if end > code.len() {
                    return Err(CompileError::Truncated);
                }
                let mut buf = [0u8; 8];
                buf.copy_from_slice(&code[pos..end]);
                pos = end;
                Instr::Push(u64::from_le_bytes(buf))
            }
            op::POP => Instr::Pop,
            op::DUP => Instr::Dup,
            op::SWAP => Instr::Swap,
            op::ADD => Instr::Add,
            op::SUB => Instr::Sub,
            op::MUL => Instr::Mul,
            op::DIV_U => Instr::DivU,
            op::REM_U => Instr::RemU,
            op::AND => Instr::And,
            op::OR => Instr::Or,
            op::XOR => Instr::Xor,
            op::SHL => Instr::Shl,
            op::SHR_U => Instr::ShrU,
            op::EQ => Instr::Eq,
            op::LT_U => Instr::LtU,
            op::GT_U => Instr::GtU,
            op::EQZ => Instr::Eqz,
            op::JUMP | op::JUMP_IF => {
                let mut p = pos;
                let target = read_u32(code, &mut p)?;
                pos = p;
                jump_sites.push(instrs.len());
                if opcode == op::JUMP {
                    Instr::Jump(target)
                } else {
                    Instr::JumpIf(target)
                }
            }
            op::CALL => {
                let end = pos.checked_add(2).ok_or(CompileError::Truncated)?;
                if end > code.len() {
                    return Err(CompileError::Truncated);
                }
                let index = u16::from_le_bytes([code[pos], code[pos + 1]]);
                pos = end;
                if index >= func_count {
                    return Err(CompileError::InvalidFunction(index));
                }
                Instr::Call(index)
            }
            op::RET => Instr::Ret,
            op::MEM_LOAD => Instr::MemLoad,
            op::MEM_STORE => Instr::MemStore,
            op::MEM_SIZE => Instr::MemSize,
            op::MEM_GROW => Instr::MemGrow,
            op::ARGS_LEN => Instr::ArgsLen,
            op::READ_ARGS => Instr::ReadArgs,
            op::KECCAK => Instr::Keccak,
            op::STORAGE_LOAD => Instr::StorageLoad,
            op::STORAGE_STORE => Instr::StorageStore,
            op::CALL_CONTRACT => Instr::CallContract,
            op::DELEGATE_CALL => Instr::DelegateCall,
            op::STATIC_CALL => Instr::StaticCall,
            op::CREATE1 => Instr::Create1,
            op::CREATE2 => Instr::Create2,
            op::RETURN_DATA_LEN => Instr::ReturnDataLen,
            op::READ_RETURN_DATA => Instr::ReadReturnData,
            op::EMIT_LOG => Instr::EmitLog,
            op::ACCOUNT_BALANCE => Instr::AccountBalance,
            op::ACCOUNT_CODEHASH => Instr::AccountCodeHash,
            op::EVM_GAS_LEFT => Instr::EvmGasLeft,
            op::EVM_INK_LEFT => Instr::EvmInkLeft,
            op::BLOCK_NUMBER => Instr::BlockNumber,
            op::BLOCK_TIMESTAMP => Instr::BlockTimestamp,
            op::BLOCK_GAS_LIMIT => Instr::BlockGasLimit,
            op::BLOCK_COINBASE => Instr::BlockCoinbase,
            op::BLOCK_BASE_FEE => Instr::BlockBaseFee,
            op::CHAIN_ID => Instr::ChainId,
            op::RANDAO_SEED => Instr::RandaoSeed,
            op::TX_ORIGIN => Instr::TxOrigin,
            op::MSG_SENDER => Instr::MsgSender,
            op::MSG_VALUE => Instr::MsgValue,
            op::CONTRACT_ADDRESS => Instr::ContractAddress,
            op::DEBUG_PRINT => {
                if !params.debug {
                    return Err(CompileError::DebugOpcode);
                }
                Instr::DebugPrint
            }
            op::RETURN => Instr::Return,
            op::REVERT => Instr::Revert,
            other => return Err(CompileError::UnknownOpcode(other)),
        };
        instrs.push(instr);
    }

    // remap jump targets from byte offsets to instruction indices
    for site in jump_sites {
        let remap = |target: u32| {
            offsets
                .get(&target)
                .copied()
                .ok_or(CompileError::InvalidJumpTarget(target))
        };
        instrs[site] = match instrs[site] {
            Instr::Jump(target) => Instr::Jump(remap(target)?),
            Instr::JumpIf(target) => Instr::JumpIf(remap(target)?),
            other => other,
        };
    }

    Ok(instrs)
}

// =============================================================================
// TESTS
// =============================================================================
