//! # Instruction Ink Costs
//!
//! The static ink table charged per instruction, keyed by engine version
//! so a version bump can reprice code generation. Host operations also
//! charge the configurable per-hostio surcharge and buy whatever gas the
//! host reports; the entries here cover only the machine-local work.
//!
//! Every instruction costs at least one ink, which bounds run time by the
//! ink budget.

use crate::vm::instr::Instr;

/// Ink per 32-byte word moved between memory and the host.
pub const IO_WORD_INK: u64 = 3;

/// Base ink for a host-side Keccak-256.
pub const KECCAK_BASE_INK: u64 = 30;

/// Ink per 32-byte word hashed.
pub const KECCAK_WORD_INK: u64 = 6;

/// Static ink cost of one instruction under the given engine version.
///
/// Version 1 is the only code generation so far; the match stays total so
/// a future version can fork the table without touching the machine.
#[must_use]
pub fn instr_ink(version: u32, instr: &Instr) -> u64 {
    let _ = version;
    match instr {
        Instr::Unreachable | Instr::Nop => 1,
        Instr::Push(_) | Instr::Pop | Instr::Dup | Instr::Swap => 1,

        Instr::Add
        | Instr::Sub
        | Instr::And
        | Instr::Or
        | Instr::Xor
        | Instr::Shl
        | Instr::ShrU
        | Instr::Eq
        | Instr::LtU
        | Instr::GtU
        | Instr::Eqz => 1,
        Instr::Mul => 3,
        Instr::DivU | Instr::RemU => 5,

        Instr::Jump(_) | Instr::JumpIf(_) => 2,
        Instr::Call(_) | Instr::Ret => 8,

        Instr::MemLoad | Instr::MemStore => 3,
        Instr::MemSize => 1,
        Instr::MemGrow => 8,

        // host operations: local work only, the surcharge is dynamic
        Instr::ArgsLen | Instr::ReturnDataLen => 2,
        Instr::ReadArgs | Instr::ReadReturnData => 8,
        Instr::Keccak => KECCAK_BASE_INK,
        Instr::StorageLoad | Instr::StorageStore => 8,
        Instr::CallContract
        | Instr::DelegateCall
        | Instr::StaticCall
        | Instr::Create1
        | Instr::Create2 => 16,
        Instr::EmitLog => 8,
        Instr::AccountBalance | Instr::AccountCodeHash => 8,

        Instr::EvmGasLeft | Instr::EvmInkLeft => 2,
        Instr::BlockNumber
        | Instr::BlockTimestamp
        | Instr::BlockGasLimit
        | Instr::BlockCoinbase
        | Instr::BlockBaseFee
        | Instr::ChainId
        | Instr::RandaoSeed
        | Instr::TxOrigin
        | Instr::MsgSender
        | Instr::MsgValue
        | Instr::ContractAddress => 2,

        Instr::DebugPrint => 1,
        Instr::Return | Instr::Revert => 2,
    }
}

/// Dynamic ink for moving `len` bytes across the host boundary.
#[must_use]
pub fn data_ink(len: u64) -> u64 {
    shared_types::math::words_for_bytes(len) * IO_WORD_INK
}

/// Dynamic ink for hashing `len` bytes.
#[must_use]
pub fn keccak_ink(len: u64) -> u64 {
    shared_types::math::words_for_bytes(len) * KECCAK_WORD_INK
}
