//! # Instruction Set
//!
//! The module bytecode's instruction set: a small deterministic stack
//! machine over 64-bit words with paged linear memory, plus one opcode per
//! host operation.
//!
//! Stack operand convention: operands are documented bottom-to-top, so the
//! last listed operand is popped first.

use serde::{Deserialize, Serialize};

/// Raw opcode bytes of the module wire format.
#[allow(missing_docs)]
pub mod op {
    pub const UNREACHABLE: u8 = 0x00;
    pub const NOP: u8 = 0x01;
    pub const PUSH: u8 = 0x02;
    pub const POP: u8 = 0x03;
    pub const DUP: u8 = 0x04;
    pub const SWAP: u8 = 0x05;

    pub const ADD: u8 = 0x10;
    pub const SUB: u8 = 0x11;
    pub const MUL: u8 = 0x12;
    pub const DIV_U: u8 = 0x13;
    pub const REM_U: u8 = 0x14;
    pub const AND: u8 = 0x15;
    pub const OR: u8 = 0x16;
    pub const XOR: u8 = 0x17;
    pub const SHL: u8 = 0x18;
    pub const SHR_U: u8 = 0x19;
    pub const EQ: u8 = 0x1A;
    pub const LT_U: u8 = 0x1B;
    pub const GT_U: u8 = 0x1C;
    pub const EQZ: u8 = 0x1D;

    pub const JUMP: u8 = 0x20;
    pub const JUMP_IF: u8 = 0x21;
    pub const CALL: u8 = 0x22;
    pub const RET: u8 = 0x23;

    pub const MEM_LOAD: u8 = 0x30;
    pub const MEM_STORE: u8 = 0x31;
    pub const MEM_SIZE: u8 = 0x32;
    pub const MEM_GROW: u8 = 0x33;

    pub const ARGS_LEN: u8 = 0x40;
    pub const READ_ARGS: u8 = 0x41;
    pub const KECCAK: u8 = 0x42;
    pub const STORAGE_LOAD: u8 = 0x43;
    pub const STORAGE_STORE: u8 = 0x44;
    pub const CALL_CONTRACT: u8 = 0x45;
    pub const DELEGATE_CALL: u8 = 0x46;
    pub const STATIC_CALL: u8 = 0x47;
    pub const CREATE1: u8 = 0x48;
    pub const CREATE2: u8 = 0x49;
    pub const RETURN_DATA_LEN: u8 = 0x4A;
    pub const READ_RETURN_DATA: u8 = 0x4B;
    pub const EMIT_LOG: u8 = 0x4C;
    pub const ACCOUNT_BALANCE: u8 = 0x4D;
    pub const ACCOUNT_CODEHASH: u8 = 0x4E;

    pub const EVM_GAS_LEFT: u8 = 0x50;
    pub const EVM_INK_LEFT: u8 = 0x51;
    pub const BLOCK_NUMBER: u8 = 0x52;
    pub const BLOCK_TIMESTAMP: u8 = 0x53;
    pub const BLOCK_GAS_LIMIT: u8 = 0x54;
    pub const BLOCK_COINBASE: u8 = 0x55;
    pub const BLOCK_BASE_FEE: u8 = 0x56;
    pub const CHAIN_ID: u8 = 0x57;
    pub const RANDAO_SEED: u8 = 0x58;
    pub const TX_ORIGIN: u8 = 0x59;
    pub const MSG_SENDER: u8 = 0x5A;
    pub const MSG_VALUE: u8 = 0x5B;
    pub const CONTRACT_ADDRESS: u8 = 0x5C;

    pub const DEBUG_PRINT: u8 = 0x60;

    pub const RETURN: u8 = 0xF0;
    pub const REVERT: u8 = 0xF1;
}

/// A decoded, validated instruction. Jump targets are instruction indices
/// within the enclosing function (the compiler remaps byte offsets).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum Instr {
    // control
    Unreachable,
    Nop,
    /// Pushes an immediate word.
    Push(u64),
    Pop,
    Dup,
    Swap,

    // arithmetic and comparison, wrapping semantics
    Add,
    Sub,
    Mul,
    /// Traps on division by zero.
    DivU,
    /// Traps on division by zero.
    RemU,
    And,
    Or,
    Xor,
    Shl,
    ShrU,
    Eq,
    LtU,
    GtU,
    Eqz,

    // intra-module control flow
    Jump(u32),
    /// `[cond]` - jumps when cond is nonzero.
    JumpIf(u32),
    /// Pushes a call frame; depth-checked against the params.
    Call(u16),
    Ret,

    // linear memory
    /// `[addr]` → `[word]` little-endian.
    MemLoad,
    /// `[addr, word]`.
    MemStore,
    /// → `[pages]`.
    MemSize,
    /// `[pages]` → `[old_pages]`; priced through the memory model.
    MemGrow,

    // host operations
    ArgsLen,
    /// `[dst]` - copies the full calldata.
    ReadArgs,
    /// `[src, len, dst]` - Keccak-256 computed host-side.
    Keccak,
    /// `[key, dst]`.
    StorageLoad,
    /// `[key, val]`.
    StorageStore,
    /// `[addr, data, data_len, value, gas]` → `[status]`.
    CallContract,
    /// `[addr, data, data_len, gas]` → `[status]`.
    DelegateCall,
    /// `[addr, data, data_len, gas]` → `[status]`.
    StaticCall,
    /// `[code, code_len, value, addr_dst]` → `[status]`.
    Create1,
    /// `[code, code_len, value, salt, addr_dst]` → `[status]`.
    Create2,
    ReturnDataLen,
    /// `[dst, offset, len]` → `[copied]`.
    ReadReturnData,
    /// `[data, len, topics]`.
    EmitLog,
    /// `[addr, dst]`.
    AccountBalance,
    /// `[addr, dst]`.
    AccountCodeHash,

    // EVM context reads
    EvmGasLeft,
    EvmInkLeft,
    BlockNumber,
    BlockTimestamp,
    BlockGasLimit,
    /// `[dst]` - 20 bytes.
    BlockCoinbase,
    /// `[dst]` - 32 bytes.
    BlockBaseFee,
    /// `[dst]` - 32 bytes.
    ChainId,
    /// `[dst]` - 32 bytes.
    RandaoSeed,
    /// `[dst]` - 20 bytes.
    TxOrigin,
    /// `[dst]` - 20 bytes.
    MsgSender,
    /// `[dst]` - 32 bytes.
    MsgValue,
    /// `[dst]` - 20 bytes.
    ContractAddress,

    /// `[ptr, len]` - debug chains only.
    DebugPrint,

    /// `[ptr, len]` - finish with Success and the given payload.
    Return,
    /// `[ptr, len]` - finish with Revert and the given payload.
    Revert,
}
