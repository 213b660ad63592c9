//! # Error Types
//!
//! Compilation errors surface to the caller; execution failures never do —
//! they are folded into an [`crate::ExecutionStatus`] by the machine.

use thiserror::Error;

/// Errors from module compilation and artifact handling.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// The module exceeds the absolute size cap.
    #[error("module too large: {size} bytes (limit {limit})")]
    TooLarge {
        /// Bytes supplied.
        size: usize,
        /// Absolute cap.
        limit: usize,
    },

    /// The module ended mid-header or mid-instruction.
    #[error("truncated module")]
    Truncated,

    /// The module declares a format this engine version does not emit.
    #[error("unsupported module format version {0}")]
    FormatVersion(u8),

    /// The module declares no functions (function 0 is the entry point).
    #[error("module declares no functions")]
    NoFunctions,

    /// The declared memory footprint exceeds the chain's page limit.
    #[error("module declares {pages} pages (limit {limit})")]
    FootprintTooLarge {
        /// Pages declared.
        pages: u16,
        /// Configured limit.
        limit: u16,
    },

    /// An opcode outside the instruction set.
    #[error("unknown opcode 0x{0:02x}")]
    UnknownOpcode(u8),

    /// A jump that does not land on an instruction boundary.
    #[error("jump to invalid offset {0}")]
    InvalidJumpTarget(u32),

    /// A call to a function index the module does not define.
    #[error("call to undefined function {0}")]
    InvalidFunction(u16),

    /// An instrumented opcode on a chain that is not in debug mode.
    #[error("debug opcode in non-debug chain")]
    DebugOpcode,

    /// Artifact serialization failed.
    #[error("artifact encoding failed: {0}")]
    Encode(String),

    /// Artifact deserialization failed (version-skewed or corrupt store).
    #[error("artifact decoding failed: {0}")]
    Decode(String),
}
