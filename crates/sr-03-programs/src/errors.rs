//! # Error Types
//!
//! All of these are typed recoverable errors: reached from inside a
//! contract call they become an EVM-level revert visible only to that
//! transaction.

use sr_01_storage::StorageError;
use sr_04_execution::CompileError;
use thiserror::Error;

/// Errors from the program registry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProgramError {
    /// The program was never compiled.
    #[error("program not compiled")]
    NotCompiled,

    /// The program was compiled for an older engine version and must be
    /// recompiled before it can run again.
    #[error("program compiled for engine version {recorded}, live version is {live}")]
    OutOfDate {
        /// Version the program was last compiled at.
        recorded: u32,
        /// Current global engine version.
        live: u32,
    },

    /// The program is already compiled at the live engine version.
    #[error("program is already up to date")]
    UpToDate,

    /// The account's code does not carry the module magic prefix.
    #[error("account code is not a program module")]
    NotAModule,

    /// The module decompresses beyond the maximum permitted size.
    #[error("module exceeds the maximum decompressed size ({limit} bytes)")]
    Oversized {
        /// The configured cap.
        limit: usize,
    },

    /// The compressed module body is not valid.
    #[error("malformed module container: {0}")]
    Malformed(String),

    /// The engine rejected the module; carries the engine's error text.
    #[error("compilation failed: {0}")]
    CompileFailed(#[from] CompileError),

    /// The registry points at an artifact the code database does not hold.
    #[error("compiled artifact missing from the code database")]
    MissingArtifact,

    /// The program reverted; the payload is the revert reason.
    #[error("execution reverted")]
    Revert(Vec<u8>),

    /// The program trapped.
    #[error("execution failed")]
    Failed,

    /// The program exhausted its gas budget.
    #[error("out of gas")]
    OutOfGas,

    /// The program exceeded the call-depth limit.
    #[error("call depth exceeded")]
    DepthExceeded,

    /// The storage layer failed beneath the registry.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = ProgramError::OutOfDate {
            recorded: 1,
            live: 2,
        };
        assert!(err.to_string().contains('1'));
        assert!(err.to_string().contains('2'));
        assert_eq!(
            ProgramError::NotCompiled.to_string(),
            "program not compiled"
        );
    }

    #[test]
    fn test_storage_error_is_transparent() {
        let err: ProgramError = StorageError::OutOfGas.into();
        assert_eq!(err.to_string(), StorageError::OutOfGas.to_string());
    }
}
