//! # Execution Status
//!
//! The status code returned by every module invocation, alongside an
//! output buffer whose meaning depends on the status: a payload on
//! `Success` and `Revert`, empty otherwise.

use tracing::error;

/// Outcome of one module invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ExecutionStatus {
    /// The module returned normally; the output is its return payload.
    Success = 0,
    /// The module reverted; the output is the revert reason.
    Revert = 1,
    /// The module trapped; all gas is consumed, output is empty.
    Failure = 2,
    /// The ink budget ran out.
    OutOfGas = 3,
    /// The call-depth limit was exceeded.
    OutOfStack = 4,
}

impl ExecutionStatus {
    /// True when the output buffer carries a payload.
    #[must_use]
    pub fn has_output(self) -> bool {
        matches!(self, Self::Success | Self::Revert)
    }

    /// True when the invocation consumes its entire gas budget.
    #[must_use]
    pub fn consumes_all_gas(self) -> bool {
        !matches!(self, Self::Success | Self::Revert)
    }
}

impl From<u8> for ExecutionStatus {
    /// Decodes a raw status byte. An unknown discriminant can only come
    /// from a version-skewed artifact; it is logged and degraded to a
    /// generic failure rather than propagated as a crash.
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Success,
            1 => Self::Revert,
            2 => Self::Failure,
            3 => Self::OutOfGas,
            4 => Self::OutOfStack,
            other => {
                error!(status = other, "unknown execution status, treating as failure");
                Self::Failure
            }
        }
    }
}
