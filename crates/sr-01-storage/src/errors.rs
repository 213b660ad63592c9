//! # Error Types
//!
//! Errors surfaced by the keyed storage layer.

use thiserror::Error;

/// Errors from storage access.
///
/// During normal execution these propagate to the caller, which converts
/// them into a transaction-level revert. During migrations the system
/// state container treats any of them as consensus-fatal.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The gas budget backing this access was exhausted.
    #[error("out of gas while accessing storage")]
    OutOfGas,

    /// A write was attempted through a read-only burner.
    #[error("write access in read-only context")]
    WriteProtection,

    /// The underlying state database failed.
    #[error("state database failure: {0}")]
    Backend(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            StorageError::OutOfGas.to_string(),
            "out of gas while accessing storage"
        );
        assert!(StorageError::Backend("disk".into())
            .to_string()
            .contains("disk"));
    }
}
