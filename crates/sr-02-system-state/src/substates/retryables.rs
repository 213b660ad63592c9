//! # Retryable Tickets
//!
//! Deferred cross-layer messages that can be retried until they expire.
//! The container only owns the sub-state's lifecycle; ticket creation,
//! redemption, and timeout handling belong to the surrounding node.

use sr_01_storage::{Storage, StorageBackedU64, StorageError};

const TICKET_COUNT_OFFSET: u64 = 0;

/// The retryable-ticket sub-state.
pub struct RetryableState {
    ticket_count: StorageBackedU64,
}

impl RetryableState {
    /// Writes the initial layout.
    pub fn initialize(sto: &Storage) -> Result<(), StorageError> {
        Self::open(sto).ticket_count.set(0)
    }

    /// Opens the sub-state against its subspace.
    #[must_use]
    pub fn open(sto: &Storage) -> Self {
        Self {
            ticket_count: sto.open_backed_u64(TICKET_COUNT_OFFSET),
        }
    }

    /// Number of live tickets.
    pub fn ticket_count(&self) -> Result<u64, StorageError> {
        self.ticket_count.get()
    }
}
