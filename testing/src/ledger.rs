//! In-memory idempotency ledger.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Mutex, PoisonError};

use address_registry_dispatch::{CommandId, IdempotencyLedger, LedgerEntry, LedgerError};

/// Deterministic in-memory [`IdempotencyLedger`].
#[derive(Default)]
pub struct InMemoryIdempotencyLedger {
    entries: Mutex<HashMap<CommandId, LedgerEntry>>,
}

impl InMemoryIdempotencyLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded outcomes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop one entry, simulating a crash after append but before the
    /// ledger write.
    pub fn forget(&self, command_id: CommandId) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&command_id);
    }
}

impl IdempotencyLedger for InMemoryIdempotencyLedger {
    fn find(
        &self,
        command_id: CommandId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<LedgerEntry>, LedgerError>> + Send + '_>> {
        Box::pin(async move {
            Ok(self
                .entries
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .get(&command_id)
                .cloned())
        })
    }

    fn record(
        &self,
        entry: LedgerEntry,
    ) -> Pin<Box<dyn Future<Output = Result<(), LedgerError>> + Send + '_>> {
        Box::pin(async move {
            self.entries
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(entry.command_id, entry);
            Ok(())
        })
    }
}
