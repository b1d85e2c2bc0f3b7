//! Idempotency ledger trait.
//!
//! The ledger remembers, per command identity, the ETag a successful
//! dispatch produced. A hit short-circuits re-execution entirely. The write
//! happens strictly after the durable append, so a crash between the two
//! leaves a gap that the dispatcher closes by re-deriving the same outcome
//! (the retried command decides to zero events against the already-updated
//! state).

use std::future::Future;
use std::pin::Pin;

use address_registry_core::{DateTime, Utc};
use address_registry_streetname::EventHash;
use thiserror::Error;

use crate::command_id::CommandId;

/// One recorded dispatch outcome.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerEntry {
    /// Identity of the dispatched command.
    pub command_id: CommandId,
    /// The ETag the dispatch returned.
    pub result: EventHash,
    /// When the outcome was recorded.
    pub applied_at: DateTime<Utc>,
}

/// The ledger backend failed.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Connection or query error in the backing store.
    #[error("Ledger backend failure: {0}")]
    Backend(String),
}

/// Durable map from command identity to dispatch outcome.
pub trait IdempotencyLedger: Send + Sync {
    /// Look up a previously recorded outcome.
    fn find(
        &self,
        command_id: CommandId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<LedgerEntry>, LedgerError>> + Send + '_>>;

    /// Record an outcome. Recording the same identity twice with the same
    /// result must be accepted (crash-window recovery re-records).
    fn record(
        &self,
        entry: LedgerEntry,
    ) -> Pin<Box<dyn Future<Output = Result<(), LedgerError>> + Send + '_>>;
}
