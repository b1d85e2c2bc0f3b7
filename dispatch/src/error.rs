//! Dispatch error taxonomy.
//!
//! Four distinct failure families meet here and must stay distinguishable:
//! caller mistakes (`Validation`, `NotFound`), transient races (`Conflict`),
//! operator problems (`Store`, `Ledger`), and fatal schema drift (`Replay`).
//! Only conflicts are ever retried, and only inside the dispatcher.

use address_registry_core::event_store::EventStoreError;
use address_registry_core::stream::StreamId;
use address_registry_streetname::error::{ReplayError, StreetNameError};
use address_registry_streetname::types::StreetNamePersistentLocalId;
use thiserror::Error;

use crate::ledger::LedgerError;

/// Why a dispatch did not return an ETag.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// No stream exists for the street name.
    #[error("Street name {0} was not found")]
    NotFound(StreetNamePersistentLocalId),

    /// The state machine rejected the command. Never retried: replaying the
    /// same command against the same state fails the same way.
    #[error(transparent)]
    Validation(#[from] StreetNameError),

    /// Another writer kept winning the optimistic append; retries exhausted.
    #[error("Concurrency conflict on {stream_id} persisted after {retries} retries")]
    Conflict {
        /// The contested stream.
        stream_id: StreamId,
        /// How many reload-and-retry rounds were attempted.
        retries: u32,
    },

    /// Cancellation was requested before any durable effect.
    #[error("Dispatch was cancelled")]
    Cancelled,

    /// Reconstruction failed; fatal, the process must not limp on.
    #[error(transparent)]
    Replay(#[from] ReplayError),

    /// A command or event failed to serialize.
    #[error("Encoding failure: {0}")]
    Encoding(String),

    /// The event store failed.
    #[error("Event store failure: {0}")]
    Store(#[from] EventStoreError),

    /// The idempotency ledger failed.
    #[error("Idempotency ledger failure: {0}")]
    Ledger(#[from] LedgerError),
}
