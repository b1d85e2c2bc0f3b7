//! The idempotent command dispatcher.
//!
//! One dispatch is: ledger lookup, reconstruct, decide, append with the
//! expected version, derive the ETag from the mutated state, record the
//! outcome, return the ETag. Exactly-once effect on top of an at-least-once
//! transport comes from the combination of the ledger (fast path) and the
//! deterministic state machine (crash-window path: a retried command whose
//! effect is already in the stream decides to zero events and resolves to
//! the current ETag).

use std::sync::Arc;

use address_registry_core::environment::Clock;
use address_registry_core::event_store::EventStoreError;
use address_registry_streetname::municipality::Municipalities;
use address_registry_streetname::types::{AddressPersistentLocalId, StreetNamePersistentLocalId};
use address_registry_streetname::{EventHash, StreetName, StreetNameCommand, StreetNameError};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::command_id::CommandId;
use crate::error::DispatchError;
use crate::ledger::{IdempotencyLedger, LedgerEntry};
use crate::repository::StreetNames;
use crate::retry::RetryPolicy;

/// Dispatches street-name commands with idempotency and conflict retry.
pub struct CommandDispatcher {
    repository: StreetNames,
    ledger: Arc<dyn IdempotencyLedger>,
    municipalities: Arc<dyn Municipalities>,
    clock: Arc<dyn Clock>,
    retry: RetryPolicy,
}

impl CommandDispatcher {
    /// Wire up a dispatcher.
    #[must_use]
    pub fn new(
        repository: StreetNames,
        ledger: Arc<dyn IdempotencyLedger>,
        municipalities: Arc<dyn Municipalities>,
        clock: Arc<dyn Clock>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            repository,
            ledger,
            municipalities,
            clock,
            retry,
        }
    }

    /// Dispatch one command and return the resulting address ETag.
    ///
    /// Cancellation is honored before the load and before the append, never
    /// between a durable append and its ledger write.
    ///
    /// # Errors
    ///
    /// See [`DispatchError`]; validation failures pass through from the
    /// state machine untouched.
    pub async fn dispatch(
        &self,
        command: &StreetNameCommand,
        cancellation: &CancellationToken,
    ) -> Result<EventHash, DispatchError> {
        let span = tracing::info_span!(
            "dispatch",
            command = command.name(),
            street_name = %command.street_name_persistent_local_id(),
            address = %command.address_persistent_local_id(),
        );
        self.dispatch_inner(command, cancellation).instrument(span).await
    }

    async fn dispatch_inner(
        &self,
        command: &StreetNameCommand,
        cancellation: &CancellationToken,
    ) -> Result<EventHash, DispatchError> {
        let command_id = CommandId::of(command)?;

        if let Some(entry) = self.ledger.find(command_id).await? {
            tracing::debug!(%command_id, "ledger hit, skipping re-execution");
            return Ok(entry.result);
        }

        let street_name_id = command.street_name_persistent_local_id();
        let address_id = command.address_persistent_local_id();
        let mut attempt: u32 = 0;

        let etag = loop {
            if cancellation.is_cancelled() {
                return Err(DispatchError::Cancelled);
            }

            let (state, version) = self.repository.load(street_name_id).await?;
            let events = state.decide(command, self.municipalities.as_ref())?;

            if events.is_empty() {
                tracing::debug!(%command_id, "command is a no-op against current state");
                break current_etag(&state, address_id)?;
            }

            if cancellation.is_cancelled() {
                return Err(DispatchError::Cancelled);
            }

            let mut mutated = state;
            for event in &events {
                mutated.apply(event);
            }

            match self
                .repository
                .append(street_name_id, &mutated, version, &events)
                .await
            {
                Ok(new_version) => {
                    tracing::info!(
                        %command_id,
                        events = events.len(),
                        version = %new_version,
                        "events appended"
                    );
                    break current_etag(&mutated, address_id)?;
                }
                Err(DispatchError::Store(EventStoreError::ConcurrencyConflict {
                    stream_id,
                    expected,
                    actual,
                })) => {
                    if attempt >= self.retry.max_retries {
                        return Err(DispatchError::Conflict {
                            stream_id,
                            retries: attempt,
                        });
                    }
                    tracing::warn!(
                        %stream_id,
                        %expected,
                        %actual,
                        attempt,
                        "append lost the optimistic race, reloading"
                    );
                    tokio::time::sleep(self.retry.delay_for_attempt(attempt)).await;
                    attempt += 1;
                }
                Err(other) => return Err(other),
            }
        };

        // The append (if any) is durable; the ledger write must follow even
        // when cancellation has been requested in the meantime.
        self.ledger
            .record(LedgerEntry {
                command_id,
                result: etag.clone(),
                applied_at: self.clock.now(),
            })
            .await?;

        Ok(etag)
    }

    /// Read-only ETag lookup for conditional HTTP handling upstream.
    ///
    /// # Errors
    ///
    /// [`DispatchError::NotFound`] when the street name has no stream;
    /// [`DispatchError::Validation`] with
    /// [`StreetNameError::AddressNotFound`] when the address does not exist
    /// under it.
    pub async fn get_hash(
        &self,
        street_name_id: StreetNamePersistentLocalId,
        address_id: AddressPersistentLocalId,
    ) -> Result<EventHash, DispatchError> {
        let (state, _) = self.repository.load(street_name_id).await?;
        current_etag(&state, address_id)
    }
}

fn current_etag(
    state: &StreetName,
    address_id: AddressPersistentLocalId,
) -> Result<EventHash, DispatchError> {
    state
        .last_event_hash(address_id)
        .cloned()
        .ok_or(DispatchError::Validation(StreetNameError::AddressNotFound(
            address_id,
        )))
}
