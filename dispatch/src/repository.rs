//! Street-name repository: reconstruction and durable append.
//!
//! Loading is snapshot-plus-tail: the latest snapshot bounds replay cost,
//! the tail after it is folded on top. Appending carries the expected
//! version from the load, so a concurrent writer surfaces as a
//! [`EventStoreError::ConcurrencyConflict`] instead of a lost update.
//!
//! [`EventStoreError::ConcurrencyConflict`]: address_registry_core::event_store::EventStoreError::ConcurrencyConflict

use std::sync::Arc;

use address_registry_core::event::SerializedEvent;
use address_registry_core::event_store::EventStore;
use address_registry_core::stream::{StreamId, Version};
use address_registry_streetname::aggregate::EmittedEvents;
use address_registry_streetname::snapshot::StreetNameSnapshot;
use address_registry_streetname::types::StreetNamePersistentLocalId;
use address_registry_streetname::StreetName;

use crate::error::DispatchError;

/// When to write a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotStrategy {
    every: u64,
}

impl SnapshotStrategy {
    /// Snapshot whenever the stream version crosses a multiple of `every`.
    #[must_use]
    pub const fn every(every: u64) -> Self {
        Self { every }
    }

    /// Never snapshot; every load replays the full stream.
    #[must_use]
    pub const fn never() -> Self {
        Self { every: 0 }
    }

    /// Whether an append that moved the stream from `before` to `after`
    /// crossed a snapshot boundary.
    #[must_use]
    pub const fn should_snapshot(&self, before: Version, after: Version) -> bool {
        if self.every == 0 {
            return false;
        }
        after.value() / self.every > before.value() / self.every
    }
}

/// Repository over one event store.
#[derive(Clone)]
pub struct StreetNames {
    store: Arc<dyn EventStore>,
    snapshots: SnapshotStrategy,
}

impl StreetNames {
    /// Create a repository with the given snapshot cadence.
    #[must_use]
    pub fn new(store: Arc<dyn EventStore>, snapshots: SnapshotStrategy) -> Self {
        Self { store, snapshots }
    }

    /// Rebuild a street name from its snapshot and event tail.
    ///
    /// # Errors
    ///
    /// [`DispatchError::NotFound`] when no stream exists,
    /// [`DispatchError::Replay`] on schema drift or corruption,
    /// [`DispatchError::Store`] on a backend failure.
    pub async fn load(
        &self,
        id: StreetNamePersistentLocalId,
    ) -> Result<(StreetName, Version), DispatchError> {
        let stream_id: StreamId = id.into();

        let snapshot = match self.store.load_snapshot(stream_id.clone()).await? {
            Some((version, bytes)) => Some((StreetNameSnapshot::from_bytes(&bytes)?, version)),
            None => None,
        };
        let from_version = snapshot.as_ref().map(|(_, version)| *version);
        let tail = self.store.load_events(stream_id, from_version).await?;

        if snapshot.is_none() && tail.is_empty() {
            return Err(DispatchError::NotFound(id));
        }

        let (state, version) = StreetName::replay(snapshot, &tail)?;
        Ok((state, version))
    }

    /// Append decided events with the optimistic version check and write a
    /// snapshot of `state_after` when the cadence says so.
    ///
    /// A failed snapshot write is logged and swallowed: the events are
    /// already durable and the next load simply replays a longer tail.
    ///
    /// # Errors
    ///
    /// [`DispatchError::Store`] on append failure, concurrency conflicts
    /// included; [`DispatchError::Encoding`] when an event fails to
    /// serialize.
    pub async fn append(
        &self,
        id: StreetNamePersistentLocalId,
        state_after: &StreetName,
        current_version: Version,
        events: &EmittedEvents,
    ) -> Result<Version, DispatchError> {
        let stream_id: StreamId = id.into();

        let mut serialized = Vec::with_capacity(events.len());
        for event in events {
            serialized.push(
                SerializedEvent::from_event(event, None)
                    .map_err(|e| DispatchError::Encoding(e.to_string()))?,
            );
        }

        let new_version = self
            .store
            .append_events(stream_id.clone(), Some(current_version), serialized)
            .await?;

        if self.snapshots.should_snapshot(current_version, new_version) {
            match state_after.snapshot().to_bytes() {
                Ok(bytes) => {
                    if let Err(error) = self
                        .store
                        .save_snapshot(stream_id.clone(), new_version, bytes)
                        .await
                    {
                        tracing::warn!(%stream_id, %error, "snapshot write failed");
                    }
                }
                Err(error) => {
                    tracing::warn!(%stream_id, %error, "snapshot serialization failed");
                }
            }
        }

        Ok(new_version)
    }
}
