//! Event store trait.
//!
//! The registry treats the event store as an external collaborator: an
//! append-only, per-stream, optimistic-concurrency-checked database of
//! serialized events, plus snapshot slots to bound replay cost.
//!
//! # Implementations
//!
//! - `InMemoryEventStore` (in `address-registry-testing`): deterministic
//!   store for tests
//! - production stores live outside this workspace and only need to honor
//!   the contract below
//!
//! # Dyn compatibility
//!
//! The trait returns explicit `Pin<Box<dyn Future>>` instead of `async fn` so
//! it can be used as a trait object (`Arc<dyn EventStore>`) inside the
//! dispatcher.

use crate::event::SerializedEvent;
use crate::stream::{StreamId, Version};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Type alias for snapshot data: `(Version, Vec<u8>)`.
type SnapshotData = (Version, Vec<u8>);

/// Errors that can occur during event store operations.
#[derive(Error, Debug)]
pub enum EventStoreError {
    /// Optimistic concurrency conflict: the expected version doesn't match
    /// the stream's current version because another writer appended first.
    /// The loser must reload and retry.
    #[error("Concurrency conflict on {stream_id}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        /// The stream where the conflict occurred.
        stream_id: StreamId,
        /// The version the writer expected.
        expected: Version,
        /// The stream's actual current version.
        actual: Version,
    },

    /// Stream not found in the event store.
    ///
    /// Not produced by the loaders in this workspace, which report a missing
    /// stream as an empty vector; reserved for external store
    /// implementations whose backend distinguishes the two.
    #[error("Stream not found: {0}")]
    StreamNotFound(StreamId),

    /// Backend connection or query error.
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Append-only event stream storage with optimistic concurrency control.
///
/// # Ordering guarantee
///
/// Events within one stream are strictly ordered by append sequence; the
/// `expected_version` precondition makes the first writer win and rejects
/// everyone else with [`EventStoreError::ConcurrencyConflict`].
pub trait EventStore: Send + Sync {
    /// Append events to a stream with an optimistic version check.
    ///
    /// `expected_version` of `Some(v)` asserts the stream's current version
    /// (the 0-based index of its last event) is exactly `v`; `None` skips
    /// the check (stream seeding and migration tooling only; the
    /// dispatcher always checks).
    ///
    /// Returns the new stream version after the append. Appending must be
    /// atomic: either every event in `events` becomes durable, or none.
    fn append_events(
        &self,
        stream_id: StreamId,
        expected_version: Option<Version>,
        events: Vec<SerializedEvent>,
    ) -> Pin<Box<dyn Future<Output = Result<Version, EventStoreError>> + Send + '_>>;

    /// Load events from a stream, ordered oldest first.
    ///
    /// `from_version` of `Some(v)` loads the events strictly after version
    /// `v` (the snapshot-plus-tail path, since a snapshot taken at `v` has
    /// event `v` already folded in); `None` loads the full history. A missing
    /// stream yields an empty vector, not an error: new aggregates start
    /// empty.
    fn load_events(
        &self,
        stream_id: StreamId,
        from_version: Option<Version>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<SerializedEvent>, EventStoreError>> + Send + '_>>;

    /// Save a snapshot of aggregate state taken at `version`.
    ///
    /// Replaces any prior snapshot for the stream; only the latest snapshot
    /// is ever consulted.
    fn save_snapshot(
        &self,
        stream_id: StreamId,
        version: Version,
        state: Vec<u8>,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventStoreError>> + Send + '_>>;

    /// Load the latest snapshot for a stream, if any.
    ///
    /// The returned version tells the caller which events are already folded
    /// into the snapshot; reconstruction continues with the tail from
    /// `load_events(stream, Some(version))`.
    fn load_snapshot(
        &self,
        stream_id: StreamId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<SnapshotData>, EventStoreError>> + Send + '_>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concurrency_conflict_display() {
        let error = EventStoreError::ConcurrencyConflict {
            stream_id: StreamId::new("streetname-10521"),
            expected: Version::new(5),
            actual: Version::new(7),
        };

        let display = format!("{error}");
        assert!(display.contains("streetname-10521"));
        assert!(display.contains("expected version 5"));
        assert!(display.contains("found 7"));
    }

    #[test]
    fn stream_not_found_display() {
        let error = EventStoreError::StreamNotFound(StreamId::new("streetname-404"));
        assert!(format!("{error}").contains("streetname-404"));
    }
}
