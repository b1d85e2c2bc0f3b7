//! In-memory event store with strict optimistic concurrency.
//!
//! Honors the full [`EventStore`] contract, version check included, so
//! dispatcher tests exercise the same conflict paths a production store
//! would produce.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Mutex, PoisonError};

use address_registry_core::event::SerializedEvent;
use address_registry_core::event_store::{EventStore, EventStoreError};
use address_registry_core::stream::{StreamId, Version};

#[derive(Default)]
struct StreamSlot {
    events: Vec<SerializedEvent>,
    snapshot: Option<(Version, Vec<u8>)>,
}

/// Deterministic in-memory [`EventStore`].
#[derive(Default)]
pub struct InMemoryEventStore {
    inner: Mutex<HashMap<String, StreamSlot>>,
}

impl InMemoryEventStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of events currently in a stream.
    #[must_use]
    pub fn stream_len(&self, stream_id: &StreamId) -> usize {
        let guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        guard.get(stream_id.as_str()).map_or(0, |slot| slot.events.len())
    }

    /// Whether a snapshot has been written for a stream.
    #[must_use]
    pub fn has_snapshot(&self, stream_id: &StreamId) -> bool {
        let guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        guard
            .get(stream_id.as_str())
            .is_some_and(|slot| slot.snapshot.is_some())
    }
}

impl EventStore for InMemoryEventStore {
    fn append_events(
        &self,
        stream_id: StreamId,
        expected_version: Option<Version>,
        events: Vec<SerializedEvent>,
    ) -> Pin<Box<dyn Future<Output = Result<Version, EventStoreError>> + Send + '_>> {
        Box::pin(async move {
            if events.is_empty() {
                return Err(EventStoreError::StorageError(
                    "cannot append zero events".to_string(),
                ));
            }

            let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            let slot = guard.entry(stream_id.as_str().to_string()).or_default();

            if let Some(expected) = expected_version {
                let actual = slot
                    .events
                    .len()
                    .checked_sub(1)
                    .map_or(Version::INITIAL, |last| Version::new(last as u64));
                if slot.events.is_empty() || actual != expected {
                    return Err(EventStoreError::ConcurrencyConflict {
                        stream_id,
                        expected,
                        actual,
                    });
                }
            }

            slot.events.extend(events);
            Ok(Version::new(slot.events.len() as u64 - 1))
        })
    }

    fn load_events(
        &self,
        stream_id: StreamId,
        from_version: Option<Version>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<SerializedEvent>, EventStoreError>> + Send + '_>>
    {
        Box::pin(async move {
            let guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            let Some(slot) = guard.get(stream_id.as_str()) else {
                return Ok(Vec::new());
            };
            let skip = from_version.map_or(0, |v| v.value() as usize + 1);
            Ok(slot.events.iter().skip(skip).cloned().collect())
        })
    }

    fn save_snapshot(
        &self,
        stream_id: StreamId,
        version: Version,
        state: Vec<u8>,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventStoreError>> + Send + '_>> {
        Box::pin(async move {
            let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            let slot = guard.entry(stream_id.as_str().to_string()).or_default();
            slot.snapshot = Some((version, state));
            Ok(())
        })
    }

    fn load_snapshot(
        &self,
        stream_id: StreamId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<(Version, Vec<u8>)>, EventStoreError>> + Send + '_>>
    {
        Box::pin(async move {
            let guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            Ok(guard
                .get(stream_id.as_str())
                .and_then(|slot| slot.snapshot.clone()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(n: u8) -> SerializedEvent {
        SerializedEvent::new(format!("TestEvent.v{n}"), vec![n], None)
    }

    #[tokio::test]
    async fn append_and_load_round_trip() {
        let store = InMemoryEventStore::new();
        let stream = StreamId::new("streetname-1");

        let version = store
            .append_events(stream.clone(), None, vec![event(1), event(2)])
            .await
            .unwrap_or_else(|_| Version::INITIAL);
        assert_eq!(version, Version::new(1));

        let all = store.load_events(stream.clone(), None).await.unwrap_or_default();
        assert_eq!(all.len(), 2);

        let tail = store
            .load_events(stream, Some(Version::INITIAL))
            .await
            .unwrap_or_default();
        assert_eq!(tail.len(), 1);
        assert_eq!(tail[0].event_type, "TestEvent.v2");
    }

    #[tokio::test]
    async fn stale_expected_version_conflicts() {
        let store = InMemoryEventStore::new();
        let stream = StreamId::new("streetname-1");

        let _ = store
            .append_events(stream.clone(), None, vec![event(1), event(2)])
            .await;

        let result = store
            .append_events(stream, Some(Version::INITIAL), vec![event(3)])
            .await;
        assert!(matches!(
            result,
            Err(EventStoreError::ConcurrencyConflict { .. })
        ));
    }

    #[tokio::test]
    async fn missing_stream_loads_empty() {
        let store = InMemoryEventStore::new();
        let events = store
            .load_events(StreamId::new("streetname-404"), None)
            .await
            .unwrap_or_default();
        assert!(events.is_empty());
    }
}
