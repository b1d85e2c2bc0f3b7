//! Event trait and serialized envelope.
//!
//! Events are immutable facts about things that have happened. They are the
//! source of truth: current state is always derived by replaying them in
//! stream order.
//!
//! Events are serialized with `bincode`. The binary format is not
//! human-readable in the store, but it is compact, fast, and shared by every
//! crate in this workspace, which keeps replay bit-deterministic.

use serde::{Serialize, de::DeserializeOwned};
use std::fmt;
use thiserror::Error;

/// Error types for event serialization.
#[derive(Error, Debug)]
pub enum EventError {
    /// Failed to serialize an event to bytes.
    #[error("Failed to serialize event: {0}")]
    SerializationError(String),

    /// Failed to deserialize an event from bytes.
    #[error("Failed to deserialize event: {0}")]
    DeserializationError(String),

    /// Unknown event type encountered during deserialization.
    ///
    /// Replay treats this as fatal schema drift: an event written by a newer
    /// (or foreign) producer must never be silently skipped.
    #[error("Unknown event type: {0}")]
    UnknownEventType(String),
}

/// An event that can be stored in an event store and replayed to rebuild
/// state.
///
/// # Event naming
///
/// `event_type()` returns a stable, versioned identifier such as
/// `"AddressWasProposed.v2"`. The string is stored alongside the payload and
/// is the routing key for deserialization, so renaming it is a schema change.
pub trait Event: Send + Sync + 'static {
    /// Stable, versioned event type identifier.
    fn event_type(&self) -> &'static str;

    /// Serialize this event to bincode bytes.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::SerializationError`] if the event cannot be
    /// serialized. Rare with bincode; indicates an unsupported payload type.
    fn to_bytes(&self) -> Result<Vec<u8>, EventError>
    where
        Self: Serialize,
    {
        bincode::serialize(self).map_err(|e| EventError::SerializationError(e.to_string()))
    }

    /// Deserialize an event from bincode bytes.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::DeserializationError`] if the bytes are corrupt
    /// or were written with an incompatible schema.
    fn from_bytes(bytes: &[u8]) -> Result<Self, EventError>
    where
        Self: DeserializeOwned + Sized,
    {
        bincode::deserialize(bytes).map_err(|e| EventError::DeserializationError(e.to_string()))
    }
}

/// A serialized event ready for storage.
///
/// Wire format between the application and the event store: the versioned
/// type name, the bincode payload, and optional JSON metadata (correlation
/// id, causation id, and similar transport-level concerns that never
/// participate in domain hashing).
#[derive(Clone, Debug)]
pub struct SerializedEvent {
    /// The event type identifier (e.g. `"AddressWasProposed.v2"`).
    pub event_type: String,

    /// The bincode-serialized event data.
    pub data: Vec<u8>,

    /// Optional metadata in JSON format.
    pub metadata: Option<serde_json::Value>,
}

impl SerializedEvent {
    /// Create a new serialized event.
    #[must_use]
    pub const fn new(
        event_type: String,
        data: Vec<u8>,
        metadata: Option<serde_json::Value>,
    ) -> Self {
        Self {
            event_type,
            data,
            metadata,
        }
    }

    /// Create a serialized event from an [`Event`].
    ///
    /// # Errors
    ///
    /// Returns [`EventError::SerializationError`] if the event cannot be
    /// serialized.
    pub fn from_event<E: Event + Serialize>(
        event: &E,
        metadata: Option<serde_json::Value>,
    ) -> Result<Self, EventError> {
        Ok(Self {
            event_type: event.event_type().to_string(),
            data: event.to_bytes()?,
            metadata,
        })
    }
}

impl fmt::Display for SerializedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SerializedEvent {{ type: {}, size: {} bytes }}",
            self.event_type,
            self.data.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
    enum TestEvent {
        Registered { id: u32, label: String },
        Relabelled { id: u32, label: String },
    }

    impl Event for TestEvent {
        fn event_type(&self) -> &'static str {
            match self {
                TestEvent::Registered { .. } => "TestEvent.Registered.v1",
                TestEvent::Relabelled { .. } => "TestEvent.Relabelled.v1",
            }
        }
    }

    #[test]
    #[allow(clippy::expect_used)] // Panics: Test will fail if serialization fails
    fn serialization_roundtrip() {
        let event = TestEvent::Registered {
            id: 7,
            label: "kerkstraat".to_string(),
        };

        let bytes = event.to_bytes().expect("serialization should succeed");
        let back = TestEvent::from_bytes(&bytes).expect("deserialization should succeed");
        assert_eq!(event, back);
    }

    #[test]
    #[allow(clippy::expect_used)] // Panics: Test will fail if serialization fails
    fn envelope_carries_type_and_metadata() {
        let event = TestEvent::Relabelled {
            id: 7,
            label: "hoogstraat".to_string(),
        };
        let metadata = serde_json::json!({ "correlation_id": "corr-1" });

        let serialized = SerializedEvent::from_event(&event, Some(metadata.clone()))
            .expect("serialization should succeed");

        assert_eq!(serialized.event_type, "TestEvent.Relabelled.v1");
        assert!(!serialized.data.is_empty());
        assert_eq!(serialized.metadata, Some(metadata));
    }

    #[test]
    fn envelope_display() {
        let serialized = SerializedEvent::new("TestEvent.v1".to_string(), vec![1, 2, 3], None);
        let display = format!("{serialized}");
        assert!(display.contains("TestEvent.v1"));
        assert!(display.contains("3 bytes"));
    }
}
