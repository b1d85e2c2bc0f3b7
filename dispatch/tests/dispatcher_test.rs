//! End-to-end dispatcher behavior over the in-memory store: idempotency,
//! crash-window recovery, conflict retry, snapshots, cancellation and
//! schema-drift handling.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use address_registry_core::event::{Event, SerializedEvent};
use address_registry_core::event_store::{EventStore, EventStoreError};
use address_registry_core::stream::{StreamId, Version};
use address_registry_dispatch::{
    CommandDispatcher, CommandId, DispatchError, RetryPolicy, SnapshotStrategy, StreetNames,
};
use address_registry_streetname::error::ReplayError;
use address_registry_streetname::geometry::{ExtendedWkbGeometry, GeometryMethod};
use address_registry_streetname::types::{
    AddressPersistentLocalId, NisCode, PostalCode, Provenance, StreetNamePersistentLocalId,
    StreetNameStatus,
};
use address_registry_streetname::{StreetNameCommand, StreetNameError, StreetNameEvent};
use address_registry_testing::{
    test_clock, test_provenance, InMemoryEventStore, InMemoryIdempotencyLedger,
    StaticMunicipalities,
};
use tokio_util::sync::CancellationToken;

const STREET: u32 = 10521;

fn street_id() -> StreetNamePersistentLocalId {
    StreetNamePersistentLocalId::new(STREET)
}

fn address_id(id: u32) -> AddressPersistentLocalId {
    AddressPersistentLocalId::new(id)
}

fn provenance_by(reason: &str) -> Provenance {
    Provenance {
        reason: reason.to_string(),
        ..test_provenance()
    }
}

fn imported() -> StreetNameEvent {
    StreetNameEvent::StreetNameWasImported {
        street_name_persistent_local_id: street_id(),
        nis_code: NisCode::new("44021"),
        status: StreetNameStatus::Current,
        provenance: test_provenance(),
    }
}

fn propose(id: u32, house_number: &str) -> StreetNameCommand {
    StreetNameCommand::ProposeAddress {
        street_name_persistent_local_id: street_id(),
        address_persistent_local_id: address_id(id),
        postal_code: PostalCode::new("9000"),
        house_number: house_number.parse().expect("valid house number"),
        box_number: None,
        geometry_method: GeometryMethod::DerivedFromObject,
        geometry_specification: None,
        position: ExtendedWkbGeometry::new(vec![0x01, 0x02]),
        provenance: test_provenance(),
    }
}

fn approve(id: u32, reason: &str) -> StreetNameCommand {
    StreetNameCommand::ApproveAddress {
        street_name_persistent_local_id: street_id(),
        address_persistent_local_id: address_id(id),
        provenance: provenance_by(reason),
    }
}

struct Fixture {
    store: Arc<InMemoryEventStore>,
    ledger: Arc<InMemoryIdempotencyLedger>,
    dispatcher: CommandDispatcher,
}

async fn fixture_with(snapshots: SnapshotStrategy, retry: RetryPolicy) -> Fixture {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let store = Arc::new(InMemoryEventStore::new());
    let ledger = Arc::new(InMemoryIdempotencyLedger::new());

    let seed = SerializedEvent::from_event(&imported(), None).expect("import serializes");
    store
        .append_events(street_id().into(), None, vec![seed])
        .await
        .expect("seeding succeeds");

    let dispatcher = CommandDispatcher::new(
        StreetNames::new(store.clone(), snapshots),
        ledger.clone(),
        Arc::new(StaticMunicipalities::knowing(&["44021"])),
        Arc::new(test_clock()),
        retry,
    );

    Fixture {
        store,
        ledger,
        dispatcher,
    }
}

async fn fixture() -> Fixture {
    fixture_with(SnapshotStrategy::never(), RetryPolicy::default()).await
}

#[tokio::test]
async fn dispatch_appends_events_and_records_the_outcome() {
    let f = fixture().await;
    let token = CancellationToken::new();

    let etag = f
        .dispatcher
        .dispatch(&propose(1, "11"), &token)
        .await
        .expect("dispatch succeeds");

    assert_eq!(f.store.stream_len(&street_id().into()), 2);
    assert_eq!(f.ledger.len(), 1);
    assert_eq!(
        f.dispatcher.get_hash(street_id(), address_id(1)).await.unwrap(),
        etag
    );
}

#[tokio::test]
async fn redelivered_command_is_not_re_executed() {
    let f = fixture().await;
    let token = CancellationToken::new();
    let command = propose(1, "11");

    let first = f.dispatcher.dispatch(&command, &token).await.unwrap();
    let second = f.dispatcher.dispatch(&command, &token).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(f.store.stream_len(&street_id().into()), 2);
    assert_eq!(f.ledger.len(), 1);
}

#[tokio::test]
async fn crash_window_redelivery_re_derives_the_same_outcome() {
    // Simulate a crash after the durable append but before the ledger
    // write: the entry disappears, the command comes back, and the
    // dispatcher must resolve it to the same ETag without new events.
    let f = fixture().await;
    let token = CancellationToken::new();
    let command = propose(1, "11");

    let first = f.dispatcher.dispatch(&command, &token).await.unwrap();
    f.ledger.forget(CommandId::of(&command).unwrap());

    let second = f.dispatcher.dispatch(&command, &token).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(f.store.stream_len(&street_id().into()), 2);
    assert_eq!(f.ledger.len(), 1);
}

#[tokio::test]
async fn no_op_commands_leave_the_etag_unchanged() {
    let f = fixture().await;
    let token = CancellationToken::new();

    let after_propose = f.dispatcher.dispatch(&propose(1, "11"), &token).await.unwrap();
    let after_approve = f
        .dispatcher
        .dispatch(&approve(1, "first"), &token)
        .await
        .unwrap();
    assert_ne!(after_propose, after_approve);

    // A second approval with fresh provenance is a distinct command but a
    // semantic no-op: zero events, same ETag, still recorded.
    let repeated = f
        .dispatcher
        .dispatch(&approve(1, "second"), &token)
        .await
        .unwrap();

    assert_eq!(after_approve, repeated);
    assert_eq!(f.store.stream_len(&street_id().into()), 3);
    assert_eq!(f.ledger.len(), 3);
}

#[tokio::test]
async fn validation_failures_pass_through_untouched() {
    let f = fixture().await;
    let token = CancellationToken::new();

    let error = f
        .dispatcher
        .dispatch(&approve(9, "missing"), &token)
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        DispatchError::Validation(StreetNameError::AddressNotFound(id)) if id == address_id(9)
    ));
    assert_eq!(f.ledger.len(), 0);
}

#[tokio::test]
async fn missing_street_name_is_not_found() {
    let f = fixture().await;
    let token = CancellationToken::new();

    let command = StreetNameCommand::ApproveAddress {
        street_name_persistent_local_id: StreetNamePersistentLocalId::new(404),
        address_persistent_local_id: address_id(1),
        provenance: test_provenance(),
    };

    assert!(matches!(
        f.dispatcher.dispatch(&command, &token).await.unwrap_err(),
        DispatchError::NotFound(id) if id == StreetNamePersistentLocalId::new(404)
    ));
}

#[tokio::test]
async fn cancelled_dispatch_has_no_effect() {
    let f = fixture().await;
    let token = CancellationToken::new();
    token.cancel();

    let error = f
        .dispatcher
        .dispatch(&propose(1, "11"), &token)
        .await
        .unwrap_err();

    assert!(matches!(error, DispatchError::Cancelled));
    assert_eq!(f.store.stream_len(&street_id().into()), 1);
    assert_eq!(f.ledger.len(), 0);
}

#[tokio::test]
async fn snapshot_is_written_when_the_cadence_boundary_is_crossed() {
    let f = fixture_with(SnapshotStrategy::every(2), RetryPolicy::default()).await;
    let token = CancellationToken::new();

    f.dispatcher.dispatch(&propose(1, "11"), &token).await.unwrap();
    assert!(!f.store.has_snapshot(&street_id().into()));

    f.dispatcher
        .dispatch(&approve(1, "approve"), &token)
        .await
        .unwrap();
    assert!(f.store.has_snapshot(&street_id().into()));

    // Loads after the snapshot replay the tail on top of it and agree with
    // the full-replay ETag.
    let etag = f
        .dispatcher
        .dispatch(&propose(2, "13"), &token)
        .await
        .unwrap();
    assert_eq!(
        f.dispatcher.get_hash(street_id(), address_id(2)).await.unwrap(),
        etag
    );
}

#[tokio::test]
async fn unknown_event_type_in_the_stream_is_fatal() {
    let f = fixture().await;
    let token = CancellationToken::new();

    let drifted = SerializedEvent::new("AddressWasTeleported.v9".to_string(), vec![0x00], None);
    f.store
        .append_events(street_id().into(), None, vec![drifted])
        .await
        .unwrap();

    let error = f
        .dispatcher
        .dispatch(&propose(1, "11"), &token)
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        DispatchError::Replay(ReplayError::UnknownEventType(t)) if t == "AddressWasTeleported.v9"
    ));
}

#[tokio::test]
async fn get_hash_reports_missing_addresses() {
    let f = fixture().await;

    let error = f
        .dispatcher
        .get_hash(street_id(), address_id(9))
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        DispatchError::Validation(StreetNameError::AddressNotFound(id)) if id == address_id(9)
    ));
}

/// Store wrapper that loses the optimistic race a fixed number of times
/// before delegating.
struct ContendedStore {
    inner: Arc<InMemoryEventStore>,
    conflicts_left: AtomicU32,
}

impl EventStore for ContendedStore {
    fn append_events(
        &self,
        stream_id: StreamId,
        expected_version: Option<Version>,
        events: Vec<SerializedEvent>,
    ) -> Pin<Box<dyn Future<Output = Result<Version, EventStoreError>> + Send + '_>> {
        Box::pin(async move {
            if self
                .conflicts_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                let expected = expected_version.unwrap_or(Version::INITIAL);
                return Err(EventStoreError::ConcurrencyConflict {
                    stream_id,
                    expected,
                    actual: expected.next(),
                });
            }
            self.inner.append_events(stream_id, expected_version, events).await
        })
    }

    fn load_events(
        &self,
        stream_id: StreamId,
        from_version: Option<Version>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<SerializedEvent>, EventStoreError>> + Send + '_>>
    {
        self.inner.load_events(stream_id, from_version)
    }

    fn save_snapshot(
        &self,
        stream_id: StreamId,
        version: Version,
        state: Vec<u8>,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventStoreError>> + Send + '_>> {
        self.inner.save_snapshot(stream_id, version, state)
    }

    fn load_snapshot(
        &self,
        stream_id: StreamId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<(Version, Vec<u8>)>, EventStoreError>> + Send + '_>>
    {
        self.inner.load_snapshot(stream_id)
    }
}

async fn contended_fixture(conflicts: u32, retry: RetryPolicy) -> (Arc<InMemoryEventStore>, CommandDispatcher) {
    let inner = Arc::new(InMemoryEventStore::new());
    let seed = SerializedEvent::from_event(&imported(), None).expect("import serializes");
    inner
        .append_events(street_id().into(), None, vec![seed])
        .await
        .expect("seeding succeeds");

    let store = Arc::new(ContendedStore {
        inner: inner.clone(),
        conflicts_left: AtomicU32::new(conflicts),
    });
    let dispatcher = CommandDispatcher::new(
        StreetNames::new(store, SnapshotStrategy::never()),
        Arc::new(InMemoryIdempotencyLedger::new()),
        Arc::new(StaticMunicipalities::knowing(&["44021"])),
        Arc::new(test_clock()),
        retry,
    );
    (inner, dispatcher)
}

#[tokio::test]
async fn lost_race_is_retried_and_resolves() {
    let (inner, dispatcher) = contended_fixture(2, RetryPolicy::default()).await;
    let token = CancellationToken::new();

    dispatcher
        .dispatch(&propose(1, "11"), &token)
        .await
        .expect("dispatch resolves after retries");

    assert_eq!(inner.stream_len(&street_id().into()), 2);
}

#[tokio::test]
async fn exhausted_retries_surface_as_a_conflict() {
    let (inner, dispatcher) = contended_fixture(u32::MAX, RetryPolicy::no_retries()).await;
    let token = CancellationToken::new();

    let error = dispatcher
        .dispatch(&propose(1, "11"), &token)
        .await
        .unwrap_err();

    assert!(matches!(error, DispatchError::Conflict { retries: 0, .. }));
    assert_eq!(inner.stream_len(&street_id().into()), 1);
}
