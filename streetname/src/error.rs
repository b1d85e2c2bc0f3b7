//! Error taxonomies of the StreetName aggregate.
//!
//! [`StreetNameError`] covers command validation: caller-fixable, surfaced
//! directly, never retried. [`ReplayError`] covers reconstruction: fatal,
//! process-level, never silently skipped. The state machine returns these as
//! typed outcomes and never catches its own validation errors; retry logic
//! lives exclusively in the dispatcher and only applies to concurrency
//! conflicts, which are not represented here.

use crate::geometry::{GeometryMethod, GeometrySpecification};
use crate::types::{
    AddressPersistentLocalId, AddressStatus, BoxNumber, HouseNumber, NisCode,
    StreetNamePersistentLocalId, StreetNameStatus,
};
use thiserror::Error;

/// A command was rejected by the state machine.
///
/// Each failure aborts the whole command atomically: `decide` validates
/// before constructing any event, so no partial emission is possible.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreetNameError {
    /// The street name is removed; nothing under it may change.
    #[error("Street name {0} was removed")]
    StreetNameIsRemoved(StreetNamePersistentLocalId),

    /// The street name is not in a status that admits address changes.
    #[error("Street name {id} has status {status:?}; expected Proposed or Current")]
    StreetNameNotActive {
        /// The street name.
        id: StreetNamePersistentLocalId,
        /// Its current status.
        status: StreetNameStatus,
    },

    /// No address with this identifier exists in the aggregate.
    #[error("Address {0} was not found")]
    AddressNotFound(AddressPersistentLocalId),

    /// A boxed address was proposed but no parent address carries the house
    /// number.
    #[error("No parent address exists for house number '{0}'")]
    ParentAddressNotFound(HouseNumber),

    /// The parent address exists but is not in an active status.
    #[error("Parent address {id} has status {status:?}; expected Proposed or Current")]
    ParentAddressNotActive {
        /// The parent address.
        id: AddressPersistentLocalId,
        /// Its current status.
        status: AddressStatus,
    },

    /// The address is removed, a terminal state; only queries are allowed.
    #[error("Address {0} was removed")]
    AddressIsRemoved(AddressPersistentLocalId),

    /// The address's current status does not admit the operation.
    #[error("Address has status {status:?}; {operation} is not allowed")]
    InvalidStatus {
        /// The operation that was attempted.
        operation: &'static str,
        /// The address's current status.
        status: AddressStatus,
    },

    /// The geometry method is not allowed for new positions.
    #[error("Geometry method {0} is not allowed")]
    InvalidGeometryMethod(GeometryMethod),

    /// The specification is not admitted for the given geometry method.
    #[error("Geometry specification {0} is not valid for the given method")]
    InvalidGeometrySpecification(GeometrySpecification),

    /// The geometry method requires an explicit specification.
    #[error("Geometry specification is required for method AppointedByAdministrator")]
    MissingGeometrySpecification,

    /// The street name's municipality could not be resolved for a
    /// municipality-derived position.
    #[error("Municipality '{0}' is unknown")]
    MunicipalityUnknown(NisCode),

    /// Another active child of the same parent already carries this box
    /// number.
    #[error("An active address with box number '{0}' already exists for this house number")]
    DuplicateBoxNumber(BoxNumber),

    /// An active parent address with this house number already exists.
    #[error("An active parent address with house number '{0}' already exists for this street name")]
    ParentAddressAlreadyExists(HouseNumber),

    /// The address identifier is already taken with a different payload.
    #[error("Address {0} already exists")]
    AddressAlreadyExists(AddressPersistentLocalId),

    /// A boxed proposal (parent given) arrived without a box number.
    #[error("A box number is required when proposing under a parent address")]
    BoxNumberRequired,
}

/// Reconstruction failed.
///
/// Replay errors are fatal: an event that cannot be interpreted means the
/// process is running against a store written by a newer schema, and
/// continuing would silently corrupt state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReplayError {
    /// Neither a snapshot nor any event was supplied.
    #[error("Cannot replay an empty stream")]
    EmptyStream,

    /// An event type not known to this build was encountered (schema drift).
    #[error("Unknown event type '{0}' during replay")]
    UnknownEventType(String),

    /// An event payload failed to deserialize.
    #[error("Corrupt payload for event '{event_type}': {message}")]
    CorruptEvent {
        /// The envelope's event type.
        event_type: String,
        /// Decoder error detail.
        message: String,
    },

    /// A snapshot failed to deserialize.
    #[error("Corrupt snapshot: {0}")]
    CorruptSnapshot(String),
}
