//! Commands accepted by the StreetName aggregate.
//!
//! Commands are plain data: identifiers, parameters, and the provenance the
//! caller vouches for. The state machine never fabricates provenance and
//! never reads a clock; everything an event will carry arrives here.
//!
//! Commands serialize with `bincode`, and that serialization is the basis of
//! command identity in the dispatcher, so every field here participates in
//! idempotency.

use serde::{Deserialize, Serialize};

use crate::geometry::{AddressGeometry, ExtendedWkbGeometry, GeometryMethod, GeometrySpecification};
use crate::types::{
    AddressPersistentLocalId, AddressStatus, BoxNumber, HouseNumber, PostalCode, Provenance,
    StreetNamePersistentLocalId,
};

/// All commands the aggregate accepts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum StreetNameCommand {
    /// Propose a new address under the street name.
    ProposeAddress {
        /// The street name.
        street_name_persistent_local_id: StreetNamePersistentLocalId,
        /// Identifier assigned to the new address.
        address_persistent_local_id: AddressPersistentLocalId,
        /// Postal code.
        postal_code: PostalCode,
        /// House number; for a boxed address this names the parent.
        house_number: HouseNumber,
        /// Box number; presence makes this a boxed proposal.
        box_number: Option<BoxNumber>,
        /// How the position was established.
        geometry_method: GeometryMethod,
        /// What the position points at; optional where the method allows.
        geometry_specification: Option<GeometrySpecification>,
        /// The position itself.
        position: ExtendedWkbGeometry,
        /// Who/when/why.
        provenance: Provenance,
    },

    /// Carry an address over from the legacy registry verbatim.
    MigrateAddress {
        /// The street name.
        street_name_persistent_local_id: StreetNamePersistentLocalId,
        /// The migrated address.
        address_persistent_local_id: AddressPersistentLocalId,
        /// The owning parent address, when boxed.
        parent_address_persistent_local_id: Option<AddressPersistentLocalId>,
        /// Migrated lifecycle status.
        status: AddressStatus,
        /// House number.
        house_number: HouseNumber,
        /// Box number.
        box_number: Option<BoxNumber>,
        /// Postal code, when the legacy record had one.
        postal_code: Option<PostalCode>,
        /// Migrated geometry, taken as-is; legacy data predates the policy.
        geometry: AddressGeometry,
        /// Regularized (true) vs deregulated (false).
        is_officially_assigned: bool,
        /// Whether the legacy record was already removed.
        is_removed: bool,
        /// Who/when/why.
        provenance: Provenance,
    },

    /// Move a proposed address to current.
    ApproveAddress {
        /// The street name.
        street_name_persistent_local_id: StreetNamePersistentLocalId,
        /// The address.
        address_persistent_local_id: AddressPersistentLocalId,
        /// Who/when/why.
        provenance: Provenance,
    },

    /// Reject a proposed address, cascading to its proposed children.
    RejectAddress {
        /// The street name.
        street_name_persistent_local_id: StreetNamePersistentLocalId,
        /// The address.
        address_persistent_local_id: AddressPersistentLocalId,
        /// Who/when/why.
        provenance: Provenance,
    },

    /// Retire a current address, cascading to its current children.
    RetireAddress {
        /// The street name.
        street_name_persistent_local_id: StreetNamePersistentLocalId,
        /// The address.
        address_persistent_local_id: AddressPersistentLocalId,
        /// Who/when/why.
        provenance: Provenance,
    },

    /// Clear the officially-assigned flag.
    DeregulateAddress {
        /// The street name.
        street_name_persistent_local_id: StreetNamePersistentLocalId,
        /// The address.
        address_persistent_local_id: AddressPersistentLocalId,
        /// Who/when/why.
        provenance: Provenance,
    },

    /// Set the officially-assigned flag.
    RegularizeAddress {
        /// The street name.
        street_name_persistent_local_id: StreetNamePersistentLocalId,
        /// The address.
        address_persistent_local_id: AddressPersistentLocalId,
        /// Who/when/why.
        provenance: Provenance,
    },

    /// Change the position of an address.
    ChangeAddressPosition {
        /// The street name.
        street_name_persistent_local_id: StreetNamePersistentLocalId,
        /// The address.
        address_persistent_local_id: AddressPersistentLocalId,
        /// How the new position was established.
        geometry_method: GeometryMethod,
        /// What the new position points at; optional where the method allows.
        geometry_specification: Option<GeometrySpecification>,
        /// The new position.
        position: ExtendedWkbGeometry,
        /// Who/when/why.
        provenance: Provenance,
    },

    /// Undo a retirement, returning the address to current.
    CorrectAddressRetirement {
        /// The street name.
        street_name_persistent_local_id: StreetNamePersistentLocalId,
        /// The address.
        address_persistent_local_id: AddressPersistentLocalId,
        /// Who/when/why.
        provenance: Provenance,
    },
}

impl StreetNameCommand {
    /// The aggregate this command targets.
    #[must_use]
    pub const fn street_name_persistent_local_id(&self) -> StreetNamePersistentLocalId {
        match self {
            Self::ProposeAddress {
                street_name_persistent_local_id,
                ..
            }
            | Self::MigrateAddress {
                street_name_persistent_local_id,
                ..
            }
            | Self::ApproveAddress {
                street_name_persistent_local_id,
                ..
            }
            | Self::RejectAddress {
                street_name_persistent_local_id,
                ..
            }
            | Self::RetireAddress {
                street_name_persistent_local_id,
                ..
            }
            | Self::DeregulateAddress {
                street_name_persistent_local_id,
                ..
            }
            | Self::RegularizeAddress {
                street_name_persistent_local_id,
                ..
            }
            | Self::ChangeAddressPosition {
                street_name_persistent_local_id,
                ..
            }
            | Self::CorrectAddressRetirement {
                street_name_persistent_local_id,
                ..
            } => *street_name_persistent_local_id,
        }
    }

    /// The address this command targets.
    #[must_use]
    pub const fn address_persistent_local_id(&self) -> AddressPersistentLocalId {
        match self {
            Self::ProposeAddress {
                address_persistent_local_id,
                ..
            }
            | Self::MigrateAddress {
                address_persistent_local_id,
                ..
            }
            | Self::ApproveAddress {
                address_persistent_local_id,
                ..
            }
            | Self::RejectAddress {
                address_persistent_local_id,
                ..
            }
            | Self::RetireAddress {
                address_persistent_local_id,
                ..
            }
            | Self::DeregulateAddress {
                address_persistent_local_id,
                ..
            }
            | Self::RegularizeAddress {
                address_persistent_local_id,
                ..
            }
            | Self::ChangeAddressPosition {
                address_persistent_local_id,
                ..
            }
            | Self::CorrectAddressRetirement {
                address_persistent_local_id,
                ..
            } => *address_persistent_local_id,
        }
    }

    /// Short name for tracing.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ProposeAddress { .. } => "ProposeAddress",
            Self::MigrateAddress { .. } => "MigrateAddress",
            Self::ApproveAddress { .. } => "ApproveAddress",
            Self::RejectAddress { .. } => "RejectAddress",
            Self::RetireAddress { .. } => "RetireAddress",
            Self::DeregulateAddress { .. } => "DeregulateAddress",
            Self::RegularizeAddress { .. } => "RegularizeAddress",
            Self::ChangeAddressPosition { .. } => "ChangeAddressPosition",
            Self::CorrectAddressRetirement { .. } => "CorrectAddressRetirement",
        }
    }
}
