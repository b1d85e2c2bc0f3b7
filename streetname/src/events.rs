//! Domain events of the StreetName aggregate.
//!
//! One closed enum, exhaustively matched in the replay fold. The variant set
//! is the schema: adding a variant means bumping its versioned
//! `event_type()` string, and an envelope carrying a type string outside
//! [`KNOWN_EVENT_TYPES`] is fatal schema drift at reconstruction time.
//!
//! Every event carries the provenance it was decided with; provenance
//! participates in the event hash chain, so the resulting ETags are
//! sensitive to every field.

use address_registry_core::event::Event;
use serde::{Deserialize, Serialize};

use crate::geometry::AddressGeometry;
use crate::types::{
    AddressPersistentLocalId, AddressStatus, BoxNumber, HouseNumber, NisCode, PostalCode,
    Provenance, StreetNamePersistentLocalId, StreetNameStatus,
};

/// All facts that can appear in a street-name stream.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum StreetNameEvent {
    /// The street name was imported into the registry; creates the
    /// aggregate.
    StreetNameWasImported {
        /// The street name.
        street_name_persistent_local_id: StreetNamePersistentLocalId,
        /// Municipality reference key.
        nis_code: NisCode,
        /// Imported lifecycle status.
        status: StreetNameStatus,
        /// Who/when/why.
        provenance: Provenance,
    },

    /// The street name was removed (fact owned by the street-name lifecycle;
    /// replayed here as a terminal gate).
    StreetNameWasRemoved {
        /// The street name.
        street_name_persistent_local_id: StreetNamePersistentLocalId,
        /// Who/when/why.
        provenance: Provenance,
    },

    /// A new address was proposed.
    AddressWasProposed {
        /// The street name.
        street_name_persistent_local_id: StreetNamePersistentLocalId,
        /// The new address.
        address_persistent_local_id: AddressPersistentLocalId,
        /// The owning parent address, when this is a boxed address.
        parent_address_persistent_local_id: Option<AddressPersistentLocalId>,
        /// Postal code.
        postal_code: PostalCode,
        /// House number.
        house_number: HouseNumber,
        /// Box number; present exactly when a parent is present.
        box_number: Option<BoxNumber>,
        /// Validated geometry.
        geometry: AddressGeometry,
        /// Who/when/why.
        provenance: Provenance,
    },

    /// An address was carried over from the legacy registry with its full
    /// historical state, removed and rejected addresses included.
    AddressWasMigratedToStreetName {
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
        /// Migrated geometry.
        geometry: AddressGeometry,
        /// Regularized (true) vs deregulated (false).
        is_officially_assigned: bool,
        /// Whether the legacy record was already removed.
        is_removed: bool,
        /// Who/when/why.
        provenance: Provenance,
    },

    /// A proposed address became current.
    AddressWasApproved {
        /// The street name.
        street_name_persistent_local_id: StreetNamePersistentLocalId,
        /// The approved address.
        address_persistent_local_id: AddressPersistentLocalId,
        /// Who/when/why.
        provenance: Provenance,
    },

    /// A proposed address was rejected. Emitted both for the targeted
    /// address and for its proposed children under the reject cascade.
    AddressWasRejected {
        /// The street name.
        street_name_persistent_local_id: StreetNamePersistentLocalId,
        /// The rejected address.
        address_persistent_local_id: AddressPersistentLocalId,
        /// Who/when/why.
        provenance: Provenance,
    },

    /// A current address was retired.
    AddressWasRetired {
        /// The street name.
        street_name_persistent_local_id: StreetNamePersistentLocalId,
        /// The retired address.
        address_persistent_local_id: AddressPersistentLocalId,
        /// Who/when/why.
        provenance: Provenance,
    },

    /// A current child address was retired because its parent (the
    /// house-number address) was retired. Distinct tag so projections can
    /// tell direct retirement from cascade.
    AddressWasRetiredBecauseHouseNumberWasRetired {
        /// The street name.
        street_name_persistent_local_id: StreetNamePersistentLocalId,
        /// The retired child address.
        address_persistent_local_id: AddressPersistentLocalId,
        /// Who/when/why.
        provenance: Provenance,
    },

    /// An address lost its officially-assigned flag.
    AddressWasDeregulated {
        /// The street name.
        street_name_persistent_local_id: StreetNamePersistentLocalId,
        /// The deregulated address.
        address_persistent_local_id: AddressPersistentLocalId,
        /// Who/when/why.
        provenance: Provenance,
    },

    /// An address regained its officially-assigned flag.
    AddressWasRegularized {
        /// The street name.
        street_name_persistent_local_id: StreetNamePersistentLocalId,
        /// The regularized address.
        address_persistent_local_id: AddressPersistentLocalId,
        /// Who/when/why.
        provenance: Provenance,
    },

    /// The position of an address was changed.
    AddressPositionWasChanged {
        /// The street name.
        street_name_persistent_local_id: StreetNamePersistentLocalId,
        /// The moved address.
        address_persistent_local_id: AddressPersistentLocalId,
        /// The new, validated geometry.
        geometry: AddressGeometry,
        /// Who/when/why.
        provenance: Provenance,
    },

    /// A retirement was undone; the address is current again.
    AddressRetirementWasCorrected {
        /// The street name.
        street_name_persistent_local_id: StreetNamePersistentLocalId,
        /// The corrected address.
        address_persistent_local_id: AddressPersistentLocalId,
        /// Who/when/why.
        provenance: Provenance,
    },
}

/// Every event type string this build can replay.
pub const KNOWN_EVENT_TYPES: &[&str] = &[
    "StreetNameWasImported.v1",
    "StreetNameWasRemoved.v1",
    "AddressWasProposed.v2",
    "AddressWasMigratedToStreetName.v1",
    "AddressWasApproved.v1",
    "AddressWasRejected.v1",
    "AddressWasRetired.v2",
    "AddressWasRetiredBecauseHouseNumberWasRetired.v1",
    "AddressWasDeregulated.v1",
    "AddressWasRegularized.v1",
    "AddressPositionWasChanged.v1",
    "AddressRetirementWasCorrected.v1",
];

/// Whether this build knows how to replay the given event type.
#[must_use]
pub fn is_known_event_type(event_type: &str) -> bool {
    KNOWN_EVENT_TYPES.contains(&event_type)
}

impl StreetNameEvent {
    /// The address this event belongs to, if any.
    ///
    /// Routes the event into the per-address hash chain; street-level facts
    /// return `None` and do not participate in address ETags.
    #[must_use]
    pub const fn address_persistent_local_id(&self) -> Option<AddressPersistentLocalId> {
        match self {
            Self::StreetNameWasImported { .. } | Self::StreetNameWasRemoved { .. } => None,
            Self::AddressWasProposed {
                address_persistent_local_id,
                ..
            }
            | Self::AddressWasMigratedToStreetName {
                address_persistent_local_id,
                ..
            }
            | Self::AddressWasApproved {
                address_persistent_local_id,
                ..
            }
            | Self::AddressWasRejected {
                address_persistent_local_id,
                ..
            }
            | Self::AddressWasRetired {
                address_persistent_local_id,
                ..
            }
            | Self::AddressWasRetiredBecauseHouseNumberWasRetired {
                address_persistent_local_id,
                ..
            }
            | Self::AddressWasDeregulated {
                address_persistent_local_id,
                ..
            }
            | Self::AddressWasRegularized {
                address_persistent_local_id,
                ..
            }
            | Self::AddressPositionWasChanged {
                address_persistent_local_id,
                ..
            }
            | Self::AddressRetirementWasCorrected {
                address_persistent_local_id,
                ..
            } => Some(*address_persistent_local_id),
        }
    }

    /// The provenance stamped into this event.
    #[must_use]
    pub const fn provenance(&self) -> &Provenance {
        match self {
            Self::StreetNameWasImported { provenance, .. }
            | Self::StreetNameWasRemoved { provenance, .. }
            | Self::AddressWasProposed { provenance, .. }
            | Self::AddressWasMigratedToStreetName { provenance, .. }
            | Self::AddressWasApproved { provenance, .. }
            | Self::AddressWasRejected { provenance, .. }
            | Self::AddressWasRetired { provenance, .. }
            | Self::AddressWasRetiredBecauseHouseNumberWasRetired { provenance, .. }
            | Self::AddressWasDeregulated { provenance, .. }
            | Self::AddressWasRegularized { provenance, .. }
            | Self::AddressPositionWasChanged { provenance, .. }
            | Self::AddressRetirementWasCorrected { provenance, .. } => provenance,
        }
    }

    /// The fields contributing to this event's hash, in a stable order.
    ///
    /// Mirrors the registry's hash protocol: provenance fields first, then
    /// identifiers, then the payload. Any field change alters the hash and
    /// thereby every subsequent hash in the chain.
    #[must_use]
    pub fn hash_fields(&self) -> Vec<String> {
        let provenance = self.provenance();
        let mut fields = vec![
            self.event_type().to_string(),
            provenance.timestamp.to_rfc3339(),
            provenance.application.clone(),
            format!("{:?}", provenance.modification),
            provenance.organisation.clone(),
            provenance.reason.clone(),
        ];

        match self {
            Self::StreetNameWasImported {
                street_name_persistent_local_id,
                nis_code,
                status,
                ..
            } => {
                fields.push(street_name_persistent_local_id.to_string());
                fields.push(nis_code.to_string());
                fields.push(format!("{status:?}"));
            }
            Self::StreetNameWasRemoved {
                street_name_persistent_local_id,
                ..
            } => {
                fields.push(street_name_persistent_local_id.to_string());
            }
            Self::AddressWasProposed {
                street_name_persistent_local_id,
                address_persistent_local_id,
                parent_address_persistent_local_id,
                postal_code,
                house_number,
                box_number,
                geometry,
                ..
            } => {
                fields.push(street_name_persistent_local_id.to_string());
                fields.push(address_persistent_local_id.to_string());
                fields.push(opt_string(parent_address_persistent_local_id.as_ref()));
                fields.push(postal_code.to_string());
                fields.push(house_number.to_string());
                fields.push(opt_string(box_number.as_ref()));
                push_geometry_fields(&mut fields, geometry);
            }
            Self::AddressWasMigratedToStreetName {
                street_name_persistent_local_id,
                address_persistent_local_id,
                parent_address_persistent_local_id,
                status,
                house_number,
                box_number,
                postal_code,
                geometry,
                is_officially_assigned,
                is_removed,
                ..
            } => {
                fields.push(street_name_persistent_local_id.to_string());
                fields.push(address_persistent_local_id.to_string());
                fields.push(opt_string(parent_address_persistent_local_id.as_ref()));
                fields.push(format!("{status:?}"));
                fields.push(house_number.to_string());
                fields.push(opt_string(box_number.as_ref()));
                fields.push(opt_string(postal_code.as_ref()));
                push_geometry_fields(&mut fields, geometry);
                fields.push(is_officially_assigned.to_string());
                fields.push(is_removed.to_string());
            }
            Self::AddressWasApproved {
                street_name_persistent_local_id,
                address_persistent_local_id,
                ..
            }
            | Self::AddressWasRejected {
                street_name_persistent_local_id,
                address_persistent_local_id,
                ..
            }
            | Self::AddressWasRetired {
                street_name_persistent_local_id,
                address_persistent_local_id,
                ..
            }
            | Self::AddressWasRetiredBecauseHouseNumberWasRetired {
                street_name_persistent_local_id,
                address_persistent_local_id,
                ..
            }
            | Self::AddressWasDeregulated {
                street_name_persistent_local_id,
                address_persistent_local_id,
                ..
            }
            | Self::AddressWasRegularized {
                street_name_persistent_local_id,
                address_persistent_local_id,
                ..
            }
            | Self::AddressRetirementWasCorrected {
                street_name_persistent_local_id,
                address_persistent_local_id,
                ..
            } => {
                fields.push(street_name_persistent_local_id.to_string());
                fields.push(address_persistent_local_id.to_string());
            }
            Self::AddressPositionWasChanged {
                street_name_persistent_local_id,
                address_persistent_local_id,
                geometry,
                ..
            } => {
                fields.push(street_name_persistent_local_id.to_string());
                fields.push(address_persistent_local_id.to_string());
                push_geometry_fields(&mut fields, geometry);
            }
        }

        fields
    }
}

fn opt_string<T: ToString>(value: Option<&T>) -> String {
    value.map_or_else(String::new, ToString::to_string)
}

fn push_geometry_fields(fields: &mut Vec<String>, geometry: &AddressGeometry) {
    fields.push(geometry.method.to_string());
    fields.push(geometry.specification.to_string());
    let mut hex = String::with_capacity(geometry.position.as_bytes().len() * 2);
    for byte in geometry.position.as_bytes() {
        use std::fmt::Write as _;
        let _ = write!(hex, "{byte:02x}");
    }
    fields.push(hex);
}

impl Event for StreetNameEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::StreetNameWasImported { .. } => "StreetNameWasImported.v1",
            Self::StreetNameWasRemoved { .. } => "StreetNameWasRemoved.v1",
            Self::AddressWasProposed { .. } => "AddressWasProposed.v2",
            Self::AddressWasMigratedToStreetName { .. } => "AddressWasMigratedToStreetName.v1",
            Self::AddressWasApproved { .. } => "AddressWasApproved.v1",
            Self::AddressWasRejected { .. } => "AddressWasRejected.v1",
            Self::AddressWasRetired { .. } => "AddressWasRetired.v2",
            Self::AddressWasRetiredBecauseHouseNumberWasRetired { .. } => {
                "AddressWasRetiredBecauseHouseNumberWasRetired.v1"
            }
            Self::AddressWasDeregulated { .. } => "AddressWasDeregulated.v1",
            Self::AddressWasRegularized { .. } => "AddressWasRegularized.v1",
            Self::AddressPositionWasChanged { .. } => "AddressPositionWasChanged.v1",
            Self::AddressRetirementWasCorrected { .. } => "AddressRetirementWasCorrected.v1",
        }
    }
}
