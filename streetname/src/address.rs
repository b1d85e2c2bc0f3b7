//! The address entity inside a street-name aggregate.

use serde::{Deserialize, Serialize};

use crate::geometry::AddressGeometry;
use crate::types::{
    AddressPersistentLocalId, AddressStatus, BoxNumber, HouseNumber, PostalCode,
};

/// One address under a street name.
///
/// Removed addresses stay in the table with `is_removed` set; their identity
/// and hash chain remain reachable but every operation on them fails.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StreetNameAddress {
    /// Stable registry identifier.
    pub address_persistent_local_id: AddressPersistentLocalId,
    /// The owning house-number address, when this is a boxed address.
    pub parent_address_persistent_local_id: Option<AddressPersistentLocalId>,
    /// Lifecycle status.
    pub status: AddressStatus,
    /// House number.
    pub house_number: HouseNumber,
    /// Box number; present exactly when a parent is present.
    pub box_number: Option<BoxNumber>,
    /// Postal code; absent only on some migrated legacy records.
    pub postal_code: Option<PostalCode>,
    /// Current position.
    pub geometry: AddressGeometry,
    /// Regularized (true) vs deregulated (false).
    pub is_officially_assigned: bool,
    /// Soft-removal marker.
    pub is_removed: bool,
}

impl StreetNameAddress {
    /// Whether this is a house-number (parent-capable) address.
    #[must_use]
    pub const fn is_house_number_address(&self) -> bool {
        self.parent_address_persistent_local_id.is_none()
    }

    /// Whether this is a boxed (child) address.
    #[must_use]
    pub const fn is_box_number_address(&self) -> bool {
        self.parent_address_persistent_local_id.is_some()
    }

    /// Whether the address participates in cascades and uniqueness checks.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !self.is_removed
            && matches!(self.status, AddressStatus::Proposed | AddressStatus::Current)
    }
}
