//! Aggregate snapshots.
//!
//! A snapshot is a bincode image of the full aggregate state at a stream
//! version, per-address hash chains included. Restoring a snapshot at
//! version V and applying the tail after V must equal replaying the whole
//! stream from empty; anything the fold maintains therefore has to be in
//! here.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::address::StreetNameAddress;
use crate::error::ReplayError;
use crate::hash::EventHash;
use crate::types::{AddressPersistentLocalId, NisCode, StreetNamePersistentLocalId, StreetNameStatus};

/// Serialized image of a [`StreetName`](crate::StreetName) at one version.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StreetNameSnapshot {
    /// The street name.
    pub street_name_persistent_local_id: StreetNamePersistentLocalId,
    /// Street-name lifecycle status.
    pub status: StreetNameStatus,
    /// Municipality reference key.
    pub nis_code: NisCode,
    /// Soft-removal marker.
    pub is_removed: bool,
    /// All addresses, removed ones included.
    pub addresses: BTreeMap<AddressPersistentLocalId, StreetNameAddress>,
    /// Last hash-chain link per address.
    pub last_event_hashes: BTreeMap<AddressPersistentLocalId, EventHash>,
}

impl StreetNameSnapshot {
    /// Serialize for the store's snapshot slot.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::CorruptSnapshot`] when bincode fails, which
    /// only happens under resource exhaustion.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ReplayError> {
        bincode::serialize(self).map_err(|e| ReplayError::CorruptSnapshot(e.to_string()))
    }

    /// Deserialize from the store's snapshot slot.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::CorruptSnapshot`] when the bytes do not decode
    /// as a snapshot of this schema.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ReplayError> {
        bincode::deserialize(bytes).map_err(|e| ReplayError::CorruptSnapshot(e.to_string()))
    }
}
