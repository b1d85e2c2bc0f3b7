//! The StreetName aggregate: pure decide/apply state machine.
//!
//! `decide` validates a command against the current state and returns the
//! events to append, without mutating anything. `apply` folds one event into
//! the state and maintains the per-address hash chains. Neither reads a
//! clock, draws randomness, or performs I/O, so replaying the same stream
//! always reconstructs bit-identical state and identical ETags.

use std::collections::BTreeMap;

use address_registry_core::event::{Event, SerializedEvent};
use address_registry_core::stream::Version;
use smallvec::{smallvec, SmallVec};

use crate::address::StreetNameAddress;
use crate::commands::StreetNameCommand;
use crate::error::{ReplayError, StreetNameError};
use crate::events::{is_known_event_type, StreetNameEvent};
use crate::geometry::{
    validate_geometry, AddressGeometry, ExtendedWkbGeometry, GeometryMethod, GeometrySpecification,
};
use crate::hash::EventHash;
use crate::municipality::Municipalities;
use crate::snapshot::StreetNameSnapshot;
use crate::types::{
    AddressPersistentLocalId, AddressStatus, BoxNumber, HouseNumber, NisCode, PostalCode,
    Provenance, StreetNamePersistentLocalId, StreetNameStatus,
};

/// Events produced by one `decide`; most commands emit zero or one, cascades
/// spill past the inline capacity.
pub type EmittedEvents = SmallVec<[StreetNameEvent; 4]>;

/// A street name with its addresses, rebuilt from its event stream.
#[derive(Clone, Debug, PartialEq)]
pub struct StreetName {
    street_name_persistent_local_id: StreetNamePersistentLocalId,
    status: StreetNameStatus,
    nis_code: NisCode,
    is_removed: bool,
    // BTreeMap so cascades and lookups iterate in id order, keeping the
    // emitted event order deterministic across replays.
    addresses: BTreeMap<AddressPersistentLocalId, StreetNameAddress>,
    last_event_hashes: BTreeMap<AddressPersistentLocalId, EventHash>,
}

impl StreetName {
    /// The street name's identifier.
    #[must_use]
    pub const fn street_name_persistent_local_id(&self) -> StreetNamePersistentLocalId {
        self.street_name_persistent_local_id
    }

    /// The street name's lifecycle status.
    #[must_use]
    pub const fn status(&self) -> StreetNameStatus {
        self.status
    }

    /// Municipality reference key.
    #[must_use]
    pub const fn nis_code(&self) -> &NisCode {
        &self.nis_code
    }

    /// Whether the street name is removed.
    #[must_use]
    pub const fn is_removed(&self) -> bool {
        self.is_removed
    }

    /// Look up one address.
    #[must_use]
    pub fn address(&self, id: AddressPersistentLocalId) -> Option<&StreetNameAddress> {
        self.addresses.get(&id)
    }

    /// All addresses in id order, removed ones included.
    pub fn addresses(&self) -> impl Iterator<Item = &StreetNameAddress> {
        self.addresses.values()
    }

    /// The last hash-chain link of an address, hex-rendered as its ETag.
    #[must_use]
    pub fn last_event_hash(&self, id: AddressPersistentLocalId) -> Option<&EventHash> {
        self.last_event_hashes.get(&id)
    }

    /// Validate `command` against the current state and produce the events
    /// to append. Pure: `self` is not mutated, and a failure means nothing
    /// was emitted.
    ///
    /// # Errors
    ///
    /// Returns the [`StreetNameError`] naming the violated precondition.
    pub fn decide(
        &self,
        command: &StreetNameCommand,
        municipalities: &dyn Municipalities,
    ) -> Result<EmittedEvents, StreetNameError> {
        if self.is_removed {
            return Err(StreetNameError::StreetNameIsRemoved(
                self.street_name_persistent_local_id,
            ));
        }

        match command {
            StreetNameCommand::ProposeAddress {
                address_persistent_local_id,
                postal_code,
                house_number,
                box_number,
                geometry_method,
                geometry_specification,
                position,
                provenance,
                ..
            } => self.propose(
                *address_persistent_local_id,
                postal_code,
                house_number,
                box_number.as_ref(),
                *geometry_method,
                *geometry_specification,
                position,
                provenance,
                municipalities,
            ),
            StreetNameCommand::MigrateAddress {
                address_persistent_local_id,
                parent_address_persistent_local_id,
                status,
                house_number,
                box_number,
                postal_code,
                geometry,
                is_officially_assigned,
                is_removed,
                provenance,
                ..
            } => self.migrate(
                *address_persistent_local_id,
                *parent_address_persistent_local_id,
                *status,
                house_number,
                box_number.as_ref(),
                postal_code.as_ref(),
                geometry,
                *is_officially_assigned,
                *is_removed,
                provenance,
            ),
            StreetNameCommand::ApproveAddress {
                address_persistent_local_id,
                provenance,
                ..
            } => self.approve(*address_persistent_local_id, provenance),
            StreetNameCommand::RejectAddress {
                address_persistent_local_id,
                provenance,
                ..
            } => self.reject(*address_persistent_local_id, provenance),
            StreetNameCommand::RetireAddress {
                address_persistent_local_id,
                provenance,
                ..
            } => self.retire(*address_persistent_local_id, provenance),
            StreetNameCommand::DeregulateAddress {
                address_persistent_local_id,
                provenance,
                ..
            } => self.deregulate(*address_persistent_local_id, provenance),
            StreetNameCommand::RegularizeAddress {
                address_persistent_local_id,
                provenance,
                ..
            } => self.regularize(*address_persistent_local_id, provenance),
            StreetNameCommand::ChangeAddressPosition {
                address_persistent_local_id,
                geometry_method,
                geometry_specification,
                position,
                provenance,
                ..
            } => self.change_position(
                *address_persistent_local_id,
                *geometry_method,
                *geometry_specification,
                position,
                provenance,
                municipalities,
            ),
            StreetNameCommand::CorrectAddressRetirement {
                address_persistent_local_id,
                provenance,
                ..
            } => self.correct_retirement(*address_persistent_local_id, provenance),
        }
    }

    /// Fold one event into the state and advance its address's hash chain.
    pub fn apply(&mut self, event: &StreetNameEvent) {
        match event {
            StreetNameEvent::StreetNameWasImported {
                street_name_persistent_local_id,
                nis_code,
                status,
                ..
            } => {
                self.street_name_persistent_local_id = *street_name_persistent_local_id;
                self.nis_code = nis_code.clone();
                self.status = *status;
                self.is_removed = false;
            }
            StreetNameEvent::StreetNameWasRemoved { .. } => {
                self.is_removed = true;
            }
            StreetNameEvent::AddressWasProposed {
                address_persistent_local_id,
                parent_address_persistent_local_id,
                postal_code,
                house_number,
                box_number,
                geometry,
                ..
            } => {
                self.addresses.insert(
                    *address_persistent_local_id,
                    StreetNameAddress {
                        address_persistent_local_id: *address_persistent_local_id,
                        parent_address_persistent_local_id: *parent_address_persistent_local_id,
                        status: AddressStatus::Proposed,
                        house_number: house_number.clone(),
                        box_number: box_number.clone(),
                        postal_code: Some(postal_code.clone()),
                        geometry: geometry.clone(),
                        is_officially_assigned: true,
                        is_removed: false,
                    },
                );
            }
            StreetNameEvent::AddressWasMigratedToStreetName {
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
                self.addresses.insert(
                    *address_persistent_local_id,
                    StreetNameAddress {
                        address_persistent_local_id: *address_persistent_local_id,
                        parent_address_persistent_local_id: *parent_address_persistent_local_id,
                        status: *status,
                        house_number: house_number.clone(),
                        box_number: box_number.clone(),
                        postal_code: postal_code.clone(),
                        geometry: geometry.clone(),
                        is_officially_assigned: *is_officially_assigned,
                        is_removed: *is_removed,
                    },
                );
            }
            StreetNameEvent::AddressWasApproved {
                address_persistent_local_id,
                ..
            }
            | StreetNameEvent::AddressRetirementWasCorrected {
                address_persistent_local_id,
                ..
            } => {
                self.set_status(*address_persistent_local_id, AddressStatus::Current);
            }
            StreetNameEvent::AddressWasRejected {
                address_persistent_local_id,
                ..
            } => {
                self.set_status(*address_persistent_local_id, AddressStatus::Rejected);
            }
            StreetNameEvent::AddressWasRetired {
                address_persistent_local_id,
                ..
            }
            | StreetNameEvent::AddressWasRetiredBecauseHouseNumberWasRetired {
                address_persistent_local_id,
                ..
            } => {
                self.set_status(*address_persistent_local_id, AddressStatus::Retired);
            }
            StreetNameEvent::AddressWasDeregulated {
                address_persistent_local_id,
                ..
            } => {
                if let Some(address) = self.addresses.get_mut(address_persistent_local_id) {
                    address.is_officially_assigned = false;
                }
            }
            StreetNameEvent::AddressWasRegularized {
                address_persistent_local_id,
                ..
            } => {
                if let Some(address) = self.addresses.get_mut(address_persistent_local_id) {
                    address.is_officially_assigned = true;
                }
            }
            StreetNameEvent::AddressPositionWasChanged {
                address_persistent_local_id,
                geometry,
                ..
            } => {
                if let Some(address) = self.addresses.get_mut(address_persistent_local_id) {
                    address.geometry = geometry.clone();
                }
            }
        }

        if let Some(address_id) = event.address_persistent_local_id() {
            let previous = self
                .last_event_hashes
                .get(&address_id)
                .cloned()
                .unwrap_or_else(EventHash::seed);
            self.last_event_hashes.insert(address_id, previous.next(event));
        }
    }

    /// Rebuild a street name from an optional snapshot plus the event tail.
    ///
    /// Returns the state together with the version of the last event folded
    /// in. Pure: the same inputs always reconstruct the same state.
    ///
    /// # Errors
    ///
    /// - [`ReplayError::UnknownEventType`] when the tail carries an event
    ///   type this build does not know. Fatal by design: skipping it would
    ///   silently corrupt state.
    /// - [`ReplayError::CorruptEvent`] when a payload fails to decode or the
    ///   stream does not begin with an import.
    /// - [`ReplayError::EmptyStream`] when there is nothing to replay.
    pub fn replay(
        snapshot: Option<(StreetNameSnapshot, Version)>,
        tail: &[SerializedEvent],
    ) -> Result<(Self, Version), ReplayError> {
        let mut restored = snapshot.map(|(image, version)| (Self::from(image), version));

        for envelope in tail {
            if !is_known_event_type(&envelope.event_type) {
                return Err(ReplayError::UnknownEventType(envelope.event_type.clone()));
            }
            let event = StreetNameEvent::from_bytes(&envelope.data).map_err(|source| {
                ReplayError::CorruptEvent {
                    event_type: envelope.event_type.clone(),
                    message: source.to_string(),
                }
            })?;
            if event.event_type() != envelope.event_type {
                return Err(ReplayError::CorruptEvent {
                    event_type: envelope.event_type.clone(),
                    message: format!("payload decodes as '{}'", event.event_type()),
                });
            }

            match &mut restored {
                None => {
                    if let StreetNameEvent::StreetNameWasImported {
                        street_name_persistent_local_id,
                        nis_code,
                        status,
                        ..
                    } = &event
                    {
                        restored = Some((
                            Self {
                                street_name_persistent_local_id: *street_name_persistent_local_id,
                                status: *status,
                                nis_code: nis_code.clone(),
                                is_removed: false,
                                addresses: BTreeMap::new(),
                                last_event_hashes: BTreeMap::new(),
                            },
                            Version::INITIAL,
                        ));
                    } else {
                        return Err(ReplayError::CorruptEvent {
                            event_type: envelope.event_type.clone(),
                            message: "stream does not begin with StreetNameWasImported".to_string(),
                        });
                    }
                }
                Some((state, version)) => {
                    state.apply(&event);
                    *version = version.next();
                }
            }
        }

        restored.ok_or(ReplayError::EmptyStream)
    }

    /// Capture the full state for the store's snapshot slot.
    #[must_use]
    pub fn snapshot(&self) -> StreetNameSnapshot {
        StreetNameSnapshot {
            street_name_persistent_local_id: self.street_name_persistent_local_id,
            status: self.status,
            nis_code: self.nis_code.clone(),
            is_removed: self.is_removed,
            addresses: self.addresses.clone(),
            last_event_hashes: self.last_event_hashes.clone(),
        }
    }

    fn set_status(&mut self, id: AddressPersistentLocalId, status: AddressStatus) {
        if let Some(address) = self.addresses.get_mut(&id) {
            address.status = status;
        }
    }

    fn require_address(
        &self,
        id: AddressPersistentLocalId,
    ) -> Result<&StreetNameAddress, StreetNameError> {
        let address = self
            .addresses
            .get(&id)
            .ok_or(StreetNameError::AddressNotFound(id))?;
        if address.is_removed {
            return Err(StreetNameError::AddressIsRemoved(id));
        }
        Ok(address)
    }

    fn children_of(
        &self,
        parent: AddressPersistentLocalId,
    ) -> impl Iterator<Item = &StreetNameAddress> {
        self.addresses
            .values()
            .filter(move |a| a.parent_address_persistent_local_id == Some(parent))
    }

    fn resolve_geometry(
        &self,
        method: GeometryMethod,
        specification: Option<GeometrySpecification>,
        position: &ExtendedWkbGeometry,
        municipalities: &dyn Municipalities,
    ) -> Result<AddressGeometry, StreetNameError> {
        let specification = validate_geometry(method, specification)?;
        if specification == GeometrySpecification::Municipality
            && municipalities.get(&self.nis_code).is_none()
        {
            return Err(StreetNameError::MunicipalityUnknown(self.nis_code.clone()));
        }
        Ok(AddressGeometry {
            method,
            specification,
            position: position.clone(),
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn propose(
        &self,
        address_persistent_local_id: AddressPersistentLocalId,
        postal_code: &PostalCode,
        house_number: &HouseNumber,
        box_number: Option<&BoxNumber>,
        geometry_method: GeometryMethod,
        geometry_specification: Option<GeometrySpecification>,
        position: &ExtendedWkbGeometry,
        provenance: &Provenance,
        municipalities: &dyn Municipalities,
    ) -> Result<EmittedEvents, StreetNameError> {
        if !self.status.is_active() {
            return Err(StreetNameError::StreetNameNotActive {
                id: self.street_name_persistent_local_id,
                status: self.status,
            });
        }

        let geometry =
            self.resolve_geometry(geometry_method, geometry_specification, position, municipalities)?;

        if let Some(existing) = self.addresses.get(&address_persistent_local_id) {
            // Re-dispatch of an already applied proposal resolves to a
            // no-op; the same id with any other payload is a conflict.
            let identical = !existing.is_removed
                && existing.status == AddressStatus::Proposed
                && existing.house_number == *house_number
                && existing.box_number.as_ref() == box_number
                && existing.postal_code.as_ref() == Some(postal_code)
                && existing.geometry == geometry;
            if identical {
                return Ok(smallvec![]);
            }
            return Err(StreetNameError::AddressAlreadyExists(
                address_persistent_local_id,
            ));
        }

        let parent_address_persistent_local_id = match box_number {
            None => {
                let taken = self.addresses.values().any(|a| {
                    a.is_house_number_address() && a.is_active() && a.house_number == *house_number
                });
                if taken {
                    return Err(StreetNameError::ParentAddressAlreadyExists(
                        house_number.clone(),
                    ));
                }
                None
            }
            Some(box_number) => {
                let parent = self.find_parent(house_number)?;
                let duplicate = self.children_of(parent.address_persistent_local_id).any(|a| {
                    a.is_active() && a.box_number.as_ref() == Some(box_number)
                });
                if duplicate {
                    return Err(StreetNameError::DuplicateBoxNumber(box_number.clone()));
                }
                Some(parent.address_persistent_local_id)
            }
        };

        Ok(smallvec![StreetNameEvent::AddressWasProposed {
            street_name_persistent_local_id: self.street_name_persistent_local_id,
            address_persistent_local_id,
            parent_address_persistent_local_id,
            postal_code: postal_code.clone(),
            house_number: house_number.clone(),
            box_number: box_number.cloned(),
            geometry,
            provenance: provenance.clone(),
        }])
    }

    fn find_parent(
        &self,
        house_number: &HouseNumber,
    ) -> Result<&StreetNameAddress, StreetNameError> {
        let mut inactive = None;
        for candidate in self.addresses.values() {
            if !candidate.is_house_number_address()
                || candidate.is_removed
                || candidate.house_number != *house_number
            {
                continue;
            }
            if candidate.is_active() {
                return Ok(candidate);
            }
            inactive.get_or_insert(candidate);
        }
        match inactive {
            Some(candidate) => Err(StreetNameError::ParentAddressNotActive {
                id: candidate.address_persistent_local_id,
                status: candidate.status,
            }),
            None => Err(StreetNameError::ParentAddressNotFound(house_number.clone())),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn migrate(
        &self,
        address_persistent_local_id: AddressPersistentLocalId,
        parent_address_persistent_local_id: Option<AddressPersistentLocalId>,
        status: AddressStatus,
        house_number: &HouseNumber,
        box_number: Option<&BoxNumber>,
        postal_code: Option<&PostalCode>,
        geometry: &AddressGeometry,
        is_officially_assigned: bool,
        is_removed: bool,
        provenance: &Provenance,
    ) -> Result<EmittedEvents, StreetNameError> {
        match (parent_address_persistent_local_id, box_number) {
            (Some(_), None) => return Err(StreetNameError::BoxNumberRequired),
            (None, Some(_)) => {
                return Err(StreetNameError::ParentAddressNotFound(house_number.clone()))
            }
            _ => {}
        }
        if let Some(parent_id) = parent_address_persistent_local_id {
            // Legacy parents may be in any status, but they must exist.
            if !self.addresses.contains_key(&parent_id) {
                return Err(StreetNameError::AddressNotFound(parent_id));
            }
        }

        if let Some(existing) = self.addresses.get(&address_persistent_local_id) {
            let identical = existing.parent_address_persistent_local_id
                == parent_address_persistent_local_id
                && existing.status == status
                && existing.house_number == *house_number
                && existing.box_number.as_ref() == box_number
                && existing.postal_code.as_ref() == postal_code
                && existing.geometry == *geometry
                && existing.is_officially_assigned == is_officially_assigned
                && existing.is_removed == is_removed;
            if identical {
                return Ok(smallvec![]);
            }
            return Err(StreetNameError::AddressAlreadyExists(
                address_persistent_local_id,
            ));
        }

        Ok(smallvec![StreetNameEvent::AddressWasMigratedToStreetName {
            street_name_persistent_local_id: self.street_name_persistent_local_id,
            address_persistent_local_id,
            parent_address_persistent_local_id,
            status,
            house_number: house_number.clone(),
            box_number: box_number.cloned(),
            postal_code: postal_code.cloned(),
            geometry: geometry.clone(),
            is_officially_assigned,
            is_removed,
            provenance: provenance.clone(),
        }])
    }

    fn approve(
        &self,
        id: AddressPersistentLocalId,
        provenance: &Provenance,
    ) -> Result<EmittedEvents, StreetNameError> {
        let address = self.require_address(id)?;
        match address.status {
            AddressStatus::Current => Ok(smallvec![]),
            AddressStatus::Proposed => Ok(smallvec![StreetNameEvent::AddressWasApproved {
                street_name_persistent_local_id: self.street_name_persistent_local_id,
                address_persistent_local_id: id,
                provenance: provenance.clone(),
            }]),
            status @ (AddressStatus::Retired | AddressStatus::Rejected) => {
                Err(StreetNameError::InvalidStatus {
                    operation: "ApproveAddress",
                    status,
                })
            }
        }
    }

    fn reject(
        &self,
        id: AddressPersistentLocalId,
        provenance: &Provenance,
    ) -> Result<EmittedEvents, StreetNameError> {
        let address = self.require_address(id)?;
        match address.status {
            AddressStatus::Rejected => Ok(smallvec![]),
            status @ (AddressStatus::Current | AddressStatus::Retired) => {
                Err(StreetNameError::InvalidStatus {
                    operation: "RejectAddress",
                    status,
                })
            }
            AddressStatus::Proposed => {
                let mut events: EmittedEvents = smallvec![StreetNameEvent::AddressWasRejected {
                    street_name_persistent_local_id: self.street_name_persistent_local_id,
                    address_persistent_local_id: id,
                    provenance: provenance.clone(),
                }];
                for child in self.children_of(id) {
                    if !child.is_removed && child.status == AddressStatus::Proposed {
                        events.push(StreetNameEvent::AddressWasRejected {
                            street_name_persistent_local_id: self.street_name_persistent_local_id,
                            address_persistent_local_id: child.address_persistent_local_id,
                            provenance: provenance.clone(),
                        });
                    }
                }
                Ok(events)
            }
        }
    }

    fn retire(
        &self,
        id: AddressPersistentLocalId,
        provenance: &Provenance,
    ) -> Result<EmittedEvents, StreetNameError> {
        let address = self.require_address(id)?;
        match address.status {
            AddressStatus::Retired => Ok(smallvec![]),
            status @ (AddressStatus::Proposed | AddressStatus::Rejected) => {
                Err(StreetNameError::InvalidStatus {
                    operation: "RetireAddress",
                    status,
                })
            }
            AddressStatus::Current => {
                let mut events: EmittedEvents = smallvec![StreetNameEvent::AddressWasRetired {
                    street_name_persistent_local_id: self.street_name_persistent_local_id,
                    address_persistent_local_id: id,
                    provenance: provenance.clone(),
                }];
                for child in self.children_of(id) {
                    if !child.is_removed && child.status == AddressStatus::Current {
                        events.push(
                            StreetNameEvent::AddressWasRetiredBecauseHouseNumberWasRetired {
                                street_name_persistent_local_id: self
                                    .street_name_persistent_local_id,
                                address_persistent_local_id: child.address_persistent_local_id,
                                provenance: provenance.clone(),
                            },
                        );
                    }
                }
                Ok(events)
            }
        }
    }

    fn deregulate(
        &self,
        id: AddressPersistentLocalId,
        provenance: &Provenance,
    ) -> Result<EmittedEvents, StreetNameError> {
        let address = self.require_address(id)?;
        match address.status {
            AddressStatus::Proposed | AddressStatus::Current => {
                if address.is_officially_assigned {
                    Ok(smallvec![StreetNameEvent::AddressWasDeregulated {
                        street_name_persistent_local_id: self.street_name_persistent_local_id,
                        address_persistent_local_id: id,
                        provenance: provenance.clone(),
                    }])
                } else {
                    Ok(smallvec![])
                }
            }
            status @ (AddressStatus::Retired | AddressStatus::Rejected) => {
                Err(StreetNameError::InvalidStatus {
                    operation: "DeregulateAddress",
                    status,
                })
            }
        }
    }

    fn regularize(
        &self,
        id: AddressPersistentLocalId,
        provenance: &Provenance,
    ) -> Result<EmittedEvents, StreetNameError> {
        let address = self.require_address(id)?;
        match address.status {
            AddressStatus::Proposed | AddressStatus::Current => {
                if address.is_officially_assigned {
                    Ok(smallvec![])
                } else {
                    Ok(smallvec![StreetNameEvent::AddressWasRegularized {
                        street_name_persistent_local_id: self.street_name_persistent_local_id,
                        address_persistent_local_id: id,
                        provenance: provenance.clone(),
                    }])
                }
            }
            status @ (AddressStatus::Retired | AddressStatus::Rejected) => {
                Err(StreetNameError::InvalidStatus {
                    operation: "RegularizeAddress",
                    status,
                })
            }
        }
    }

    fn change_position(
        &self,
        id: AddressPersistentLocalId,
        geometry_method: GeometryMethod,
        geometry_specification: Option<GeometrySpecification>,
        position: &ExtendedWkbGeometry,
        provenance: &Provenance,
        municipalities: &dyn Municipalities,
    ) -> Result<EmittedEvents, StreetNameError> {
        let address = self.require_address(id)?;
        let geometry =
            self.resolve_geometry(geometry_method, geometry_specification, position, municipalities)?;
        if address.geometry == geometry {
            return Ok(smallvec![]);
        }
        Ok(smallvec![StreetNameEvent::AddressPositionWasChanged {
            street_name_persistent_local_id: self.street_name_persistent_local_id,
            address_persistent_local_id: id,
            geometry,
            provenance: provenance.clone(),
        }])
    }

    fn correct_retirement(
        &self,
        id: AddressPersistentLocalId,
        provenance: &Provenance,
    ) -> Result<EmittedEvents, StreetNameError> {
        let address = self.require_address(id)?;
        match address.status {
            AddressStatus::Current => Ok(smallvec![]),
            AddressStatus::Retired => Ok(smallvec![StreetNameEvent::AddressRetirementWasCorrected {
                street_name_persistent_local_id: self.street_name_persistent_local_id,
                address_persistent_local_id: id,
                provenance: provenance.clone(),
            }]),
            status @ (AddressStatus::Proposed | AddressStatus::Rejected) => {
                Err(StreetNameError::InvalidStatus {
                    operation: "CorrectAddressRetirement",
                    status,
                })
            }
        }
    }
}

impl From<StreetNameSnapshot> for StreetName {
    fn from(snapshot: StreetNameSnapshot) -> Self {
        Self {
            street_name_persistent_local_id: snapshot.street_name_persistent_local_id,
            status: snapshot.status,
            nis_code: snapshot.nis_code,
            is_removed: snapshot.is_removed,
            addresses: snapshot.addresses,
            last_event_hashes: snapshot.last_event_hashes,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::municipality::Municipality;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    struct AllMunicipalities;

    impl Municipalities for AllMunicipalities {
        fn get(&self, nis_code: &NisCode) -> Option<Municipality> {
            Some(Municipality {
                nis_code: nis_code.clone(),
                extended_wkb_geometry: None,
            })
        }
    }

    fn provenance() -> Provenance {
        Provenance {
            timestamp: Utc
                .with_ymd_and_hms(2025, 3, 1, 9, 0, 0)
                .single()
                .unwrap_or_default(),
            application: "address-registry".to_string(),
            modification: crate::types::Modification::Update,
            organisation: "municipality".to_string(),
            reason: "test".to_string(),
        }
    }

    fn imported() -> StreetNameEvent {
        StreetNameEvent::StreetNameWasImported {
            street_name_persistent_local_id: StreetNamePersistentLocalId::new(100),
            nis_code: NisCode::new("44021"),
            status: StreetNameStatus::Current,
            provenance: provenance(),
        }
    }

    fn proposed(id: u32, house: &str, boxed: Option<(u32, &str)>) -> StreetNameEvent {
        StreetNameEvent::AddressWasProposed {
            street_name_persistent_local_id: StreetNamePersistentLocalId::new(100),
            address_persistent_local_id: AddressPersistentLocalId::new(id),
            parent_address_persistent_local_id: boxed
                .map(|(parent, _)| AddressPersistentLocalId::new(parent)),
            postal_code: PostalCode::new("9000"),
            house_number: house.parse().unwrap(),
            box_number: boxed.map(|(_, b)| b.parse().unwrap()),
            geometry: AddressGeometry {
                method: GeometryMethod::DerivedFromObject,
                specification: GeometrySpecification::Municipality,
                position: ExtendedWkbGeometry::new(vec![0x01, 0x02]),
            },
            provenance: provenance(),
        }
    }

    fn envelope(event: &StreetNameEvent) -> SerializedEvent {
        SerializedEvent::from_event(event, None).expect("serializable")
    }

    fn replayed(events: &[StreetNameEvent]) -> (StreetName, Version) {
        let tail: Vec<SerializedEvent> = events.iter().map(envelope).collect();
        StreetName::replay(None, &tail).expect("replay succeeds")
    }

    #[test]
    fn replay_requires_an_import_first() {
        let tail = vec![envelope(&proposed(1, "11", None))];
        let error = StreetName::replay(None, &tail).unwrap_err();
        assert!(matches!(error, ReplayError::CorruptEvent { .. }));
    }

    #[test]
    fn replay_of_empty_stream_fails() {
        assert_eq!(StreetName::replay(None, &[]), Err(ReplayError::EmptyStream));
    }

    #[test]
    fn unknown_event_type_is_fatal() {
        let mut drifted = envelope(&proposed(1, "11", None));
        drifted.event_type = "AddressWasTeleported.v1".to_string();
        let tail = vec![envelope(&imported()), drifted];
        assert_eq!(
            StreetName::replay(None, &tail),
            Err(ReplayError::UnknownEventType(
                "AddressWasTeleported.v1".to_string()
            ))
        );
    }

    #[test]
    fn corrupt_payload_is_fatal() {
        let mut corrupt = envelope(&proposed(1, "11", None));
        corrupt.data = vec![0xff; 3];
        let tail = vec![envelope(&imported()), corrupt];
        assert!(matches!(
            StreetName::replay(None, &tail),
            Err(ReplayError::CorruptEvent { .. })
        ));
    }

    #[test]
    fn replay_tracks_version_and_state() {
        let (state, version) = replayed(&[imported(), proposed(1, "11", None)]);
        assert_eq!(version, Version::new(1));
        let address = state.address(AddressPersistentLocalId::new(1)).unwrap();
        assert_eq!(address.status, AddressStatus::Proposed);
        assert!(state.last_event_hash(AddressPersistentLocalId::new(1)).is_some());
    }

    #[test]
    fn snapshot_then_tail_equals_full_replay() {
        let events = [
            imported(),
            proposed(1, "11", None),
            proposed(2, "11", Some((1, "A"))),
            StreetNameEvent::AddressWasApproved {
                street_name_persistent_local_id: StreetNamePersistentLocalId::new(100),
                address_persistent_local_id: AddressPersistentLocalId::new(1),
                provenance: provenance(),
            },
        ];
        let (full, full_version) = replayed(&events);

        let (head, head_version) = replayed(&events[..2]);
        let image = StreetNameSnapshot::from_bytes(&head.snapshot().to_bytes().unwrap()).unwrap();
        let tail: Vec<SerializedEvent> = events[2..].iter().map(envelope).collect();
        let (resumed, resumed_version) =
            StreetName::replay(Some((image, head_version)), &tail).unwrap();

        assert_eq!(resumed, full);
        assert_eq!(resumed_version, full_version);
    }

    #[test]
    fn street_removal_blocks_every_command() {
        let (state, _) = replayed(&[
            imported(),
            proposed(1, "11", None),
            StreetNameEvent::StreetNameWasRemoved {
                street_name_persistent_local_id: StreetNamePersistentLocalId::new(100),
                provenance: provenance(),
            },
        ]);
        let command = StreetNameCommand::ApproveAddress {
            street_name_persistent_local_id: StreetNamePersistentLocalId::new(100),
            address_persistent_local_id: AddressPersistentLocalId::new(1),
            provenance: provenance(),
        };
        assert_eq!(
            state.decide(&command, &AllMunicipalities),
            Err(StreetNameError::StreetNameIsRemoved(
                StreetNamePersistentLocalId::new(100)
            ))
        );
    }

    fn arbitrary_operation() -> impl Strategy<Value = (u8, u32)> {
        (0u8..6, 1u32..4)
    }

    proptest! {
        // Folding the same command sequence twice from the same start must
        // land on identical state and identical ETags.
        #[test]
        fn reconstruction_is_deterministic(ops in prop::collection::vec(arbitrary_operation(), 0..24)) {
            let seed = [imported(), proposed(1, "11", None), proposed(2, "11", Some((1, "A"))), proposed(3, "13", None)];

            let run = || {
                let (mut state, _) = replayed(&seed);
                for (op, id) in &ops {
                    let address_persistent_local_id = AddressPersistentLocalId::new(*id);
                    let street_name_persistent_local_id = StreetNamePersistentLocalId::new(100);
                    let provenance = provenance();
                    let command = match op {
                        0 => StreetNameCommand::ApproveAddress { street_name_persistent_local_id, address_persistent_local_id, provenance },
                        1 => StreetNameCommand::RejectAddress { street_name_persistent_local_id, address_persistent_local_id, provenance },
                        2 => StreetNameCommand::RetireAddress { street_name_persistent_local_id, address_persistent_local_id, provenance },
                        3 => StreetNameCommand::DeregulateAddress { street_name_persistent_local_id, address_persistent_local_id, provenance },
                        4 => StreetNameCommand::RegularizeAddress { street_name_persistent_local_id, address_persistent_local_id, provenance },
                        _ => StreetNameCommand::CorrectAddressRetirement { street_name_persistent_local_id, address_persistent_local_id, provenance },
                    };
                    if let Ok(events) = state.decide(&command, &AllMunicipalities) {
                        for event in &events {
                            state.apply(event);
                        }
                    }
                }
                state
            };

            let first = run();
            let second = run();
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(
                first.last_event_hash(AddressPersistentLocalId::new(1)),
                second.last_event_hash(AddressPersistentLocalId::new(1))
            );
        }
    }
}
