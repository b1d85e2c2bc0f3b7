//! Address geometry and the method/specification policy.
//!
//! The geometry codec itself (WKB parsing, SRID handling) is out of scope;
//! positions travel as opaque binary blobs. What the domain does own is the
//! policy deciding which method/specification combinations are legal, checked
//! before any geometry-bearing event is constructed.

use crate::error::StreetNameError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the position of an address was determined.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeometryMethod {
    /// Manually appointed by an administrator.
    AppointedByAdministrator,
    /// Derived from the geometry of another object (municipality, road
    /// segment).
    DerivedFromObject,
    /// Interpolated along the street; legacy only, rejected for new
    /// positions.
    Interpolated,
}

impl fmt::Display for GeometryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AppointedByAdministrator => "AppointedByAdministrator",
            Self::DerivedFromObject => "DerivedFromObject",
            Self::Interpolated => "Interpolated",
        };
        write!(f, "{name}")
    }
}

/// What real-world feature the position points at.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)] // Value enumeration; names are the documentation.
pub enum GeometrySpecification {
    Municipality,
    Street,
    Parcel,
    Lot,
    Stand,
    Mooring,
    Entry,
    RoadSegment,
    Building,
    BuildingUnit,
}

impl fmt::Display for GeometrySpecification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Municipality => "Municipality",
            Self::Street => "Street",
            Self::Parcel => "Parcel",
            Self::Lot => "Lot",
            Self::Stand => "Stand",
            Self::Mooring => "Mooring",
            Self::Entry => "Entry",
            Self::RoadSegment => "RoadSegment",
            Self::Building => "Building",
            Self::BuildingUnit => "BuildingUnit",
        };
        write!(f, "{name}")
    }
}

/// An opaque extended-WKB position blob.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExtendedWkbGeometry(Vec<u8>);

impl ExtendedWkbGeometry {
    /// Wraps raw extended-WKB bytes.
    #[must_use]
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Returns the raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for ExtendedWkbGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExtendedWkbGeometry({} bytes)", self.0.len())
    }
}

/// A validated geometry: method, resolved specification, and position.
///
/// Only [`validate_geometry`] produces the `specification` field, so a value
/// of this type always satisfies the policy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressGeometry {
    /// How the position was determined.
    pub method: GeometryMethod,
    /// What the position points at (resolved, never absent).
    pub specification: GeometrySpecification,
    /// The position blob.
    pub position: ExtendedWkbGeometry,
}

/// Validates a method/specification combination and resolves the effective
/// specification.
///
/// - `AppointedByAdministrator`: specification is required and must be one of
///   Entry, Parcel, Lot, Stand, Mooring.
/// - `DerivedFromObject`: specification is optional and must be Municipality
///   or `RoadSegment`; omitted defaults to Municipality.
/// - Any other method is rejected.
///
/// # Errors
///
/// [`StreetNameError::InvalidGeometryMethod`],
/// [`StreetNameError::MissingGeometrySpecification`], or
/// [`StreetNameError::InvalidGeometrySpecification`].
pub fn validate_geometry(
    method: GeometryMethod,
    specification: Option<GeometrySpecification>,
) -> Result<GeometrySpecification, StreetNameError> {
    match method {
        GeometryMethod::AppointedByAdministrator => match specification {
            None => Err(StreetNameError::MissingGeometrySpecification),
            Some(
                spec @ (GeometrySpecification::Entry
                | GeometrySpecification::Parcel
                | GeometrySpecification::Lot
                | GeometrySpecification::Stand
                | GeometrySpecification::Mooring),
            ) => Ok(spec),
            Some(spec) => Err(StreetNameError::InvalidGeometrySpecification(spec)),
        },
        GeometryMethod::DerivedFromObject => match specification {
            None => Ok(GeometrySpecification::Municipality),
            Some(
                spec @ (GeometrySpecification::Municipality | GeometrySpecification::RoadSegment),
            ) => Ok(spec),
            Some(spec) => Err(StreetNameError::InvalidGeometrySpecification(spec)),
        },
        GeometryMethod::Interpolated => Err(StreetNameError::InvalidGeometryMethod(method)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appointed_requires_specification() {
        assert_eq!(
            validate_geometry(GeometryMethod::AppointedByAdministrator, None),
            Err(StreetNameError::MissingGeometrySpecification)
        );
    }

    #[test]
    fn appointed_accepts_the_admitted_subset() {
        for spec in [
            GeometrySpecification::Entry,
            GeometrySpecification::Parcel,
            GeometrySpecification::Lot,
            GeometrySpecification::Stand,
            GeometrySpecification::Mooring,
        ] {
            assert_eq!(
                validate_geometry(GeometryMethod::AppointedByAdministrator, Some(spec)),
                Ok(spec)
            );
        }
    }

    #[test]
    fn appointed_rejects_municipality() {
        assert_eq!(
            validate_geometry(
                GeometryMethod::AppointedByAdministrator,
                Some(GeometrySpecification::Municipality)
            ),
            Err(StreetNameError::InvalidGeometrySpecification(
                GeometrySpecification::Municipality
            ))
        );
    }

    #[test]
    fn derived_defaults_to_municipality() {
        assert_eq!(
            validate_geometry(GeometryMethod::DerivedFromObject, None),
            Ok(GeometrySpecification::Municipality)
        );
    }

    #[test]
    fn derived_accepts_road_segment() {
        assert_eq!(
            validate_geometry(
                GeometryMethod::DerivedFromObject,
                Some(GeometrySpecification::RoadSegment)
            ),
            Ok(GeometrySpecification::RoadSegment)
        );
    }

    #[test]
    fn derived_rejects_building() {
        assert_eq!(
            validate_geometry(
                GeometryMethod::DerivedFromObject,
                Some(GeometrySpecification::Building)
            ),
            Err(StreetNameError::InvalidGeometrySpecification(
                GeometrySpecification::Building
            ))
        );
    }

    #[test]
    fn interpolated_is_rejected() {
        assert_eq!(
            validate_geometry(GeometryMethod::Interpolated, Some(GeometrySpecification::Entry)),
            Err(StreetNameError::InvalidGeometryMethod(
                GeometryMethod::Interpolated
            ))
        );
    }
}
