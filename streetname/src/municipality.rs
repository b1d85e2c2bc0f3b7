//! Municipality reference data, consumed as a capability.
//!
//! The aggregate only ever asks one question of this data: can the street
//! name's NIS code be resolved when a position is derived from the
//! municipality. Maintaining the reference data itself is someone else's job.

use crate::types::NisCode;

/// The slice of municipality reference data the aggregate consumes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Municipality {
    /// NIS code of the municipality.
    pub nis_code: NisCode,
    /// Boundary geometry as extended WKB, when the source has one.
    pub extended_wkb_geometry: Option<Vec<u8>>,
}

/// Read-only municipality lookup.
pub trait Municipalities: Send + Sync {
    /// Resolve a municipality by NIS code.
    fn get(&self, nis_code: &NisCode) -> Option<Municipality>;
}
