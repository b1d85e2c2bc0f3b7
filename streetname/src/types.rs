//! Identifiers and value objects for the StreetName aggregate.

use address_registry_core::stream::StreamId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Stable external identifier of a street name. Immutable once assigned.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StreetNamePersistentLocalId(u32);

impl StreetNamePersistentLocalId {
    /// Creates a new `StreetNamePersistentLocalId`.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for StreetNamePersistentLocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<StreetNamePersistentLocalId> for StreamId {
    fn from(id: StreetNamePersistentLocalId) -> Self {
        StreamId::new(format!("streetname-{}", id.0))
    }
}

/// Stable external identifier of an address, unique within its street name.
/// Immutable once assigned.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AddressPersistentLocalId(u32);

impl AddressPersistentLocalId {
    /// Creates a new `AddressPersistentLocalId`.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for AddressPersistentLocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error raised by value-object parsers in this module.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid {kind}: {message}")]
pub struct ParseValueError {
    /// Which value object rejected the input.
    pub kind: &'static str,
    /// What was wrong with it.
    pub message: String,
}

fn normalize_number(kind: &'static str, raw: &str, digit_first: bool) -> Result<String, ParseValueError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ParseValueError {
            kind,
            message: "must not be empty".to_string(),
        });
    }
    if !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ParseValueError {
            kind,
            message: format!("'{trimmed}' contains non-alphanumeric characters"),
        });
    }
    if digit_first && !trimmed.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(ParseValueError {
            kind,
            message: format!("'{trimmed}' must start with a digit"),
        });
    }
    Ok(trimmed.to_ascii_uppercase())
}

/// A normalized house number: digits with an optional letter suffix
/// (`"1"`, `"19"`, `"30B"`). Normalization trims whitespace and uppercases
/// the suffix, so `"30b "` and `"30B"` compare equal.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HouseNumber(String);

impl HouseNumber {
    /// Returns the normalized house number.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for HouseNumber {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        normalize_number("house number", s, true).map(Self)
    }
}

impl fmt::Display for HouseNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A normalized box number (`"1"`, `"A"`, `"0101"`). Trimmed, alphanumeric,
/// uppercased; unlike house numbers a box number may start with a letter.
/// Present only on child addresses.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BoxNumber(String);

impl BoxNumber {
    /// Returns the normalized box number.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for BoxNumber {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        normalize_number("box number", s, false).map(Self)
    }
}

impl fmt::Display for BoxNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Postal code attached to an address at propose time.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PostalCode(String);

impl PostalCode {
    /// Creates a postal code from application-controlled input.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Returns the postal code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Municipality reference key carried by the street name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NisCode(String);

impl NisCode {
    /// Creates a NIS code from application-controlled input.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Returns the NIS code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NisCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a street name.
///
/// Owned by the sibling street-name lifecycle; consumed here only as a
/// precondition gate for address operations.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreetNameStatus {
    /// Registered but not yet in use.
    Proposed,
    /// In use.
    Current,
    /// No longer in use.
    Retired,
}

impl StreetNameStatus {
    /// Whether addresses may be proposed under a street name in this status.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Proposed | Self::Current)
    }
}

/// Lifecycle status of an address.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddressStatus {
    /// Registered, awaiting approval.
    Proposed,
    /// Officially in use.
    Current,
    /// Was current, no longer in use.
    Retired,
    /// Proposal was rejected.
    Rejected,
}

/// The kind of change a provenance record describes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Modification {
    /// A new fact was registered.
    Insert,
    /// An existing fact was changed.
    Update,
    /// A fact was withdrawn.
    Delete,
}

/// Who changed what, when, and why.
///
/// Provenance arrives with every command from the edge layer and is stamped
/// into every emitted event. The core never fabricates it: the domain stays
/// clock-free and replay stays deterministic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// When the change was decided (edge-supplied, not read from a clock).
    pub timestamp: DateTime<Utc>,
    /// The application that issued the change.
    pub application: String,
    /// The kind of change.
    pub modification: Modification,
    /// The organisation on whose behalf the change was made.
    pub organisation: String,
    /// Free-form reason.
    pub reason: String,
}
