//! # Address Registry StreetName aggregate
//!
//! The event-sourced domain model of the address registry: a street name and
//! the house-number/box-number addresses attached to it, rebuilt from an
//! ordered event log and mutated only through validated commands.
//!
//! The aggregate is the consistency boundary. Everything inside one
//! [`aggregate::StreetName`] (the street name itself, its addresses, and the
//! parent/child relations between them) is loaded, validated and persisted
//! as one atomic unit. Different street names never coordinate.
//!
//! Module map:
//!
//! - [`types`]: identifiers and value objects (`HouseNumber`, `BoxNumber`,
//!   `Provenance`, statuses)
//! - [`geometry`]: geometry method/specification policy
//! - [`events`]: the closed [`events::StreetNameEvent`] enum
//! - [`commands`]: the [`commands::StreetNameCommand`] enum
//! - [`aggregate`]: the state machine: `decide`, `apply`, `replay`
//! - [`address`]: the address entity and the aggregate-owned address table
//! - [`hash`]: the per-address rolling event hash (ETag source)
//! - [`snapshot`]: serializable aggregate image
//! - [`municipality`]: the municipality reference-data capability
//! - [`error`]: command and replay error taxonomies

pub mod address;
pub mod aggregate;
pub mod commands;
pub mod error;
pub mod events;
pub mod geometry;
pub mod hash;
pub mod municipality;
pub mod snapshot;
pub mod types;

pub use aggregate::{EmittedEvents, StreetName};
pub use commands::StreetNameCommand;
pub use error::{ReplayError, StreetNameError};
pub use events::StreetNameEvent;
pub use hash::EventHash;
