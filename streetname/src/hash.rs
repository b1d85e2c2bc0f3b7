//! Per-address event hash chain.
//!
//! Each address carries the hash of its last event; every new event hashes
//! its own fields together with that previous hash, so the latest hash
//! commits to the address's entire history. The hex rendering of the latest
//! hash is the address ETag.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::events::StreetNameEvent;

/// Separator between hash fields, chosen so field boundaries cannot be
/// forged by field content.
const FIELD_SEPARATOR: u8 = 0x1f;

/// Seed for the first event of each address chain.
const CHAIN_SEED: &str = "address-registry";

/// A link in an address's event hash chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventHash(String);

impl EventHash {
    /// The seed value every chain starts from.
    #[must_use]
    pub fn seed() -> Self {
        Self(CHAIN_SEED.to_string())
    }

    /// Hash `event` on top of the previous link.
    #[must_use]
    pub fn next(&self, event: &StreetNameEvent) -> Self {
        let mut hasher = Sha256::new();
        for field in event.hash_fields() {
            hasher.update(field.as_bytes());
            hasher.update([FIELD_SEPARATOR]);
        }
        hasher.update(self.0.as_bytes());

        let digest = hasher.finalize();
        let mut hex = String::with_capacity(digest.len() * 2);
        for byte in digest {
            use std::fmt::Write as _;
            let _ = write!(hex, "{byte:02x}");
        }
        Self(hex)
    }

    /// The hex rendering, served as the address ETag.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
