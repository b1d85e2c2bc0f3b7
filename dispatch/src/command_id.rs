//! Deterministic command identity.
//!
//! A command's identity is the SHA-256 of its bincode serialization: target
//! identifiers, operation, parameters and provenance. Transport metadata
//! (delivery attempt, queue receipt, trace ids) lives outside the command
//! type and so can never influence identity; the same logical command
//! arriving twice through different channels hashes the same.

use std::fmt;

use address_registry_streetname::StreetNameCommand;
use sha2::{Digest, Sha256};

use crate::error::DispatchError;

/// Identity of one logical command, used as the idempotency ledger key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandId([u8; 32]);

impl CommandId {
    /// Derive the identity of a command.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Encoding`] when the command fails to
    /// serialize, which only happens under resource exhaustion.
    pub fn of(command: &StreetNameCommand) -> Result<Self, DispatchError> {
        let bytes =
            bincode::serialize(command).map_err(|e| DispatchError::Encoding(e.to_string()))?;
        Ok(Self(Sha256::digest(&bytes).into()))
    }

    /// Raw digest bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CommandId({self})")
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use address_registry_streetname::types::{
        AddressPersistentLocalId, StreetNamePersistentLocalId,
    };
    use address_registry_testing::test_provenance;

    fn approve(reason: &str) -> StreetNameCommand {
        let mut provenance = test_provenance();
        provenance.reason = reason.to_string();
        StreetNameCommand::ApproveAddress {
            street_name_persistent_local_id: StreetNamePersistentLocalId::new(100),
            address_persistent_local_id: AddressPersistentLocalId::new(1),
            provenance,
        }
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn identical_commands_share_an_identity() {
        assert_eq!(
            CommandId::of(&approve("a")).unwrap(),
            CommandId::of(&approve("a")).unwrap()
        );
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn provenance_participates_in_identity() {
        assert_ne!(
            CommandId::of(&approve("a")).unwrap(),
            CommandId::of(&approve("b")).unwrap()
        );
    }
}
