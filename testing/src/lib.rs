//! # Address Registry testing utilities
//!
//! Deterministic doubles for every collaborator the dispatcher and the
//! aggregate depend on, plus a Given/When/Then scenario helper for state
//! machine tests.
//!
//! Everything here is in-memory and single-process: tests that pass once
//! pass always.
//!
//! ## Example
//!
//! ```ignore
//! use address_registry_testing::{AggregateScenario, test_provenance};
//!
//! AggregateScenario::given(vec![imported(), proposed(1)])
//!     .when(approve(1))
//!     .then(vec![approved(1)]);
//! ```

use chrono::{DateTime, Utc};

pub mod event_store;
pub mod ledger;
pub mod scenario;

pub use event_store::InMemoryEventStore;
pub use ledger::InMemoryIdempotencyLedger;
pub use mocks::{test_clock, test_provenance, FixedClock, StaticMunicipalities};
pub use scenario::AggregateScenario;

/// Mock implementations of environment traits.
pub mod mocks {
    use super::{DateTime, Utc};
    use address_registry_core::environment::Clock;
    use address_registry_streetname::municipality::{Municipalities, Municipality};
    use address_registry_streetname::types::{Modification, NisCode, Provenance};
    use std::collections::HashSet;

    /// Fixed clock for deterministic tests. Always returns the same time.
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time.
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Default fixed clock for tests (2025-01-01 00:00:00 UTC).
    ///
    /// # Panics
    ///
    /// Panics if the hardcoded timestamp fails to parse, which never
    /// happens.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    /// Provenance stamped by the default test clock.
    #[must_use]
    pub fn test_provenance() -> Provenance {
        Provenance {
            timestamp: test_clock().now(),
            application: "address-registry".to_string(),
            modification: Modification::Update,
            organisation: "municipality".to_string(),
            reason: "test".to_string(),
        }
    }

    /// Municipality lookup over a fixed set of NIS codes.
    #[derive(Debug, Clone, Default)]
    pub struct StaticMunicipalities {
        known: HashSet<String>,
    }

    impl StaticMunicipalities {
        /// A lookup that resolves exactly the given NIS codes.
        #[must_use]
        pub fn knowing(nis_codes: &[&str]) -> Self {
            Self {
                known: nis_codes.iter().map(ToString::to_string).collect(),
            }
        }

        /// A lookup that resolves nothing.
        #[must_use]
        pub fn empty() -> Self {
            Self::default()
        }
    }

    impl Municipalities for StaticMunicipalities {
        fn get(&self, nis_code: &NisCode) -> Option<Municipality> {
            self.known.contains(nis_code.as_str()).then(|| Municipality {
                nis_code: nis_code.clone(),
                extended_wkb_geometry: None,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use address_registry_core::environment::Clock;
    use address_registry_streetname::municipality::Municipalities;
    use address_registry_streetname::types::NisCode;

    #[test]
    fn fixed_clock_is_frozen() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
    }

    #[test]
    fn static_municipalities_resolve_known_codes_only() {
        let municipalities = mocks::StaticMunicipalities::knowing(&["44021"]);
        assert!(municipalities.get(&NisCode::new("44021")).is_some());
        assert!(municipalities.get(&NisCode::new("99999")).is_none());
    }
}
