//! # Address Registry Core
//!
//! Event-sourcing primitives shared by the Address Registry crates.
//!
//! This crate defines the persistence boundary of the registry:
//!
//! - [`stream`]: strong types for stream identity and versioning
//! - [`event`]: the [`event::Event`] trait and the serialized envelope
//!   stored in the event store
//! - [`event_store`]: the [`event_store::EventStore`] trait, an external
//!   collaborator supplying append/read with optimistic version checks
//! - [`environment`]: injected dependencies (currently the clock)
//!
//! The domain model lives in `address-registry-streetname`; command
//! orchestration in `address-registry-dispatch`. This crate knows nothing
//! about street names or addresses, only about ordered, versioned streams
//! of immutable facts.

pub mod event;
pub mod event_store;
pub mod stream;

// Re-export commonly used types
pub use chrono::{DateTime, Utc};

/// Environment traits for injected dependencies.
///
/// All external capabilities are abstracted behind traits and handed to the
/// dispatcher explicitly, so tests can substitute deterministic
/// implementations.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Abstracts time so the dispatcher never reads the wall clock directly.
    ///
    /// The domain itself is clock-free: provenance timestamps arrive with the
    /// command. The clock is only consulted for bookkeeping such as the
    /// idempotency ledger's `applied_at` column.
    pub trait Clock: Send + Sync {
        /// Get the current time.
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::environment::{Clock, SystemClock};

    #[test]
    fn system_clock_is_monotonic_enough() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
