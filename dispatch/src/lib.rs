//! # Address Registry command dispatch
//!
//! Everything between a transport edge and the StreetName aggregate:
//! deterministic command identity, the idempotency ledger, the repository
//! (snapshot-plus-tail reconstruction, optimistic append, snapshot cadence),
//! conflict retry, and the dispatcher that ties them together and returns
//! per-address ETags.
//!
//! The transport itself (HTTP, queues) is out of scope; callers hand a
//! [`StreetNameCommand`](address_registry_streetname::StreetNameCommand)
//! and a [`CancellationToken`](tokio_util::sync::CancellationToken) to
//! [`CommandDispatcher::dispatch`].

pub mod command_id;
pub mod dispatcher;
pub mod error;
pub mod ledger;
pub mod repository;
pub mod retry;

pub use command_id::CommandId;
pub use dispatcher::CommandDispatcher;
pub use error::DispatchError;
pub use ledger::{IdempotencyLedger, LedgerEntry, LedgerError};
pub use repository::{SnapshotStrategy, StreetNames};
pub use retry::RetryPolicy;
