//! The tiered refresh protocol.
//!
//! A refresh cycle tries, in order:
//!
//! ```text
//! local freshness ──fresh──▶ done (no I/O)
//!      │ stale
//!      ▼
//! shared store ──fresh & newer──▶ apply (SharedStore)
//!      │ absent / stale / unreachable
//!      ▼
//! remote fetch ──▶ apply (RemoteApi) ──▶ transact write-back ──▶ publish
//!                                          │ newer record found
//!                                          ▼
//!                                        apply (SharedStoreOverride)
//! ```
//!
//! Peers receive the published body through their [`SubscriptionListener`],
//! so roughly one process per interval pays for the remote fetch.

mod coordinator;
mod listener;
mod scheduler;
mod stats;

pub use coordinator::{RefreshOutcome, UpdateCoordinator, WriteBack};
pub use listener::SubscriptionListener;
pub use scheduler::PeriodicScheduler;
pub use stats::{SyncCounters, SyncStats};
