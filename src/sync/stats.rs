//! Refresh diagnostics.

use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of the counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub refresh_cycles: u64,
    /// Cycles that ended at the local freshness check.
    pub local_hits: u64,
    /// Cycles satisfied by the shared store.
    pub store_hits: u64,
    pub remote_fetches: u64,
    pub remote_failures: u64,
    pub store_failures: u64,
    pub broadcast_failures: u64,
    /// Write-backs that found a newer record and adopted it.
    pub overrides: u64,
    pub broadcasts_applied: u64,
    pub broadcasts_discarded: u64,
}

/// Live counters shared by the coordinator and listener.
#[derive(Debug, Default)]
pub struct SyncCounters {
    pub(crate) refresh_cycles: AtomicU64,
    pub(crate) local_hits: AtomicU64,
    pub(crate) store_hits: AtomicU64,
    pub(crate) remote_fetches: AtomicU64,
    pub(crate) remote_failures: AtomicU64,
    pub(crate) store_failures: AtomicU64,
    pub(crate) broadcast_failures: AtomicU64,
    pub(crate) overrides: AtomicU64,
    pub(crate) broadcasts_applied: AtomicU64,
    pub(crate) broadcasts_discarded: AtomicU64,
}

impl SyncCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> SyncStats {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        SyncStats {
            refresh_cycles: load(&self.refresh_cycles),
            local_hits: load(&self.local_hits),
            store_hits: load(&self.store_hits),
            remote_fetches: load(&self.remote_fetches),
            remote_failures: load(&self.remote_failures),
            store_failures: load(&self.store_failures),
            broadcast_failures: load(&self.broadcast_failures),
            overrides: load(&self.overrides),
            broadcasts_applied: load(&self.broadcasts_applied),
            broadcasts_discarded: load(&self.broadcasts_discarded),
        }
    }
}
