//! Update coordinator: one refresh cycle across the three tiers.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::stats::SyncCounters;
use crate::backends::{Backends, Broadcast, DocumentSource, SharedStore};
use crate::clock::Clock;
use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::state::ValueStore;
use crate::types::{SharedStoreRecord, SheetKey, Timestamp, UpdateSource};

/// Result of the shared-store write-back after a remote fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WriteBack {
    /// Our fetched document was written.
    Stored,
    /// The store already held a record at least as new; it was kept and
    /// re-applied locally.
    Overridden,
    /// The transaction failed; logged and ignored.
    Failed,
}

/// How a refresh cycle ended. Never an error for the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Local values are inside their freshness window; no I/O was done.
    Fresh,
    /// The shared store had a fresh record that was not newer than ours.
    StoreNotNewer,
    /// A fresh, newer record was applied from the shared store.
    FromSharedStore { changed: bool },
    /// The remote document was fetched and applied.
    FromRemote {
        changed: bool,
        write_back: WriteBack,
        published: bool,
    },
    /// The remote fetch failed; the next tick retries.
    Failed(SyncError),
    /// The manager was destroyed before or during the cycle.
    Destroyed,
}

impl RefreshOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, RefreshOutcome::Failed(_) | RefreshOutcome::Destroyed)
    }
}

/// Drives refresh cycles for one sheet.
pub struct UpdateCoordinator {
    document_id: String,
    sub_document_id: Option<String>,
    key: SheetKey,
    refresh_secs: i64,
    values: Arc<ValueStore>,
    source: Arc<dyn DocumentSource>,
    store: Arc<dyn SharedStore>,
    broadcast: Arc<dyn Broadcast>,
    clock: Arc<dyn Clock>,
    counters: Arc<SyncCounters>,
    /// Serializes write-back and override for this sheet.
    write_lock: Mutex<()>,
}

impl UpdateCoordinator {
    pub fn new(
        config: &SyncConfig,
        values: Arc<ValueStore>,
        backends: &Backends,
        counters: Arc<SyncCounters>,
    ) -> Self {
        Self {
            document_id: config.document_id.clone(),
            sub_document_id: config.sub_document_id.clone(),
            key: config.key(),
            refresh_secs: config.refresh_secs(),
            values,
            source: Arc::clone(&backends.source),
            store: Arc::clone(&backends.store),
            broadcast: Arc::clone(&backends.broadcast),
            clock: Arc::clone(&backends.clock),
            counters,
            write_lock: Mutex::new(()),
        }
    }

    pub fn key(&self) -> &SheetKey {
        &self.key
    }

    pub fn is_alive(&self) -> bool {
        self.values.is_alive()
    }

    /// Run one refresh cycle.
    pub fn refresh(&self) -> RefreshOutcome {
        SyncCounters::bump(&self.counters.refresh_cycles);

        if !self.is_alive() {
            return RefreshOutcome::Destroyed;
        }

        let now = self.clock.now();
        let last_updated = self.values.last_updated();

        // Tier 1: local freshness
        if now.seconds_since(last_updated) < self.refresh_secs {
            SyncCounters::bump(&self.counters.local_hits);
            debug!(key = %self.key, last_updated = %last_updated, "Local values fresh");
            return RefreshOutcome::Fresh;
        }

        // Tier 2: shared store
        if let Some(outcome) = self.try_shared_store(now) {
            return outcome;
        }

        // Tier 3: remote
        self.fetch_remote(now)
    }

    /// Returns `None` when the cycle should fall through to the remote fetch.
    fn try_shared_store(&self, now: Timestamp) -> Option<RefreshOutcome> {
        let record = match self.store.read(&self.key) {
            Ok(Some(record)) => record,
            Ok(None) => {
                debug!(key = %self.key, "No shared record");
                return None;
            }
            Err(e) => {
                SyncCounters::bump(&self.counters.store_failures);
                warn!(key = %self.key, error = %e, "Shared store read failed");
                return None;
            }
        };

        if now.seconds_since(record.timestamp) >= self.refresh_secs {
            debug!(key = %self.key, timestamp = %record.timestamp, "Shared record stale");
            return None;
        }

        if record.timestamp <= self.values.last_updated() {
            debug!(key = %self.key, timestamp = %record.timestamp, "Shared record not newer");
            return Some(RefreshOutcome::StoreNotNewer);
        }

        if !self.is_alive() {
            return Some(RefreshOutcome::Destroyed);
        }

        let changed = self
            .values
            .apply_document(&record.csv, record.timestamp, UpdateSource::SharedStore);
        SyncCounters::bump(&self.counters.store_hits);
        debug!(key = %self.key, timestamp = %record.timestamp, changed, "Applied shared record");
        Some(RefreshOutcome::FromSharedStore { changed })
    }

    fn fetch_remote(&self, now: Timestamp) -> RefreshOutcome {
        let fetched = self
            .source
            .fetch(&self.document_id, self.sub_document_id.as_deref())
            .and_then(|response| {
                if response.is_success() {
                    Ok(response)
                } else {
                    Err(SyncError::HttpStatus(response.status))
                }
            });

        let body = match fetched {
            Ok(response) => response.body,
            Err(e) => {
                SyncCounters::bump(&self.counters.remote_failures);
                warn!(
                    key = %self.key,
                    document_id = %self.document_id,
                    error = %e,
                    "Remote fetch failed"
                );
                return RefreshOutcome::Failed(e);
            }
        };
        SyncCounters::bump(&self.counters.remote_fetches);

        if !self.is_alive() {
            return RefreshOutcome::Destroyed;
        }

        let changed = self.values.apply_document(&body, now, UpdateSource::RemoteApi);
        info!(key = %self.key, timestamp = %now, changed, "Fetched remote document");

        let write_back = self.write_back(now, &body);

        let published = match self.broadcast.publish(&self.key, &body) {
            Ok(()) => true,
            Err(e) => {
                SyncCounters::bump(&self.counters.broadcast_failures);
                warn!(key = %self.key, error = %e, "Broadcast publish failed");
                false
            }
        };

        RefreshOutcome::FromRemote {
            changed,
            write_back,
            published,
        }
    }

    /// Write the fetched body back unless another process got there first.
    fn write_back(&self, now: Timestamp, body: &str) -> WriteBack {
        let _lock = self.write_lock.lock();

        let mut winner: Option<SharedStoreRecord> = None;
        let result = self.store.transact(&self.key, &mut |existing| {
            if existing.timestamp >= now {
                winner = Some(existing.clone());
                existing
            } else {
                winner = None;
                SharedStoreRecord::new(now, body)
            }
        });

        if let Err(e) = result {
            SyncCounters::bump(&self.counters.store_failures);
            warn!(key = %self.key, error = %e, "Shared store write-back failed");
            return WriteBack::Failed;
        }

        match winner {
            Some(record) => {
                SyncCounters::bump(&self.counters.overrides);
                let changed = self.values.apply_document(
                    &record.csv,
                    record.timestamp,
                    UpdateSource::SharedStoreOverride,
                );
                info!(
                    key = %self.key,
                    timestamp = %record.timestamp,
                    changed,
                    "Shared store already newer, adopting its record"
                );
                WriteBack::Overridden
            }
            None => WriteBack::Stored,
        }
    }
}
