//! In-process collaborators.
//!
//! Thread-safe implementations of the three backend traits. Several managers
//! in one process can share a [`MemorySharedStore`] and a [`MemoryBroadcast`]
//! to behave like separate servers sharing real services. Each type supports
//! failure injection and counts its calls.

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::trace;

use super::broadcast::{Broadcast, BroadcastHandler, BroadcastMessage, ListenerId};
use super::source::{DocumentSource, FetchResponse};
use super::store::SharedStore;
use crate::clock::{Clock, SystemClock};
use crate::error::{Result, SyncError};
use crate::types::{SharedStoreRecord, SheetKey};

/// Document source serving a settable response.
pub struct MemorySource {
    response: Mutex<FetchResponse>,
    failing: AtomicBool,
    fetches: AtomicUsize,
}

impl MemorySource {
    /// Serve `body` with status 200.
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            response: Mutex::new(FetchResponse::ok(body)),
            failing: AtomicBool::new(false),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn set_body(&self, body: impl Into<String>) {
        self.response.lock().body = body.into();
    }

    pub fn set_status(&self, status: u16) {
        self.response.lock().status = status;
    }

    /// When set, every fetch fails as unreachable.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of fetch attempts, including failed ones.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl DocumentSource for MemorySource {
    fn fetch(&self, document_id: &str, _sub_document_id: Option<&str>) -> Result<FetchResponse> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(SyncError::Transport(format!(
                "document {} unreachable",
                document_id
            )));
        }
        Ok(self.response.lock().clone())
    }
}

/// Shared store backed by a map. `transact` holds the map lock for the whole
/// read-modify-write, so it is atomic per store.
#[derive(Default)]
pub struct MemorySharedStore {
    records: Mutex<HashMap<SheetKey, SharedStoreRecord>>,
    failing: AtomicBool,
    reads: AtomicUsize,
    transactions: AtomicUsize,
}

impl MemorySharedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// When set, reads and transactions fail as unreachable.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Write a record directly, bypassing failure injection.
    pub fn put(&self, key: SheetKey, record: SharedStoreRecord) {
        self.records.lock().insert(key, record);
    }

    /// Read a record directly, bypassing failure injection.
    pub fn get(&self, key: &SheetKey) -> Option<SharedStoreRecord> {
        self.records.lock().get(key).cloned()
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(SyncError::Store("shared store unreachable".into()))
        } else {
            Ok(())
        }
    }
}

impl SharedStore for MemorySharedStore {
    fn read(&self, key: &SheetKey) -> Result<Option<SharedStoreRecord>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(self.records.lock().get(key).cloned())
    }

    fn transact(
        &self,
        key: &SheetKey,
        update: &mut dyn FnMut(SharedStoreRecord) -> SharedStoreRecord,
    ) -> Result<SharedStoreRecord> {
        self.transactions.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let mut records = self.records.lock();
        let existing = records.get(key).cloned().unwrap_or_default();
        let next = update(existing);
        records.insert(*key, next.clone());
        Ok(next)
    }
}

type SharedHandler = Arc<dyn Fn(BroadcastMessage) + Send + Sync>;

/// Broadcast service delivering synchronously to every handler on a topic,
/// the publisher's own included.
pub struct MemoryBroadcast {
    topics: RwLock<HashMap<SheetKey, Vec<(ListenerId, SharedHandler)>>>,
    clock: Arc<dyn Clock>,
    next_id: AtomicU64,
    failing: AtomicBool,
    published: Mutex<Vec<(SheetKey, String)>>,
}

impl MemoryBroadcast {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Stamp messages with `clock` instead of the wall clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
            clock,
            next_id: AtomicU64::new(1),
            failing: AtomicBool::new(false),
            published: Mutex::new(Vec::new()),
        }
    }

    /// When set, publish and subscribe fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Every successfully published `(topic, body)`, in order.
    pub fn published(&self) -> Vec<(SheetKey, String)> {
        self.published.lock().clone()
    }

    pub fn listener_count(&self, topic: &SheetKey) -> usize {
        self.topics.read().get(topic).map_or(0, Vec::len)
    }

    /// Deliver a message with an explicit send time, bypassing the clock.
    pub fn deliver(&self, topic: &SheetKey, body: &str, sent: f64) {
        let handlers: Vec<SharedHandler> = self
            .topics
            .read()
            .get(topic)
            .map(|listeners| listeners.iter().map(|(_, h)| Arc::clone(h)).collect())
            .unwrap_or_default();

        trace!(topic = %topic, listeners = handlers.len(), "Delivering broadcast");
        for handler in handlers {
            handler(BroadcastMessage {
                body: body.to_string(),
                sent,
            });
        }
    }

    fn check_available(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(SyncError::Broadcast("broadcast service unavailable".into()))
        } else {
            Ok(())
        }
    }
}

impl Default for MemoryBroadcast {
    fn default() -> Self {
        Self::new()
    }
}

impl Broadcast for MemoryBroadcast {
    fn publish(&self, topic: &SheetKey, body: &str) -> Result<()> {
        self.check_available()?;
        self.published.lock().push((*topic, body.to_string()));
        self.deliver(topic, body, self.clock.now().0 as f64);
        Ok(())
    }

    fn subscribe(&self, topic: &SheetKey, handler: BroadcastHandler) -> Result<ListenerId> {
        self.check_available()?;
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.topics
            .write()
            .entry(*topic)
            .or_default()
            .push((id, Arc::from(handler)));
        Ok(id)
    }

    fn unsubscribe(&self, topic: &SheetKey, id: ListenerId) {
        if let Some(listeners) = self.topics.write().get_mut(topic) {
            listeners.retain(|(listener, _)| *listener != id);
        }
    }
}
