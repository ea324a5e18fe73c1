//! Shared key-value store.

use crate::error::Result;
use crate::types::{SharedStoreRecord, SheetKey};

/// Durable store shared by every process.
pub trait SharedStore: Send + Sync {
    /// Read the record under `key`, `None` if absent.
    fn read(&self, key: &SheetKey) -> Result<Option<SharedStoreRecord>>;

    /// Atomically replace the record under `key` with `update(existing)`.
    ///
    /// `update` receives `SharedStoreRecord::default()` when the key is
    /// absent. Implementations may call it more than once if they retry on
    /// contention; only the last result is persisted and returned.
    fn transact(
        &self,
        key: &SheetKey,
        update: &mut dyn FnMut(SharedStoreRecord) -> SharedStoreRecord,
    ) -> Result<SharedStoreRecord>;
}
