//! # Sheet Sync
//!
//! Keeps a set of named, typed configuration values synchronized across many
//! server processes. Values come from one remote sheet document; updates are
//! spread through a shared store and a broadcast topic so that, globally,
//! only about one process per refresh interval hits the remote source.
//!
//! ## Core Concepts
//!
//! - **Values**: `"Name","Type","Value"` rows parsed into [`TypedValue`]s
//! - **Tiers**: local freshness, then the shared store, then the remote fetch
//! - **Apply**: the only state transition; rejects anything not strictly newer
//! - **Subscriptions**: per-name and aggregate change channels
//!
//! ## Example
//!
//! ```ignore
//! use sheet_sync::{Backends, SheetManager, SyncConfig, TypedValue};
//!
//! let manager = SheetManager::new(
//!     SyncConfig::new("1a2b3c").with_sub_document("Balance"),
//!     Backends::new(source, shared_store, broadcast),
//! )?;
//!
//! let health = manager.get("Health", TypedValue::Number(100.0));
//!
//! let changes = manager.subscribe("Health");
//! while let Ok(event) = changes.recv() {
//!     println!("{:?}", event);
//! }
//! ```

pub mod backends;
pub mod clock;
pub mod config;
pub mod error;
pub mod manager;
pub mod state;
pub mod subscriptions;
pub mod sync;
pub mod types;
pub mod values;

// Re-exports
pub use backends::memory::{MemoryBroadcast, MemorySharedStore, MemorySource};
pub use backends::{
    Backends, Broadcast, BroadcastHandler, BroadcastMessage, DocumentSource, FetchResponse,
    ListenerId, SharedStore,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::SyncConfig;
pub use error::{Result, SyncError};
pub use manager::SheetManager;
pub use state::{SheetState, ValueStore};
pub use subscriptions::{
    ChangeHandle, DropReason, SubscriptionId, SubscriptionManager, Topic, ValueEvent,
};
pub use sync::{
    PeriodicScheduler, RefreshOutcome, SubscriptionListener, SyncCounters, SyncStats,
    UpdateCoordinator, WriteBack,
};
pub use types::*;
pub use values::{parse_document, Rect, TypeRegistry, TypedValue, UDim2, Vector2, Vector3};
