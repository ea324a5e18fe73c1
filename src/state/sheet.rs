//! Value store for one synchronized sheet.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, trace};

use crate::subscriptions::{ChangeHandle, DropReason, SubscriptionId, SubscriptionManager, Topic};
use crate::types::{Timestamp, UpdateSource, ValueRow};
use crate::values::{parse_document, TypeRegistry, TypedValue};

/// Durable state of one synchronized document.
#[derive(Clone, Debug, Default)]
pub struct SheetState {
    pub values: HashMap<String, TypedValue>,
    /// Timestamp of the data currently held. Never decreases.
    pub last_updated: Timestamp,
    /// Provenance of the last accepted update; `None` until the first one.
    pub last_source: Option<UpdateSource>,
}

/// Holds the current values of a sheet and notifies observers of changes.
///
/// Reads take the state lock only briefly; apply holds it for the whole
/// compare-and-write so concurrent appliers are serialized.
pub struct ValueStore {
    state: Mutex<SheetState>,
    registry: TypeRegistry,
    subscriptions: SubscriptionManager,
    alive: AtomicBool,
}

impl ValueStore {
    /// Create an empty store with `last_updated = 0`.
    pub fn new(registry: TypeRegistry, buffer_size: usize) -> Self {
        Self {
            state: Mutex::new(SheetState::default()),
            registry,
            subscriptions: SubscriptionManager::with_buffer_size(buffer_size),
            alive: AtomicBool::new(true),
        }
    }

    /// Apply a candidate set of rows stamped with `timestamp`.
    ///
    /// Returns true if at least one value changed. Stale candidates
    /// (`timestamp <= last_updated`) and applies after [`close`](Self::close)
    /// return false without mutation.
    pub fn apply(&self, rows: &[ValueRow], timestamp: Timestamp, source: UpdateSource) -> bool {
        let mut state = self.state.lock();

        if !self.is_alive() {
            debug!(timestamp = %timestamp, "Ignoring apply on closed store");
            return false;
        }

        if timestamp <= state.last_updated {
            debug!(
                timestamp = %timestamp,
                last_updated = %state.last_updated,
                source = %source,
                "Discarding stale candidate"
            );
            return false;
        }

        state.last_updated = timestamp;
        state.last_source = Some(source);

        let mut changed = 0usize;
        for row in rows {
            let new = self.registry.parse(&row.type_tag, &row.raw);
            if state.values.get(&row.name) == Some(&new) {
                continue;
            }

            let old = state.values.insert(row.name.clone(), new.clone());
            trace!(name = %row.name, value = %new, "Value changed");
            self.subscriptions.notify_changed(&row.name, &new, old.as_ref());
            changed += 1;
        }

        if changed > 0 {
            self.subscriptions.notify_all(&state.values);
        }

        debug!(
            timestamp = %timestamp,
            source = %source,
            rows = rows.len(),
            changed,
            "Applied candidate"
        );
        changed > 0
    }

    /// Parse a document and apply its rows.
    pub fn apply_document(&self, document: &str, timestamp: Timestamp, source: UpdateSource) -> bool {
        let rows = parse_document(document);
        self.apply(&rows, timestamp, source)
    }

    /// The stored value for `name`, or `default` if absent.
    pub fn get(&self, name: &str, default: TypedValue) -> TypedValue {
        self.value(name).unwrap_or(default)
    }

    /// The stored value for `name`, if any.
    pub fn value(&self, name: &str) -> Option<TypedValue> {
        self.state.lock().values.get(name).cloned()
    }

    /// Snapshot of every value.
    pub fn values(&self) -> HashMap<String, TypedValue> {
        self.state.lock().values.clone()
    }

    /// Snapshot of the full state.
    pub fn snapshot(&self) -> SheetState {
        self.state.lock().clone()
    }

    pub fn last_updated(&self) -> Timestamp {
        self.state.lock().last_updated
    }

    pub fn last_source(&self) -> Option<UpdateSource> {
        self.state.lock().last_source
    }

    /// Subscribe to changes of one value.
    pub fn on_change(&self, name: &str) -> ChangeHandle {
        self.subscriptions.subscribe(Topic::Value(name.to_string()))
    }

    /// Subscribe to any change; events carry the full value map.
    pub fn on_any_change(&self) -> ChangeHandle {
        self.subscriptions.subscribe(Topic::Any)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscriptions.unsubscribe(id)
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.subscription_count()
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Stop accepting applies and release every observer channel.
    pub fn close(&self) {
        // Taking the state lock waits out any apply in progress.
        let _state = self.state.lock();
        if self.alive.swap(false, Ordering::SeqCst) {
            self.subscriptions.close_all(DropReason::Destroyed);
        }
    }
}

impl Default for ValueStore {
    fn default() -> Self {
        Self::new(TypeRegistry::new(), crate::subscriptions::DEFAULT_BUFFER_SIZE)
    }
}
