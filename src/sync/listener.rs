//! Applies documents pushed by peers over the broadcast topic.

use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tracing::{debug, warn};

use super::stats::SyncCounters;
use crate::backends::{Broadcast, BroadcastMessage, ListenerId};
use crate::state::ValueStore;
use crate::types::{SheetKey, Timestamp, UpdateSource};

/// Subscription to this sheet's broadcast topic.
///
/// Startup failures are logged and leave the listener inactive; the manager
/// then relies on polling alone.
pub struct SubscriptionListener {
    key: SheetKey,
    broadcast: Arc<dyn Broadcast>,
    listener: Mutex<Option<ListenerId>>,
}

impl SubscriptionListener {
    /// Subscribe to `key`'s topic and feed newer messages into `values`.
    pub fn start(
        key: SheetKey,
        broadcast: Arc<dyn Broadcast>,
        values: &Arc<ValueStore>,
        counters: Arc<SyncCounters>,
    ) -> Self {
        let weak: Weak<ValueStore> = Arc::downgrade(values);
        let handler = Box::new(move |message: BroadcastMessage| {
            if let Some(values) = weak.upgrade() {
                handle_message(&values, &counters, message);
            }
        });

        let listener = match broadcast.subscribe(&key, handler) {
            Ok(id) => {
                debug!(key = %key, listener = id.0, "Subscribed to broadcast topic");
                Some(id)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Broadcast subscribe failed, polling only");
                None
            }
        };

        Self {
            key,
            broadcast,
            listener: Mutex::new(listener),
        }
    }

    /// Listener that never subscribed, for managers with broadcasts disabled.
    pub fn inactive(key: SheetKey, broadcast: Arc<dyn Broadcast>) -> Self {
        Self {
            key,
            broadcast,
            listener: Mutex::new(None),
        }
    }

    pub fn is_listening(&self) -> bool {
        self.listener.lock().is_some()
    }

    /// Unsubscribe. Safe to call more than once.
    pub fn stop(&self) {
        if let Some(id) = self.listener.lock().take() {
            self.broadcast.unsubscribe(&self.key, id);
            debug!(key = %self.key, listener = id.0, "Unsubscribed from broadcast topic");
        }
    }
}

/// Apply a message if it is newer than what `values` holds.
fn handle_message(values: &ValueStore, counters: &SyncCounters, message: BroadcastMessage) {
    let sent = Timestamp::from_secs_f64(message.sent);
    if sent <= values.last_updated() {
        SyncCounters::bump(&counters.broadcasts_discarded);
        debug!(sent = %sent, "Discarding broadcast not newer than local state");
        return;
    }

    SyncCounters::bump(&counters.broadcasts_applied);
    values.apply_document(&message.body, sent, UpdateSource::Broadcast);
}
