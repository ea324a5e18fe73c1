//! Subscription manager for fanning out value changes.

use crossbeam_channel::{bounded, Sender};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::trace;

use super::types::{ChangeHandle, DropReason, SubscriptionId, Topic, ValueEvent};
use crate::values::TypedValue;

/// Default per-observer buffer size.
pub const DEFAULT_BUFFER_SIZE: usize = 64;

/// Internal subscriber state.
struct Subscriber {
    id: SubscriptionId,
    sender: Sender<ValueEvent>,
}

impl Subscriber {
    /// Try to send an event. Returns false if the buffer is full or the receiver is gone.
    fn try_send(&self, event: ValueEvent) -> bool {
        self.sender.try_send(event).is_ok()
    }
}

/// Manages per-topic observers and delivers change events.
///
/// A topic entry is created on first subscribe and retained until
/// [`close_all`](SubscriptionManager::close_all).
pub struct SubscriptionManager {
    /// Subscribers grouped by topic.
    topics: RwLock<HashMap<Topic, Vec<Subscriber>>>,
    /// Counter for generating subscription IDs.
    next_id: AtomicU64,
    /// Buffer size for new subscribers.
    buffer_size: usize,
    /// Set once all channels have been released.
    closed: AtomicBool,
}

impl SubscriptionManager {
    /// Create a new subscription manager.
    pub fn new() -> Self {
        Self::with_buffer_size(DEFAULT_BUFFER_SIZE)
    }

    /// Create a new subscription manager with a custom per-observer buffer.
    pub fn with_buffer_size(buffer_size: usize) -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            buffer_size: buffer_size.max(1),
            closed: AtomicBool::new(false),
        }
    }

    /// Register a new observer for a topic.
    ///
    /// After [`close_all`](Self::close_all) the returned handle yields a single
    /// `Closed` event and then disconnects.
    pub fn subscribe(&self, topic: Topic) -> ChangeHandle {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (sender, receiver) = bounded(self.buffer_size);

        let mut topics = self.topics.write();
        if self.closed.load(Ordering::SeqCst) {
            let _ = sender.try_send(ValueEvent::Closed {
                reason: DropReason::Destroyed,
            });
        } else {
            topics
                .entry(topic.clone())
                .or_default()
                .push(Subscriber { id, sender });
            trace!(subscription_id = id.0, topic = ?topic, "Observer registered");
        }

        ChangeHandle {
            id,
            topic,
            receiver,
        }
    }

    /// Unsubscribe and clean up. Returns false if the id was unknown.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut topics = self.topics.write();
        for subscribers in topics.values_mut() {
            if let Some(pos) = subscribers.iter().position(|s| s.id == id) {
                let sub = subscribers.remove(pos);
                // Best effort
                let _ = sub.sender.try_send(ValueEvent::Closed {
                    reason: DropReason::Unsubscribed,
                });
                return true;
            }
        }
        false
    }

    /// Number of live observers across all topics.
    pub fn subscription_count(&self) -> usize {
        self.topics.read().values().map(Vec::len).sum()
    }

    /// Number of topics that have ever been subscribed to.
    pub fn topic_count(&self) -> usize {
        self.topics.read().len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    // --- Delivery ---

    /// Notify observers of one name that its value changed.
    pub fn notify_changed(&self, name: &str, new: &TypedValue, old: Option<&TypedValue>) {
        let topic = Topic::Value(name.to_string());
        if !self.has_subscribers(&topic) {
            return;
        }

        let event = ValueEvent::Changed {
            name: name.to_string(),
            new: new.clone(),
            old: old.cloned(),
        };
        self.deliver(&topic, event);
    }

    /// Notify aggregate observers with the full new value map.
    pub fn notify_all(&self, values: &HashMap<String, TypedValue>) {
        if !self.has_subscribers(&Topic::Any) {
            return;
        }

        let event = ValueEvent::AllChanged {
            values: values.clone(),
        };
        self.deliver(&Topic::Any, event);
    }

    /// Close every channel. No further events are delivered.
    pub fn close_all(&self, reason: DropReason) {
        let mut topics = self.topics.write();
        self.closed.store(true, Ordering::SeqCst);
        for (_, subscribers) in topics.drain() {
            for sub in subscribers {
                let _ = sub.sender.try_send(ValueEvent::Closed {
                    reason: reason.clone(),
                });
            }
        }
    }

    fn has_subscribers(&self, topic: &Topic) -> bool {
        self.topics
            .read()
            .get(topic)
            .map_or(false, |subs| !subs.is_empty())
    }

    /// Internal delivery helper. Drops subscribers that fail to receive.
    fn deliver(&self, topic: &Topic, event: ValueEvent) {
        let mut to_remove = Vec::new();

        {
            let topics = self.topics.read();
            if let Some(subscribers) = topics.get(topic) {
                for sub in subscribers {
                    if !sub.try_send(event.clone()) {
                        to_remove.push(sub.id);
                    }
                }
            }
        }

        // Remove dropped subscribers
        if !to_remove.is_empty() {
            let mut topics = self.topics.write();
            if let Some(subscribers) = topics.get_mut(topic) {
                subscribers.retain(|sub| {
                    if to_remove.contains(&sub.id) {
                        // Might fail too, that's ok
                        let _ = sub.sender.try_send(ValueEvent::Closed {
                            reason: DropReason::BufferOverflow,
                        });
                        false
                    } else {
                        true
                    }
                });
            }
        }
    }
}

impl Default for SubscriptionManager {
    fn default() -> Self {
        Self::new()
    }
}
