//! Subscription types for value change notifications.

use crate::values::TypedValue;
use std::collections::HashMap;

/// What an observer is interested in.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Changes to one named value.
    Value(String),
    /// Any change; delivers the full value map once per apply.
    Any,
}

/// Events delivered to observers.
#[derive(Clone, Debug, PartialEq)]
pub enum ValueEvent {
    /// A single value changed. `old` is `None` if the name was new.
    Changed {
        name: String,
        new: TypedValue,
        old: Option<TypedValue>,
    },

    /// At least one value changed in an apply; carries the full new map.
    AllChanged { values: HashMap<String, TypedValue> },

    /// The subscription was closed and will receive nothing further.
    Closed { reason: DropReason },
}

/// Why a subscription was closed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DropReason {
    /// Send buffer overflowed (slow consumer).
    BufferOverflow,
    /// Explicitly unsubscribed.
    Unsubscribed,
    /// The owning manager was destroyed.
    Destroyed,
}

/// Unique identifier for a subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Handle to receive change notifications.
pub struct ChangeHandle {
    pub id: SubscriptionId,
    pub topic: Topic,
    /// Channel to receive events.
    pub receiver: crossbeam_channel::Receiver<ValueEvent>,
}

impl ChangeHandle {
    /// Receive the next event (blocking).
    pub fn recv(&self) -> Result<ValueEvent, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive an event (non-blocking).
    pub fn try_recv(&self) -> Result<ValueEvent, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(
        &self,
        timeout: std::time::Duration,
    ) -> Result<ValueEvent, crossbeam_channel::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Drain everything currently buffered.
    pub fn try_iter(&self) -> crossbeam_channel::TryIter<'_, ValueEvent> {
        self.receiver.try_iter()
    }
}
