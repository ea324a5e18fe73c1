//! Topic publish/subscribe.

use crate::error::Result;
use crate::types::SheetKey;

/// A message received on a topic.
#[derive(Clone, Debug, PartialEq)]
pub struct BroadcastMessage {
    pub body: String,
    /// Send time in fractional Unix seconds.
    pub sent: f64,
}

/// Callback invoked for every message on a subscribed topic.
pub type BroadcastHandler = Box<dyn Fn(BroadcastMessage) + Send + Sync>;

/// Identifies one registered handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Best-effort broadcast channel.
pub trait Broadcast: Send + Sync {
    fn publish(&self, topic: &SheetKey, body: &str) -> Result<()>;

    fn subscribe(&self, topic: &SheetKey, handler: BroadcastHandler) -> Result<ListenerId>;

    /// Remove a handler. Unknown ids are ignored.
    fn unsubscribe(&self, topic: &SheetKey, id: ListenerId);
}
