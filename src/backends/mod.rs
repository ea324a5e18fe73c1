//! External collaborators.
//!
//! The engine talks to three services it does not own:
//! - a [`DocumentSource`] that exports the remote sheet as text
//! - a [`SharedStore`] every process can read and atomically update
//! - a [`Broadcast`] topic service used to push fresh documents to peers
//!
//! [`memory`] provides in-process implementations of all three.

mod broadcast;
pub mod memory;
mod source;
mod store;

pub use broadcast::{Broadcast, BroadcastHandler, BroadcastMessage, ListenerId};
pub use source::{DocumentSource, FetchResponse};
pub use store::SharedStore;

use std::sync::Arc;

use crate::clock::{Clock, SystemClock};

/// The collaborators a manager runs against.
#[derive(Clone)]
pub struct Backends {
    pub source: Arc<dyn DocumentSource>,
    pub store: Arc<dyn SharedStore>,
    pub broadcast: Arc<dyn Broadcast>,
    pub clock: Arc<dyn Clock>,
}

impl Backends {
    /// Bundle collaborators using the wall clock.
    pub fn new(
        source: Arc<dyn DocumentSource>,
        store: Arc<dyn SharedStore>,
        broadcast: Arc<dyn Broadcast>,
    ) -> Self {
        Self {
            source,
            store,
            broadcast,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}
