//! Change notifications for sheet values.
//!
//! Observers register interest either in one value name or in any change:
//! - per-name subscriptions receive `(new, old)` for that name
//! - aggregate subscriptions receive the full value map once per apply
//!
//! Every observer gets its own bounded buffer. Slow observers are dropped
//! rather than stalling the apply path.
//!
//! # Example
//!
//! ```ignore
//! let handle = manager.subscribe("Health");
//!
//! loop {
//!     match handle.recv() {
//!         Ok(ValueEvent::Changed { new, old, .. }) => println!("{:?} -> {}", old, new),
//!         Ok(ValueEvent::Closed { .. }) | Err(_) => break,
//!         Ok(_) => {}
//!     }
//! }
//! ```

mod manager;
mod types;

pub use manager::{SubscriptionManager, DEFAULT_BUFFER_SIZE};
pub use types::{ChangeHandle, DropReason, SubscriptionId, Topic, ValueEvent};
