//! In-memory sheet state.
//!
//! All mutation funnels through [`ValueStore::apply`], which enforces the
//! staleness guard: a candidate whose timestamp is not strictly newer than the
//! data already held is discarded without touching any value.

mod sheet;

pub use sheet::{SheetState, ValueStore};
