//! Domain types with no I/O: session handles and the slot that owns them.

pub mod handle;

pub use handle::{HandleResolver, HandleSlot, SessionHandle};
