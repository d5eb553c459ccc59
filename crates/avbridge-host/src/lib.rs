//! avbridge-host library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! ```text
//! managed application
//!   │  calls                          ▲ callbacks
//!   ▼                                 │
//! application::coordinate_lifecycle (BridgeCoordinator)
//!   │                                 ▲
//!   ▼                                 │
//! application::dispatch_command   application::demux_events
//!   │                                 ▲
//!   ▼                                 │
//! infrastructure::native_session  (NativeSession adapters)
//! ```

pub mod application;
pub mod infrastructure;
