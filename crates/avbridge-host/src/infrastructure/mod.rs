//! Infrastructure layer for the bridge host.
//!
//! Contains the adapters around the application layer: native session
//! bindings, file-system storage, and the JSON script-call surface.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `avbridge_core`, but MUST NOT be imported by the `application` layer.

pub mod native_session;
pub mod script_bridge;
pub mod storage;
