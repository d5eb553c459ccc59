//! # avbridge-core
//!
//! Shared library for AV-Bridge containing the command opcode table, the
//! event-name registry, and the session handle types.
//!
//! This crate is used by the host crate that drives a native audio/video
//! session.  It has zero dependencies on platform bindings, UI frameworks,
//! or async runtimes.
//!
//! # Architecture overview (for beginners)
//!
//! AV-Bridge sits between a managed application (typically a scripting layer)
//! and a native, stateful audio/video session object.  The application never
//! touches the native object directly.  Instead:
//!
//! - Calls flow **down** as [`Command`]s: a stable numeric [`Opcode`] plus an
//!   ordered argument list, addressed to an opaque [`SessionHandle`].
//! - Notifications flow **up** as named events ([`EventName`]) carrying an
//!   opaque [`EventPayload`] that the bridge never looks inside.
//!
//! This crate (`avbridge-core`) is the shared contract.  It defines:
//!
//! - **`protocol`** – The opcode table, command construction (including the
//!   argument-order contract for `connect`), and the event-name registry.
//!   Both tables are append-only: a shipped value is never changed or reused.
//!
//! - **`domain`** – Session handles.  A handle is an arena-style token that is
//!   validated for liveness on every use and retired exactly once.

pub mod domain;
pub mod protocol;

pub use domain::handle::{HandleResolver, HandleSlot, SessionHandle};
pub use protocol::command::{
    CameraType, Command, CommandArg, ConnectOptions, ContractViolation, EncodingParameters,
};
pub use protocol::events::{EventName, EventPayload, NativeNotification, UnknownEventName};
pub use protocol::opcodes::{ArgKind, Opcode, PROTOCOL_VERSION};
