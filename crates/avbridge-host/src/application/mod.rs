//! Application layer: the three components of the bridge.
//!
//! # What is the "application" layer? (for beginners)
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (pure protocol tables in `avbridge-core`) and the infrastructure (platform
//! bindings, config files, the script-call surface).
//!
//! Use cases in this layer:
//!
//! - **Depend on abstractions** (the [`dispatch_command::NativeSession`]
//!   trait) rather than a concrete native binding, so the platform side can
//!   be swapped or mocked without touching this code.
//! - **Contain no platform calls, no file system access, no threads**.
//!
//! # Sub-modules
//!
//! - **`dispatch_command`** – Sends one command to the live native handle, or
//!   does nothing if there is none.  Fire-and-forget.
//!
//! - **`demux_events`** – Routes each named native notification to the single
//!   handler registered for that name.
//!
//! - **`coordinate_lifecycle`** – Owns the handle, exposes the public
//!   operation surface, and guarantees exactly one release per handle.

pub mod coordinate_lifecycle;
pub mod demux_events;
pub mod dispatch_command;
