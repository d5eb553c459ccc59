//! Native session adapters.
//!
//! A real deployment implements
//! [`NativeSession`](crate::application::dispatch_command::NativeSession) in
//! the platform binding that owns the native audio/video object.  This module
//! ships the two adapters that need no platform at all:
//!
//! - **`recording`** – Stores every command it receives.  Used by integration
//!   tests and by anything that wants to inspect traffic after the fact.
//! - **`loopback`** – Answers lifecycle commands with the notifications a real
//!   native session would emit.  Drives the `avbridge-host` smoke binary.

pub mod loopback;
pub mod recording;

pub use loopback::LoopbackSession;
pub use recording::{RecordingSession, SentCommand};
