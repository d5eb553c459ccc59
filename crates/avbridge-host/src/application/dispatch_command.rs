//! CommandDispatcher: sends commands to the live native session.
//!
//! Dispatch is one-way.  The native side returns nothing and acknowledges
//! nothing; if the caller needs to know a command took effect it must wait
//! for the corresponding event (e.g. `onRoomDidConnect` after `connect`).
//!
//! # Error policy
//!
//! | Situation                          | Outcome                                   |
//! |------------------------------------|-------------------------------------------|
//! | no live handle (mount/unmount race)| silent no-op, [`Dispatch::NoLiveHandle`]  |
//! | unknown opcode / malformed args    | panic in debug builds, `Err` in release   |
//!
//! # Architecture
//!
//! The dispatcher depends only on the [`NativeSession`] trait and a
//! [`HandleResolver`].  Platform bindings implement the trait; tests inject a
//! mock.

use avbridge_core::{Command, ContractViolation, HandleResolver, SessionHandle};
use serde_json::Value;
use tracing::{debug, error, trace};

/// The platform binding that delivers a command to a native session.
///
/// Implementations must forward `command` to the instance behind `handle`
/// unchanged and must not block waiting for the native side.
#[cfg_attr(test, mockall::automock)]
pub trait NativeSession {
    fn send(&self, handle: SessionHandle, command: Command);
}

/// What happened to a dispatched command.
///
/// This is informational only: `Sent` does not mean the native side applied
/// the command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Handed to the native binding for this handle.
    Sent(SessionHandle),
    /// No live handle; nothing was sent.
    NoLiveHandle,
}

impl Dispatch {
    pub fn was_sent(self) -> bool {
        matches!(self, Dispatch::Sent(_))
    }
}

/// Routes commands to whichever handle the resolver reports as live.
pub struct CommandDispatcher<S> {
    native: S,
}

impl<S: NativeSession> CommandDispatcher<S> {
    pub fn new(native: S) -> Self {
        Self { native }
    }

    /// Returns the underlying native binding.
    pub fn native(&self) -> &S {
        &self.native
    }

    /// Sends `command` to the live handle, if there is one.
    ///
    /// Arguments are forwarded in order and unmodified.  With no live handle
    /// the command is dropped without error.
    pub fn dispatch(&self, resolver: &dyn HandleResolver, command: Command) -> Dispatch {
        let Some(handle) = resolver.resolve() else {
            trace!(opcode = %command.opcode(), "no live handle; command dropped");
            return Dispatch::NoLiveHandle;
        };

        debug!(handle = %handle, opcode = %command.opcode(), "dispatching command");
        self.native.send(handle, command);
        Dispatch::Sent(handle)
    }

    /// Validates an untyped opcode and argument list, then dispatches it.
    ///
    /// Values are taken as they arrive from the script layer; nothing is
    /// coerced into a matching argument type.
    ///
    /// # Errors
    ///
    /// Returns [`ContractViolation`] for an unknown or malformed opcode, or
    /// arguments that do not match its signature.  In debug builds this
    /// panics instead, because it is a programming error on the calling side.
    pub fn dispatch_raw(
        &self,
        resolver: &dyn HandleResolver,
        opcode: &Value,
        args: Vec<Value>,
    ) -> Result<Dispatch, ContractViolation> {
        let command = Command::from_json(opcode, args).map_err(report_violation)?;
        Ok(self.dispatch(resolver, command))
    }
}

fn report_violation(violation: ContractViolation) -> ContractViolation {
    error!(%violation, "command contract violation");
    if cfg!(debug_assertions) {
        panic!("command contract violation: {violation}");
    }
    violation
}
