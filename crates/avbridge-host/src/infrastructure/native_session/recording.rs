//! Recording native session.
//!
//! Stores every command it is handed, in order, so tests can assert on the
//! exact opcode and argument sequence that reached the native boundary.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use avbridge_core::{Command, CommandArg, Opcode, SessionHandle};

use crate::application::dispatch_command::NativeSession;

/// One command as it arrived at the native boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct SentCommand {
    pub handle: SessionHandle,
    pub opcode: Opcode,
    pub args: Vec<CommandArg>,
}

impl SentCommand {
    /// The argument list as the JSON array the native side would receive.
    pub fn args_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.args).unwrap_or(serde_json::Value::Null)
    }
}

/// A [`NativeSession`] that records instead of sending.
///
/// Clones share the same log, so a test can keep one clone and hand the
/// other to a coordinator.
#[derive(Debug, Clone, Default)]
pub struct RecordingSession {
    sent: Arc<Mutex<Vec<SentCommand>>>,
}

impl RecordingSession {
    pub fn new() -> Self {
        Self::default()
    }

    fn log(&self) -> MutexGuard<'_, Vec<SentCommand>> {
        // A panicking test thread must not hide what was recorded before it.
        self.sent.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of everything sent so far.
    pub fn sent(&self) -> Vec<SentCommand> {
        self.log().clone()
    }

    /// Removes and returns everything sent so far.
    pub fn take(&self) -> Vec<SentCommand> {
        std::mem::take(&mut *self.log())
    }

    /// Number of commands with `opcode`.
    pub fn count(&self, opcode: Opcode) -> usize {
        self.log().iter().filter(|c| c.opcode == opcode).count()
    }

    pub fn len(&self) -> usize {
        self.log().len()
    }

    pub fn is_empty(&self) -> bool {
        self.log().is_empty()
    }

    pub fn last(&self) -> Option<SentCommand> {
        self.log().last().cloned()
    }
}

impl NativeSession for RecordingSession {
    fn send(&self, handle: SessionHandle, command: Command) {
        let (opcode, args) = command.into_parts();
        self.log().push(SentCommand { handle, opcode, args });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_records_commands_in_order() {
        // Arrange
        let session = RecordingSession::new();
        let handle = SessionHandle::allocate();

        // Act
        session.send(handle, Command::toggle_audio(true));
        session.send(handle, Command::send_message("hi"));

        // Assert
        let sent = session.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].opcode, Opcode::ToggleAudio);
        assert_eq!(sent[1].opcode, Opcode::SendMessage);
        assert_eq!(sent[1].args_json(), json!(["hi"]));
        assert_eq!(sent[1].handle, handle);
    }

    #[test]
    fn test_clones_share_the_log() {
        let session = RecordingSession::new();
        let observer = session.clone();

        session.send(SessionHandle::allocate(), Command::get_stats());

        assert_eq!(observer.count(Opcode::GetStats), 1);
    }

    #[test]
    fn test_take_drains_the_log() {
        let session = RecordingSession::new();
        session.send(SessionHandle::allocate(), Command::disconnect());

        let drained = session.take();

        assert_eq!(drained.len(), 1);
        assert!(session.is_empty());
    }
}
