//! Loopback native session.
//!
//! Plays the part of a native audio/video session without any media stack.
//! Each command is answered with the notification a real session would emit:
//!
//! | Command                    | Notification(s)                                  |
//! |----------------------------|--------------------------------------------------|
//! | Connect (non-empty room)   | `onRoomDidConnect`, `onLocalParticipantSupportedCodecs` |
//! | Connect (empty room name)  | `onRoomDidFailToConnect`                         |
//! | Disconnect                 | `onRoomDidDisconnect` (only when connected)      |
//! | SwitchCamera               | `onCameraSwitched`                               |
//! | ToggleVideo / ToggleAudio  | `onVideoChanged` / `onAudioChanged`              |
//! | GetStats                   | `onStatsReceived`                                |
//! | SendMessage                | `onDataTrackMessageReceived` (own message echoed)|
//!
//! Every notification is stamped with the handle the command was sent to.
//! Everything else is accepted and logged.  Notifications are pushed onto an
//! `std::sync::mpsc` channel; the host drains it and feeds each one to
//! [`BridgeCoordinator::handle_notification`].
//!
//! [`BridgeCoordinator::handle_notification`]:
//!     crate::application::coordinate_lifecycle::BridgeCoordinator::handle_notification

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Mutex, PoisonError};

use avbridge_core::{Command, CommandArg, EventName, NativeNotification, Opcode, SessionHandle};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::application::dispatch_command::NativeSession;

#[derive(Debug, Default)]
struct LoopbackState {
    room: Option<String>,
    back_camera: bool,
}

/// A [`NativeSession`] that answers its own commands.
#[derive(Debug)]
pub struct LoopbackSession {
    events: Sender<NativeNotification>,
    state: Mutex<LoopbackState>,
}

impl LoopbackSession {
    /// Creates the session and the receiver its notifications arrive on.
    pub fn new() -> (Self, Receiver<NativeNotification>) {
        let (events, rx) = mpsc::channel();
        let session = Self {
            events,
            state: Mutex::new(LoopbackState::default()),
        };
        (session, rx)
    }

    fn emit(&self, handle: SessionHandle, name: EventName, native_event: Value) {
        let notification = NativeNotification::new(name, native_event).stamped(handle);
        if self.events.send(notification).is_err() {
            warn!(event = %name, "notification receiver dropped");
        }
    }

    fn respond(&self, handle: SessionHandle, opcode: Opcode, args: &[CommandArg]) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        match opcode {
            Opcode::Connect => {
                let room = text_arg(args, 0).unwrap_or_default().to_string();
                if room.is_empty() {
                    self.emit(
                        handle,
                        EventName::RoomDidFailToConnect,
                        json!({ "roomName": room, "error": "room name must not be empty" }),
                    );
                    return;
                }
                self.emit(
                    handle,
                    EventName::RoomDidConnect,
                    json!({
                        "roomName": room,
                        "roomSid": format!("RM-loopback-{}", handle.id()),
                        "participants": [],
                    }),
                );
                self.emit(
                    handle,
                    EventName::LocalParticipantSupportedCodecs,
                    json!({ "supportedCodecs": ["VP8", "H264", "opus"] }),
                );
                state.room = Some(room);
            }
            Opcode::Disconnect => {
                if let Some(room) = state.room.take() {
                    let event = json!({ "roomName": room, "error": null });
                    self.emit(handle, EventName::RoomDidDisconnect, event);
                }
            }
            Opcode::SwitchCamera => {
                state.back_camera = !state.back_camera;
                let event = json!({ "isBackCamera": state.back_camera });
                self.emit(handle, EventName::CameraSwitched, event);
            }
            Opcode::ToggleVideo => {
                let enabled = bool_arg(args, 0);
                self.emit(handle, EventName::VideoChanged, json!({ "videoEnabled": enabled }));
            }
            Opcode::ToggleAudio => {
                let enabled = bool_arg(args, 0);
                self.emit(handle, EventName::AudioChanged, json!({ "audioEnabled": enabled }));
            }
            Opcode::GetStats => {
                self.emit(
                    handle,
                    EventName::StatsReceived,
                    json!({
                        "loopback": { "remoteAudioTrackStats": [], "remoteVideoTrackStats": [] }
                    }),
                );
            }
            Opcode::SendMessage => {
                let message = text_arg(args, 0).unwrap_or_default();
                self.emit(
                    handle,
                    EventName::DataTrackMessageReceived,
                    json!({ "message": message, "trackSid": "MT-loopback" }),
                );
            }
            Opcode::ReleaseResources => {
                state.room = None;
            }
            _ => {}
        }
    }
}

impl NativeSession for LoopbackSession {
    fn send(&self, handle: SessionHandle, command: Command) {
        debug!(
            handle = %handle,
            opcode = %command.opcode(),
            args = %command.args_json(),
            "loopback received command"
        );
        self.respond(handle, command.opcode(), command.args());
    }
}

fn bool_arg(args: &[CommandArg], position: usize) -> bool {
    matches!(args.get(position), Some(CommandArg::Bool(true)))
}

fn text_arg(args: &[CommandArg], position: usize) -> Option<&str> {
    match args.get(position) {
        Some(CommandArg::Text(text)) => Some(text.as_str()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use avbridge_core::ConnectOptions;

    fn names(rx: &Receiver<NativeNotification>) -> Vec<String> {
        rx.try_iter().map(|n| n.name).collect()
    }

    #[test]
    fn test_connect_then_disconnect_emits_lifecycle_events() {
        // Arrange
        let (session, rx) = LoopbackSession::new();
        let handle = SessionHandle::allocate();

        // Act
        session.send(handle, Command::connect(&ConnectOptions::new("room1", "tok")));
        session.send(handle, Command::disconnect());

        // Assert
        assert_eq!(
            names(&rx),
            vec![
                "onRoomDidConnect",
                "onLocalParticipantSupportedCodecs",
                "onRoomDidDisconnect",
            ]
        );
    }

    #[test]
    fn test_connect_to_empty_room_fails() {
        let (session, rx) = LoopbackSession::new();

        let options = ConnectOptions::new("", "tok");

        session.send(SessionHandle::allocate(), Command::connect(&options));

        let events: Vec<NativeNotification> = rx.try_iter().collect();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "onRoomDidFailToConnect");
        assert_eq!(events[0].native_event["roomName"], "");
    }

    #[test]
    fn test_disconnect_without_room_emits_nothing() {
        let (session, rx) = LoopbackSession::new();

        session.send(SessionHandle::allocate(), Command::disconnect());

        assert!(names(&rx).is_empty());
    }

    #[test]
    fn test_switch_camera_alternates() {
        let (session, rx) = LoopbackSession::new();
        let handle = SessionHandle::allocate();

        session.send(handle, Command::switch_camera());
        session.send(handle, Command::switch_camera());

        let flags: Vec<Value> = rx
            .try_iter()
            .map(|n| n.native_event["isBackCamera"].clone())
            .collect();
        assert_eq!(flags, vec![json!(true), json!(false)]);
    }

    #[test]
    fn test_send_message_is_echoed() {
        let (session, rx) = LoopbackSession::new();

        session.send(SessionHandle::allocate(), Command::send_message("ping"));

        let event = rx.try_recv().expect("one notification");
        assert_eq!(event.name, "onDataTrackMessageReceived");
        assert_eq!(event.native_event["message"], "ping");
    }

    #[test]
    fn test_notifications_are_stamped_with_sending_handle() {
        let (session, rx) = LoopbackSession::new();
        let first = SessionHandle::allocate();
        let second = SessionHandle::allocate();

        session.send(first, Command::get_stats());
        session.send(second, Command::toggle_video(true));

        let origins: Vec<_> = rx.try_iter().map(|n| n.handle).collect();
        assert_eq!(origins, vec![Some(first), Some(second)]);
    }

    #[test]
    fn test_dropped_receiver_does_not_panic() {
        let (session, rx) = LoopbackSession::new();
        drop(rx);

        session.send(SessionHandle::allocate(), Command::get_stats());
    }
}
