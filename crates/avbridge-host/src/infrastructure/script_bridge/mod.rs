//! Script bridge: the JSON call surface for the managed layer.
//!
//! The managed application talks to the bridge through JSON objects tagged
//! with a `method` field, one method per coordinator operation:
//!
//! ```json
//! { "method": "connect", "roomName": "room1", "accessToken": "tok", "cameraType": "back" }
//! { "method": "setLocalVideoEnabled", "enabled": false }
//! { "method": "dispatchCommand", "opcode": 6, "args": [] }
//! ```
//!
//! Outbound events use the shape `{ "type": "<wire name>", "nativeEvent": ... }`.
//!
//! # `CallResult<T>` wrapper
//!
//! Every call returns `{ success: bool, data: T | null, error: string | null }`
//! so the managed side can always read `result.success` without a try/catch.

use std::sync::mpsc::Sender;

use avbridge_core::{
    CameraType, ConnectOptions, ContractViolation, EncodingParameters, EventName, EventPayload,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::application::coordinate_lifecycle::{BridgeCoordinator, ConnectDefaults};
use crate::application::demux_events::EventCallbacks;
use crate::application::dispatch_command::{Dispatch, NativeSession};

/// Errors raised before a call reaches the coordinator.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("malformed script call: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Contract(#[from] ContractViolation),
}

// ── Call envelope ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallResult<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> CallResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

// ── Calls ─────────────────────────────────────────────────────────────────────

/// Connect request; every flag left out falls back to the configured default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectCall {
    pub room_name: String,
    pub access_token: String,
    pub enable_audio: Option<bool>,
    pub enable_video: Option<bool>,
    pub enable_remote_audio: Option<bool>,
    pub enable_network_quality_reporting: Option<bool>,
    pub dominant_speaker_enabled: Option<bool>,
    pub maintain_video_track_in_background: Option<bool>,
    pub camera_type: Option<CameraType>,
    pub encoding_parameters: Option<EncodingParameters>,
}

impl ConnectCall {
    pub fn into_options(self, defaults: &ConnectDefaults) -> ConnectOptions {
        let base = defaults.options(self.room_name, self.access_token);
        ConnectOptions {
            enable_audio: self.enable_audio.unwrap_or(base.enable_audio),
            enable_video: self.enable_video.unwrap_or(base.enable_video),
            enable_remote_audio: self.enable_remote_audio.unwrap_or(base.enable_remote_audio),
            enable_network_quality_reporting: self
                .enable_network_quality_reporting
                .unwrap_or(base.enable_network_quality_reporting),
            dominant_speaker_enabled: self
                .dominant_speaker_enabled
                .unwrap_or(base.dominant_speaker_enabled),
            maintain_video_track_in_background: self
                .maintain_video_track_in_background
                .unwrap_or(base.maintain_video_track_in_background),
            camera_type: self.camera_type.unwrap_or(base.camera_type),
            encoding_parameters: self.encoding_parameters.unwrap_or(base.encoding_parameters),
            ..base
        }
    }
}

/// One call from the managed layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ScriptCall {
    Connect(ConnectCall),
    Disconnect,
    FlipCamera,
    SetLocalVideoEnabled { enabled: bool },
    SetLocalAudioEnabled { enabled: bool },
    SetRemoteAudioEnabled { enabled: bool },
    SetBluetoothHeadsetConnected { enabled: bool },
    PublishLocalVideo,
    UnpublishLocalVideo,
    PublishLocalAudio,
    UnpublishLocalAudio,
    SendString { message: String },
    GetStats,
    SetRemoteAudioPlayback { participant_sid: String, enabled: bool },
    #[serde(rename = "disableOpenSLES")]
    DisableOpenSlEs,
    ToggleSoundSetup { speaker: bool },
    /// Untyped escape hatch.  Opcode and arguments stay raw JSON so that
    /// every mismatch is judged by the command contract, not by decoding.
    DispatchCommand { opcode: Value, args: Vec<Value> },
}

/// Decodes one JSON call.
///
/// # Errors
///
/// Returns [`ScriptError::Decode`] for unknown methods or missing fields.
pub fn parse_call(raw: &str) -> Result<ScriptCall, ScriptError> {
    Ok(serde_json::from_str(raw)?)
}

fn sent(outcome: Dispatch) -> CallResult<Value> {
    CallResult::ok(json!({ "sent": outcome.was_sent() }))
}

/// Runs `call` against `coordinator`.
///
/// The optimistic toggles report the echoed value as `data`; every other call
/// reports `{ "sent": bool }`.
pub fn invoke<S: NativeSession>(
    coordinator: &mut BridgeCoordinator<S>,
    call: ScriptCall,
) -> CallResult<Value> {
    debug!(bridge = %coordinator.bridge_id(), ?call, "script call");

    match call {
        ScriptCall::Connect(connect) => {
            let options = connect.into_options(coordinator.defaults());
            sent(coordinator.connect(options))
        }
        ScriptCall::Disconnect => sent(coordinator.disconnect()),
        ScriptCall::FlipCamera => sent(coordinator.flip_camera()),
        ScriptCall::SetLocalVideoEnabled { enabled } => {
            CallResult::ok(json!(coordinator.set_local_video_enabled(enabled).into_inner()))
        }
        ScriptCall::SetLocalAudioEnabled { enabled } => {
            CallResult::ok(json!(coordinator.set_local_audio_enabled(enabled).into_inner()))
        }
        ScriptCall::SetRemoteAudioEnabled { enabled } => {
            CallResult::ok(json!(coordinator.set_remote_audio_enabled(enabled).into_inner()))
        }
        ScriptCall::SetBluetoothHeadsetConnected { enabled } => {
            let echoed = coordinator.set_bluetooth_headset_connected(enabled).into_inner();
            CallResult::ok(json!(echoed))
        }
        ScriptCall::PublishLocalVideo => sent(coordinator.publish_local_video()),
        ScriptCall::UnpublishLocalVideo => sent(coordinator.unpublish_local_video()),
        ScriptCall::PublishLocalAudio => sent(coordinator.publish_local_audio()),
        ScriptCall::UnpublishLocalAudio => sent(coordinator.unpublish_local_audio()),
        ScriptCall::SendString { message } => sent(coordinator.send_string(message)),
        ScriptCall::GetStats => sent(coordinator.get_stats()),
        ScriptCall::SetRemoteAudioPlayback { participant_sid, enabled } => {
            sent(coordinator.set_remote_audio_playback(participant_sid, enabled))
        }
        ScriptCall::DisableOpenSlEs => sent(coordinator.disable_open_sl_es()),
        ScriptCall::ToggleSoundSetup { speaker } => sent(coordinator.toggle_sound_setup(speaker)),
        ScriptCall::DispatchCommand { opcode, args } => {
            match coordinator.dispatch_raw(&opcode, args) {
                Ok(outcome) => sent(outcome),
                Err(violation) => CallResult::err(ScriptError::from(violation).to_string()),
            }
        }
    }
}

/// Decodes and runs one JSON call, folding decode errors into the envelope.
pub fn invoke_json<S: NativeSession>(
    coordinator: &mut BridgeCoordinator<S>,
    raw: &str,
) -> CallResult<Value> {
    match parse_call(raw) {
        Ok(call) => invoke(coordinator, call),
        Err(e) => {
            warn!(error = %e, "rejected script call");
            CallResult::err(e.to_string())
        }
    }
}

// ── Events ────────────────────────────────────────────────────────────────────

/// Renders an outbound event for the managed layer.
pub fn script_event(name: EventName, payload: &EventPayload) -> Value {
    json!({ "type": name.as_str(), "nativeEvent": payload.as_value() })
}

/// Builds callbacks that forward each of `names` to `sink` as script events.
///
/// A closed sink is ignored; the managed side has simply gone away.
pub fn forward_to_script(names: &[EventName], sink: Sender<Value>) -> EventCallbacks {
    let mut callbacks = EventCallbacks::new();
    for &name in names {
        let sink = sink.clone();
        callbacks.set(
            name,
            Some(Box::new(move |payload: EventPayload| {
                let _ = sink.send(script_event(name, &payload));
            })),
        );
    }
    callbacks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::native_session::RecordingSession;
    use avbridge_core::Opcode;

    fn mounted() -> (BridgeCoordinator<RecordingSession>, RecordingSession) {
        let native = RecordingSession::new();
        let mut bridge = BridgeCoordinator::new(native.clone());
        bridge.mount();
        (bridge, native)
    }

    #[test]
    fn test_parse_connect_with_overrides() {
        // Arrange
        let raw = r#"{"method":"connect","roomName":"r","accessToken":"t",
            "cameraType":"back","enableVideo":false}"#;

        // Act
        let call = parse_call(raw).expect("valid call");

        // Assert
        let ScriptCall::Connect(connect) = call else {
            panic!("expected a connect call");
        };
        assert_eq!(connect.camera_type, Some(CameraType::Back));
        assert_eq!(connect.enable_video, Some(false));
        assert_eq!(connect.enable_audio, None);
    }

    #[test]
    fn test_parse_method_names() {
        assert_eq!(
            parse_call(r#"{"method":"disableOpenSLES"}"#).unwrap(),
            ScriptCall::DisableOpenSlEs
        );
        assert_eq!(
            parse_call(
                r#"{"method":"setRemoteAudioPlayback","participantSid":"PA1","enabled":true}"#
            )
            .unwrap(),
            ScriptCall::SetRemoteAudioPlayback {
                participant_sid: "PA1".to_string(),
                enabled: true
            }
        );
    }

    #[test]
    fn test_unknown_method_is_rejected_in_envelope() {
        let (mut bridge, native) = mounted();

        let result = invoke_json(&mut bridge, r#"{"method":"teleport"}"#);

        assert!(!result.success);
        assert!(result.error.is_some());
        assert!(native.is_empty());
    }

    #[test]
    fn test_connect_call_merges_with_defaults() {
        // Arrange
        let (mut bridge, native) = mounted();

        // Act
        let result = invoke_json(
            &mut bridge,
            r#"{"method":"connect","roomName":"room1","accessToken":"tok",
                "dominantSpeakerEnabled":true}"#,
        );

        // Assert
        assert!(result.success);
        assert_eq!(result.data, Some(json!({ "sent": true })));
        let connect = native.last().expect("connect recorded");
        assert_eq!(connect.opcode, Opcode::Connect);
        assert_eq!(
            connect.args_json(),
            json!(["room1", "tok", true, true, true, false, true, false, "front", {}])
        );
    }

    #[test]
    fn test_toggle_reports_echoed_value() {
        let (mut bridge, native) = mounted();

        let result = invoke(&mut bridge, ScriptCall::SetLocalAudioEnabled { enabled: false });

        assert_eq!(result, CallResult::ok(json!(false)));
        assert_eq!(native.count(Opcode::ToggleAudio), 1);
    }

    #[test]
    fn test_dispatch_command_reaches_native_session() {
        let (mut bridge, native) = mounted();

        let result = invoke_json(
            &mut bridge,
            r#"{"method":"dispatchCommand","opcode":9,"args":[false]}"#,
        );

        assert!(result.success);
        let last = native.last().expect("command recorded");
        assert_eq!(last.opcode, Opcode::ToggleRemoteSound);
        assert_eq!(last.args_json(), json!([false]));
    }

    /// A raw `connect` call whose last argument is `encoding`.
    fn raw_connect(encoding: &str) -> String {
        format!(
            r#"{{"method":"dispatchCommand","opcode":1,
                "args":["r","t",true,true,true,false,false,false,"front",{encoding}]}}"#
        )
    }

    #[test]
    fn test_dispatch_command_forwards_encoding_record_verbatim() {
        let (mut bridge, native) = mounted();

        let result = invoke_json(&mut bridge, &raw_connect(r#"{"enableH264Codec":true}"#));

        assert!(result.success);
        let connect = native.last().expect("connect recorded");
        assert_eq!(connect.args_json()[9], json!({"enableH264Codec": true}));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "cannot be represented")]
    fn test_dispatch_command_encoding_with_unknown_key_panics_in_debug() {
        let (mut bridge, _native) = mounted();

        invoke_json(&mut bridge, &raw_connect(r#"{"enableH264Codec":true,"maxFps":30}"#));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "cannot be represented: array")]
    fn test_dispatch_command_array_as_encoding_panics_in_debug() {
        let (mut bridge, _native) = mounted();

        invoke_json(&mut bridge, &raw_connect("[]"));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "unknown opcode: 300")]
    fn test_dispatch_command_opcode_beyond_a_byte_panics_in_debug() {
        let (mut bridge, _native) = mounted();

        invoke_json(&mut bridge, r#"{"method":"dispatchCommand","opcode":300,"args":[]}"#);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "cannot be represented: number 1")]
    fn test_dispatch_command_numeric_argument_panics_in_debug() {
        let (mut bridge, _native) = mounted();

        invoke_json(&mut bridge, r#"{"method":"dispatchCommand","opcode":4,"args":[1]}"#);
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn test_dispatch_command_violations_fail_the_call_in_release() {
        let (mut bridge, native) = mounted();
        native.take();

        let results = [
            invoke_json(&mut bridge, r#"{"method":"dispatchCommand","opcode":300,"args":[]}"#),
            invoke_json(&mut bridge, r#"{"method":"dispatchCommand","opcode":4,"args":[1]}"#),
            invoke_json(&mut bridge, &raw_connect(r#"{"maxFps":30}"#)),
            invoke_json(&mut bridge, &raw_connect("[]")),
        ];

        assert!(results.iter().all(|r| !r.success));
        assert!(native.is_empty());
    }

    #[test]
    fn test_calls_after_unmount_report_not_sent() {
        let (mut bridge, native) = mounted();
        bridge.unmount();
        native.take();

        let result = invoke(&mut bridge, ScriptCall::GetStats);

        assert_eq!(result.data, Some(json!({ "sent": false })));
        assert!(native.is_empty());
    }

    #[test]
    fn test_script_event_shape() {
        let payload = EventPayload(json!({ "roomName": "r" }));

        let event = script_event(EventName::RoomDidConnect, &payload);

        assert_eq!(
            event,
            json!({ "type": "onRoomDidConnect", "nativeEvent": { "roomName": "r" } })
        );
    }

    #[test]
    fn test_forward_to_script_registers_each_name() {
        let (tx, rx) = std::sync::mpsc::channel();
        let callbacks =
            forward_to_script(&[EventName::StatsReceived, EventName::VideoChanged], tx);

        assert_eq!(
            callbacks.active_names(),
            vec![EventName::VideoChanged, EventName::StatsReceived]
        );

        let mut table = callbacks.into_registration_table();
        let handler = table.get_mut(&EventName::StatsReceived).expect("registered");
        handler(EventPayload(json!({ "n": 1 })));
        assert_eq!(
            rx.try_recv().unwrap(),
            json!({ "type": "onStatsReceived", "nativeEvent": { "n": 1 } })
        );
    }
}
