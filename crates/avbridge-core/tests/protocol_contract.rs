//! Integration tests pinning the command and event tables.
//!
//! Both tables are compiled into deployed native code.  These tests spell out
//! the full table through the public API so that any edit to a shipped value,
//! a name, or an argument position shows up as a failing test rather than a
//! silent binary incompatibility.

use avbridge_core::{
    ArgKind, CameraType, Command, CommandArg, ConnectOptions, EncodingParameters, EventName,
    Opcode, PROTOCOL_VERSION,
};
use serde_json::json;

#[test]
fn test_protocol_version_is_one() {
    assert_eq!(PROTOCOL_VERSION, 1);
}

#[test]
fn test_full_opcode_table() {
    use ArgKind::{Bool, Encoding, Text};

    let expected: [(u8, Opcode, &[ArgKind]); 15] = [
        (1, Opcode::Connect, &[Text, Text, Bool, Bool, Bool, Bool, Bool, Bool, Text, Encoding]),
        (2, Opcode::Disconnect, &[]),
        (3, Opcode::SwitchCamera, &[]),
        (4, Opcode::ToggleVideo, &[Bool]),
        (5, Opcode::ToggleAudio, &[Bool]),
        (6, Opcode::GetStats, &[]),
        (7, Opcode::DisablePlatformAudioPath, &[]),
        (8, Opcode::ToggleSoundSetup, &[Bool]),
        (9, Opcode::ToggleRemoteSound, &[Bool]),
        (10, Opcode::ReleaseResources, &[]),
        (11, Opcode::ToggleBluetoothHeadset, &[Bool]),
        (12, Opcode::SendMessage, &[Text]),
        (13, Opcode::PublishVideo, &[Bool]),
        (14, Opcode::PublishAudio, &[Bool]),
        (15, Opcode::SetRemoteAudioPlayback, &[Text, Bool]),
    ];

    for (code, opcode, signature) in expected {
        assert_eq!(opcode.code(), code, "{opcode} moved");
        assert_eq!(Opcode::try_from(code), Ok(opcode));
        assert_eq!(opcode.signature(), signature, "{opcode} signature changed");
    }
}

#[test]
fn test_full_event_table() {
    let expected: [(u8, &str); 23] = [
        (1, "onCameraSwitched"),
        (2, "onVideoChanged"),
        (3, "onAudioChanged"),
        (4, "onRoomDidConnect"),
        (5, "onRoomDidFailToConnect"),
        (6, "onRoomDidDisconnect"),
        (7, "onParticipantAddedDataTrack"),
        (8, "onParticipantRemovedDataTrack"),
        (9, "onDataTrackMessageReceived"),
        (10, "onParticipantAddedVideoTrack"),
        (11, "onParticipantRemovedVideoTrack"),
        (12, "onParticipantAddedAudioTrack"),
        (13, "onParticipantRemovedAudioTrack"),
        (14, "onRoomParticipantDidConnect"),
        (15, "onRoomParticipantDidDisconnect"),
        (16, "onParticipantEnabledVideoTrack"),
        (17, "onParticipantDisabledVideoTrack"),
        (18, "onParticipantEnabledAudioTrack"),
        (19, "onParticipantDisabledAudioTrack"),
        (20, "onStatsReceived"),
        (21, "onNetworkQualityLevelsChanged"),
        (22, "onDominantSpeakerDidChange"),
        (23, "onLocalParticipantSupportedCodecs"),
    ];

    for (id, wire) in expected {
        let name = EventName::from_id(id).expect("id must be registered");
        assert_eq!(name.as_str(), wire);
        assert_eq!(wire.parse::<EventName>(), Ok(name));
    }
}

#[test]
fn test_connect_with_every_option_set() {
    let options = ConnectOptions {
        room_name: "standup".to_string(),
        access_token: "jwt".to_string(),
        enable_audio: false,
        enable_video: false,
        enable_remote_audio: false,
        enable_network_quality_reporting: true,
        dominant_speaker_enabled: true,
        maintain_video_track_in_background: true,
        camera_type: CameraType::Back,
        encoding_parameters: EncodingParameters {
            enable_h264_codec: Some(true),
            audio_bitrate: Some(32),
            video_bitrate: Some(900),
        },
    };

    let cmd = Command::connect(&options);

    assert_eq!(
        cmd.args_json(),
        json!([
            "standup",
            "jwt",
            false,
            false,
            false,
            true,
            true,
            true,
            "back",
            {"enableH264Codec": true, "audioBitrate": 32, "videoBitrate": 900}
        ])
    );
}

#[test]
fn test_into_parts_preserves_argument_order() {
    let cmd = Command::set_remote_audio_playback("PA42", true);

    let (opcode, args) = cmd.into_parts();

    assert_eq!(opcode, Opcode::SetRemoteAudioPlayback);
    assert_eq!(
        args,
        vec![CommandArg::Text("PA42".to_string()), CommandArg::Bool(true)]
    );
}
