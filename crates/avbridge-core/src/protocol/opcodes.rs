//! The command opcode table.
//!
//! Every operation the managed application can ask of the native session is
//! identified on the wire by a single byte.  Deployed native code switches on
//! these values, so the table is a binary-compatibility contract:
//!
//! - A value, once shipped, is never changed.
//! - A retired value is never reused.
//! - New commands are appended with the next free value.
//!
//! Changing the *argument order* of an existing opcode requires bumping
//! [`PROTOCOL_VERSION`].

use serde::{Deserialize, Serialize};

use super::command::ContractViolation;

// ── Protocol constants ────────────────────────────────────────────────────────

/// Current command protocol version.
pub const PROTOCOL_VERSION: u8 = 0x01;

// ── Argument kinds ────────────────────────────────────────────────────────────

/// The primitive or flat-record type expected at one argument position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArgKind {
    Bool,
    Text,
    Encoding,
}

// ── Opcodes ───────────────────────────────────────────────────────────────────

/// All command codes understood by the native session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Opcode {
    Connect = 1,
    Disconnect = 2,
    SwitchCamera = 3,
    ToggleVideo = 4,
    ToggleAudio = 5,
    GetStats = 6,
    /// Turns off the platform-specific low-latency audio path (OpenSL ES on Android).
    DisablePlatformAudioPath = 7,
    ToggleSoundSetup = 8,
    ToggleRemoteSound = 9,
    ReleaseResources = 10,
    ToggleBluetoothHeadset = 11,
    SendMessage = 12,
    PublishVideo = 13,
    PublishAudio = 14,
    SetRemoteAudioPlayback = 15,
}

/// Arguments of [`Opcode::Connect`], in wire order.
const CONNECT_SIGNATURE: &[ArgKind] = &[
    ArgKind::Text,     // room name
    ArgKind::Text,     // access token
    ArgKind::Bool,     // audio enabled
    ArgKind::Bool,     // video enabled
    ArgKind::Bool,     // remote audio enabled
    ArgKind::Bool,     // network quality reporting enabled
    ArgKind::Bool,     // dominant speaker enabled
    ArgKind::Bool,     // maintain video track in background
    ArgKind::Text,     // camera type
    ArgKind::Encoding, // encoding parameters
];

impl Opcode {
    /// Every opcode, in ascending value order.
    pub const ALL: [Opcode; 15] = [
        Opcode::Connect,
        Opcode::Disconnect,
        Opcode::SwitchCamera,
        Opcode::ToggleVideo,
        Opcode::ToggleAudio,
        Opcode::GetStats,
        Opcode::DisablePlatformAudioPath,
        Opcode::ToggleSoundSetup,
        Opcode::ToggleRemoteSound,
        Opcode::ReleaseResources,
        Opcode::ToggleBluetoothHeadset,
        Opcode::SendMessage,
        Opcode::PublishVideo,
        Opcode::PublishAudio,
        Opcode::SetRemoteAudioPlayback,
    ];

    /// Returns the wire value of this opcode.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Returns the fixed argument signature for this opcode.
    pub fn signature(self) -> &'static [ArgKind] {
        match self {
            Opcode::Connect => CONNECT_SIGNATURE,
            Opcode::Disconnect
            | Opcode::SwitchCamera
            | Opcode::GetStats
            | Opcode::DisablePlatformAudioPath
            | Opcode::ReleaseResources => &[],
            Opcode::ToggleVideo
            | Opcode::ToggleAudio
            | Opcode::ToggleSoundSetup
            | Opcode::ToggleRemoteSound
            | Opcode::ToggleBluetoothHeadset
            | Opcode::PublishVideo
            | Opcode::PublishAudio => &[ArgKind::Bool],
            Opcode::SendMessage => &[ArgKind::Text],
            Opcode::SetRemoteAudioPlayback => &[ArgKind::Text, ArgKind::Bool],
        }
    }

    /// Human-readable command name, used in log output.
    pub fn name(self) -> &'static str {
        match self {
            Opcode::Connect => "connect",
            Opcode::Disconnect => "disconnect",
            Opcode::SwitchCamera => "switch_camera",
            Opcode::ToggleVideo => "toggle_video",
            Opcode::ToggleAudio => "toggle_audio",
            Opcode::GetStats => "get_stats",
            Opcode::DisablePlatformAudioPath => "disable_platform_audio_path",
            Opcode::ToggleSoundSetup => "toggle_sound_setup",
            Opcode::ToggleRemoteSound => "toggle_remote_sound",
            Opcode::ReleaseResources => "release_resources",
            Opcode::ToggleBluetoothHeadset => "toggle_bluetooth_headset",
            Opcode::SendMessage => "send_message",
            Opcode::PublishVideo => "publish_video",
            Opcode::PublishAudio => "publish_audio",
            Opcode::SetRemoteAudioPlayback => "set_remote_audio_playback",
        }
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name(), self.code())
    }
}

impl TryFrom<u8> for Opcode {
    type Error = ContractViolation;

    fn try_from(value: u8) -> Result<Self, ContractViolation> {
        match value {
            1 => Ok(Opcode::Connect),
            2 => Ok(Opcode::Disconnect),
            3 => Ok(Opcode::SwitchCamera),
            4 => Ok(Opcode::ToggleVideo),
            5 => Ok(Opcode::ToggleAudio),
            6 => Ok(Opcode::GetStats),
            7 => Ok(Opcode::DisablePlatformAudioPath),
            8 => Ok(Opcode::ToggleSoundSetup),
            9 => Ok(Opcode::ToggleRemoteSound),
            10 => Ok(Opcode::ReleaseResources),
            11 => Ok(Opcode::ToggleBluetoothHeadset),
            12 => Ok(Opcode::SendMessage),
            13 => Ok(Opcode::PublishVideo),
            14 => Ok(Opcode::PublishAudio),
            15 => Ok(Opcode::SetRemoteAudioPlayback),
            other => Err(ContractViolation::UnknownOpcode(u64::from(other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_values_are_pinned() {
        // These values are compiled into deployed native code.
        assert_eq!(Opcode::Connect.code(), 1);
        assert_eq!(Opcode::ReleaseResources.code(), 10);
        assert_eq!(Opcode::SendMessage.code(), 12);
        assert_eq!(Opcode::SetRemoteAudioPlayback.code(), 15);
    }

    #[test]
    fn test_all_opcodes_are_unique_and_ascending() {
        for window in Opcode::ALL.windows(2) {
            assert!(window[1].code() > window[0].code());
        }
    }

    #[test]
    fn test_try_from_accepts_every_known_code() {
        for op in Opcode::ALL {
            assert_eq!(Opcode::try_from(op.code()), Ok(op));
        }
    }

    #[test]
    fn test_try_from_rejects_unknown_codes() {
        assert_eq!(
            Opcode::try_from(0),
            Err(ContractViolation::UnknownOpcode(0))
        );
        assert_eq!(
            Opcode::try_from(16),
            Err(ContractViolation::UnknownOpcode(16))
        );
    }

    #[test]
    fn test_connect_signature_has_ten_positions() {
        let sig = Opcode::Connect.signature();
        assert_eq!(sig.len(), 10);
        assert_eq!(sig[8], ArgKind::Text, "camera type sits at position 8");
        assert_eq!(sig[9], ArgKind::Encoding);
    }

    #[test]
    fn test_set_remote_audio_playback_takes_sid_then_flag() {
        assert_eq!(
            Opcode::SetRemoteAudioPlayback.signature(),
            &[ArgKind::Text, ArgKind::Bool]
        );
    }

    #[test]
    fn test_display_includes_name_and_code() {
        assert_eq!(Opcode::ToggleVideo.to_string(), "toggle_video(4)");
    }
}
