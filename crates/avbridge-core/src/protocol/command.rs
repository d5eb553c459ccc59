//! Command construction and the argument-order contract.
//!
//! A [`Command`] is an [`Opcode`] plus an ordered list of [`CommandArg`]s.
//! Commands are validated against [`Opcode::signature`] when they are built,
//! so a constructed command always matches its opcode's arity and types.
//!
//! `Command` deliberately does not implement `Clone`: handing it to the
//! dispatcher moves it, which is how "sent at most once" is enforced.
//!
//! # Argument rendering
//!
//! Arguments serialize untagged, so the argument list of a command renders as
//! a plain JSON array.  For a default `connect`:
//!
//! ```json
//! ["room1", "tok", true, true, true, false, false, false, "front", {}]
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::opcodes::{ArgKind, Opcode};

/// A command that does not match the opcode table.
///
/// This is always a programming error on the calling side, never a runtime
/// race, and must be surfaced loudly.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ContractViolation {
    /// The opcode is not in the table.
    #[error("unknown opcode: {0}")]
    UnknownOpcode(u64),

    /// The opcode is not a non-negative integer at all.
    #[error("malformed opcode: {0}")]
    MalformedOpcode(String),

    /// Wrong number of arguments for the opcode.
    #[error("{opcode} expects {expected} argument(s), got {actual}")]
    ArityMismatch {
        opcode: Opcode,
        expected: usize,
        actual: usize,
    },

    /// An argument has the wrong type for its position.
    #[error("{opcode} argument {position} must be {expected:?}, got {actual:?}")]
    ArgumentKind {
        opcode: Opcode,
        position: usize,
        expected: ArgKind,
        actual: ArgKind,
    },

    /// An untyped argument has no [`CommandArg`] representation, such as a
    /// number or an encoding record with unknown keys.
    #[error("{opcode} argument {position} cannot be represented: {found}")]
    UnrepresentableArgument {
        opcode: Opcode,
        position: usize,
        found: String,
    },
}

// ── Argument values ───────────────────────────────────────────────────────────

/// Video encoding preferences passed with `connect`.
///
/// Absent fields are omitted from the rendered record, so the default value
/// renders as `{}` and leaves the choice to the native layer.
///
/// Decoding is strict: only a map is accepted, and a key outside the three
/// below is an error rather than being dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodingParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_h264_codec: Option<bool>,
    /// Maximum audio bitrate in kbps.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_bitrate: Option<u32>,
    /// Maximum video bitrate in kbps.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_bitrate: Option<u32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct EncodingRecord {
    #[serde(default)]
    enable_h264_codec: Option<bool>,
    #[serde(default)]
    audio_bitrate: Option<u32>,
    #[serde(default)]
    video_bitrate: Option<u32>,
}

impl<'de> Deserialize<'de> for EncodingParameters {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // A map first: the derived impl alone would also take a sequence.
        let map = Map::<String, Value>::deserialize(deserializer)?;
        let record: EncodingRecord =
            serde_json::from_value(Value::Object(map)).map_err(serde::de::Error::custom)?;
        Ok(Self {
            enable_h264_codec: record.enable_h264_codec,
            audio_bitrate: record.audio_bitrate,
            video_bitrate: record.video_bitrate,
        })
    }
}

/// Which device camera the local video track starts on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraType {
    #[default]
    Front,
    Back,
}

impl CameraType {
    pub fn as_str(self) -> &'static str {
        match self {
            CameraType::Front => "front",
            CameraType::Back => "back",
        }
    }
}

/// A single positional command argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandArg {
    Bool(bool),
    Text(String),
    Encoding(EncodingParameters),
}

impl CommandArg {
    /// Returns the [`ArgKind`] of this value.
    pub fn kind(&self) -> ArgKind {
        match self {
            CommandArg::Bool(_) => ArgKind::Bool,
            CommandArg::Text(_) => ArgKind::Text,
            CommandArg::Encoding(_) => ArgKind::Encoding,
        }
    }

    /// Converts one untyped JSON value, or `None` when no variant holds it
    /// exactly.
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Bool(flag) => Some(CommandArg::Bool(flag)),
            Value::String(text) => Some(CommandArg::Text(text)),
            Value::Object(_) => serde_json::from_value(value).ok().map(CommandArg::Encoding),
            Value::Null | Value::Number(_) | Value::Array(_) => None,
        }
    }
}

/// Short description of a JSON value for violation messages.
fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Number(n) => format!("number {n}"),
        Value::Array(_) => "array".to_string(),
        Value::Object(_) => format!("record {value}"),
        Value::Bool(_) | Value::String(_) => value.to_string(),
    }
}

impl From<bool> for CommandArg {
    fn from(value: bool) -> Self {
        CommandArg::Bool(value)
    }
}

impl From<String> for CommandArg {
    fn from(value: String) -> Self {
        CommandArg::Text(value)
    }
}

impl From<&str> for CommandArg {
    fn from(value: &str) -> Self {
        CommandArg::Text(value.to_string())
    }
}

impl From<EncodingParameters> for CommandArg {
    fn from(value: EncodingParameters) -> Self {
        CommandArg::Encoding(value)
    }
}

// ── Connect options ───────────────────────────────────────────────────────────

fn default_true() -> bool {
    true
}

/// Everything the native session needs to join a room.
///
/// Deserializes from the managed layer's camelCase object; any omitted flag
/// takes the documented default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectOptions {
    pub room_name: String,
    pub access_token: String,
    #[serde(default = "default_true")]
    pub enable_audio: bool,
    #[serde(default = "default_true")]
    pub enable_video: bool,
    #[serde(default = "default_true")]
    pub enable_remote_audio: bool,
    #[serde(default)]
    pub enable_network_quality_reporting: bool,
    #[serde(default)]
    pub dominant_speaker_enabled: bool,
    #[serde(default)]
    pub maintain_video_track_in_background: bool,
    #[serde(default)]
    pub camera_type: CameraType,
    #[serde(default)]
    pub encoding_parameters: EncodingParameters,
}

impl ConnectOptions {
    /// Options for `room_name` with every flag at its default.
    pub fn new(room_name: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            room_name: room_name.into(),
            access_token: access_token.into(),
            enable_audio: true,
            enable_video: true,
            enable_remote_audio: true,
            enable_network_quality_reporting: false,
            dominant_speaker_enabled: false,
            maintain_video_track_in_background: false,
            camera_type: CameraType::Front,
            encoding_parameters: EncodingParameters::default(),
        }
    }
}

// ── Command ───────────────────────────────────────────────────────────────────

/// One instruction for the native session.
#[derive(Debug, PartialEq, Serialize)]
pub struct Command {
    opcode: Opcode,
    args: Vec<CommandArg>,
}

/// Checks `args` against the fixed signature of `opcode`.
fn validate(opcode: Opcode, args: &[CommandArg]) -> Result<(), ContractViolation> {
    let signature = opcode.signature();
    if signature.len() != args.len() {
        return Err(ContractViolation::ArityMismatch {
            opcode,
            expected: signature.len(),
            actual: args.len(),
        });
    }
    for (position, (expected, arg)) in signature.iter().zip(args).enumerate() {
        if arg.kind() != *expected {
            return Err(ContractViolation::ArgumentKind {
                opcode,
                position,
                expected: *expected,
                actual: arg.kind(),
            });
        }
    }
    Ok(())
}

impl Command {
    /// Builds a command, validating `args` against the opcode's signature.
    ///
    /// # Errors
    ///
    /// Returns [`ContractViolation`] on an arity or argument-type mismatch.
    pub fn new(opcode: Opcode, args: Vec<CommandArg>) -> Result<Self, ContractViolation> {
        validate(opcode, &args)?;
        Ok(Self { opcode, args })
    }

    /// Builds a command from an untyped opcode byte.
    ///
    /// # Errors
    ///
    /// Returns [`ContractViolation::UnknownOpcode`] for a byte outside the
    /// table, or the errors of [`Command::new`].
    pub fn from_raw(code: u8, args: Vec<CommandArg>) -> Result<Self, ContractViolation> {
        Self::new(Opcode::try_from(code)?, args)
    }

    /// Builds a command from untyped JSON, as received from the script layer.
    ///
    /// Nothing is coerced: an opcode outside the table, or an argument with
    /// no exact [`CommandArg`] form, is a [`ContractViolation`].
    ///
    /// # Errors
    ///
    /// Returns [`ContractViolation::MalformedOpcode`],
    /// [`ContractViolation::UnknownOpcode`],
    /// [`ContractViolation::UnrepresentableArgument`], or the errors of
    /// [`Command::new`].
    pub fn from_json(opcode: &Value, args: Vec<Value>) -> Result<Self, ContractViolation> {
        let code = opcode
            .as_u64()
            .ok_or_else(|| ContractViolation::MalformedOpcode(opcode.to_string()))?;
        let opcode = u8::try_from(code)
            .map_err(|_| ContractViolation::UnknownOpcode(code))
            .and_then(Opcode::try_from)?;
        let args = args
            .into_iter()
            .enumerate()
            .map(|(position, value)| {
                let found = describe(&value);
                CommandArg::from_json(value).ok_or(ContractViolation::UnrepresentableArgument {
                    opcode,
                    position,
                    found,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(opcode, args)
    }

    /// Used by the facade constructors below, whose argument lists match
    /// the table by construction.
    fn trusted(opcode: Opcode, args: Vec<CommandArg>) -> Self {
        debug_assert_eq!(validate(opcode, &args), Ok(()));
        Self { opcode, args }
    }

    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    pub fn args(&self) -> &[CommandArg] {
        &self.args
    }

    /// Renders the argument list as a JSON array.
    pub fn args_json(&self) -> serde_json::Value {
        serde_json::Value::Array(
            self.args
                .iter()
                .map(|arg| serde_json::to_value(arg).unwrap_or(serde_json::Value::Null))
                .collect(),
        )
    }

    /// Splits the command into its opcode and argument list.
    pub fn into_parts(self) -> (Opcode, Vec<CommandArg>) {
        (self.opcode, self.args)
    }

    // ── Facades ───────────────────────────────────────────────────────────────

    pub fn connect(options: &ConnectOptions) -> Self {
        Self::trusted(
            Opcode::Connect,
            vec![
                options.room_name.clone().into(),
                options.access_token.clone().into(),
                options.enable_audio.into(),
                options.enable_video.into(),
                options.enable_remote_audio.into(),
                options.enable_network_quality_reporting.into(),
                options.dominant_speaker_enabled.into(),
                options.maintain_video_track_in_background.into(),
                options.camera_type.as_str().into(),
                options.encoding_parameters.clone().into(),
            ],
        )
    }

    pub fn disconnect() -> Self {
        Self::trusted(Opcode::Disconnect, Vec::new())
    }

    pub fn switch_camera() -> Self {
        Self::trusted(Opcode::SwitchCamera, Vec::new())
    }

    pub fn toggle_video(enabled: bool) -> Self {
        Self::trusted(Opcode::ToggleVideo, vec![enabled.into()])
    }

    pub fn toggle_audio(enabled: bool) -> Self {
        Self::trusted(Opcode::ToggleAudio, vec![enabled.into()])
    }

    pub fn get_stats() -> Self {
        Self::trusted(Opcode::GetStats, Vec::new())
    }

    pub fn disable_platform_audio_path() -> Self {
        Self::trusted(Opcode::DisablePlatformAudioPath, Vec::new())
    }

    /// `speaker = true` routes audio to the loudspeaker.
    pub fn toggle_sound_setup(speaker: bool) -> Self {
        Self::trusted(Opcode::ToggleSoundSetup, vec![speaker.into()])
    }

    pub fn toggle_remote_sound(enabled: bool) -> Self {
        Self::trusted(Opcode::ToggleRemoteSound, vec![enabled.into()])
    }

    pub fn release_resources() -> Self {
        Self::trusted(Opcode::ReleaseResources, Vec::new())
    }

    pub fn toggle_bluetooth_headset(enabled: bool) -> Self {
        Self::trusted(Opcode::ToggleBluetoothHeadset, vec![enabled.into()])
    }

    /// Sends `message` on the local data track.
    pub fn send_message(message: impl Into<String>) -> Self {
        Self::trusted(Opcode::SendMessage, vec![CommandArg::Text(message.into())])
    }

    pub fn publish_video(enabled: bool) -> Self {
        Self::trusted(Opcode::PublishVideo, vec![enabled.into()])
    }

    pub fn publish_audio(enabled: bool) -> Self {
        Self::trusted(Opcode::PublishAudio, vec![enabled.into()])
    }

    pub fn set_remote_audio_playback(participant_sid: impl Into<String>, enabled: bool) -> Self {
        Self::trusted(
            Opcode::SetRemoteAudioPlayback,
            vec![CommandArg::Text(participant_sid.into()), enabled.into()],
        )
    }
}
