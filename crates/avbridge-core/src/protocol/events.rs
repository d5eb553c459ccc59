//! The event-name registry.
//!
//! The native session reports everything that happens to it (room joined,
//! participant left, stats ready, ...) as a notification tagged with a
//! string name and carrying one opaque structured payload.
//!
//! [`EventName`] is the fixed, enumerated set of names both sides agree on.
//! Each name has:
//!
//! - a stable numeric id (append-only, never reused), and
//! - a wire string (`"onRoomDidConnect"`, ...) used by the native layer.
//!
//! Payload shapes are owned by the native layer.  The bridge never validates,
//! inspects, or rewrites them; [`EventPayload`] is a pure pass-through wrapper.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::handle::SessionHandle;

/// Every event the native session can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventName {
    CameraSwitched = 1,
    VideoChanged = 2,
    AudioChanged = 3,
    RoomDidConnect = 4,
    RoomDidFailToConnect = 5,
    RoomDidDisconnect = 6,
    ParticipantAddedDataTrack = 7,
    ParticipantRemovedDataTrack = 8,
    DataTrackMessageReceived = 9,
    ParticipantAddedVideoTrack = 10,
    ParticipantRemovedVideoTrack = 11,
    ParticipantAddedAudioTrack = 12,
    ParticipantRemovedAudioTrack = 13,
    RoomParticipantDidConnect = 14,
    RoomParticipantDidDisconnect = 15,
    ParticipantEnabledVideoTrack = 16,
    ParticipantDisabledVideoTrack = 17,
    ParticipantEnabledAudioTrack = 18,
    ParticipantDisabledAudioTrack = 19,
    StatsReceived = 20,
    NetworkQualityLevelsChanged = 21,
    DominantSpeakerDidChange = 22,
    LocalParticipantSupportedCodecs = 23,
}

impl EventName {
    /// Every event name, in ascending id order.
    pub const ALL: [EventName; 23] = [
        EventName::CameraSwitched,
        EventName::VideoChanged,
        EventName::AudioChanged,
        EventName::RoomDidConnect,
        EventName::RoomDidFailToConnect,
        EventName::RoomDidDisconnect,
        EventName::ParticipantAddedDataTrack,
        EventName::ParticipantRemovedDataTrack,
        EventName::DataTrackMessageReceived,
        EventName::ParticipantAddedVideoTrack,
        EventName::ParticipantRemovedVideoTrack,
        EventName::ParticipantAddedAudioTrack,
        EventName::ParticipantRemovedAudioTrack,
        EventName::RoomParticipantDidConnect,
        EventName::RoomParticipantDidDisconnect,
        EventName::ParticipantEnabledVideoTrack,
        EventName::ParticipantDisabledVideoTrack,
        EventName::ParticipantEnabledAudioTrack,
        EventName::ParticipantDisabledAudioTrack,
        EventName::StatsReceived,
        EventName::NetworkQualityLevelsChanged,
        EventName::DominantSpeakerDidChange,
        EventName::LocalParticipantSupportedCodecs,
    ];

    /// Stable numeric id.
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Looks up a name by its stable id.
    pub fn from_id(id: u8) -> Option<Self> {
        // ALL is ordered by id starting at 1, so the id doubles as an index.
        let index = usize::from(id).checked_sub(1)?;
        Self::ALL.get(index).copied()
    }

    /// The string the native layer tags notifications with.
    pub fn as_str(self) -> &'static str {
        match self {
            EventName::CameraSwitched => "onCameraSwitched",
            EventName::VideoChanged => "onVideoChanged",
            EventName::AudioChanged => "onAudioChanged",
            EventName::RoomDidConnect => "onRoomDidConnect",
            EventName::RoomDidFailToConnect => "onRoomDidFailToConnect",
            EventName::RoomDidDisconnect => "onRoomDidDisconnect",
            EventName::ParticipantAddedDataTrack => "onParticipantAddedDataTrack",
            EventName::ParticipantRemovedDataTrack => "onParticipantRemovedDataTrack",
            EventName::DataTrackMessageReceived => "onDataTrackMessageReceived",
            EventName::ParticipantAddedVideoTrack => "onParticipantAddedVideoTrack",
            EventName::ParticipantRemovedVideoTrack => "onParticipantRemovedVideoTrack",
            EventName::ParticipantAddedAudioTrack => "onParticipantAddedAudioTrack",
            EventName::ParticipantRemovedAudioTrack => "onParticipantRemovedAudioTrack",
            EventName::RoomParticipantDidConnect => "onRoomParticipantDidConnect",
            EventName::RoomParticipantDidDisconnect => "onRoomParticipantDidDisconnect",
            EventName::ParticipantEnabledVideoTrack => "onParticipantEnabledVideoTrack",
            EventName::ParticipantDisabledVideoTrack => "onParticipantDisabledVideoTrack",
            EventName::ParticipantEnabledAudioTrack => "onParticipantEnabledAudioTrack",
            EventName::ParticipantDisabledAudioTrack => "onParticipantDisabledAudioTrack",
            EventName::StatsReceived => "onStatsReceived",
            EventName::NetworkQualityLevelsChanged => "onNetworkQualityLevelsChanged",
            EventName::DominantSpeakerDidChange => "onDominantSpeakerDidChange",
            EventName::LocalParticipantSupportedCodecs => "onLocalParticipantSupportedCodecs",
        }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a wire string is not in the registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown event name: {0}")]
pub struct UnknownEventName(pub String);

impl FromStr for EventName {
    type Err = UnknownEventName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| UnknownEventName(s.to_string()))
    }
}

// ── Payloads ──────────────────────────────────────────────────────────────────

/// Opaque event payload.  Passed through to the application unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventPayload(pub serde_json::Value);

impl EventPayload {
    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    pub fn into_value(self) -> serde_json::Value {
        self.0
    }
}

impl From<serde_json::Value> for EventPayload {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

/// A raw notification as emitted by the native layer.
///
/// The native side wraps each payload in an envelope; only `native_event`
/// is handed to the application.
///
/// `handle` names the session that emitted the notification.  The native
/// layer may omit it, and such a notification cannot be told apart from one
/// raised by an already released session: after a remount it is routed to
/// whichever session is live.  A stamped notification whose handle is no
/// longer live is dropped by the coordinator instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeNotification {
    pub name: String,
    #[serde(default)]
    pub native_event: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<SessionHandle>,
}

impl NativeNotification {
    /// An unstamped notification.
    pub fn new(name: EventName, native_event: serde_json::Value) -> Self {
        Self {
            name: name.as_str().to_string(),
            native_event,
            handle: None,
        }
    }

    /// Stamps the notification with the session that emitted it.
    pub fn stamped(mut self, handle: SessionHandle) -> Self {
        self.handle = Some(handle);
        self
    }
}
