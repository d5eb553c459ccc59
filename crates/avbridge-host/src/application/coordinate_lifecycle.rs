//! BridgeCoordinator: one bridge instance per hosted surface.
//!
//! # Lifecycle (for beginners)
//!
//! ```text
//!            mount()               connect()            disconnect()
//! Unmounted ────────▶ Mounted ───────────────▶ Connected ──────────▶ Disconnected
//!     ▲                  │                        │                      │
//!     └──────────────────┴──── unmount() ─────────┴──────────────────────┘
//! ```
//!
//! `mount` allocates a fresh [`SessionHandle`].  `unmount` sends exactly one
//! `ReleaseResources` to that handle and then retires it, so every later
//! operation becomes a silent no-op.  Dropping the coordinator unmounts it.
//!
//! `Connected`/`Disconnected` are also driven by inbound notifications
//! (`onRoomDidConnect`, `onRoomDidDisconnect`, `onRoomDidFailToConnect`),
//! because the native side may fail or drop a connection on its own.
//!
//! # Optimistic echo
//!
//! The four boolean toggles return a future that is *already resolved* with
//! the requested value.  It is not a confirmation from the native side; that
//! arrives later as `onVideoChanged`, `onAudioChanged`, etc.

use std::fmt;
use std::future::{ready, Ready};

use avbridge_core::{
    CameraType, Command, ConnectOptions, ContractViolation, EncodingParameters, EventName,
    EventPayload, HandleResolver, HandleSlot, NativeNotification, SessionHandle,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use super::demux_events::{Delivery, EventCallbacks, EventDemultiplexer};
use super::dispatch_command::{CommandDispatcher, Dispatch, NativeSession};

// ── Supporting types ──────────────────────────────────────────────────────────

/// Where a coordinator is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Unmounted,
    Mounted,
    Connected,
    Disconnected,
}

/// Per-coordinator id used to correlate log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BridgeId(Uuid);

impl BridgeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BridgeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BridgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Connect flags applied by [`BridgeCoordinator::connect_to`].
///
/// Also the `[connect_defaults]` section of the config file; every field has
/// a serde default so a partial section is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectDefaults {
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
    pub encoding: EncodingParameters,
}

fn default_true() -> bool {
    true
}

impl Default for ConnectDefaults {
    fn default() -> Self {
        Self {
            enable_audio: true,
            enable_video: true,
            enable_remote_audio: true,
            enable_network_quality_reporting: false,
            dominant_speaker_enabled: false,
            maintain_video_track_in_background: false,
            camera_type: CameraType::Front,
            encoding: EncodingParameters::default(),
        }
    }
}

impl ConnectDefaults {
    /// Builds full connect options for one room from these defaults.
    pub fn options(
        &self,
        room_name: impl Into<String>,
        access_token: impl Into<String>,
    ) -> ConnectOptions {
        ConnectOptions {
            enable_audio: self.enable_audio,
            enable_video: self.enable_video,
            enable_remote_audio: self.enable_remote_audio,
            enable_network_quality_reporting: self.enable_network_quality_reporting,
            dominant_speaker_enabled: self.dominant_speaker_enabled,
            maintain_video_track_in_background: self.maintain_video_track_in_background,
            camera_type: self.camera_type,
            encoding_parameters: self.encoding.clone(),
            ..ConnectOptions::new(room_name, access_token)
        }
    }
}

// ── BridgeCoordinator ─────────────────────────────────────────────────────────

/// Owns the handle, the dispatcher, and the event routing table for one
/// hosted surface.
pub struct BridgeCoordinator<S: NativeSession> {
    id: BridgeId,
    dispatcher: CommandDispatcher<S>,
    demux: EventDemultiplexer,
    slot: HandleSlot,
    state: BridgeState,
    defaults: ConnectDefaults,
}

impl<S: NativeSession> BridgeCoordinator<S> {
    pub fn new(native: S) -> Self {
        Self::with_defaults(native, ConnectDefaults::default())
    }

    pub fn with_defaults(native: S, defaults: ConnectDefaults) -> Self {
        Self {
            id: BridgeId::new(),
            dispatcher: CommandDispatcher::new(native),
            demux: EventDemultiplexer::new(),
            slot: HandleSlot::new(),
            state: BridgeState::Unmounted,
            defaults,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn bridge_id(&self) -> BridgeId {
        self.id
    }

    pub fn state(&self) -> BridgeState {
        self.state
    }

    /// The live handle, or `None` when unmounted.
    pub fn handle(&self) -> Option<SessionHandle> {
        self.slot.resolve()
    }

    pub fn native(&self) -> &S {
        self.dispatcher.native()
    }

    pub fn defaults(&self) -> &ConnectDefaults {
        &self.defaults
    }

    /// Event names the hosting layer should subscribe to.
    pub fn registered_events(&self) -> Vec<EventName> {
        self.demux.registered_names()
    }

    // ── Mount / unmount ───────────────────────────────────────────────────────

    /// Binds the coordinator to a freshly allocated native handle.
    ///
    /// If a handle is already live it is released first, so no native
    /// session is ever orphaned.
    pub fn mount(&mut self) -> SessionHandle {
        if let Some(previous) = self.release_live_handle() {
            warn!(
                bridge = %self.id,
                handle = %previous,
                "mount while mounted; released previous handle"
            );
        }

        let handle = SessionHandle::allocate();
        self.slot.install(handle);
        self.state = BridgeState::Mounted;
        info!(bridge = %self.id, handle = %handle, "mounted");
        handle
    }

    /// Releases native resources and retires the handle.
    ///
    /// Exactly one `ReleaseResources` is dispatched per mounted handle.
    /// Calling this again, or on a never-mounted coordinator, does nothing.
    pub fn unmount(&mut self) {
        if let Some(handle) = self.release_live_handle() {
            info!(bridge = %self.id, handle = %handle, "unmounted");
        }
        self.state = BridgeState::Unmounted;
    }

    fn release_live_handle(&mut self) -> Option<SessionHandle> {
        self.slot.resolve()?;
        self.dispatcher.dispatch(&self.slot, Command::release_resources());
        self.slot.retire()
    }

    // ── Event registration ────────────────────────────────────────────────────

    /// Replaces all handlers with the non-empty entries of `callbacks`.
    pub fn set_callbacks(&mut self, callbacks: EventCallbacks) {
        self.demux.rebuild(callbacks);
    }

    /// Registers a single handler, replacing any previous one for `name`.
    pub fn on(&mut self, name: EventName, handler: impl FnMut(EventPayload) + 'static) {
        self.demux.register(name, handler);
    }

    pub fn off(&mut self, name: EventName) -> bool {
        self.demux.unregister(name)
    }

    // ── Inbound path ──────────────────────────────────────────────────────────

    /// Routes a raw native notification.
    ///
    /// Unknown names are dropped, as is a notification stamped with a handle
    /// that is no longer live.  An unstamped notification goes to the live
    /// session, whichever one that is.
    pub fn handle_notification(&mut self, notification: NativeNotification) -> Delivery {
        if let Some(origin) = notification.handle {
            if self.slot.resolve() != Some(origin) {
                trace!(bridge = %self.id, handle = %origin, "stale handle; notification dropped");
                return Delivery::StaleHandle;
            }
        }

        match notification.name.parse::<EventName>() {
            Ok(name) => self.handle_event(name, EventPayload(notification.native_event)),
            Err(unknown) => {
                trace!(bridge = %self.id, %unknown, "dropping notification");
                Delivery::UnknownEvent
            }
        }
    }

    /// Routes an already-parsed event.
    ///
    /// Lifecycle events update [`BridgeState`] before the handler runs.
    /// After unmount nothing is delivered.
    pub fn handle_event(&mut self, name: EventName, payload: EventPayload) -> Delivery {
        if self.slot.resolve().is_none() {
            trace!(bridge = %self.id, event = %name, "not mounted; event dropped");
            return Delivery::Unhandled;
        }

        match name {
            EventName::RoomDidConnect => self.state = BridgeState::Connected,
            EventName::RoomDidDisconnect | EventName::RoomDidFailToConnect => {
                self.state = BridgeState::Disconnected
            }
            _ => {}
        }

        self.demux.deliver(name, payload)
    }

    // ── Operations ────────────────────────────────────────────────────────────

    fn send(&self, command: Command) -> Dispatch {
        self.dispatcher.dispatch(&self.slot, command)
    }

    /// Asks the native session to join a room.
    ///
    /// Success or failure arrives later as `onRoomDidConnect` or
    /// `onRoomDidFailToConnect`.  A second connect while connected is
    /// forwarded anyway; the native side decides what it means.
    pub fn connect(&mut self, options: ConnectOptions) -> Dispatch {
        if self.state == BridgeState::Connected {
            warn!(bridge = %self.id, room = %options.room_name, "connect while already connected");
        }

        let outcome = self.send(Command::connect(&options));
        if outcome.was_sent() {
            debug!(bridge = %self.id, room = %options.room_name, "connect requested");
            self.state = BridgeState::Connected;
        }
        outcome
    }

    /// Connects using the configured [`ConnectDefaults`].
    pub fn connect_to(
        &mut self,
        room_name: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Dispatch {
        let options = self.defaults.options(room_name, access_token);
        self.connect(options)
    }

    pub fn disconnect(&mut self) -> Dispatch {
        let outcome = self.send(Command::disconnect());
        if outcome.was_sent() {
            self.state = BridgeState::Disconnected;
        }
        outcome
    }

    pub fn flip_camera(&self) -> Dispatch {
        self.send(Command::switch_camera())
    }

    /// Resolves immediately with `enabled`; see the module docs.
    pub fn set_local_video_enabled(&self, enabled: bool) -> Ready<bool> {
        self.send(Command::toggle_video(enabled));
        ready(enabled)
    }

    /// Resolves immediately with `enabled`.
    pub fn set_local_audio_enabled(&self, enabled: bool) -> Ready<bool> {
        self.send(Command::toggle_audio(enabled));
        ready(enabled)
    }

    /// Resolves immediately with `enabled`.
    pub fn set_remote_audio_enabled(&self, enabled: bool) -> Ready<bool> {
        self.send(Command::toggle_remote_sound(enabled));
        ready(enabled)
    }

    /// Resolves immediately with `enabled`.
    pub fn set_bluetooth_headset_connected(&self, enabled: bool) -> Ready<bool> {
        self.send(Command::toggle_bluetooth_headset(enabled));
        ready(enabled)
    }

    pub fn publish_local_video(&self) -> Dispatch {
        self.send(Command::publish_video(true))
    }

    pub fn unpublish_local_video(&self) -> Dispatch {
        self.send(Command::publish_video(false))
    }

    pub fn publish_local_audio(&self) -> Dispatch {
        self.send(Command::publish_audio(true))
    }

    pub fn unpublish_local_audio(&self) -> Dispatch {
        self.send(Command::publish_audio(false))
    }

    /// Sends a text message over the local data track.
    pub fn send_string(&self, message: impl Into<String>) -> Dispatch {
        self.send(Command::send_message(message))
    }

    /// Requests a stats snapshot, delivered later as `onStatsReceived`.
    pub fn get_stats(&self) -> Dispatch {
        self.send(Command::get_stats())
    }

    pub fn set_remote_audio_playback(
        &self,
        participant_sid: impl Into<String>,
        enabled: bool,
    ) -> Dispatch {
        self.send(Command::set_remote_audio_playback(participant_sid, enabled))
    }

    /// Turns off the platform-specific low-level audio path (OpenSL ES).
    pub fn disable_open_sl_es(&self) -> Dispatch {
        self.send(Command::disable_platform_audio_path())
    }

    /// `true` routes audio to the loudspeaker, `false` to the earpiece.
    pub fn toggle_sound_setup(&self, speaker: bool) -> Dispatch {
        self.send(Command::toggle_sound_setup(speaker))
    }

    /// Validates and dispatches an untyped command.
    ///
    /// See [`CommandDispatcher::dispatch_raw`] for the contract-violation policy.
    pub fn dispatch_raw(
        &self,
        opcode: &Value,
        args: Vec<Value>,
    ) -> Result<Dispatch, ContractViolation> {
        self.dispatcher.dispatch_raw(&self.slot, opcode, args)
    }
}

impl<S: NativeSession> Drop for BridgeCoordinator<S> {
    fn drop(&mut self) {
        self.unmount();
    }
}

impl<S: NativeSession> fmt::Debug for BridgeCoordinator<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeCoordinator")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("handle", &self.slot.resolve())
            .field("demux", &self.demux)
            .finish()
    }
}
