//! EventDemultiplexer: routes native notifications to application handlers.
//!
//! # How routing works (for beginners)
//!
//! The native session emits *named* notifications (`onRoomDidConnect`,
//! `onStatsReceived`, ...).  The application registers at most one handler per
//! name.  When a notification arrives:
//!
//! 1. The wire name is parsed into an [`EventName`].  Unknown names are dropped.
//! 2. The handler registered for that name (if any) is called exactly once with
//!    the payload, unchanged.
//! 3. No handler means no effect.  Nothing is queued for later registration.
//!
//! The bridge never looks inside a payload.  Handlers receive exactly what the
//! native side produced.
//!
//! Delivery is synchronous: the handler runs to completion before
//! [`EventDemultiplexer::deliver`] returns.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use avbridge_core::{EventName, EventPayload, NativeNotification};
use tracing::{debug, trace};

/// A handler for one event name.
pub type EventHandler = Box<dyn FnMut(EventPayload)>;

/// Outcome of a single delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// A handler ran.
    Handled,
    /// Known name, but no handler registered.
    Unhandled,
    /// The wire name is not in the registry.
    UnknownEvent,
    /// Stamped with a handle that is no longer live; nothing ran.
    StaleHandle,
}

// ── EventCallbacks ────────────────────────────────────────────────────────────

/// The application's callback set, keyed by event name.
///
/// An entry may be explicitly empty (`None`), mirroring a callback property
/// that is present but unset.  Only non-empty entries are registered.
#[derive(Default)]
pub struct EventCallbacks {
    handlers: BTreeMap<EventName, Option<EventHandler>>,
}

impl EventCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the handler for `name`.
    pub fn on(mut self, name: EventName, handler: impl FnMut(EventPayload) + 'static) -> Self {
        self.handlers.insert(name, Some(Box::new(handler)));
        self
    }

    /// Marks `name` as present but without a handler.
    pub fn clear(mut self, name: EventName) -> Self {
        self.handlers.insert(name, None);
        self
    }

    /// In-place form of [`on`](Self::on) and [`clear`](Self::clear).
    pub fn set(&mut self, name: EventName, handler: Option<EventHandler>) {
        self.handlers.insert(name, handler);
    }

    /// Names that currently hold a handler, in id order.
    pub fn active_names(&self) -> Vec<EventName> {
        self.handlers
            .iter()
            .filter(|(_, h)| h.is_some())
            .map(|(name, _)| *name)
            .collect()
    }

    /// Drops empty entries and returns the table the demultiplexer routes by.
    pub fn into_registration_table(self) -> HashMap<EventName, EventHandler> {
        self.handlers
            .into_iter()
            .filter_map(|(name, handler)| handler.map(|h| (name, h)))
            .collect()
    }
}

impl fmt::Debug for EventCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventCallbacks")
            .field("active", &self.active_names())
            .finish()
    }
}

// ── EventDemultiplexer ────────────────────────────────────────────────────────

/// Maps each event name to at most one handler.
#[derive(Default)]
pub struct EventDemultiplexer {
    table: HashMap<EventName, EventHandler>,
}

impl EventDemultiplexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `name`, replacing any previous handler.
    ///
    /// The replaced handler is dropped and will never be invoked again.
    pub fn register(&mut self, name: EventName, handler: impl FnMut(EventPayload) + 'static) {
        if self.table.insert(name, Box::new(handler)).is_some() {
            debug!(event = %name, "replaced event handler");
        }
    }

    /// Removes the handler for `name`.  Returns `true` if one was registered.
    pub fn unregister(&mut self, name: EventName) -> bool {
        self.table.remove(&name).is_some()
    }

    /// Replaces the whole table with the non-empty entries of `callbacks`.
    pub fn rebuild(&mut self, callbacks: EventCallbacks) {
        self.table = callbacks.into_registration_table();
        debug!(registered = self.table.len(), "rebuilt event registration table");
    }

    pub fn is_registered(&self, name: EventName) -> bool {
        self.table.contains_key(&name)
    }

    /// Names the hosting layer should subscribe to, in id order.
    pub fn registered_names(&self) -> Vec<EventName> {
        let mut names: Vec<EventName> = self.table.keys().copied().collect();
        names.sort();
        names
    }

    /// Invokes the handler for `name` once with `payload`.
    pub fn deliver(&mut self, name: EventName, payload: EventPayload) -> Delivery {
        match self.table.get_mut(&name) {
            Some(handler) => {
                trace!(event = %name, "delivering event");
                handler(payload);
                Delivery::Handled
            }
            None => {
                trace!(event = %name, "no handler registered; event dropped");
                Delivery::Unhandled
            }
        }
    }

    /// Parses a raw notification and delivers its `nativeEvent` payload.
    pub fn deliver_notification(&mut self, notification: NativeNotification) -> Delivery {
        match notification.name.parse::<EventName>() {
            Ok(name) => self.deliver(name, EventPayload(notification.native_event)),
            Err(unknown) => {
                trace!(%unknown, "dropping notification");
                Delivery::UnknownEvent
            }
        }
    }
}

impl fmt::Debug for EventDemultiplexer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDemultiplexer")
            .field("registered", &self.registered_names())
            .finish()
    }
}
