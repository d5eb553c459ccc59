//! Session handles.
//!
//! # What is a handle? (for beginners)
//!
//! The native session object lives in memory the bridge does not own.  The
//! bridge refers to it through a *handle*: a small opaque token that the
//! hosting layer maps to the real native instance.
//!
//! A raw pointer would be dangerous here: the hosting surface can unmount at
//! any moment, and a command racing with that unmount must not reach freed
//! memory.  So handles are modelled arena-style:
//!
//! - **Allocated** from a process-wide counter when the surface mounts.
//!   Ids increase monotonically and are never reused, so a stale handle can
//!   never alias a newer session.
//! - **Validated** on every use through a [`HandleResolver`].  A resolver
//!   that returns `None` means "no live session"; callers treat that as a
//!   silent no-op, not an error.
//! - **Retired** exactly once when the surface unmounts.
//!
//! # Thread safety
//!
//! The allocator is an `AtomicU64`, so coordinators on different threads
//! still receive distinct ids.  The [`HandleSlot`] itself is owned by one
//! coordinator and mutated through `&mut self` only.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Next id to hand out.  Starts at 1 so that 0 never names a live session.
static NEXT_HANDLE_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque reference to one live native session/view instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionHandle(u64);

impl SessionHandle {
    /// Allocates a handle that has never been issued before in this process.
    ///
    /// `Ordering::Relaxed` is enough: the id only has to be unique, it does
    /// not publish any other memory.
    pub fn allocate() -> Self {
        Self(NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Wraps an id issued by the hosting layer.
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }

    pub fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Resolves the handle that commands should currently be addressed to.
pub trait HandleResolver {
    /// Returns the live handle, or `None` when no session is mounted.
    fn resolve(&self) -> Option<SessionHandle>;
}

/// Holds at most one live handle.
#[derive(Debug, Default)]
pub struct HandleSlot {
    live: Option<SessionHandle>,
}

impl HandleSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `handle` the live handle, returning any handle it displaced.
    ///
    /// Callers that care about teardown must retire the previous handle
    /// first; a displaced handle is returned only so it is not lost silently.
    pub fn install(&mut self, handle: SessionHandle) -> Option<SessionHandle> {
        self.live.replace(handle)
    }

    /// Invalidates the live handle and returns it.
    ///
    /// Returns `None` if nothing was live, so a second retire is a no-op.
    pub fn retire(&mut self) -> Option<SessionHandle> {
        self.live.take()
    }

    /// Returns `true` if `handle` is the live handle.
    pub fn is_live(&self, handle: SessionHandle) -> bool {
        self.live == Some(handle)
    }
}

impl HandleResolver for HandleSlot {
    fn resolve(&self) -> Option<SessionHandle> {
        self.live
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_allocate_never_repeats() {
        // Arrange / Act
        let handles: Vec<SessionHandle> = (0..100).map(|_| SessionHandle::allocate()).collect();

        // Assert – strictly increasing within one thread
        for window in handles.windows(2) {
            assert!(window[1].id() > window[0].id());
        }
    }

    #[test]
    fn test_allocate_is_unique_across_threads() {
        // Arrange
        let barrier = Arc::new(std::sync::Barrier::new(4));

        // Act
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let b = Arc::clone(&barrier);
                thread::spawn(move || {
                    b.wait();
                    (0..500).map(|_| SessionHandle::allocate()).collect::<Vec<_>>()
                })
            })
            .collect();

        let all: Vec<SessionHandle> = workers
            .into_iter()
            .flat_map(|w| w.join().expect("thread panicked"))
            .collect();

        // Assert
        let unique: HashSet<_> = all.iter().copied().collect();
        assert_eq!(unique.len(), all.len(), "no two threads may share an id");
    }

    #[test]
    fn test_allocate_never_issues_zero() {
        assert_ne!(SessionHandle::allocate().id(), 0);
    }

    #[test]
    fn test_empty_slot_resolves_to_none() {
        let slot = HandleSlot::new();
        assert_eq!(slot.resolve(), None);
    }

    #[test]
    fn test_installed_handle_resolves() {
        let mut slot = HandleSlot::new();
        let handle = SessionHandle::allocate();

        let displaced = slot.install(handle);

        assert_eq!(displaced, None);
        assert_eq!(slot.resolve(), Some(handle));
        assert!(slot.is_live(handle));
    }

    #[test]
    fn test_retire_happens_once() {
        // Arrange
        let mut slot = HandleSlot::new();
        let handle = SessionHandle::allocate();
        slot.install(handle);

        // Act
        let first = slot.retire();
        let second = slot.retire();

        // Assert
        assert_eq!(first, Some(handle));
        assert_eq!(second, None, "second retire must be a no-op");
        assert!(!slot.is_live(handle));
    }

    #[test]
    fn test_install_returns_displaced_handle() {
        let mut slot = HandleSlot::new();
        let old = SessionHandle::allocate();
        let new = SessionHandle::allocate();
        slot.install(old);

        assert_eq!(slot.install(new), Some(old));
        assert!(slot.is_live(new));
        assert!(!slot.is_live(old));
    }

    #[test]
    fn test_display_shows_id() {
        assert_eq!(SessionHandle::from_raw(7).to_string(), "#7");
    }
}
