//! In-memory media session
//!
//! Stands in for the OS session where none exists (headless hosts, tests).
//! Writes land in a pending view and become visible on commit, like the
//! real display updater. A [`MemoryHandle`] observes the visible state and
//! plays the OS's part by pressing buttons.

use crate::{ButtonHandler, SessionBackend};
use sap_core::{
    BridgeError, BridgeResult, Capabilities, MediaKind, SessionButton, SessionStatus,
    TrackMetadata,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Session operation that can be told to fail
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailPoint {
    AutoRouting,
    Subscribe,
    Capabilities,
    Status,
    Enable,
    MediaKind,
    Track,
    Commit,
}

/// Resource released during teardown, in release order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Teardown {
    Session,
    Runtime,
}

/// What the OS would currently display and report
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub enabled: bool,
    pub auto_command_routing: bool,
    pub subscribed: bool,
    pub capabilities: Capabilities,
    pub status: SessionStatus,
    pub media_kind: MediaKind,
    pub title: String,
    pub artist: String,
    /// Number of successful commits
    pub commits: usize,
    pub teardown: Vec<Teardown>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct SessionView {
    enabled: bool,
    auto_command_routing: bool,
    capabilities: Capabilities,
    status: SessionStatus,
    media_kind: MediaKind,
    track: TrackMetadata,
}

#[derive(Default)]
struct MemoryState {
    pending: SessionView,
    visible: SessionView,
    handler: Option<ButtonHandler>,
    commits: usize,
    fail_at: Option<FailPoint>,
    teardown: Vec<Teardown>,
}

type Shared = Arc<Mutex<MemoryState>>;

fn lock(state: &Shared) -> MutexGuard<'_, MemoryState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Headless [`SessionBackend`]
pub struct MemorySession {
    // Field order is release order: session before runtime.
    session: SessionGuard,
    _runtime: RuntimeGuard,
}

/// The session object; dropping it unsubscribes and disables the session
struct SessionGuard {
    state: Shared,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let mut state = lock(&self.state);
        state.handler = None;
        state.visible.enabled = false;
        state.teardown.push(Teardown::Session);
        debug!("Closed in-memory media session");
    }
}

/// Stand-in for the platform runtime context the session depends on
struct RuntimeGuard {
    state: Shared,
}

impl Drop for RuntimeGuard {
    fn drop(&mut self) {
        lock(&self.state).teardown.push(Teardown::Runtime);
        debug!("Released in-memory runtime context");
    }
}

impl MemorySession {
    /// Create a session and the handle that observes it
    pub fn new() -> (Self, MemoryHandle) {
        let view = SessionView {
            // OS default: commands auto-route until told otherwise
            auto_command_routing: true,
            ..Default::default()
        };
        let state = Arc::new(Mutex::new(MemoryState {
            pending: view.clone(),
            visible: view,
            ..Default::default()
        }));
        debug!("Opened in-memory media session");
        (
            Self {
                session: SessionGuard {
                    state: state.clone(),
                },
                _runtime: RuntimeGuard {
                    state: state.clone(),
                },
            },
            MemoryHandle { state },
        )
    }

    /// Create a session whose `point` operation fails from the start
    pub fn failing_at(point: FailPoint) -> (Self, MemoryHandle) {
        let (session, handle) = Self::new();
        handle.fail_at(Some(point));
        (session, handle)
    }

    fn write<F>(&mut self, point: FailPoint, apply: F) -> BridgeResult<()>
    where
        F: FnOnce(&mut MemoryState),
    {
        let mut state = lock(&self.session.state);
        if state.fail_at == Some(point) {
            return Err(BridgeError::Backend(format!("injected failure at {:?}", point)));
        }
        apply(&mut state);
        Ok(())
    }
}

impl SessionBackend for MemorySession {
    fn set_auto_command_routing(&mut self, enabled: bool) -> BridgeResult<()> {
        self.write(FailPoint::AutoRouting, |s| {
            s.pending.auto_command_routing = enabled
        })
    }

    fn subscribe_buttons(&mut self, handler: ButtonHandler) -> BridgeResult<()> {
        self.write(FailPoint::Subscribe, |s| s.handler = Some(handler))
    }

    fn set_capabilities(&mut self, capabilities: Capabilities) -> BridgeResult<()> {
        self.write(FailPoint::Capabilities, |s| {
            s.pending.capabilities = capabilities
        })
    }

    fn set_status(&mut self, status: SessionStatus) -> BridgeResult<()> {
        self.write(FailPoint::Status, |s| s.pending.status = status)
    }

    fn set_enabled(&mut self, enabled: bool) -> BridgeResult<()> {
        self.write(FailPoint::Enable, |s| s.pending.enabled = enabled)
    }

    fn set_media_kind(&mut self, kind: MediaKind) -> BridgeResult<()> {
        self.write(FailPoint::MediaKind, |s| s.pending.media_kind = kind)
    }

    fn set_track(&mut self, track: &TrackMetadata) -> BridgeResult<()> {
        self.write(FailPoint::Track, |s| s.pending.track = track.clone())
    }

    fn commit(&mut self) -> BridgeResult<()> {
        self.write(FailPoint::Commit, |s| {
            s.visible = s.pending.clone();
            s.commits += 1;
        })
    }
}

/// Observer and button source for a [`MemorySession`].
///
/// Stays valid after the session is dropped so teardown can be inspected.
#[derive(Clone)]
pub struct MemoryHandle {
    state: Shared,
}

impl MemoryHandle {
    pub fn snapshot(&self) -> SessionSnapshot {
        let state = lock(&self.state);
        SessionSnapshot {
            enabled: state.visible.enabled,
            auto_command_routing: state.visible.auto_command_routing,
            subscribed: state.handler.is_some(),
            capabilities: state.visible.capabilities,
            status: state.visible.status,
            media_kind: state.visible.media_kind,
            title: state.visible.track.title.clone(),
            artist: state.visible.track.artist.clone(),
            commits: state.commits,
            teardown: state.teardown.clone(),
        }
    }

    /// Deliver a button press the way the OS would.
    ///
    /// Returns false when nothing is subscribed.
    pub fn press(&self, button: SessionButton) -> bool {
        // Clone out so the handler runs without the session lock held
        let handler = lock(&self.state).handler.clone();
        match handler {
            Some(handler) => {
                handler(button);
                true
            }
            None => false,
        }
    }

    /// Make one operation fail from now on; `None` clears it
    pub fn fail_at(&self, point: Option<FailPoint>) {
        lock(&self.state).fail_at = point;
    }
}
