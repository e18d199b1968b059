//! Bridge between an application's playback engine and the OS media session
//!
//! The bridge mirrors playback status and track metadata into the session the
//! OS exposes on lock screens and media overlays, and forwards hardware or
//! on-screen transport buttons back to application callbacks:
//! - Windows: System Media Transport Controls (SMTC) via a `MediaPlayer`
//! - Anywhere: an in-memory session, used headless and in tests

use std::sync::Arc;

mod bridge;
mod instance;
pub mod memory;

#[cfg(target_os = "windows")]
mod smtc;

pub use bridge::MediaSessionBridge;
pub use instance::InstanceGuard;
pub use memory::{FailPoint, MemoryHandle, MemorySession, SessionSnapshot, Teardown};
pub use sap_core::{
    BridgeConfig, BridgeError, BridgeResult, Capabilities, CommandType, MediaKind, PlaybackStatus,
    SessionButton, SessionStatus, TrackMetadata,
};

/// Receiver for OS button-press notifications
pub type ButtonHandler = Arc<dyn Fn(SessionButton) + Send + Sync>;

/// The OS media session as seen by the bridge.
///
/// An implementation owns the session object and whatever platform runtime
/// it needs. Dropping it releases the session first, then the runtime.
/// Field writes become visible to the OS only after [`SessionBackend::commit`].
pub trait SessionBackend {
    /// Toggle the OS's own routing of commands to a built-in consumer
    fn set_auto_command_routing(&mut self, enabled: bool) -> BridgeResult<()>;

    /// Subscribe `handler` to button presses. A later call replaces the earlier handler.
    fn subscribe_buttons(&mut self, handler: ButtonHandler) -> BridgeResult<()>;

    fn set_capabilities(&mut self, capabilities: Capabilities) -> BridgeResult<()>;

    fn set_status(&mut self, status: SessionStatus) -> BridgeResult<()>;

    fn set_enabled(&mut self, enabled: bool) -> BridgeResult<()>;

    fn set_media_kind(&mut self, kind: MediaKind) -> BridgeResult<()>;

    fn set_track(&mut self, track: &TrackMetadata) -> BridgeResult<()>;

    /// Push pending writes to the OS
    fn commit(&mut self) -> BridgeResult<()>;
}

/// Session backend for the current target
#[cfg(target_os = "windows")]
pub type PlatformSession = smtc::SmtcSession;

/// Session backend for the current target
#[cfg(not(target_os = "windows"))]
pub type PlatformSession = memory::MemorySession;

/// Open the OS media session for the current target.
///
/// Targets without an OS session report [`BridgeError::Unsupported`]; callers
/// that still want a working bridge can fall back to [`MemorySession`].
pub fn open_platform_session() -> BridgeResult<PlatformSession> {
    #[cfg(target_os = "windows")]
    return smtc::SmtcSession::open();

    #[cfg(not(target_os = "windows"))]
    Err(BridgeError::Unsupported(std::env::consts::OS))
}
