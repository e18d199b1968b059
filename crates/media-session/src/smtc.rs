//! Windows System Media Transport Controls (SMTC) session
//!
//! Publishes this process as a media source through the SMTC instance that
//! belongs to a `MediaPlayer`. The player never plays anything; it only
//! carries the controls.
//!
//! Requires Windows 10 or later.

use crate::{ButtonHandler, SessionBackend};
use sap_core::{
    BridgeError, BridgeResult, Capabilities, MediaKind, SessionButton, SessionStatus,
    TrackMetadata,
};
use std::marker::PhantomData;
use tracing::{debug, info, warn};
use windows::{
    core::HSTRING,
    Foundation::TypedEventHandler,
    Media::{
        MediaPlaybackStatus, MediaPlaybackType, Playback::MediaPlayer,
        SystemMediaTransportControls, SystemMediaTransportControlsButton,
        SystemMediaTransportControlsButtonPressedEventArgs,
        SystemMediaTransportControlsDisplayUpdater,
    },
    Win32::System::WinRT::{RoInitialize, RoUninitialize, RO_INIT_SINGLETHREADED},
};

/// Single-threaded Windows Runtime apartment for the current thread.
///
/// `!Send`: the apartment must be torn down on the thread that entered it,
/// which also pins the session and any bridge owning it to that thread.
struct RuntimeGuard {
    _not_send: PhantomData<*const ()>,
}

impl RuntimeGuard {
    fn acquire() -> BridgeResult<Self> {
        // SAFETY: balanced by RoUninitialize in Drop; the guard is !Send, so
        // that runs on this same thread
        unsafe { RoInitialize(RO_INIT_SINGLETHREADED) }
            .map_err(|e| BridgeError::RuntimeInit(e.message().to_string()))?;
        debug!("Windows Runtime initialized (single-threaded)");
        Ok(Self {
            _not_send: PhantomData,
        })
    }
}

impl Drop for RuntimeGuard {
    fn drop(&mut self) {
        // SAFETY: only reachable after a successful RoInitialize
        unsafe { RoUninitialize() };
        debug!("Windows Runtime uninitialized");
    }
}

pub struct SmtcSession {
    // Declared before `_runtime` so every WinRT object is gone before the
    // apartment is torn down.
    player: MediaPlayer,
    controls: SystemMediaTransportControls,
    button_token: Option<i64>,
    _runtime: RuntimeGuard,
}

impl SmtcSession {
    /// Initialize the runtime and create the backing player and its controls
    pub fn open() -> BridgeResult<Self> {
        let runtime = RuntimeGuard::acquire()?;

        let player = MediaPlayer::new().map_err(session_error)?;
        let controls = player.SystemMediaTransportControls().map_err(session_error)?;

        info!("SMTC session created");

        Ok(Self {
            player,
            controls,
            button_token: None,
            _runtime: runtime,
        })
    }

    fn updater(&self) -> BridgeResult<SystemMediaTransportControlsDisplayUpdater> {
        self.controls.DisplayUpdater().map_err(backend_error)
    }
}

fn session_error(e: windows::core::Error) -> BridgeError {
    BridgeError::SessionCreate(e.message().to_string())
}

fn backend_error(e: windows::core::Error) -> BridgeError {
    BridgeError::Backend(e.message().to_string())
}

fn map_button(button: SystemMediaTransportControlsButton) -> Option<SessionButton> {
    match button {
        SystemMediaTransportControlsButton::Play => Some(SessionButton::Play),
        SystemMediaTransportControlsButton::Pause => Some(SessionButton::Pause),
        SystemMediaTransportControlsButton::Stop => Some(SessionButton::Stop),
        SystemMediaTransportControlsButton::Record => Some(SessionButton::Record),
        SystemMediaTransportControlsButton::FastForward => Some(SessionButton::FastForward),
        SystemMediaTransportControlsButton::Rewind => Some(SessionButton::Rewind),
        SystemMediaTransportControlsButton::Next => Some(SessionButton::Next),
        SystemMediaTransportControlsButton::Previous => Some(SessionButton::Previous),
        SystemMediaTransportControlsButton::ChannelUp => Some(SessionButton::ChannelUp),
        SystemMediaTransportControlsButton::ChannelDown => Some(SessionButton::ChannelDown),
        _ => None,
    }
}

impl SessionBackend for SmtcSession {
    fn set_auto_command_routing(&mut self, enabled: bool) -> BridgeResult<()> {
        self.player
            .CommandManager()
            .and_then(|manager| manager.SetIsEnabled(enabled))
            .map_err(backend_error)
    }

    fn subscribe_buttons(&mut self, handler: ButtonHandler) -> BridgeResult<()> {
        let event_handler = TypedEventHandler::new(
            move |_sender: &Option<SystemMediaTransportControls>,
                  args: &Option<SystemMediaTransportControlsButtonPressedEventArgs>| {
                let button = args
                    .as_ref()
                    .and_then(|args| args.Button().ok())
                    .and_then(map_button);
                if let Some(button) = button {
                    handler(button);
                }
                Ok(())
            },
        );

        let token = self
            .controls
            .ButtonPressed(&event_handler)
            .map_err(backend_error)?;

        if let Some(previous) = self.button_token.replace(token) {
            if let Err(e) = self.controls.RemoveButtonPressed(previous) {
                warn!("Failed to remove previous SMTC button handler: {}", e);
            }
        }
        Ok(())
    }

    fn set_capabilities(&mut self, capabilities: Capabilities) -> BridgeResult<()> {
        let controls = &self.controls;
        controls
            .SetIsPlayEnabled(capabilities.play)
            .and_then(|()| controls.SetIsPauseEnabled(capabilities.pause))
            .and_then(|()| controls.SetIsStopEnabled(capabilities.stop))
            .and_then(|()| controls.SetIsPreviousEnabled(capabilities.previous))
            .and_then(|()| controls.SetIsNextEnabled(capabilities.next))
            .map_err(backend_error)
    }

    fn set_status(&mut self, status: SessionStatus) -> BridgeResult<()> {
        let status = match status {
            SessionStatus::Closed => MediaPlaybackStatus::Closed,
            SessionStatus::Stopped => MediaPlaybackStatus::Stopped,
            SessionStatus::Playing => MediaPlaybackStatus::Playing,
            SessionStatus::Paused => MediaPlaybackStatus::Paused,
        };
        self.controls.SetPlaybackStatus(status).map_err(backend_error)
    }

    fn set_enabled(&mut self, enabled: bool) -> BridgeResult<()> {
        self.controls.SetIsEnabled(enabled).map_err(backend_error)
    }

    fn set_media_kind(&mut self, kind: MediaKind) -> BridgeResult<()> {
        let kind = match kind {
            MediaKind::Unknown => MediaPlaybackType::Unknown,
            MediaKind::Music => MediaPlaybackType::Music,
            MediaKind::Video => MediaPlaybackType::Video,
            MediaKind::Image => MediaPlaybackType::Image,
        };
        self.updater()?.SetType(kind).map_err(backend_error)
    }

    fn set_track(&mut self, track: &TrackMetadata) -> BridgeResult<()> {
        let properties = self.updater()?.MusicProperties().map_err(backend_error)?;
        properties
            .SetTitle(&HSTRING::from(track.title.as_str()))
            .and_then(|()| properties.SetArtist(&HSTRING::from(track.artist.as_str())))
            .map_err(backend_error)
    }

    fn commit(&mut self) -> BridgeResult<()> {
        self.updater()?.Update().map_err(backend_error)
    }
}

impl Drop for SmtcSession {
    fn drop(&mut self) {
        if let Some(token) = self.button_token.take() {
            if let Err(e) = self.controls.RemoveButtonPressed(token) {
                warn!("Failed to remove SMTC button handler: {}", e);
            }
        }
        if let Err(e) = self.player.Close() {
            warn!("Failed to close SMTC media player: {}", e);
        }
        info!("SMTC session released");
        // `_runtime` drops after the player and controls
    }
}
