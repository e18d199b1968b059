use crate::instance::InstanceGuard;
use crate::{open_platform_session, ButtonHandler, PlatformSession, SessionBackend};
use sap_core::{
    command_for_button, BridgeConfig, BridgeError, BridgeResult, CallbackRegistry, Capabilities,
    CommandType, MediaKind, PlaybackStatus, SessionButton, SessionStatus, TrackMetadata,
};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Mirrors application playback state into an OS media session and routes
/// the session's transport buttons back to application callbacks.
///
/// All calls are expected from the thread that built the bridge. Button
/// presses arrive on whatever context the OS uses for event delivery; they
/// only touch the callback registry, which is internally locked.
///
/// Dropping the bridge releases the session, then the platform runtime.
/// The Windows session is `!Send`, so a bridge over it cannot be moved to
/// (or dropped on) another thread than the one that entered the apartment.
pub struct MediaSessionBridge<B: SessionBackend = PlatformSession> {
    // Field order is drop order: backend before the instance lock.
    backend: B,
    registry: Arc<CallbackRegistry>,
    config: BridgeConfig,
    status: SessionStatus,
    _instance: Option<InstanceGuard>,
}

impl MediaSessionBridge<PlatformSession> {
    /// Open the OS media session with default settings
    pub fn new() -> BridgeResult<Self> {
        Self::with_config(BridgeConfig::default())
    }

    /// Open the OS media session
    pub fn with_config(config: BridgeConfig) -> BridgeResult<Self> {
        // Claim the slot before touching any process-wide platform state
        let instance = claim_instance(&config)?;
        let backend = open_platform_session()?;
        Self::assemble(backend, config, instance)
    }
}

impl<B: SessionBackend> MediaSessionBridge<B> {
    /// Build a bridge on top of an already opened session backend
    pub fn with_backend(backend: B, config: BridgeConfig) -> BridgeResult<Self> {
        let instance = claim_instance(&config)?;
        Self::assemble(backend, config, instance)
    }

    fn assemble(
        mut backend: B,
        config: BridgeConfig,
        instance: Option<InstanceGuard>,
    ) -> BridgeResult<Self> {
        let registry = Arc::new(CallbackRegistry::new());

        // On failure `backend` drops here, releasing whatever it acquired
        initialize(&mut backend, button_dispatcher(registry.clone())).map_err(|e| match e {
            BridgeError::Backend(msg) => BridgeError::SessionCreate(msg),
            other => other,
        })?;

        info!("Media session bridge ready");

        Ok(Self {
            backend,
            registry,
            config,
            status: SessionStatus::Closed,
            _instance: instance,
        })
    }

    /// Report the application's transport state to the OS
    pub fn notify_playback_status(&mut self, status: PlaybackStatus) {
        let mapped = SessionStatus::from(status);
        debug!("Playback status {} -> {:?}", status, mapped);
        self.status = mapped;

        let result = self
            .backend
            .set_status(mapped)
            .and_then(|()| self.backend.commit());
        if let Err(e) = result {
            warn!("Failed to update session playback status: {}", e);
        }
    }

    /// Report a track change; missing or empty fields get the configured fallbacks
    pub fn notify_track_changed(&mut self, title: Option<&str>, artist: Option<&str>) {
        let track = TrackMetadata::resolve(
            title,
            artist,
            &self.config.fallback_title,
            &self.config.fallback_artist,
        );
        debug!("Track changed: title={}, artist={}", track.title, track.artist);

        let result = self
            .backend
            .set_track(&track)
            .and_then(|()| self.backend.commit());
        if let Err(e) = result {
            warn!("Failed to update session metadata: {}", e);
        }
    }

    /// Hook `callback` to a command slot, replacing any earlier callback.
    ///
    /// Registering for [`CommandType::Unknown`] does nothing.
    pub fn register_command_callback<F>(&self, command: CommandType, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.registry.register(command, callback);
    }

    pub fn has_command_callback(&self, command: CommandType) -> bool {
        self.registry.is_registered(command)
    }

    /// Last status pushed to the OS; `Closed` until the first update
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }
}

impl<B: SessionBackend> Drop for MediaSessionBridge<B> {
    fn drop(&mut self) {
        info!("Releasing media session bridge");
    }
}

fn claim_instance(config: &BridgeConfig) -> BridgeResult<Option<InstanceGuard>> {
    if config.single_instance {
        InstanceGuard::acquire().map(Some)
    } else {
        Ok(None)
    }
}

/// Bring a fresh session into its steady state.
///
/// The dispatcher is subscribed before the session is enabled so no press
/// can arrive unobserved.
fn initialize<B: SessionBackend>(backend: &mut B, dispatcher: ButtonHandler) -> BridgeResult<()> {
    backend.set_auto_command_routing(false)?;
    backend.subscribe_buttons(dispatcher)?;
    backend.set_capabilities(Capabilities::TRANSPORT)?;
    backend.set_status(SessionStatus::Closed)?;
    backend.set_enabled(true)?;
    backend.set_media_kind(MediaKind::Music)?;
    backend.commit()
}

fn button_dispatcher(registry: Arc<CallbackRegistry>) -> ButtonHandler {
    Arc::new(move |button| dispatch_button(&registry, button))
}

/// Route one OS button press to its callback.
///
/// Runs on the OS event-delivery context, so nothing may escape: unmapped
/// buttons and empty slots are dropped, and a panicking callback is caught.
pub(crate) fn dispatch_button(registry: &CallbackRegistry, button: SessionButton) {
    let Some(command) = command_for_button(button) else {
        debug!("Ignoring unmapped button {:?}", button);
        return;
    };

    match panic::catch_unwind(AssertUnwindSafe(|| registry.dispatch(command))) {
        Ok(true) => debug!("Dispatched {:?} to {}", button, command),
        Ok(false) => debug!("No callback for {}, dropping {:?}", command, button),
        Err(_) => error!("Callback for {} panicked while handling {:?}", command, button),
    }
}
