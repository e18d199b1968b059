use sap_media_session::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// Every test here owns its own session, so the process-wide lock stays off
fn bridge() -> (MediaSessionBridge<MemorySession>, MemoryHandle) {
    let (session, handle) = MemorySession::new();
    let config = BridgeConfig {
        single_instance: false,
        ..Default::default()
    };
    let bridge = MediaSessionBridge::with_backend(session, config).unwrap();
    (bridge, handle)
}

fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
    let count = Arc::new(AtomicUsize::new(0));
    let c = count.clone();
    (count, move || {
        c.fetch_add(1, Ordering::SeqCst);
    })
}

#[test]
fn test_playing_and_paused_are_mirrored_idempotently() {
    let (mut bridge, handle) = bridge();

    for (status, expected) in [
        (PlaybackStatus::Playing, SessionStatus::Playing),
        (PlaybackStatus::Paused, SessionStatus::Paused),
    ] {
        bridge.notify_playback_status(status);
        let first = handle.snapshot();
        assert_eq!(first.status, expected);

        bridge.notify_playback_status(status);
        let second = handle.snapshot();
        assert_eq!(second.status, expected);
        assert_eq!(first.title, second.title);
        assert_eq!(first.capabilities, second.capabilities);
    }
}

#[test]
fn test_unknown_and_stopped_report_stopped() {
    let (mut bridge, handle) = bridge();

    bridge.notify_playback_status(PlaybackStatus::Playing);
    bridge.notify_playback_status(PlaybackStatus::Unknown);
    assert_eq!(handle.snapshot().status, SessionStatus::Stopped);

    bridge.notify_playback_status(PlaybackStatus::Playing);
    bridge.notify_playback_status(PlaybackStatus::Stopped);
    assert_eq!(handle.snapshot().status, SessionStatus::Stopped);

    bridge.notify_playback_status(PlaybackStatus::Playing);
    bridge.notify_playback_status(PlaybackStatus::from_raw(99));
    assert_eq!(handle.snapshot().status, SessionStatus::Stopped);
}

#[test]
fn test_every_update_commits() {
    let (mut bridge, handle) = bridge();
    let base = handle.snapshot().commits;

    bridge.notify_playback_status(PlaybackStatus::Playing);
    assert_eq!(handle.snapshot().commits, base + 1);

    bridge.notify_track_changed(Some("Song"), Some("Band"));
    assert_eq!(handle.snapshot().commits, base + 2);

    bridge.notify_playback_status(PlaybackStatus::Paused);
    bridge.notify_track_changed(None, None);
    assert_eq!(handle.snapshot().commits, base + 4);
}

#[test]
fn test_track_fallbacks() {
    let (mut bridge, handle) = bridge();

    bridge.notify_track_changed(None, None);
    let snapshot = handle.snapshot();
    assert_eq!(snapshot.title, "Unknown Title");
    assert_eq!(snapshot.artist, "Unknown Artists");

    bridge.notify_track_changed(Some("Song"), None);
    let snapshot = handle.snapshot();
    assert_eq!(snapshot.title, "Song");
    assert_eq!(snapshot.artist, "Unknown Artists");

    bridge.notify_track_changed(Some("Song"), Some("Band"));
    bridge.notify_track_changed(Some("Song"), Some("Band"));
    let snapshot = handle.snapshot();
    assert_eq!(snapshot.title, "Song");
    assert_eq!(snapshot.artist, "Band");
}

#[test]
fn test_configured_fallbacks() {
    let (session, handle) = MemorySession::new();
    let config = BridgeConfig {
        fallback_title: "Untitled".to_string(),
        fallback_artist: "Various".to_string(),
        single_instance: false,
    };
    let mut bridge = MediaSessionBridge::with_backend(session, config).unwrap();

    bridge.notify_track_changed(None, Some(""));
    let snapshot = handle.snapshot();
    assert_eq!(snapshot.title, "Untitled");
    assert_eq!(snapshot.artist, "Various");
}

#[test]
fn test_play_and_pause_share_one_callback() {
    let (bridge, handle) = bridge();
    let (count, cb) = counter();
    bridge.register_command_callback(CommandType::PlayPause, cb);

    assert!(handle.press(SessionButton::Play));
    assert!(handle.press(SessionButton::Pause));
    assert_eq!(count.load(Ordering::SeqCst), 2);
}

#[test]
fn test_previous_and_next_reach_their_slots() {
    let (bridge, handle) = bridge();
    let (previous, cb_prev) = counter();
    let (next, cb_next) = counter();
    bridge.register_command_callback(CommandType::Previous, cb_prev);
    bridge.register_command_callback(CommandType::Next, cb_next);

    handle.press(SessionButton::Next);
    handle.press(SessionButton::Next);
    handle.press(SessionButton::Previous);
    handle.press(SessionButton::Stop);

    assert_eq!(previous.load(Ordering::SeqCst), 1);
    assert_eq!(next.load(Ordering::SeqCst), 2);
}

#[test]
fn test_press_without_callback_is_silent() {
    let (bridge, handle) = bridge();
    assert!(!bridge.has_command_callback(CommandType::PlayPause));

    // Dispatcher is subscribed, so the press is delivered and dropped
    assert!(handle.press(SessionButton::Play));
    assert!(handle.press(SessionButton::Previous));
    assert!(handle.press(SessionButton::Next));
}

#[test]
fn test_replaced_callback_is_never_called() {
    let (bridge, handle) = bridge();
    let (first, cb_a) = counter();
    let (second, cb_b) = counter();
    bridge.register_command_callback(CommandType::Next, cb_a);
    bridge.register_command_callback(CommandType::Next, cb_b);

    handle.press(SessionButton::Next);
    assert_eq!(first.load(Ordering::SeqCst), 0);
    assert_eq!(second.load(Ordering::SeqCst), 1);
}

#[test]
fn test_unknown_registration_is_ignored() {
    let (bridge, handle) = bridge();
    let (count, cb) = counter();
    bridge.register_command_callback(CommandType::Unknown, cb);

    for command in CommandType::SLOTS {
        assert!(!bridge.has_command_callback(command));
    }
    handle.press(SessionButton::Play);
    handle.press(SessionButton::Next);
    assert_eq!(count.load(Ordering::SeqCst), 0);
}

#[test]
fn test_panicking_callback_does_not_escape_dispatch() {
    let (bridge, handle) = bridge();
    bridge.register_command_callback(CommandType::PlayPause, || panic!("player went away"));

    assert!(handle.press(SessionButton::Play));

    let (count, cb) = counter();
    bridge.register_command_callback(CommandType::PlayPause, cb);
    handle.press(SessionButton::Pause);
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn test_callback_may_call_back_into_session_handle() {
    let (bridge, handle) = bridge();
    let observed = Arc::new(AtomicUsize::new(0));

    let inner = handle.clone();
    let seen = observed.clone();
    bridge.register_command_callback(CommandType::Next, move || {
        seen.store(inner.snapshot().commits, Ordering::SeqCst);
    });

    handle.press(SessionButton::Next);
    assert_eq!(observed.load(Ordering::SeqCst), 1);
}

#[test]
fn test_construct_then_drop_releases_once() {
    let (bridge, handle) = bridge();
    drop(bridge);

    let snapshot = handle.snapshot();
    assert_eq!(snapshot.teardown, vec![Teardown::Session, Teardown::Runtime]);
    assert!(!snapshot.subscribed);
    assert!(!snapshot.enabled);
}

#[test]
fn test_failed_initialization_releases_session() {
    for point in [
        FailPoint::AutoRouting,
        FailPoint::Subscribe,
        FailPoint::Capabilities,
        FailPoint::Status,
        FailPoint::Enable,
        FailPoint::MediaKind,
        FailPoint::Commit,
    ] {
        let (session, handle) = MemorySession::failing_at(point);
        let config = BridgeConfig {
            single_instance: false,
            ..Default::default()
        };

        match MediaSessionBridge::with_backend(session, config) {
            Err(BridgeError::SessionCreate(_)) => {}
            Err(e) => panic!("unexpected error for {:?}: {}", point, e),
            Ok(_) => panic!("construction should fail at {:?}", point),
        }
        assert_eq!(
            handle.snapshot().teardown,
            vec![Teardown::Session, Teardown::Runtime],
            "teardown after failure at {:?}",
            point
        );
    }
}

#[test]
fn test_steady_state_failures_are_swallowed() {
    let (mut bridge, handle) = bridge();
    bridge.notify_track_changed(Some("Before"), None);
    let commits = handle.snapshot().commits;

    handle.fail_at(Some(FailPoint::Commit));
    bridge.notify_playback_status(PlaybackStatus::Playing);
    bridge.notify_track_changed(Some("After"), None);

    let snapshot = handle.snapshot();
    assert_eq!(snapshot.commits, commits);
    assert_eq!(snapshot.title, "Before");
    assert_eq!(bridge.status(), SessionStatus::Playing);

    handle.fail_at(None);
    bridge.notify_track_changed(Some("After"), None);
    assert_eq!(handle.snapshot().title, "After");
    // The status write stayed pending and went out with this commit
    assert_eq!(handle.snapshot().status, SessionStatus::Playing);
}
