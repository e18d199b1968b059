mod player;

use anyhow::{Context, Result};
use clap::Parser;
use player::{Player, Track};
use sap_core::{BridgeConfig, CommandType, SessionButton};
use sap_media_session::{
    BridgeError, MediaSessionBridge, MemoryHandle, MemorySession, SessionBackend,
};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Publish a simulated player to the OS media session and react to media keys
#[derive(Parser, Debug)]
#[command(name = "sap-demo", version)]
struct Args {
    /// Bridge settings (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use an in-memory session; media keys are typed on stdin
    #[arg(long)]
    headless: bool,

    /// Title of the first track
    #[arg(long)]
    title: Option<String>,

    /// Artist of the first track
    #[arg(long)]
    artist: Option<String>,
}

// Single-threaded so the session stays on the thread that created it
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sap=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    tracing::info!("Starting sap-demo");

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => BridgeConfig::default(),
    };

    let player = Player::new(vec![
        Track::new(args.title.as_deref(), args.artist.as_deref()),
        Track::new(Some("Second Song"), Some("Demo Band")),
        Track::new(Some("Untitled Jam"), None),
    ]);

    if !args.headless {
        match MediaSessionBridge::with_config(config.clone()) {
            Ok(bridge) => return run(bridge, player, None).await,
            Err(BridgeError::Unsupported(os)) => {
                tracing::warn!("No OS media session on {}, running headless", os);
            }
            Err(e) => return Err(e).context("Failed to open OS media session"),
        }
    }

    let (session, handle) = MemorySession::new();
    let bridge = MediaSessionBridge::with_backend(session, config)
        .context("Failed to open in-memory media session")?;
    run(bridge, player, Some(handle)).await
}

fn load_config(path: &Path) -> Result<BridgeConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config = BridgeConfig::from_toml_str(&raw)
        .with_context(|| format!("Failed to parse config {}", path.display()))?;
    tracing::info!("Loaded config from {}", path.display());
    Ok(config)
}

async fn run<B: SessionBackend>(
    mut bridge: MediaSessionBridge<B>,
    mut player: Player,
    keys: Option<MemoryHandle>,
) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    for command in CommandType::SLOTS {
        let tx = tx.clone();
        bridge.register_command_callback(command, move || {
            // Receiver only goes away on shutdown
            let _ = tx.send(command);
        });
    }

    bridge.notify_track_changed(
        player.current().title.as_deref(),
        player.current().artist.as_deref(),
    );
    bridge.notify_playback_status(player.status());

    if let Some(handle) = keys {
        // Plain thread: a blocking stdin read would hold up runtime shutdown,
        // while a detached thread simply dies with the process.
        std::thread::spawn(move || read_keys(std::io::stdin().lock(), &handle));
        tracing::info!("Type play, pause, next or previous; Ctrl-C to quit");
    } else {
        tracing::info!("Use the media keys; Ctrl-C to quit");
    }

    loop {
        tokio::select! {
            Some(command) = rx.recv() => {
                let change = player.apply(command);
                tracing::info!("{} -> {} ({:?})", command, player.status(), player.current());
                if change.track {
                    let track = player.current();
                    bridge.notify_track_changed(track.title.as_deref(), track.artist.as_deref());
                }
                if change.status {
                    bridge.notify_playback_status(player.status());
                }
            }
            result = tokio::signal::ctrl_c() => {
                result.context("Failed to listen for Ctrl-C")?;
                tracing::info!("Shutting down");
                break;
            }
        }
    }

    Ok(())
}

/// Feed typed words to the in-memory session as button presses, until EOF
fn read_keys<R: BufRead>(input: R, handle: &MemoryHandle) {
    for line in input.lines().map_while(|line| line.ok()) {
        match parse_button(&line) {
            Some(button) => {
                handle.press(button);
            }
            None => tracing::warn!("Unknown key: {}", line.trim()),
        }
    }
}

fn parse_button(input: &str) -> Option<SessionButton> {
    match input.trim().to_lowercase().as_str() {
        "play" => Some(SessionButton::Play),
        "pause" => Some(SessionButton::Pause),
        "stop" => Some(SessionButton::Stop),
        "next" => Some(SessionButton::Next),
        "previous" | "prev" => Some(SessionButton::Previous),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_button() {
        assert_eq!(parse_button(" Play "), Some(SessionButton::Play));
        assert_eq!(parse_button("prev"), Some(SessionButton::Previous));
        assert_eq!(parse_button("stop"), Some(SessionButton::Stop));
        assert_eq!(parse_button("rewind"), None);
    }

    #[test]
    fn test_read_keys_presses_until_eof() {
        let (mut session, handle) = MemorySession::new();
        let pressed = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen = pressed.clone();
        session
            .subscribe_buttons(std::sync::Arc::new(move |button: SessionButton| {
                seen.lock().unwrap().push(button);
            }))
            .unwrap();

        let input = std::io::Cursor::new("play\nbogus\n next \nprev\n");
        read_keys(input, &handle);

        assert_eq!(
            *pressed.lock().unwrap(),
            vec![
                SessionButton::Play,
                SessionButton::Next,
                SessionButton::Previous
            ]
        );
    }

    #[test]
    fn test_args_parse() {
        let args = Args::parse_from(["sap-demo", "--headless", "--title", "Song"]);
        assert!(args.headless);
        assert_eq!(args.title.as_deref(), Some("Song"));
        assert!(args.artist.is_none());
        assert!(args.config.is_none());
    }
}
