use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Fallback title pushed to the OS when the application supplies none
pub const UNKNOWN_TITLE: &str = "Unknown Title";

/// Fallback artist pushed to the OS when the application supplies none
pub const UNKNOWN_ARTISTS: &str = "Unknown Artists";

/// Transport state reported by the application
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    #[default]
    Unknown,
    Playing,
    Paused,
    Stopped,
}

impl PlaybackStatus {
    /// Decode a raw status code from a foreign host.
    ///
    /// `-1` is Unknown, then Playing, Paused, Stopped from `0`. Anything
    /// else is Unknown.
    pub fn from_raw(code: i32) -> Self {
        match code {
            0 => PlaybackStatus::Playing,
            1 => PlaybackStatus::Paused,
            2 => PlaybackStatus::Stopped,
            _ => PlaybackStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackStatus::Unknown => "unknown",
            PlaybackStatus::Playing => "playing",
            PlaybackStatus::Paused => "paused",
            PlaybackStatus::Stopped => "stopped",
        }
    }
}

impl fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlaybackStatus {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "playing" => PlaybackStatus::Playing,
            "paused" => PlaybackStatus::Paused,
            "stopped" => PlaybackStatus::Stopped,
            _ => PlaybackStatus::Unknown,
        })
    }
}

/// One of the command slots an application can hook
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandType {
    #[default]
    Unknown,
    PlayPause,
    Previous,
    Next,
}

impl CommandType {
    /// Slots that accept a callback, in registry order
    pub const SLOTS: [CommandType; 3] = [
        CommandType::PlayPause,
        CommandType::Previous,
        CommandType::Next,
    ];

    /// Decode a raw command code; same numbering scheme as [`PlaybackStatus::from_raw`]
    pub fn from_raw(code: i32) -> Self {
        match code {
            0 => CommandType::PlayPause,
            1 => CommandType::Previous,
            2 => CommandType::Next,
            _ => CommandType::Unknown,
        }
    }

    /// Registry index for this command, `None` for Unknown
    pub fn slot(&self) -> Option<usize> {
        match self {
            CommandType::Unknown => None,
            CommandType::PlayPause => Some(0),
            CommandType::Previous => Some(1),
            CommandType::Next => Some(2),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CommandType::Unknown => "unknown",
            CommandType::PlayPause => "play_pause",
            CommandType::Previous => "previous",
            CommandType::Next => "next",
        }
    }
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "play_pause" | "playpause" | "toggle" => CommandType::PlayPause,
            "previous" | "prev" => CommandType::Previous,
            "next" => CommandType::Next,
            _ => CommandType::Unknown,
        })
    }
}

/// Playback state in the OS session's vocabulary
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Session exists but nothing has been played yet
    #[default]
    Closed,
    Stopped,
    Playing,
    Paused,
}

impl From<PlaybackStatus> for SessionStatus {
    fn from(status: PlaybackStatus) -> Self {
        match status {
            PlaybackStatus::Playing => SessionStatus::Playing,
            PlaybackStatus::Paused => SessionStatus::Paused,
            // The OS has no notion of "unknown"
            PlaybackStatus::Unknown | PlaybackStatus::Stopped => SessionStatus::Stopped,
        }
    }
}

/// Kind of media the session advertises
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[default]
    Unknown,
    Music,
    Video,
    Image,
}

/// Button identifiers reported by the OS on a button-press event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SessionButton {
    Play,
    Pause,
    Stop,
    Record,
    FastForward,
    Rewind,
    Next,
    Previous,
    ChannelUp,
    ChannelDown,
}

/// Dispatch table from OS buttons to application command slots.
///
/// Play and Pause share the PlayPause slot; buttons the bridge does not
/// expose resolve to `None`.
pub fn command_for_button(button: SessionButton) -> Option<CommandType> {
    match button {
        SessionButton::Play | SessionButton::Pause => Some(CommandType::PlayPause),
        SessionButton::Previous => Some(CommandType::Previous),
        SessionButton::Next => Some(CommandType::Next),
        _ => None,
    }
}

/// Transport buttons the session advertises as usable
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub play: bool,
    pub pause: bool,
    pub stop: bool,
    pub previous: bool,
    pub next: bool,
}

impl Capabilities {
    /// The fixed set every bridge session advertises. Stop is not offered.
    pub const TRANSPORT: Capabilities = Capabilities {
        play: true,
        pause: true,
        stop: false,
        previous: true,
        next: true,
    };
}

/// Title and artist as pushed to the OS session
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackMetadata {
    pub title: String,
    pub artist: String,
}

impl TrackMetadata {
    /// Resolve optional fields against per-field fallbacks.
    ///
    /// Absent and empty strings both take the fallback.
    pub fn resolve(
        title: Option<&str>,
        artist: Option<&str>,
        fallback_title: &str,
        fallback_artist: &str,
    ) -> Self {
        Self {
            title: or_fallback(title, fallback_title),
            artist: or_fallback(artist, fallback_artist),
        }
    }
}

fn or_fallback(value: Option<&str>, fallback: &str) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => fallback.to_string(),
    }
}
