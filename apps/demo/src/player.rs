/// Simulated playback engine driven by media-key commands
use sap_core::{CommandType, PlaybackStatus};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Track {
    pub title: Option<String>,
    pub artist: Option<String>,
}

impl Track {
    pub fn new(title: Option<&str>, artist: Option<&str>) -> Self {
        Self {
            title: title.map(str::to_string),
            artist: artist.map(str::to_string),
        }
    }
}

/// What a command changed, so the host knows which session fields to refresh
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Change {
    pub status: bool,
    pub track: bool,
}

pub struct Player {
    playlist: Vec<Track>,
    index: usize,
    status: PlaybackStatus,
}

impl Player {
    /// An empty playlist gets a single untitled track
    pub fn new(mut playlist: Vec<Track>) -> Self {
        if playlist.is_empty() {
            playlist.push(Track::default());
        }
        Self {
            playlist,
            index: 0,
            status: PlaybackStatus::Stopped,
        }
    }

    pub fn current(&self) -> &Track {
        &self.playlist[self.index]
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn apply(&mut self, command: CommandType) -> Change {
        match command {
            CommandType::PlayPause => {
                self.status = match self.status {
                    PlaybackStatus::Playing => PlaybackStatus::Paused,
                    _ => PlaybackStatus::Playing,
                };
                Change {
                    status: true,
                    track: false,
                }
            }
            CommandType::Next => {
                self.index = (self.index + 1) % self.playlist.len();
                self.start_track()
            }
            CommandType::Previous => {
                self.index = (self.index + self.playlist.len() - 1) % self.playlist.len();
                self.start_track()
            }
            CommandType::Unknown => Change::default(),
        }
    }

    fn start_track(&mut self) -> Change {
        let was_playing = self.status == PlaybackStatus::Playing;
        self.status = PlaybackStatus::Playing;
        Change {
            status: !was_playing,
            track: true,
        }
    }
}
