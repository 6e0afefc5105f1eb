use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Volume reported when the player does not answer a volume query.
pub const DEFAULT_VOLUME: u8 = 50;

/// Playback state reported by the player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    Playing,
    Paused,
    #[default]
    Stopped,
    Error,
}

impl PlaybackState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackState::Playing => "playing",
            PlaybackState::Paused => "paused",
            PlaybackState::Stopped => "stopped",
            PlaybackState::Error => "error",
        }
    }
}

/// Error type for invalid playback state strings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsePlaybackStateError;

impl std::fmt::Display for ParsePlaybackStateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid playback state value")
    }
}

impl std::error::Error for ParsePlaybackStateError {}

impl FromStr for PlaybackState {
    type Err = ParsePlaybackStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "playing" => Ok(PlaybackState::Playing),
            "paused" => Ok(PlaybackState::Paused),
            "stopped" => Ok(PlaybackState::Stopped),
            "error" => Ok(PlaybackState::Error),
            _ => Err(ParsePlaybackStateError),
        }
    }
}

/// Metadata for the player's current track, as read from the automation bridge
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackInfo {
    pub name: String,
    pub artist: String,
    pub album: String,
    /// Track length in seconds
    pub duration: f64,
    /// Elapsed playback position in seconds
    pub position: f64,
}

/// One point-in-time observation of player state, produced once per poll cycle.
///
/// A snapshot is all-or-nothing: a failed read yields [`Snapshot::idle`],
/// never a mix of stale and fresh fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub track_name: Option<String>,
    pub track_artist: Option<String>,
    pub track_album: Option<String>,
    /// Elapsed playback position in seconds
    pub position: f64,
    /// Track length in seconds
    pub duration: f64,
    pub state: PlaybackState,
    /// Player volume, 0-100
    pub volume: u8,
}

impl Snapshot {
    /// The sentinel snapshot: nothing playing, nothing known.
    pub fn idle() -> Self {
        Self {
            track_name: None,
            track_artist: None,
            track_album: None,
            position: 0.0,
            duration: 0.0,
            state: PlaybackState::Stopped,
            volume: DEFAULT_VOLUME,
        }
    }

    /// Assemble a snapshot from one cycle's successful reads.
    pub fn observed(track: Option<TrackInfo>, state: PlaybackState, volume: u8) -> Self {
        match track {
            Some(t) => Self {
                track_name: Some(t.name),
                track_artist: Some(t.artist),
                track_album: Some(t.album),
                position: t.position,
                duration: t.duration,
                state,
                volume,
            },
            None => Self {
                state,
                volume,
                ..Self::idle()
            },
        }
    }

    /// Track identity used for change detection: (name, artist) pair.
    pub fn track_identity(&self) -> (Option<&str>, Option<&str>) {
        (self.track_name.as_deref(), self.track_artist.as_deref())
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::idle()
    }
}

/// Repeat mode of the current playlist
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    Off,
    One,
    All,
}

impl RepeatMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepeatMode::Off => "off",
            RepeatMode::One => "one",
            RepeatMode::All => "all",
        }
    }
}

/// Error type for invalid repeat mode strings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseRepeatModeError;

impl std::fmt::Display for ParseRepeatModeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid repeat mode value")
    }
}

impl std::error::Error for ParseRepeatModeError {}

impl FromStr for RepeatMode {
    type Err = ParseRepeatModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "off" => Ok(RepeatMode::Off),
            "one" => Ok(RepeatMode::One),
            "all" => Ok(RepeatMode::All),
            _ => Err(ParseRepeatModeError),
        }
    }
}

/// What a library search is looking for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    Track,
    Album,
    Artist,
}

impl SearchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchKind::Track => "track",
            SearchKind::Album => "album",
            SearchKind::Artist => "artist",
        }
    }
}

/// Error type for invalid search kind strings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseSearchKindError;

impl std::fmt::Display for ParseSearchKindError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid search type value")
    }
}

impl std::error::Error for ParseSearchKindError {}

impl FromStr for SearchKind {
    type Err = ParseSearchKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "track" => Ok(SearchKind::Track),
            "album" => Ok(SearchKind::Album),
            "artist" => Ok(SearchKind::Artist),
            _ => Err(ParseSearchKindError),
        }
    }
}

/// One library search hit, shaped by what was searched for
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SearchResult {
    Track {
        name: String,
        artist: String,
        album: String,
        id: String,
    },
    Album {
        name: String,
        artist: String,
    },
    Artist {
        name: String,
    },
}
