/// Type definitions for the REST surface
use crate::devices::TrustedDevice;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tunebridge_core::{PlaybackState, RepeatMode, SearchResult, TrackInfo};

/// Response for GET /ping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingResponse {
    pub status: String,
    pub service: String,
}

/// Response for GET /status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub state: PlaybackState,
    pub volume: u8,
}

/// Response for GET /current-track
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentTrackResponse {
    pub name: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub duration: f64,
    pub position: f64,
    pub state: PlaybackState,
}

impl CurrentTrackResponse {
    pub fn from_parts(track: Option<TrackInfo>, state: PlaybackState) -> Self {
        match track {
            Some(t) => Self {
                name: Some(t.name),
                artist: Some(t.artist),
                album: Some(t.album),
                duration: t.duration,
                position: t.position,
                state,
            },
            None => Self {
                name: None,
                artist: None,
                album: None,
                duration: 0.0,
                position: 0.0,
                state,
            },
        }
    }
}

/// Response for the simple playback verbs (POST /play, /pause)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResponse {
    pub action: String,
    pub success: bool,
    pub message: String,
}

/// Response for verbs that settle on a new track (POST /next, /previous, /play-track)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackActionResponse {
    pub action: String,
    pub success: bool,
    pub track: CurrentTrackResponse,
}

/// Response for POST /volume
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeResponse {
    pub action: String,
    pub success: bool,
    pub level: u8,
}

/// Response for POST /seek
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeekResponse {
    pub action: String,
    pub success: bool,
    pub position: f64,
}

/// Response for GET /playlists
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistsResponse {
    pub playlists: Vec<String>,
    pub count: usize,
}

/// Response for POST /playlist/{name}/play
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistActionResponse {
    pub action: String,
    pub playlist: String,
    pub success: bool,
}

/// Query parameters for GET /search
#[derive(Debug, Clone, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// Response for GET /search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub results: Vec<SearchResult>,
    pub count: usize,
}

/// Response for GET /repeat
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepeatResponse {
    pub repeat: RepeatMode,
}

/// Response for POST /repeat
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetRepeatResponse {
    pub action: String,
    pub mode: RepeatMode,
    pub success: bool,
}

/// Response for GET /shuffle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShuffleResponse {
    pub shuffle: bool,
}

/// Response for POST /shuffle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetShuffleResponse {
    pub action: String,
    pub enabled: bool,
    pub success: bool,
}

/// Response for POST /device/check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceCheckResponse {
    pub is_trusted: bool,
    pub requires_token: bool,
}

/// Response for GET /device/list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceListResponse {
    pub devices: HashMap<String, TrustedDevice>,
    pub count: usize,
}

/// Generic success response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
