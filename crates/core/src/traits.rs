use crate::error::DriverResult;
use crate::models::{PlaybackState, RepeatMode, SearchKind, SearchResult, TrackInfo};
use async_trait::async_trait;
use std::path::PathBuf;

/// Trait for player automation backends (Music.app today, others later).
///
/// Every call crosses into an external automation bridge and may fail or
/// time out; implementations bound each call rather than letting callers
/// stall. The bridge is a serialized resource, so implementations are
/// expected to queue concurrent calls internally.
#[async_trait]
pub trait PlayerDriver: Send + Sync {
    /// Start or resume playback
    async fn play(&self) -> DriverResult<()>;

    /// Pause playback
    async fn pause(&self) -> DriverResult<()>;

    /// Skip to the next track
    async fn next_track(&self) -> DriverResult<()>;

    /// Go back to the previous track
    async fn previous_track(&self) -> DriverResult<()>;

    /// Current playback state
    async fn playback_state(&self) -> DriverResult<PlaybackState>;

    /// Metadata for the current track, or `None` when stopped
    async fn current_track(&self) -> DriverResult<Option<TrackInfo>>;

    /// Current volume, 0-100
    async fn volume(&self) -> DriverResult<u8>;

    /// Set the volume; `level` is already clamped to 0-100 by callers
    async fn set_volume(&self, level: u8) -> DriverResult<()>;

    /// Seek to a position (seconds) in the current track
    async fn seek(&self, position: f64) -> DriverResult<()>;

    /// Names of all playlists known to the player
    async fn playlists(&self) -> DriverResult<Vec<String>>;

    /// Start playing a playlist by name
    async fn play_playlist(&self, name: &str) -> DriverResult<()>;

    /// Artwork for the current track as a path to a cached JPEG,
    /// or `None` when no artwork is available
    async fn artwork(&self) -> DriverResult<Option<PathBuf>>;

    /// Search the library
    async fn search(&self, query: &str, kind: SearchKind) -> DriverResult<Vec<SearchResult>>;

    /// Play a specific track by its library database ID
    async fn play_track_by_id(&self, id: &str) -> DriverResult<()>;

    /// Repeat mode of the current playlist
    async fn repeat_mode(&self) -> DriverResult<RepeatMode>;

    /// Set the repeat mode of the current playlist
    async fn set_repeat_mode(&self, mode: RepeatMode) -> DriverResult<()>;

    /// Whether shuffle is enabled on the current playlist
    async fn shuffle(&self) -> DriverResult<bool>;

    /// Enable or disable shuffle on the current playlist
    async fn set_shuffle(&self, enabled: bool) -> DriverResult<()>;
}
