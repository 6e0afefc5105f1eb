//! Music.app automation driver built on `osascript`.
//!
//! Each operation is one AppleScript snippet executed as a subprocess.
//! The automation bridge is a serialized resource: a mutex queues calls
//! so the poller and the command path never hit Music.app concurrently.
//! Every call is bounded by a 5 second timeout so a wedged bridge can
//! never stall a caller indefinitely.

mod parse;

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::debug;
use tunebridge_core::{
    DriverError, DriverResult, PlaybackState, PlayerDriver, RepeatMode, SearchKind, SearchResult,
    TrackInfo,
};

use parse::{escape_script_arg, parse_current_track, parse_playlists, parse_search_results};

/// Upper bound on a single osascript invocation.
const SCRIPT_TIMEOUT: Duration = Duration::from_secs(5);

/// Search results are capped before they hit the wire.
const SEARCH_RESULT_LIMIT: usize = 50;

/// Driver for Music.app via the `osascript` automation bridge.
pub struct OsaScriptDriver {
    /// Serializes bridge access across the poller and the command path.
    lock: Mutex<()>,
    artwork_dir: PathBuf,
}

impl OsaScriptDriver {
    pub fn new() -> Self {
        Self {
            lock: Mutex::new(()),
            artwork_dir: std::env::temp_dir().join("tunebridge_artwork"),
        }
    }

    /// Run one AppleScript snippet and return its trimmed stdout.
    async fn execute(&self, script: &str) -> DriverResult<String> {
        let _guard = self.lock.lock().await;

        let result = timeout(
            SCRIPT_TIMEOUT,
            Command::new("osascript").arg("-e").arg(script).output(),
        )
        .await
        .map_err(|_| DriverError::Timeout(SCRIPT_TIMEOUT))?;

        let output =
            result.map_err(|e| DriverError::Command(format!("failed to run osascript: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DriverError::Command(format!(
                "osascript exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl Default for OsaScriptDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlayerDriver for OsaScriptDriver {
    async fn play(&self) -> DriverResult<()> {
        self.execute(r#"tell application "Music" to play"#).await?;
        Ok(())
    }

    async fn pause(&self) -> DriverResult<()> {
        self.execute(r#"tell application "Music" to pause"#).await?;
        Ok(())
    }

    async fn next_track(&self) -> DriverResult<()> {
        self.execute(r#"tell application "Music" to next track"#)
            .await?;
        Ok(())
    }

    async fn previous_track(&self) -> DriverResult<()> {
        self.execute(r#"tell application "Music" to previous track"#)
            .await?;
        Ok(())
    }

    async fn playback_state(&self) -> DriverResult<PlaybackState> {
        let raw = self
            .execute(r#"tell application "Music" to get player state as string"#)
            .await?;
        raw.parse()
            .map_err(|_| DriverError::Parse(format!("unknown player state: {raw}")))
    }

    async fn current_track(&self) -> DriverResult<Option<TrackInfo>> {
        let script = r#"
            tell application "Music"
                if player state is not stopped then
                    set trackName to name of current track
                    set trackArtist to artist of current track
                    set trackAlbum to album of current track
                    set trackDuration to duration of current track
                    set playerPos to player position
                    return trackName & "|||" & trackArtist & "|||" & trackAlbum & "|||" & trackDuration & "|||" & playerPos
                else
                    return "No track playing"
                end if
            end tell
        "#;
        let raw = self.execute(script).await?;
        parse_current_track(&raw)
    }

    async fn volume(&self) -> DriverResult<u8> {
        let raw = self
            .execute(r#"tell application "Music" to get sound volume"#)
            .await?;
        let level: i64 = raw
            .parse()
            .map_err(|_| DriverError::Parse(format!("non-numeric volume: {raw}")))?;
        Ok(level.clamp(0, 100) as u8)
    }

    async fn set_volume(&self, level: u8) -> DriverResult<()> {
        let level = level.min(100);
        self.execute(&format!(
            r#"tell application "Music" to set sound volume to {level}"#
        ))
        .await?;
        Ok(())
    }

    async fn seek(&self, position: f64) -> DriverResult<()> {
        self.execute(&format!(
            r#"tell application "Music" to set player position to {position}"#
        ))
        .await?;
        Ok(())
    }

    async fn playlists(&self) -> DriverResult<Vec<String>> {
        let script = r#"
            tell application "Music"
                set playlistNames to name of playlists
                return playlistNames
            end tell
        "#;
        let raw = self.execute(script).await?;
        Ok(parse_playlists(&raw))
    }

    async fn play_playlist(&self, name: &str) -> DriverResult<()> {
        let name = escape_script_arg(name);
        self.execute(&format!(
            r#"tell application "Music" to play playlist "{name}""#
        ))
        .await?;
        Ok(())
    }

    async fn artwork(&self) -> DriverResult<Option<PathBuf>> {
        let track_id = self
            .execute(
                r#"
                tell application "Music"
                    if player state is not stopped then
                        set trackID to database ID of current track
                        return trackID as string
                    else
                        return "0"
                    end if
                end tell
            "#,
            )
            .await?;

        if track_id == "0" {
            return Ok(None);
        }

        std::fs::create_dir_all(&self.artwork_dir)
            .map_err(|e| DriverError::Command(format!("artwork cache dir: {e}")))?;
        let path = self.artwork_dir.join(format!("artwork_{track_id}.jpg"));

        // Artwork for a given database ID never changes; reuse the cache.
        if path.exists() {
            debug!("artwork cache hit for track {track_id}");
            return Ok(Some(path));
        }

        let posix_path = escape_script_arg(&path.to_string_lossy());
        let script = format!(
            r#"
            tell application "Music"
                if player state is not stopped then
                    try
                        set artworkData to data of artwork 1 of current track
                        set artworkFile to POSIX file "{posix_path}"
                        set fileRef to open for access artworkFile with write permission
                        write artworkData to fileRef
                        close access fileRef
                        return "success"
                    on error errMsg
                        return "Error: " & errMsg
                    end try
                else
                    return "Error: No track playing"
                end if
            end tell
        "#
        );

        let result = self.execute(&script).await?;
        if result == "success" && path.exists() {
            Ok(Some(path))
        } else {
            Ok(None)
        }
    }

    async fn search(&self, query: &str, kind: SearchKind) -> DriverResult<Vec<SearchResult>> {
        if query.len() < 2 {
            return Ok(Vec::new());
        }
        let query = escape_script_arg(query);

        let script = match kind {
            SearchKind::Track => format!(
                r#"
                tell application "Music"
                    set searchResults to (search library playlist 1 for "{query}")
                    set resultList to {{}}
                    repeat with aTrack in searchResults
                        try
                            if class of aTrack is file track then
                                set trackName to name of aTrack
                                set trackArtist to artist of aTrack
                                set trackAlbum to album of aTrack
                                set trackID to database ID of aTrack
                                set end of resultList to trackName & "|||" & trackArtist & "|||" & trackAlbum & "|||" & trackID
                            end if
                        end try
                    end repeat

                    set AppleScript's text item delimiters to ":::"
                    set resultString to resultList as string
                    set AppleScript's text item delimiters to ""
                    return resultString
                end tell
            "#
            ),
            SearchKind::Album => format!(
                r#"
                tell application "Music"
                    set searchResults to (search library playlist 1 for "{query}")
                    set albumKeys to {{}}
                    set resultList to {{}}
                    repeat with aTrack in searchResults
                        try
                            if class of aTrack is file track then
                                set albumName to album of aTrack
                                set artistName to artist of aTrack
                                set albumKey to albumName & "|" & artistName
                                if albumKeys does not contain albumKey then
                                    set end of albumKeys to albumKey
                                    set end of resultList to albumName & "|||" & artistName
                                end if
                            end if
                        end try
                    end repeat

                    set AppleScript's text item delimiters to ":::"
                    set resultString to resultList as string
                    set AppleScript's text item delimiters to ""
                    return resultString
                end tell
            "#
            ),
            SearchKind::Artist => format!(
                r#"
                tell application "Music"
                    set searchResults to (search library playlist 1 for "{query}")
                    set artistNames to {{}}
                    set resultList to {{}}
                    repeat with aTrack in searchResults
                        try
                            if class of aTrack is file track then
                                set artistName to artist of aTrack
                                if artistNames does not contain artistName and artistName is not "" then
                                    set end of artistNames to artistName
                                    set end of resultList to artistName
                                end if
                            end if
                        end try
                    end repeat

                    set AppleScript's text item delimiters to ":::"
                    set resultString to resultList as string
                    set AppleScript's text item delimiters to ""
                    return resultString
                end tell
            "#
            ),
        };

        let raw = self.execute(&script).await?;
        Ok(parse_search_results(&raw, kind, SEARCH_RESULT_LIMIT))
    }

    async fn play_track_by_id(&self, id: &str) -> DriverResult<()> {
        // Database IDs are numeric; anything else would splice into the script.
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
            return Err(DriverError::Command(format!("invalid track id: {id}")));
        }
        let script = format!(
            r#"
            tell application "Music"
                set theTrack to (first track of library playlist 1 whose database ID is {id})
                play theTrack
                return "Playing: " & name of theTrack
            end tell
        "#
        );
        self.execute(&script).await?;
        Ok(())
    }

    async fn repeat_mode(&self) -> DriverResult<RepeatMode> {
        let raw = self
            .execute(r#"tell application "Music" to get song repeat of current playlist as string"#)
            .await?;
        raw.parse()
            .map_err(|_| DriverError::Parse(format!("unknown repeat mode: {raw}")))
    }

    async fn set_repeat_mode(&self, mode: RepeatMode) -> DriverResult<()> {
        self.execute(&format!(
            r#"tell application "Music" to set song repeat of current playlist to {}"#,
            mode.as_str()
        ))
        .await?;
        Ok(())
    }

    async fn shuffle(&self) -> DriverResult<bool> {
        let raw = self
            .execute(r#"tell application "Music" to get shuffle enabled of current playlist"#)
            .await?;
        match raw.to_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(DriverError::Parse(format!("unexpected shuffle flag: {other}"))),
        }
    }

    async fn set_shuffle(&self, enabled: bool) -> DriverResult<()> {
        self.execute(&format!(
            r#"tell application "Music" to set shuffle enabled of current playlist to {enabled}"#
        ))
        .await?;
        Ok(())
    }
}
