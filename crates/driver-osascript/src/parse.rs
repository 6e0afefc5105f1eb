//! Parsing for the string contract with the AppleScript bridge.
//!
//! Multi-field values come back with `"|||"` between fields and `":::"`
//! between records; playlist listings are AppleScript's comma-joined
//! list form.

use tunebridge_core::{DriverError, DriverResult, SearchKind, SearchResult, TrackInfo};

/// Sentinel returned by the current-track script when nothing is queued.
const NO_TRACK: &str = "No track playing";

/// Escape a value for interpolation inside a double-quoted AppleScript string.
pub(crate) fn escape_script_arg(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Parse the `name|||artist|||album|||duration|||position` current-track line.
pub(crate) fn parse_current_track(raw: &str) -> DriverResult<Option<TrackInfo>> {
    if raw.is_empty() || raw == NO_TRACK {
        return Ok(None);
    }

    let parts: Vec<&str> = raw.split("|||").collect();
    if parts.len() != 5 {
        return Err(DriverError::Parse(format!(
            "expected 5 track fields, got {}",
            parts.len()
        )));
    }

    let duration: f64 = parts[3]
        .trim()
        .parse()
        .map_err(|_| DriverError::Parse(format!("bad track duration: {}", parts[3])))?;
    let position: f64 = parts[4]
        .trim()
        .parse()
        .map_err(|_| DriverError::Parse(format!("bad track position: {}", parts[4])))?;

    Ok(Some(TrackInfo {
        name: parts[0].to_string(),
        artist: parts[1].to_string(),
        album: parts[2].to_string(),
        duration,
        position,
    }))
}

/// Parse AppleScript's comma-joined playlist name list.
pub(crate) fn parse_playlists(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split(',')
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

/// Split `":::"`-joined search records into typed results, capped at `limit`.
pub(crate) fn parse_search_results(raw: &str, kind: SearchKind, limit: usize) -> Vec<SearchResult> {
    if raw.is_empty() {
        return Vec::new();
    }

    raw.split(":::")
        .filter(|item| !item.trim().is_empty())
        .filter_map(|item| {
            let parts: Vec<&str> = item.split("|||").collect();
            match kind {
                SearchKind::Track if parts.len() >= 4 => Some(SearchResult::Track {
                    name: parts[0].to_string(),
                    artist: parts[1].to_string(),
                    album: parts[2].to_string(),
                    id: parts[3].to_string(),
                }),
                SearchKind::Album if parts.len() >= 2 => Some(SearchResult::Album {
                    name: parts[0].to_string(),
                    artist: parts[1].to_string(),
                }),
                SearchKind::Artist => Some(SearchResult::Artist {
                    name: item.trim().to_string(),
                }),
                _ => None,
            }
        })
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_current_track() {
        let raw = "Time|||Pink Floyd|||The Dark Side of the Moon|||413.081|||42.5";
        let track = parse_current_track(raw).unwrap().unwrap();
        assert_eq!(track.name, "Time");
        assert_eq!(track.artist, "Pink Floyd");
        assert_eq!(track.album, "The Dark Side of the Moon");
        assert!((track.duration - 413.081).abs() < 1e-9);
        assert!((track.position - 42.5).abs() < 1e-9);
    }

    #[test]
    fn test_parse_current_track_sentinel() {
        assert_eq!(parse_current_track("No track playing").unwrap(), None);
        assert_eq!(parse_current_track("").unwrap(), None);
    }

    #[test]
    fn test_parse_current_track_wrong_field_count() {
        let err = parse_current_track("Time|||Pink Floyd").unwrap_err();
        assert!(matches!(err, DriverError::Parse(_)));
    }

    #[test]
    fn test_parse_current_track_bad_float() {
        let raw = "Time|||Pink Floyd|||Album|||NaN-ish|||1.0";
        assert!(parse_current_track(raw).is_err());
    }

    #[test]
    fn test_parse_playlists() {
        assert_eq!(
            parse_playlists("Library, Chill, Workout"),
            vec!["Library", "Chill", "Workout"]
        );
        assert!(parse_playlists("").is_empty());
    }

    #[test]
    fn test_parse_track_search_results() {
        let raw = "Time|||Pink Floyd|||DSOTM|||1234:::Money|||Pink Floyd|||DSOTM|||1235";
        let results = parse_search_results(raw, SearchKind::Track, 50);
        assert_eq!(results.len(), 2);
        assert_eq!(
            results[0],
            SearchResult::Track {
                name: "Time".to_string(),
                artist: "Pink Floyd".to_string(),
                album: "DSOTM".to_string(),
                id: "1234".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_album_search_results() {
        let raw = "Animals|||Pink Floyd:::Wish You Were Here|||Pink Floyd";
        let results = parse_search_results(raw, SearchKind::Album, 50);
        assert_eq!(results.len(), 2);
        assert_eq!(
            results[1],
            SearchResult::Album {
                name: "Wish You Were Here".to_string(),
                artist: "Pink Floyd".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_artist_search_results() {
        let results = parse_search_results("Pink Floyd:::Yes", SearchKind::Artist, 50);
        assert_eq!(
            results,
            vec![
                SearchResult::Artist {
                    name: "Pink Floyd".to_string()
                },
                SearchResult::Artist {
                    name: "Yes".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_search_results_are_capped() {
        let raw = (0..60)
            .map(|i| format!("Artist{i}"))
            .collect::<Vec<_>>()
            .join(":::");
        assert_eq!(parse_search_results(&raw, SearchKind::Artist, 50).len(), 50);
    }

    #[test]
    fn test_malformed_records_are_skipped() {
        let raw = "OnlyOneField:::Name|||Artist";
        let results = parse_search_results(raw, SearchKind::Album, 50);
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_escape_script_arg() {
        assert_eq!(escape_script_arg(r#"say "hi""#), r#"say \"hi\""#);
        assert_eq!(escape_script_arg(r"a\b"), r"a\\b");
    }
}
