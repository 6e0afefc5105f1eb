//! Change detection between consecutive player snapshots.
//!
//! Each poll cycle compares the freshly acquired snapshot against the
//! previous one and classifies the difference into at most one event.
//! Precedence is fixed: track change > playback state change > volume
//! change. Position drift alone never produces an event; clients
//! interpolate the seek position locally between events.

use crate::models::{PlaybackState, Snapshot};
use serde::{Deserialize, Serialize};

/// Track payload carried by a `track_changed` event.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackChange {
    pub name: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub position: f64,
    pub duration: f64,
}

impl From<&Snapshot> for TrackChange {
    fn from(snapshot: &Snapshot) -> Self {
        Self {
            name: snapshot.track_name.clone(),
            artist: snapshot.track_artist.clone(),
            album: snapshot.track_album.clone(),
            position: snapshot.position,
            duration: snapshot.duration,
        }
    }
}

/// Classified diff between two consecutive snapshots.
///
/// Serialized with a snake_case `type` tag, which is also the shape the
/// realtime channel puts on the wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeEvent {
    /// First cycle since start: the whole snapshot, no diff to report.
    FullUpdate {
        #[serde(flatten)]
        snapshot: Snapshot,
    },
    /// Track identity (name + artist) differs from the previous cycle.
    TrackChanged { track: TrackChange },
    /// Same track, different playback state.
    PlaybackStateChanged { state: PlaybackState },
    /// Same track and state, different volume.
    VolumeChanged { volume: u8 },
}

impl ChangeEvent {
    /// The wire tag of this event.
    pub fn kind(&self) -> &'static str {
        match self {
            ChangeEvent::FullUpdate { .. } => "full_update",
            ChangeEvent::TrackChanged { .. } => "track_changed",
            ChangeEvent::PlaybackStateChanged { .. } => "playback_state_changed",
            ChangeEvent::VolumeChanged { .. } => "volume_changed",
        }
    }
}

/// Compare two consecutive snapshots and produce zero or one event.
///
/// With no previous snapshot the result is always a `FullUpdate` of the
/// current one. Otherwise the categories are checked in precedence order
/// and only the first difference is reported; a track change commonly
/// co-occurs with a state flip and the richer event wins.
pub fn detect(previous: Option<&Snapshot>, current: &Snapshot) -> Option<ChangeEvent> {
    let Some(prev) = previous else {
        return Some(ChangeEvent::FullUpdate {
            snapshot: current.clone(),
        });
    };

    if prev.track_identity() != current.track_identity() {
        return Some(ChangeEvent::TrackChanged {
            track: TrackChange::from(current),
        });
    }

    if prev.state != current.state {
        return Some(ChangeEvent::PlaybackStateChanged {
            state: current.state,
        });
    }

    if prev.volume != current.volume {
        return Some(ChangeEvent::VolumeChanged {
            volume: current.volume,
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing(name: &str, artist: &str) -> Snapshot {
        Snapshot {
            track_name: Some(name.to_string()),
            track_artist: Some(artist.to_string()),
            track_album: Some("Album".to_string()),
            position: 10.0,
            duration: 180.0,
            state: PlaybackState::Playing,
            volume: 50,
        }
    }

    #[test]
    fn test_no_previous_yields_full_update() {
        let current = playing("A", "Artist1");
        match detect(None, &current) {
            Some(ChangeEvent::FullUpdate { snapshot }) => assert_eq!(snapshot, current),
            other => panic!("expected FullUpdate, got {:?}", other),
        }
    }

    #[test]
    fn test_identical_snapshots_yield_nothing() {
        let snap = playing("A", "Artist1");
        assert_eq!(detect(Some(&snap), &snap), None);
    }

    #[test]
    fn test_position_only_drift_yields_nothing() {
        let prev = playing("A", "Artist1");
        let mut current = prev.clone();
        current.position = 42.7;
        assert_eq!(detect(Some(&prev), &current), None);
    }

    #[test]
    fn test_track_change() {
        let prev = playing("A", "Artist1");
        let current = playing("B", "Artist1");
        match detect(Some(&prev), &current) {
            Some(ChangeEvent::TrackChanged { track }) => {
                assert_eq!(track.name.as_deref(), Some("B"));
                assert_eq!(track.artist.as_deref(), Some("Artist1"));
            }
            other => panic!("expected TrackChanged, got {:?}", other),
        }
    }

    #[test]
    fn test_artist_change_alone_is_a_track_change() {
        let prev = playing("A", "Artist1");
        let current = playing("A", "Artist2");
        assert!(matches!(
            detect(Some(&prev), &current),
            Some(ChangeEvent::TrackChanged { .. })
        ));
    }

    #[test]
    fn test_track_change_wins_over_state_change() {
        let prev = playing("A", "Artist1");
        let mut current = playing("B", "Artist1");
        current.state = PlaybackState::Paused;
        assert!(matches!(
            detect(Some(&prev), &current),
            Some(ChangeEvent::TrackChanged { .. })
        ));
    }

    #[test]
    fn test_state_change_same_track() {
        let prev = playing("A", "Artist1");
        let mut current = prev.clone();
        current.state = PlaybackState::Paused;
        assert_eq!(
            detect(Some(&prev), &current),
            Some(ChangeEvent::PlaybackStateChanged {
                state: PlaybackState::Paused
            })
        );
    }

    #[test]
    fn test_state_change_wins_over_volume_change() {
        let prev = playing("A", "Artist1");
        let mut current = prev.clone();
        current.state = PlaybackState::Paused;
        current.volume = 80;
        assert!(matches!(
            detect(Some(&prev), &current),
            Some(ChangeEvent::PlaybackStateChanged { .. })
        ));
    }

    #[test]
    fn test_volume_only_change() {
        let prev = playing("A", "Artist1");
        let mut current = prev.clone();
        current.volume = 80;
        assert_eq!(
            detect(Some(&prev), &current),
            Some(ChangeEvent::VolumeChanged { volume: 80 })
        );
    }

    #[test]
    fn test_stopping_playback_is_a_track_change() {
        // Track identity goes from Some to None when the player stops.
        let prev = playing("A", "Artist1");
        let current = Snapshot::idle();
        assert!(matches!(
            detect(Some(&prev), &current),
            Some(ChangeEvent::TrackChanged { .. })
        ));
    }

    #[test]
    fn test_full_update_wire_shape() {
        let event = ChangeEvent::FullUpdate {
            snapshot: playing("A", "Artist1"),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "full_update");
        // Snapshot fields are flattened into the event object.
        assert_eq!(json["track_name"], "A");
        assert_eq!(json["state"], "playing");
    }

    #[test]
    fn test_track_changed_wire_shape() {
        let event = ChangeEvent::TrackChanged {
            track: TrackChange::from(&playing("B", "Artist1")),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "track_changed");
        assert_eq!(json["track"]["name"], "B");
        assert_eq!(json["track"]["duration"], 180.0);
    }

    #[test]
    fn test_playback_state_changed_wire_shape() {
        let event = ChangeEvent::PlaybackStateChanged {
            state: PlaybackState::Paused,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "playback_state_changed");
        assert_eq!(json["state"], "paused");
    }
}
