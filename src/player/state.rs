//! Player State Definitions
//!
//! Types describing the shared media player. Snapshots of [`PlayerState`]
//! are what every connected client receives in `stateChanged` notifications.

use serde::{Deserialize, Serialize};

/// The media type every loadable track is tagged with.
pub const MEDIA_TYPE_MUSIC: &str = "music";

/// Media types the player accepts, as reported by `getSupportedMediaTypes`.
pub const SUPPORTED_MEDIA_TYPES: &[&str] = &[MEDIA_TYPE_MUSIC];

// =============================================================================
// PLAYBACK STATE
// =============================================================================

/// Playback lifecycle of the shared player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    /// Nothing loaded.
    #[default]
    Idle,
    /// Media loaded and playing.
    Playing,
    /// Media loaded, playback held.
    Paused,
    /// Playback failed; see [`PlayerState::error`].
    Error,
}

// =============================================================================
// MEDIA INFO
// =============================================================================

/// The currently loaded track.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Source URL the track was loaded from.
    pub url: String,
    /// Media category; always [`MEDIA_TYPE_MUSIC`].
    pub media_type: String,
    /// Track length in seconds. 0.0 until the engine reports it.
    pub duration: f64,
    /// Playhead position in seconds.
    pub position: f64,
}

impl MediaInfo {
    /// Freshly loaded track with duration and position still unknown.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            media_type: MEDIA_TYPE_MUSIC.to_string(),
            duration: 0.0,
            position: 0.0,
        }
    }
}

// =============================================================================
// PLAYER STATE
// =============================================================================

/// Shared player state. One instance per server process.
///
/// Serializes to the exact record clients see: `media` is `null` while no
/// track is loaded, and `volume` never leaves [0.0, 1.0].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayerState {
    /// Current playback lifecycle state.
    pub state: PlaybackState,
    /// Loaded track, if any. Absent whenever `state` is idle.
    pub media: Option<MediaInfo>,
    /// Output volume in [0.0, 1.0].
    pub volume: f64,
    /// Mute flag. Serialized but not yet driven by any command.
    pub muted: bool,
    /// Last playback error, populated when the player enters the error state.
    pub error: Option<String>,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            state: PlaybackState::Idle,
            media: None,
            volume: 1.0,
            muted: false,
            error: None,
        }
    }
}

impl PlayerState {
    /// Clamp a requested volume level into the valid range.
    #[inline]
    pub fn clamp_volume(level: f64) -> f64 {
        level.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_initial_state() {
        let state = PlayerState::default();
        assert_eq!(state.state, PlaybackState::Idle);
        assert!(state.media.is_none());
        assert_eq!(state.volume, 1.0);
        assert!(!state.muted);
        assert!(state.error.is_none());
    }

    #[test]
    fn test_state_serializes_lowercase() {
        let json = serde_json::to_value(PlayerState::default()).unwrap();
        assert_eq!(json["state"], "idle");
        assert!(json["media"].is_null());
        assert_eq!(json["volume"], 1.0);
        assert_eq!(json["muted"], false);
        assert!(json["error"].is_null());
    }

    #[test]
    fn test_media_info_new() {
        let media = MediaInfo::new("http://radio/a.mp3");
        assert_eq!(media.url, "http://radio/a.mp3");
        assert_eq!(media.media_type, MEDIA_TYPE_MUSIC);
        assert_eq!(media.duration, 0.0);
        assert_eq!(media.position, 0.0);
    }

    #[test]
    fn test_clamp_volume_bounds() {
        assert_eq!(PlayerState::clamp_volume(-0.5), 0.0);
        assert_eq!(PlayerState::clamp_volume(0.0), 0.0);
        assert_eq!(PlayerState::clamp_volume(0.42), 0.42);
        assert_eq!(PlayerState::clamp_volume(1.0), 1.0);
        assert_eq!(PlayerState::clamp_volume(7.0), 1.0);
    }

    proptest! {
        #[test]
        fn test_clamp_volume_always_in_range(level in -1.0e6f64..1.0e6) {
            let clamped = PlayerState::clamp_volume(level);
            prop_assert!((0.0..=1.0).contains(&clamped));
            if (0.0..=1.0).contains(&level) {
                prop_assert_eq!(clamped, level);
            }
        }
    }
}
