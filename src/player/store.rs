//! State Store
//!
//! Single shared cell holding the [`PlayerState`]. All mutation and
//! snapshotting goes through this type; each method holds the lock for the
//! whole operation, so no caller ever observes a partially-applied mutation.

use tokio::sync::RwLock;
use tracing::info;

use crate::player::engine::EngineEvent;
use crate::player::state::{MediaInfo, PlaybackState, PlayerState};

/// Owns the single shared [`PlayerState`].
///
/// Conditional mutations report whether they changed anything so the caller
/// can decide whether a broadcast is owed.
pub struct StateStore {
    state: RwLock<PlayerState>,
}

impl StateStore {
    /// Fresh store in the idle state.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(PlayerState::default()),
        }
    }

    /// Point-in-time copy of the current state, safe to serialize.
    pub async fn snapshot(&self) -> PlayerState {
        self.state.read().await.clone()
    }

    /// Resume playback. Only a paused player starts playing.
    ///
    /// Returns true if the state changed.
    pub async fn play(&self) -> bool {
        let mut state = self.state.write().await;
        if state.state == PlaybackState::Paused {
            state.state = PlaybackState::Playing;
            info!("Playback resumed");
            true
        } else {
            false
        }
    }

    /// Hold playback. Only a playing player pauses.
    ///
    /// Returns true if the state changed.
    pub async fn pause(&self) -> bool {
        let mut state = self.state.write().await;
        if state.state == PlaybackState::Playing {
            state.state = PlaybackState::Paused;
            info!("Playback paused");
            true
        } else {
            false
        }
    }

    /// Stop playback and unload the current track.
    pub async fn stop(&self) {
        let mut state = self.state.write().await;
        state.state = PlaybackState::Idle;
        state.media = None;
        info!("Playback stopped");
    }

    /// Set the output volume, clamped to [0.0, 1.0].
    ///
    /// Returns the volume actually stored.
    pub async fn set_volume(&self, level: f64) -> f64 {
        let level = PlayerState::clamp_volume(level);
        let mut state = self.state.write().await;
        state.volume = level;
        info!("Volume set to {:.0}%", level * 100.0);
        level
    }

    /// Load a new track, replacing whatever was loaded before.
    ///
    /// A stale error from an earlier playback failure is cleared.
    pub async fn load(&self, url: &str, autoplay: bool) {
        let mut state = self.state.write().await;
        state.media = Some(MediaInfo::new(url));
        state.state = if autoplay {
            PlaybackState::Playing
        } else {
            PlaybackState::Paused
        };
        state.error = None;
        info!("Loading media from {}", url);
    }

    /// Apply an event pushed back by the audio engine.
    ///
    /// Returns true if the state changed. Progress events for an unloaded
    /// player are dropped.
    pub async fn apply_engine_event(&self, event: EngineEvent) -> bool {
        let mut state = self.state.write().await;
        match event {
            EngineEvent::PositionChanged(position) => match state.media.as_mut() {
                Some(media) => {
                    media.position = position.max(0.0);
                    true
                }
                None => false,
            },
            EngineEvent::DurationKnown(duration) => match state.media.as_mut() {
                Some(media) => {
                    media.duration = duration.max(0.0);
                    true
                }
                None => false,
            },
            EngineEvent::PlaybackError(message) => {
                state.state = PlaybackState::Error;
                state.error = Some(message);
                true
            }
        }
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}
