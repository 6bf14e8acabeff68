//! Audio Engine Interface
//!
//! Seam between the synchronization core and actual audio playback.
//! The core drives the engine on behalf of client commands; the engine
//! pushes playback progress back through [`EngineEvent`]s.

use thiserror::Error;
use tokio::sync::mpsc;

/// Failure surfaced by the audio backend.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// The engine could not load the given URL.
    #[error("failed to load media: {0}")]
    LoadFailed(String),

    /// Any other backend failure.
    #[error("audio engine error: {0}")]
    Backend(String),
}

/// Events pushed from the engine back into the state store.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Playhead moved (seconds).
    PositionChanged(f64),
    /// Track duration became known (seconds).
    DurationKnown(f64),
    /// Playback failed; the player enters the error state.
    PlaybackError(String),
}

/// Capability the playback backend must provide.
///
/// Calls happen on behalf of exactly one client command at a time; a
/// failure surfaces as an internal error on the requesting connection
/// and leaves the shared state untouched.
pub trait AudioEngine: Send + Sync {
    /// Prepare `url` for playback.
    fn load(&self, url: &str) -> Result<(), EngineError>;

    /// Begin or resume playback.
    fn play(&self) -> Result<(), EngineError>;

    /// Hold playback at the current position.
    fn pause(&self) -> Result<(), EngineError>;

    /// Stop playback and release the current track.
    fn stop(&self) -> Result<(), EngineError>;

    /// Apply an output volume in [0.0, 1.0].
    fn set_volume(&self, level: f64) -> Result<(), EngineError>;
}

/// No-op engine used until a real playback backend lands.
///
/// Accepts every command and emits no events, so the server degrades to a
/// pure state synchronizer.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEngine;

impl AudioEngine for NullEngine {
    fn load(&self, _url: &str) -> Result<(), EngineError> {
        Ok(())
    }

    fn play(&self) -> Result<(), EngineError> {
        Ok(())
    }

    fn pause(&self) -> Result<(), EngineError> {
        Ok(())
    }

    fn stop(&self) -> Result<(), EngineError> {
        Ok(())
    }

    fn set_volume(&self, _level: f64) -> Result<(), EngineError> {
        Ok(())
    }
}

/// Channel pair an event-emitting engine hands its receiver half from.
pub fn event_channel() -> (mpsc::Sender<EngineEvent>, mpsc::Receiver<EngineEvent>) {
    mpsc::channel(64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_engine_accepts_everything() {
        let engine = NullEngine;
        assert!(engine.load("http://radio/a.mp3").is_ok());
        assert!(engine.play().is_ok());
        assert!(engine.pause().is_ok());
        assert!(engine.stop().is_ok());
        assert!(engine.set_volume(0.5).is_ok());
    }

    #[test]
    fn test_engine_error_messages() {
        let err = EngineError::LoadFailed("bad url".to_string());
        assert_eq!(err.to_string(), "failed to load media: bad url");

        let err = EngineError::Backend("device gone".to_string());
        assert_eq!(err.to_string(), "audio engine error: device gone");
    }
}
