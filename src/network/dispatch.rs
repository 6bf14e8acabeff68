//! Command Dispatch
//!
//! Maps JSON-RPC method names onto player operations. The method table is
//! an explicit enum, so an unknown name is rejected in exactly one place
//! and the compiler enforces that every entry has a handler.

use std::sync::Arc;

use serde_json::{json, Map, Value};
use tracing::warn;

use crate::network::protocol::RpcError;
use crate::player::engine::{AudioEngine, EngineError};
use crate::player::state::{PlaybackState, PlayerState, SUPPORTED_MEDIA_TYPES};
use crate::player::store::StateStore;

// =============================================================================
// METHOD TABLE
// =============================================================================

/// Recognized JSON-RPC methods.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    /// Return the current state snapshot.
    GetState,
    /// Return the supported media type list.
    GetSupportedMediaTypes,
    /// Resume paused playback.
    Play,
    /// Hold running playback.
    Pause,
    /// Stop playback and unload.
    Stop,
    /// Set the output volume.
    SetVolume,
    /// Load a track by URL.
    Load,
}

impl Method {
    /// Every recognized method, for table-completeness checks.
    pub const ALL: [Method; 7] = [
        Method::GetState,
        Method::GetSupportedMediaTypes,
        Method::Play,
        Method::Pause,
        Method::Stop,
        Method::SetVolume,
        Method::Load,
    ];

    /// Look up a wire method name.
    pub fn from_name(name: &str) -> Option<Method> {
        match name {
            "getState" => Some(Method::GetState),
            "getSupportedMediaTypes" => Some(Method::GetSupportedMediaTypes),
            "play" => Some(Method::Play),
            "pause" => Some(Method::Pause),
            "stop" => Some(Method::Stop),
            "setVolume" => Some(Method::SetVolume),
            "load" => Some(Method::Load),
            _ => None,
        }
    }

    /// Wire name of this method.
    pub fn name(self) -> &'static str {
        match self {
            Method::GetState => "getState",
            Method::GetSupportedMediaTypes => "getSupportedMediaTypes",
            Method::Play => "play",
            Method::Pause => "pause",
            Method::Stop => "stop",
            Method::SetVolume => "setVolume",
            Method::Load => "load",
        }
    }
}

// =============================================================================
// DISPATCHER
// =============================================================================

/// Outcome of a successful dispatch.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    /// Result value for the response frame.
    pub result: Value,
    /// Whether the command warrants a state broadcast.
    pub state_changed: bool,
}

impl DispatchOutcome {
    fn reply(result: Value) -> Self {
        Self {
            result,
            state_changed: false,
        }
    }

    fn mutated(result: Value, state_changed: bool) -> Self {
        Self {
            result,
            state_changed,
        }
    }
}

/// Applies validated commands to the state store and audio engine.
///
/// The store is mutated only after the engine accepted the command, so a
/// failed command never leaves a partial state change behind.
pub struct Dispatcher {
    store: Arc<StateStore>,
    engine: Arc<dyn AudioEngine>,
}

impl Dispatcher {
    /// New dispatcher over the shared store and engine.
    pub fn new(store: Arc<StateStore>, engine: Arc<dyn AudioEngine>) -> Self {
        Self { store, engine }
    }

    /// Dispatch one request.
    ///
    /// Errors map one-to-one onto protocol error responses; nothing here
    /// can tear down the calling connection.
    pub async fn dispatch(
        &self,
        method: &str,
        params: &Map<String, Value>,
    ) -> Result<DispatchOutcome, RpcError> {
        let method = match Method::from_name(method) {
            Some(m) => m,
            None => {
                warn!("Method not found: {}", method);
                return Err(RpcError::MethodNotFound);
            }
        };

        match method {
            Method::GetState => {
                let snapshot = self.store.snapshot().await;
                let value = serde_json::to_value(snapshot)
                    .map_err(|e| RpcError::Internal(e.to_string()))?;
                Ok(DispatchOutcome::reply(value))
            }

            Method::GetSupportedMediaTypes => {
                Ok(DispatchOutcome::reply(json!(SUPPORTED_MEDIA_TYPES)))
            }

            Method::Play => {
                let changed = if self.store.snapshot().await.state == PlaybackState::Paused {
                    self.engine.play().map_err(engine_failure)?;
                    self.store.play().await
                } else {
                    false
                };
                Ok(DispatchOutcome::mutated(json!(true), changed))
            }

            Method::Pause => {
                let changed = if self.store.snapshot().await.state == PlaybackState::Playing {
                    self.engine.pause().map_err(engine_failure)?;
                    self.store.pause().await
                } else {
                    false
                };
                Ok(DispatchOutcome::mutated(json!(true), changed))
            }

            Method::Stop => {
                self.engine.stop().map_err(engine_failure)?;
                self.store.stop().await;
                Ok(DispatchOutcome::mutated(json!(true), true))
            }

            Method::SetVolume => {
                let Some(level) = params.get("level") else {
                    // level omitted: accepted no-op, nothing to broadcast
                    return Ok(DispatchOutcome::mutated(json!(true), false));
                };
                let level = level.as_f64().ok_or_else(|| {
                    RpcError::InvalidParams("level must be a number".to_string())
                })?;
                let level = PlayerState::clamp_volume(level);
                self.engine.set_volume(level).map_err(engine_failure)?;
                self.store.set_volume(level).await;
                Ok(DispatchOutcome::mutated(json!(true), true))
            }

            Method::Load => {
                let url = params
                    .get("url")
                    .ok_or_else(|| RpcError::InvalidParams("URL is required".to_string()))?
                    .as_str()
                    .ok_or_else(|| {
                        RpcError::InvalidParams("url must be a string".to_string())
                    })?;
                let autoplay = params
                    .get("options")
                    .and_then(|o| o.get("autoplay"))
                    .and_then(Value::as_bool)
                    .unwrap_or(true);

                self.engine.load(url).map_err(engine_failure)?;
                if autoplay {
                    self.engine.play().map_err(engine_failure)?;
                }
                self.store.load(url, autoplay).await;
                Ok(DispatchOutcome::mutated(json!(true), true))
            }
        }
    }
}

/// Engine failures surface as internal errors on the requesting connection.
fn engine_failure(err: EngineError) -> RpcError {
    RpcError::Internal(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::engine::NullEngine;

    fn dispatcher() -> (Dispatcher, Arc<StateStore>) {
        let store = Arc::new(StateStore::new());
        let dispatcher = Dispatcher::new(store.clone(), Arc::new(NullEngine));
        (dispatcher, store)
    }

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_method_table_round_trips() {
        for method in Method::ALL {
            assert_eq!(Method::from_name(method.name()), Some(method));
        }
        assert_eq!(Method::from_name("seek"), None);
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let (dispatcher, _) = dispatcher();
        let result = dispatcher.dispatch("seek", &Map::new()).await;
        assert_eq!(result.unwrap_err(), RpcError::MethodNotFound);
    }

    #[tokio::test]
    async fn test_get_state_returns_snapshot() {
        let (dispatcher, _) = dispatcher();
        let outcome = dispatcher.dispatch("getState", &Map::new()).await.unwrap();
        assert!(!outcome.state_changed);
        assert_eq!(outcome.result["state"], "idle");
        assert_eq!(outcome.result["volume"], 1.0);
    }

    #[tokio::test]
    async fn test_get_supported_media_types() {
        let (dispatcher, _) = dispatcher();
        let outcome = dispatcher
            .dispatch("getSupportedMediaTypes", &Map::new())
            .await
            .unwrap();
        assert_eq!(outcome.result, json!(["music"]));
        assert!(!outcome.state_changed);
    }

    #[tokio::test]
    async fn test_play_from_idle_is_accepted_noop() {
        let (dispatcher, store) = dispatcher();
        let outcome = dispatcher.dispatch("play", &Map::new()).await.unwrap();
        assert_eq!(outcome.result, json!(true));
        assert!(!outcome.state_changed);
        assert_eq!(store.snapshot().await.state, PlaybackState::Idle);
    }

    #[tokio::test]
    async fn test_play_resumes_paused_player() {
        let (dispatcher, store) = dispatcher();
        store.load("a.mp3", false).await;

        let outcome = dispatcher.dispatch("play", &Map::new()).await.unwrap();
        assert!(outcome.state_changed);
        assert_eq!(store.snapshot().await.state, PlaybackState::Playing);
    }

    #[tokio::test]
    async fn test_pause_only_moves_playing_player() {
        let (dispatcher, store) = dispatcher();

        let outcome = dispatcher.dispatch("pause", &Map::new()).await.unwrap();
        assert!(!outcome.state_changed);

        store.load("a.mp3", true).await;
        let outcome = dispatcher.dispatch("pause", &Map::new()).await.unwrap();
        assert!(outcome.state_changed);
        assert_eq!(store.snapshot().await.state, PlaybackState::Paused);
    }

    #[tokio::test]
    async fn test_stop_always_broadcasts() {
        let (dispatcher, store) = dispatcher();

        // even from idle
        let outcome = dispatcher.dispatch("stop", &Map::new()).await.unwrap();
        assert!(outcome.state_changed);

        store.load("a.mp3", true).await;
        let outcome = dispatcher.dispatch("stop", &Map::new()).await.unwrap();
        assert!(outcome.state_changed);

        let state = store.snapshot().await;
        assert_eq!(state.state, PlaybackState::Idle);
        assert!(state.media.is_none());
    }

    #[tokio::test]
    async fn test_set_volume_clamps_and_broadcasts() {
        let (dispatcher, store) = dispatcher();

        let outcome = dispatcher
            .dispatch("setVolume", &params(json!({"level": 3.2})))
            .await
            .unwrap();
        assert!(outcome.state_changed);
        assert_eq!(store.snapshot().await.volume, 1.0);

        let outcome = dispatcher
            .dispatch("setVolume", &params(json!({"level": 0.25})))
            .await
            .unwrap();
        assert!(outcome.state_changed);
        assert_eq!(store.snapshot().await.volume, 0.25);
    }

    #[tokio::test]
    async fn test_set_volume_without_level_is_noop() {
        let (dispatcher, store) = dispatcher();
        let outcome = dispatcher.dispatch("setVolume", &Map::new()).await.unwrap();
        assert_eq!(outcome.result, json!(true));
        assert!(!outcome.state_changed);
        assert_eq!(store.snapshot().await.volume, 1.0);
    }

    #[tokio::test]
    async fn test_set_volume_rejects_non_number() {
        let (dispatcher, _) = dispatcher();
        let result = dispatcher
            .dispatch("setVolume", &params(json!({"level": "loud"})))
            .await;
        assert!(matches!(result, Err(RpcError::InvalidParams(_))));
    }

    #[tokio::test]
    async fn test_load_requires_url() {
        let (dispatcher, store) = dispatcher();
        let result = dispatcher.dispatch("load", &Map::new()).await;
        assert!(matches!(result, Err(RpcError::InvalidParams(_))));
        assert_eq!(store.snapshot().await.state, PlaybackState::Idle);
    }

    #[tokio::test]
    async fn test_load_defaults_to_autoplay() {
        let (dispatcher, store) = dispatcher();
        dispatcher
            .dispatch("load", &params(json!({"url": "a.mp3"})))
            .await
            .unwrap();
        assert_eq!(store.snapshot().await.state, PlaybackState::Playing);
    }

    #[tokio::test]
    async fn test_load_with_autoplay_false() {
        let (dispatcher, store) = dispatcher();
        let outcome = dispatcher
            .dispatch(
                "load",
                &params(json!({"url": "a.mp3", "options": {"autoplay": false}})),
            )
            .await
            .unwrap();
        assert!(outcome.state_changed);

        let state = store.snapshot().await;
        assert_eq!(state.state, PlaybackState::Paused);
        let media = state.media.unwrap();
        assert_eq!(media.url, "a.mp3");
        assert_eq!(media.position, 0.0);
    }

    #[tokio::test]
    async fn test_engine_failure_is_internal_error() {
        struct FailingEngine;
        impl AudioEngine for FailingEngine {
            fn load(&self, _url: &str) -> Result<(), EngineError> {
                Err(EngineError::LoadFailed("unreachable host".to_string()))
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

        let store = Arc::new(StateStore::new());
        let dispatcher = Dispatcher::new(store.clone(), Arc::new(FailingEngine));

        let result = dispatcher
            .dispatch("load", &params(json!({"url": "a.mp3"})))
            .await;
        match result {
            Err(RpcError::Internal(message)) => {
                assert!(message.contains("unreachable host"));
            }
            other => panic!("expected internal error, got {:?}", other),
        }

        // the failed command left no partial state behind
        let state = store.snapshot().await;
        assert_eq!(state.state, PlaybackState::Idle);
        assert!(state.media.is_none());
    }
}
