//! WebSocket Media Server
//!
//! Async WebSocket server exposing the shared player over JSON-RPC.
//! One reader task and one writer task per connection; every mutation is
//! serialized through the dispatcher and followed by a snapshot broadcast.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, instrument, warn};

use crate::network::dispatch::Dispatcher;
use crate::network::protocol::{self, RpcError, RpcRequest};
use crate::network::session::SessionRegistry;
use crate::player::engine::{AudioEngine, EngineEvent};
use crate::player::store::StateStore;
use crate::{DEFAULT_HOST, DEFAULT_PORT};

/// Environment variable naming the listen host.
pub const HOST_ENV: &str = "VANTRON_MEDIA_HOST";

/// Environment variable naming the listen port.
pub const PORT_ENV: &str = "VANTRON_MEDIA_PORT";

/// Outbound frame queue depth per connection.
const OUTBOUND_QUEUE: usize = 64;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen host.
    pub host: String,
    /// Listen port.
    pub port: u16,
    /// Maximum concurrent connections.
    pub max_connections: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_connections: 64,
        }
    }
}

impl ServerConfig {
    /// Read configuration from [`HOST_ENV`] and [`PORT_ENV`].
    ///
    /// An unparsable port is logged and replaced with the default rather
    /// than treated as fatal.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let host = std::env::var(HOST_ENV).unwrap_or(defaults.host);
        let port = match std::env::var(PORT_ENV) {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                warn!("Invalid port specified, using default: {}", DEFAULT_PORT);
                DEFAULT_PORT
            }),
            Err(_) => defaults.port,
        };
        Self {
            host,
            port,
            max_connections: defaults.max_connections,
        }
    }

    /// Socket address to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Media server errors.
#[derive(Debug, thiserror::Error)]
pub enum MediaServerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// The media server.
pub struct MediaServer {
    /// Server configuration.
    config: ServerConfig,
    /// Shared player state.
    store: Arc<StateStore>,
    /// Live session registry.
    registry: Arc<SessionRegistry>,
    /// Command dispatcher.
    dispatcher: Arc<Dispatcher>,
    /// Shutdown signal.
    shutdown_tx: broadcast::Sender<()>,
}

impl MediaServer {
    /// Create a new server over the given playback engine.
    pub fn new(config: ServerConfig, engine: Arc<dyn AudioEngine>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let store = Arc::new(StateStore::new());
        let registry = Arc::new(SessionRegistry::new());
        let dispatcher = Arc::new(Dispatcher::new(store.clone(), engine));

        Self {
            config,
            store,
            registry,
            dispatcher,
            shutdown_tx,
        }
    }

    /// Run the accept loop until shutdown.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<(), MediaServerError> {
        let listener = TcpListener::bind(self.config.bind_addr()).await?;
        info!("Media server listening on ws://{}", self.config.bind_addr());

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            if self.registry.session_count().await >= self.config.max_connections {
                                warn!("Connection limit reached, rejecting {}", addr);
                                continue;
                            }
                            info!("New client connected from {}", addr);
                            self.handle_connection(stream, addr);
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Spawn the per-connection task.
    fn handle_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let store = self.store.clone();
        let registry = self.registry.clone();
        let dispatcher = self.dispatcher.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let ws_stream = match accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    error!("WebSocket handshake failed for {}: {}", addr, e);
                    return;
                }
            };

            let (mut ws_sender, mut ws_receiver) = ws_stream.split();
            let (frame_tx, mut frame_rx) = mpsc::channel::<String>(OUTBOUND_QUEUE);

            let session_id = registry.register(frame_tx.clone()).await;

            // Writer task: drains the outbound queue into the socket.
            let writer_task = tokio::spawn(async move {
                while let Some(frame) = frame_rx.recv().await {
                    if ws_sender.send(Message::Text(frame)).await.is_err() {
                        break;
                    }
                }
            });

            // Initial state goes out before any request is read.
            let snapshot = store.snapshot().await;
            registry
                .unicast(&session_id, protocol::state_changed_frame(&snapshot))
                .await;
            debug!("State sent to {}", addr);

            loop {
                tokio::select! {
                    msg = ws_receiver.next() => {
                        match msg {
                            Some(Ok(Message::Text(text))) => {
                                debug!("Received request from {}: {}", addr, text);
                                if let Some(reply) =
                                    handle_frame(&dispatcher, &store, &registry, &text).await
                                {
                                    if frame_tx.send(reply).await.is_err() {
                                        break;
                                    }
                                }
                            }
                            Some(Ok(Message::Close(_))) | None => {
                                info!("Client disconnected: {}", addr);
                                break;
                            }
                            Some(Err(e)) => {
                                error!("WebSocket error for {}: {}", addr, e);
                                break;
                            }
                            // Binary, ping and pong frames carry no requests.
                            Some(Ok(_)) => {}
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                }
            }

            // Cleanup runs on every exit path above.
            writer_task.abort();
            registry.unregister(&session_id).await;
            debug!("Session {} cleaned up", session_id);
        });
    }

    /// Spawn the task that applies engine events and rebroadcasts state.
    pub fn spawn_engine_events(
        &self,
        mut events: mpsc::Receiver<EngineEvent>,
    ) -> JoinHandle<()> {
        let store = self.store.clone();
        let registry = self.registry.clone();

        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if store.apply_engine_event(event).await {
                    let snapshot = store.snapshot().await;
                    registry
                        .broadcast(&protocol::state_changed_frame(&snapshot))
                        .await;
                }
            }
        })
    }

    /// Signal every task to stop.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Number of connected clients.
    pub async fn connection_count(&self) -> usize {
        self.registry.session_count().await
    }

    /// Handle to the shared state store.
    pub fn store(&self) -> Arc<StateStore> {
        self.store.clone()
    }
}

/// Process one inbound text frame, returning the reply frame if one is owed.
///
/// Mutating commands broadcast the fresh snapshot to every session before
/// the requester's response is returned, so the requester never sees its
/// response ahead of the matching state notification being queued.
async fn handle_frame(
    dispatcher: &Dispatcher,
    store: &StateStore,
    registry: &SessionRegistry,
    text: &str,
) -> Option<String> {
    let value: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(_) => {
            error!("Invalid JSON received");
            return Some(protocol::error_frame(&RpcError::Parse, None));
        }
    };

    let request = match RpcRequest::from_value(&value) {
        Ok(r) => r,
        // Echo whatever id the malformed request carried.
        Err(e) => {
            return Some(protocol::error_frame(
                &e,
                value.get("id").filter(|v| !v.is_null()),
            ));
        }
    };

    // Notifications are parsed but never dispatched or answered.
    if request.is_notification() {
        return None;
    }
    let id = request.id.as_ref()?;

    match dispatcher.dispatch(&request.method, &request.params).await {
        Ok(outcome) => {
            if outcome.state_changed {
                let snapshot = store.snapshot().await;
                registry
                    .broadcast(&protocol::state_changed_frame(&snapshot))
                    .await;
            }
            Some(protocol::success_frame(outcome.result, id))
        }
        Err(e) => Some(protocol::error_frame(&e, Some(id))),
    }
}
