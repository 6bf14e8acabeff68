//! # Vantron Media Server
//!
//! Shared media-player state served to many concurrent clients over
//! JSON-RPC 2.0 on WebSocket, with every state change fanned out to all
//! connected sessions.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    VANTRON MEDIA SERVER                      │
//! ├──────────────────────────────────────────────────────────────┤
//! │  player/          - Shared player state                      │
//! │  ├── state.rs     - State types and snapshots                │
//! │  ├── store.rs     - Single mutable cell, atomic mutations    │
//! │  └── engine.rs    - Audio backend seam (stubbed)             │
//! │                                                              │
//! │  network/         - Connection and synchronization engine    │
//! │  ├── protocol.rs  - JSON-RPC 2.0 wire format                 │
//! │  ├── dispatch.rs  - Method table and command handling        │
//! │  ├── session.rs   - Live session registry and fan-out        │
//! │  └── server.rs    - Accept loop and per-connection transport │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Synchronization Guarantee
//!
//! Every mutating command that changes (or may change) the player state is
//! followed by a `stateChanged` notification carrying the full snapshot to
//! every registered session. A new session receives the current snapshot
//! before its first request is read, so each client observes a
//! monotonically-not-stale sequence of snapshots.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod network;
pub mod player;

// Re-export commonly used types
pub use network::protocol::{RpcError, RpcRequest};
pub use network::server::{MediaServer, MediaServerError, ServerConfig};
pub use player::engine::{AudioEngine, EngineError, EngineEvent, NullEngine};
pub use player::state::{MediaInfo, PlaybackState, PlayerState};
pub use player::store::StateStore;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default listen host when `VANTRON_MEDIA_HOST` is unset.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default listen port when `VANTRON_MEDIA_PORT` is unset.
pub const DEFAULT_PORT: u16 = 9300;
