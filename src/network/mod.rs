//! Network Layer
//!
//! WebSocket transport, JSON-RPC protocol, command dispatch, and session
//! fan-out. Player state logic lives in `player/`; this layer only decodes
//! requests, applies them through the dispatcher, and moves frames.

pub mod dispatch;
pub mod protocol;
pub mod server;
pub mod session;

pub use dispatch::{DispatchOutcome, Dispatcher, Method};
pub use protocol::{RpcError, RpcRequest};
pub use server::{MediaServer, MediaServerError, ServerConfig};
pub use session::{SessionId, SessionRegistry};
