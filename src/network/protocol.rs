//! Protocol Messages
//!
//! JSON-RPC 2.0 wire format over WebSocket text frames.
//! Each frame carries exactly one JSON object; responses and notifications
//! are serialized once and shipped as ready-made frames.

use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::player::state::PlayerState;

/// Protocol version tag stamped on every outbound frame.
pub const JSONRPC_VERSION: &str = "2.0";

/// Method name of the server-push state notification.
pub const STATE_CHANGED_METHOD: &str = "stateChanged";

// =============================================================================
// ERROR CODES
// =============================================================================

/// Malformed JSON frame.
pub const PARSE_ERROR: i32 = -32700;

/// Frame decoded but is not a valid request (no `method` member).
pub const INVALID_REQUEST: i32 = -32600;

/// Unrecognized method name.
pub const METHOD_NOT_FOUND: i32 = -32601;

/// Required parameter missing or of the wrong shape.
pub const INVALID_PARAMS: i32 = -32602;

/// Handler failure; the message carries the failure text.
pub const INTERNAL_ERROR: i32 = -32603;

/// Protocol-level request failure, mapped onto a JSON-RPC error object.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RpcError {
    /// Frame was not valid JSON.
    #[error("Parse error")]
    Parse,

    /// Frame was valid JSON but not a request shape.
    #[error("Invalid request")]
    InvalidRequest,

    /// Method name is not in the dispatch table.
    #[error("Method not found")]
    MethodNotFound,

    /// A required parameter is missing or malformed.
    #[error("{0}")]
    InvalidParams(String),

    /// Handler failed; the text passes through to the client.
    #[error("{0}")]
    Internal(String),
}

impl RpcError {
    /// JSON-RPC error code for this failure.
    pub fn code(&self) -> i32 {
        match self {
            RpcError::Parse => PARSE_ERROR,
            RpcError::InvalidRequest => INVALID_REQUEST,
            RpcError::MethodNotFound => METHOD_NOT_FOUND,
            RpcError::InvalidParams(_) => INVALID_PARAMS,
            RpcError::Internal(_) => INTERNAL_ERROR,
        }
    }
}

// =============================================================================
// REQUESTS
// =============================================================================

/// Decoded inbound request.
#[derive(Debug, Clone)]
pub struct RpcRequest {
    /// Method name to invoke.
    pub method: String,
    /// Named parameters; empty when omitted.
    pub params: Map<String, Value>,
    /// Echo token. Absent (or null) marks a notification.
    pub id: Option<Value>,
}

impl RpcRequest {
    /// Interpret a decoded frame as a request.
    ///
    /// Anything that is not an object carrying a string `method` is an
    /// invalid request. `params` defaults to an empty map, and a null `id`
    /// is treated the same as an absent one.
    pub fn from_value(value: &Value) -> Result<Self, RpcError> {
        let obj = value.as_object().ok_or(RpcError::InvalidRequest)?;
        let method = obj
            .get("method")
            .and_then(Value::as_str)
            .ok_or(RpcError::InvalidRequest)?
            .to_string();
        let params = obj
            .get("params")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        let id = obj.get("id").filter(|v| !v.is_null()).cloned();

        Ok(Self { method, params, id })
    }

    /// Whether this request expects no response.
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

// =============================================================================
// OUTBOUND FRAMES
// =============================================================================

/// Serialized success response for the request with `id`.
pub fn success_frame(result: Value, id: &Value) -> String {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "result": result,
        "id": id,
    })
    .to_string()
}

/// Serialized error response; `id` is null when the request id is unknown.
pub fn error_frame(error: &RpcError, id: Option<&Value>) -> String {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "error": {
            "code": error.code(),
            "message": error.to_string(),
        },
        "id": id.cloned().unwrap_or(Value::Null),
    })
    .to_string()
}

/// Serialized `stateChanged` notification carrying a full snapshot.
pub fn state_changed_frame(snapshot: &PlayerState) -> String {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "method": STATE_CHANGED_METHOD,
        "params": snapshot,
    })
    .to_string()
}
