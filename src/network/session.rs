//! Session Registry
//!
//! Tracks every live client connection and fans server frames out to them.
//! Membership changes race with broadcasts; a broadcast therefore iterates
//! a point-in-time snapshot of the membership and sends outside the lock.

use std::collections::BTreeMap;

use tokio::sync::{mpsc, RwLock};
use tracing::debug;
use uuid::Uuid;

/// Unique session identifier.
pub type SessionId = Uuid;

/// Registry of live sessions.
///
/// A session is nothing but its outbound frame channel; all player state
/// is global. Registration and removal happen exactly once per connection,
/// with removal guaranteed on every termination path.
pub struct SessionRegistry {
    sessions: RwLock<BTreeMap<SessionId, mpsc::Sender<String>>>,
}

impl SessionRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(BTreeMap::new()),
        }
    }

    /// Register a connection's outbound channel under a fresh id.
    pub async fn register(&self, sender: mpsc::Sender<String>) -> SessionId {
        let id = Uuid::new_v4();
        self.sessions.write().await.insert(id, sender);
        id
    }

    /// Drop a session. Safe to call for an id that is already gone.
    pub async fn unregister(&self, id: &SessionId) {
        self.sessions.write().await.remove(id);
    }

    /// Send one frame to a single session.
    pub async fn unicast(&self, id: &SessionId, frame: String) {
        let sender = {
            let sessions = self.sessions.read().await;
            sessions.get(id).cloned()
        };
        if let Some(sender) = sender {
            let _ = sender.send(frame).await;
        }
    }

    /// Send the same frame to every registered session.
    ///
    /// Sessions whose transport already closed, or whose outbound queue is
    /// full, are skipped; one dead or slow receiver never blocks delivery
    /// to the rest and never surfaces an error to the caller.
    pub async fn broadcast(&self, frame: &str) {
        let senders: Vec<mpsc::Sender<String>> = {
            let sessions = self.sessions.read().await;
            sessions.values().cloned().collect()
        };
        if senders.is_empty() {
            return;
        }

        for sender in &senders {
            let _ = sender.try_send(frame.to_string());
        }
        debug!("State broadcast to {} clients", senders.len());
    }

    /// Number of live sessions.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
