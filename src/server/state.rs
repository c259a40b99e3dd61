//! Server state and connection registries.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::{mpsc, Mutex};

use super::predictor::SignPredictor;

/// Query parameters for the peer-scoped WebSocket endpoints
#[derive(Debug, Deserialize)]
pub struct RelayQuery {
    /// The caller's own id (`?self=...`)
    #[serde(rename = "self")]
    pub self_id: String,
}

/// One registered connection: its push channel and connect time
pub struct PeerLink {
    pub sender: mpsc::UnboundedSender<String>,
    /// Unix timestamp when connected (milliseconds, UTC)
    pub connected_at: i64,
}

/// Registry of live connections for one channel kind, keyed by the
/// connection's own id. Relaying to a peer is a lookup by the peer's id.
#[derive(Default)]
pub struct PeerRegistry {
    links: Mutex<HashMap<String, PeerLink>>,
}

impl PeerRegistry {
    /// Register a connection under its own id. Fails when the id is already
    /// taken: at most one live connection per id and channel kind.
    pub async fn register(&self, self_id: &str, link: PeerLink) -> bool {
        let mut links = self.links.lock().await;
        if links.contains_key(self_id) {
            return false;
        }
        links.insert(self_id.to_string(), link);
        true
    }

    pub async fn unregister(&self, self_id: &str) {
        let mut links = self.links.lock().await;
        links.remove(self_id);
    }

    /// Push a payload to the peer if it is connected. A missing peer is not
    /// an error: the relay is stateless and the payload is simply dropped.
    pub async fn push_to(&self, peer_id: &str, payload: String) -> bool {
        let links = self.links.lock().await;
        match links.get(peer_id) {
            Some(link) => link.sender.send(payload).is_ok(),
            None => false,
        }
    }
}

/// Shared application state
pub struct AppState {
    pub chat: PeerRegistry,
    pub video: PeerRegistry,
    /// The injected prediction model; absent when running without one
    pub predictor: Option<Arc<dyn SignPredictor>>,
}
