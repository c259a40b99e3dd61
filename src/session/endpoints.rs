//! Channel endpoint construction.
//!
//! Chat and video are peer-scoped: the path names the peer being addressed
//! and the `self` query parameter names the caller. The prediction stream is
//! a shared inference endpoint and carries no peer scope. Peer ids are
//! URL-safe by construction (see `domain::PeerId`), so no escaping is needed.

use crate::domain::PeerId;

#[derive(Debug, Clone)]
pub struct Endpoints {
    ws_base: String,
}

impl Endpoints {
    /// `ws_base` is the WebSocket origin, e.g. `ws://127.0.0.1:8000`
    pub fn new(ws_base: impl Into<String>) -> Self {
        let mut ws_base = ws_base.into();
        while ws_base.ends_with('/') {
            ws_base.pop();
        }
        Self { ws_base }
    }

    pub fn chat(&self, peer: &PeerId, local: &PeerId) -> String {
        format!("{}/ws/chat/{}/?self={}", self.ws_base, peer, local)
    }

    pub fn video(&self, peer: &PeerId, local: &PeerId) -> String {
        format!("{}/ws/video/{}/?self={}", self.ws_base, peer, local)
    }

    pub fn prediction(&self) -> String {
        format!("{}/ws/asl/", self.ws_base)
    }
}
