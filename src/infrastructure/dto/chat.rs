//! Chat channel message DTOs.
//!
//! The chat channel carries two message families: free-text messages and
//! relayed sign predictions. The relay server stamps the sender id onto
//! forwarded text messages, so the outbound and inbound shapes differ.

use serde::{Deserialize, Serialize};

/// Client -> server messages on the chat channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatOutbound {
    /// Free-text message addressed to the paired peer
    Message { text: String },
    /// A locally produced prediction re-published for the peer
    AslPrediction { label: String, confidence: f64 },
}

/// Server -> client messages on the chat channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatInbound {
    /// Free-text message forwarded from the peer, sender id stamped by the relay
    Message { sender: String, text: String },
    /// The peer's relayed prediction
    AslPrediction { label: String, confidence: f64 },
}
