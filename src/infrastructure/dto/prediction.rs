//! Prediction stream DTOs.
//!
//! The prediction endpoint is a shared inference service, not a peer link.
//! Clients stream landmark vectors at a bounded rate and receive predictions
//! whenever the service has a full sequence window.

use serde::{Deserialize, Serialize};

/// Client -> server messages on the prediction stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PredictionOutbound {
    /// A flattened landmark vector.
    ///
    /// `has_hands` is the sole discriminator for "no hands detected":
    /// when it is `false` the `landmarks` list is empty and the receiver
    /// resets its sequence state. Vector content is never inspected to
    /// infer hand presence.
    Landmarks {
        landmarks: Vec<f32>,
        has_hands: bool,
    },
    /// Explicit request to clear the service's sequence window
    Reset,
}

/// Server -> client messages on the prediction stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PredictionInbound {
    Prediction { label: String, confidence: f64 },
    Connection { message: String },
    Error { message: String },
}
