//! Entities of the session domain.

use super::value_object::{Confidence, PeerId, Timestamp};
use super::DomainError;

/// A single sign-language prediction.
///
/// Only the most recent local and most recent remote prediction are ever
/// retained; there is no prediction history.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub confidence: Confidence,
    pub produced_at: Timestamp,
}

impl Prediction {
    /// Build a prediction from wire values, validating label and confidence.
    pub fn new(label: String, confidence: f64, produced_at: Timestamp) -> Result<Self, DomainError> {
        if label.is_empty() {
            return Err(DomainError::EmptyLabel);
        }
        Ok(Self {
            label,
            confidence: Confidence::new(confidence)?,
            produced_at,
        })
    }
}

/// One entry of the session chat log.
///
/// The log is append-only for the lifetime of a session and cleared on
/// disconnect.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEntry {
    /// A message relayed from the peer
    Message {
        sender: PeerId,
        text: String,
        received_at: Timestamp,
    },
    /// A locally generated system notice ("Chat connected", ...)
    System { text: String },
}

impl ChatEntry {
    pub fn system(text: impl Into<String>) -> Self {
        Self::System { text: text.into() }
    }
}
