//! Domain model for the sign-language video chat session.
//!
//! Value objects carry their own validation; entities are built from them.
//! Nothing in this layer touches the network or the runtime.

pub mod entity;
pub mod value_object;

pub use entity::{ChatEntry, Prediction};
pub use value_object::{Confidence, FeatureVector, PeerId, Timestamp, FEATURE_LEN};

use thiserror::Error;

/// Validation errors raised by value object constructors
#[derive(Debug, Error, PartialEq)]
pub enum DomainError {
    /// Peer identifier is empty or contains characters that cannot appear in a channel URL
    #[error("invalid peer id '{0}'")]
    InvalidPeerId(String),

    /// Feature vector has the wrong length
    #[error("feature vector must have {expected} elements, got {actual}")]
    InvalidVectorLength { expected: usize, actual: usize },

    /// Feature vector contains a non-finite element
    #[error("feature vector element {index} is not finite")]
    NonFiniteElement { index: usize },

    /// Confidence is outside [0, 1] or not finite
    #[error("confidence must be a finite value in [0, 1], got {0}")]
    InvalidConfidence(f64),

    /// Prediction label is empty
    #[error("prediction label must not be empty")]
    EmptyLabel,
}
