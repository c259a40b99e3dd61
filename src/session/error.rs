//! Error types for the session layer.

use thiserror::Error;

use super::channel::ChannelKind;

/// Session-level errors.
///
/// Channel errors never propagate to sibling channels and never terminate
/// the session as a whole; they surface here (or as a status notification)
/// and leave the other channels untouched.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A connect/enable action was attempted without both identifiers
    #[error("both a local id and a peer id are required")]
    MissingPeer,

    /// The transport for one channel could not be established
    #[error("{kind} channel could not be established: {reason}")]
    Connect { kind: ChannelKind, reason: String },
}
