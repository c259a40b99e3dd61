//! The session relay layer.
//!
//! A session pairs a local id with a peer id and orchestrates three
//! independently-lived duplex channels: chat, video relay and the shared
//! prediction stream. Channels fail independently; only loss of the chat
//! channel ends the session. Reconnection is always user-initiated.

pub mod channel;
pub mod coordinator;
pub mod endpoints;
pub mod error;
pub mod identity;
pub mod throttle;

pub use channel::{ChannelEvent, ChannelHandle, ChannelKind, ChannelState};
pub use coordinator::{SessionCommand, SessionCoordinator, SessionNotification, SessionState};
pub use endpoints::Endpoints;
pub use error::SessionError;
pub use throttle::SendGate;
