//! Data Transfer Objects (DTOs) for the three WebSocket channels.
//!
//! DTOs are organized by channel:
//! - `chat`: peer-scoped chat channel messages
//! - `video`: peer-scoped video relay frames
//! - `prediction`: shared sign-prediction endpoint messages
//!
//! All payloads are JSON objects discriminated by a `type` field. Unknown
//! fields inside a known message are ignored on deserialization; a payload
//! whose `type` is unknown fails to parse and is skipped by the receiver.

pub mod chat;
pub mod prediction;
pub mod video;
