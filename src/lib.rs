//! Real-time sign-language video chat session layer.
//!
//! Two paired peers exchange live video, free-text chat and continuously
//! updated sign-language predictions over three independently-lived duplex
//! WebSocket channels. This crate provides the client-side session layer
//! (channel handles, session coordinator, perception pipeline and render
//! surface) together with the relay backend the channels talk to.

// layers
pub mod domain;
pub mod infrastructure;
pub mod media;
pub mod perception;
pub mod render;
pub mod server;
pub mod session;

// shared library
pub mod common;
