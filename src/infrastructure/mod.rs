//! Infrastructure layer: wire-format DTOs shared by the session layer and the
//! relay server.

pub mod dto;
