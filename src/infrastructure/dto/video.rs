//! Video relay channel DTOs.

use serde::{Deserialize, Serialize};

/// The single message family of the video relay channel, identical in both
/// directions. `frame_data` is an opaque data-URL encoded JPEG; the relay is
/// stateless per frame and carries no sequence numbers or timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VideoMessage {
    Frame { frame_data: String },
}
