//! Outbound rate gate for the media channels.
//!
//! Drop-oldest policy: when the gate is closed the candidate payload is
//! discarded entirely, never queued. Stale frames and stale landmarks are
//! worse than missing ones for a live conversation, so the system always
//! prefers freshness over completeness. The gate governs transmission only;
//! capture and local preview run at full device rate regardless.

use super::channel::ChannelKind;

/// Minimum interval between landmark sends (~20 Hz)
pub const LANDMARK_SEND_INTERVAL_MS: i64 = 50;

/// Minimum interval between video frame sends (~7 Hz)
pub const FRAME_SEND_INTERVAL_MS: i64 = 150;

/// Per-kind send gate, a pure function of the last-sent timestamp.
#[derive(Debug, Default)]
pub struct SendGate {
    last_landmarks_at: Option<i64>,
    last_frame_at: Option<i64>,
}

impl SendGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a send on `kind` is permitted at `now_millis`.
    ///
    /// A permitted call records `now_millis` as the new last-sent time;
    /// a denied call records nothing. Chat is never gated.
    pub fn permit(&mut self, kind: ChannelKind, now_millis: i64) -> bool {
        let (slot, interval) = match kind {
            ChannelKind::Chat => return true,
            ChannelKind::PredictionStream => {
                (&mut self.last_landmarks_at, LANDMARK_SEND_INTERVAL_MS)
            }
            ChannelKind::VideoRelay => (&mut self.last_frame_at, FRAME_SEND_INTERVAL_MS),
        };
        match *slot {
            Some(last) if now_millis - last < interval => false,
            _ => {
                *slot = Some(now_millis);
                true
            }
        }
    }
}
