//! Remote composite surface.
//!
//! Consumes session notifications and owns the remote display raster
//! exclusively. Malformed inbound frames are swallowed and skipped: frame
//! relay is lossy by design and a bad frame is never surfaced to the user.

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

use crate::domain::Prediction;
use crate::media;
use crate::session::coordinator::SessionNotification;
use crate::session::SessionState;

use super::canvas::LocalCanvas;

/// Picture-in-picture inset margin, pixels
const PIP_MARGIN: u32 = 8;

/// Prediction badge geometry, pixels
const BADGE_HEIGHT: u32 = 10;
const BADGE_MAX_WIDTH: u32 = 80;

/// Badge fill color
const BADGE_COLOR: Rgb<u8> = Rgb([0x2d, 0xd4, 0xbf]);

#[derive(Debug, Default)]
pub struct RenderSurface {
    remote: Option<RgbImage>,
    overlay: Option<Prediction>,
}

impl RenderSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one session notification to the surface state.
    pub fn apply(&mut self, notification: &SessionNotification) {
        match notification {
            SessionNotification::RemoteFrame(frame_data) => match media::decode_frame(frame_data) {
                Ok(frame) => self.remote = Some(frame),
                Err(e) => tracing::debug!("skipping undecodable remote frame: {}", e),
            },
            SessionNotification::RemotePrediction(prediction) => {
                self.overlay = Some(prediction.clone());
            }
            SessionNotification::StateChanged(SessionState::Idle) => {
                self.remote = None;
                self.overlay = None;
            }
            _ => {}
        }
    }

    /// Most recent decoded remote frame, if any has arrived
    pub fn remote(&self) -> Option<&RgbImage> {
        self.remote.as_ref()
    }

    /// Most recent remote prediction; `None` until the first one arrives
    pub fn overlay(&self) -> Option<&Prediction> {
        self.overlay.as_ref()
    }

    /// Composite the visual surface: remote frame as primary, local canvas as
    /// picture-in-picture, prediction badge top-right.
    ///
    /// Returns `None` before the first remote frame has been decoded.
    pub fn composite(&self, local: Option<&LocalCanvas>) -> Option<RgbImage> {
        let mut frame = self.remote.clone()?;

        if let Some(canvas) = local {
            if !canvas.is_empty() {
                let pip_width = (frame.width() / 4).max(1);
                let pip_height = (frame.height() / 4).max(1);
                let pip = imageops::resize(canvas.image(), pip_width, pip_height, FilterType::Triangle);
                let y = frame.height().saturating_sub(pip_height + PIP_MARGIN);
                imageops::replace(&mut frame, &pip, PIP_MARGIN as i64, y as i64);
            }
        }

        if let Some(prediction) = &self.overlay {
            draw_badge(&mut frame, prediction);
        }

        Some(frame)
    }
}

/// Confidence badge: a filled bar whose width scales with confidence.
fn draw_badge(frame: &mut RgbImage, prediction: &Prediction) {
    let width = ((prediction.confidence.value() * BADGE_MAX_WIDTH as f64) as u32).max(1);
    let x0 = frame.width().saturating_sub(width + PIP_MARGIN);
    for y in PIP_MARGIN..(PIP_MARGIN + BADGE_HEIGHT).min(frame.height()) {
        for x in x0..frame.width().saturating_sub(PIP_MARGIN) {
            frame.put_pixel(x, y, BADGE_COLOR);
        }
    }
}
