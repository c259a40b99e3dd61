//! Hand pose extraction interface.
//!
//! Pose estimation is an external capability (a model runtime owned by the
//! embedding application). The pipeline only depends on this trait.

use image::RgbImage;
use thiserror::Error;

use super::landmark::DetectedHand;

/// Errors from the camera/extraction boundary.
///
/// These disable media features when surfaced; the chat channel is never
/// affected by them.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("camera access failed: {0}")]
    Camera(String),

    #[error("hand pose extraction failed: {0}")]
    Extraction(String),
}

/// Turns a camera frame into zero or more detected hands.
#[cfg_attr(test, mockall::automock)]
pub trait HandPoseExtractor {
    fn extract(&mut self, frame: &RgbImage) -> Result<Vec<DetectedHand>, CaptureError>;
}
