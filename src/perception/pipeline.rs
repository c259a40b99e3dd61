//! Per-frame perception pipeline.

use image::RgbImage;

use crate::domain::FeatureVector;
use crate::render::canvas::LocalCanvas;

use super::extractor::{CaptureError, HandPoseExtractor};
use super::landmark::{flatten_hands, MAX_HANDS};

/// Output of one pipeline tick.
///
/// `has_hands` is the discriminator: when it is `false` the vector is the
/// zero vector and consumers reset their prediction state. Vector content is
/// never used to infer hand presence.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkEvent {
    pub has_hands: bool,
    pub vector: FeatureVector,
}

/// Consumes camera frames at device rate and produces at most one landmark
/// event per frame.
///
/// Each tick also paints the frame plus the detected-hand skeleton onto the
/// local canvas. The paint is synchronous with extraction and must not be
/// skipped: the outbound video frame is encoded from this same canvas, so a
/// skipped paint would relay a stale picture.
pub struct PerceptionPipeline<E: HandPoseExtractor> {
    extractor: E,
    canvas: LocalCanvas,
}

impl<E: HandPoseExtractor> PerceptionPipeline<E> {
    pub fn new(extractor: E) -> Self {
        Self {
            extractor,
            canvas: LocalCanvas::new(),
        }
    }

    /// Process one camera frame: paint preview, extract hands, flatten.
    pub fn process_frame(&mut self, frame: &RgbImage) -> Result<LandmarkEvent, CaptureError> {
        self.canvas.paint_frame(frame);

        let hands = self.extractor.extract(frame)?;
        for hand in hands.iter().take(MAX_HANDS) {
            self.canvas.draw_hand(hand);
        }

        if hands.is_empty() {
            return Ok(LandmarkEvent {
                has_hands: false,
                vector: FeatureVector::zeroed(),
            });
        }

        let vector = flatten_hands(&hands)
            .map_err(|e| CaptureError::Extraction(e.to_string()))?;
        Ok(LandmarkEvent {
            has_hands: true,
            vector,
        })
    }

    /// The canvas carrying the latest preview paint
    pub fn canvas(&self) -> &LocalCanvas {
        &self.canvas
    }
}
