//! Local preview canvas.
//!
//! Owned by the perception pipeline while capture is active. Each tick paints
//! the raw frame and the detected-hand skeleton; the outbound video frame is
//! encoded from this canvas, so preview and transmitted picture always match.

use image::RgbImage;

use crate::media;
use crate::perception::landmark::DetectedHand;

use super::skeleton;

#[derive(Debug)]
pub struct LocalCanvas {
    image: RgbImage,
}

impl Default for LocalCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalCanvas {
    pub fn new() -> Self {
        Self {
            image: RgbImage::new(0, 0),
        }
    }

    /// Replace the canvas content with the given frame, resizing the canvas
    /// to the frame's resolution.
    pub fn paint_frame(&mut self, frame: &RgbImage) {
        self.image = frame.clone();
    }

    /// Overlay one detected hand's skeleton on the current content.
    pub fn draw_hand(&mut self, hand: &DetectedHand) {
        skeleton::draw_hand(&mut self.image, hand);
    }

    /// Encode the current content as a data-URL JPEG for the video relay.
    pub fn to_data_url(&self, quality: u8) -> Result<String, image::ImageError> {
        media::encode_frame(&self.image, quality)
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn is_empty(&self) -> bool {
        self.image.width() == 0 || self.image.height() == 0
    }
}
