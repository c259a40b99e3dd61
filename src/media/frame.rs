//! Data-URL JPEG codec for relayed video frames.
//!
//! Frames travel as `data:image/jpeg;base64,...` strings at capture
//! resolution. Decoding failures are not fatal anywhere in the system: the
//! relay is lossy by design and a malformed frame is simply skipped.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, RgbImage};
use thiserror::Error;

pub const DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

/// JPEG quality factor for outbound frames (0-100)
pub const JPEG_QUALITY: u8 = 60;

/// Reasons an inbound frame payload can be discarded
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("payload is not a JPEG data URL")]
    MissingPrefix,

    #[error("payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("payload is not a decodable JPEG: {0}")]
    Image(#[from] image::ImageError),
}

/// Encode a raster as a data-URL JPEG at the given quality.
pub fn encode_frame(image: &RgbImage, quality: u8) -> Result<String, image::ImageError> {
    let mut jpeg = Vec::new();
    image.write_with_encoder(JpegEncoder::new_with_quality(&mut jpeg, quality))?;
    Ok(format!("{}{}", DATA_URL_PREFIX, STANDARD.encode(&jpeg)))
}

/// Decode a data-URL JPEG into a raster.
pub fn decode_frame(data_url: &str) -> Result<RgbImage, DecodeError> {
    let encoded = data_url
        .strip_prefix(DATA_URL_PREFIX)
        .ok_or(DecodeError::MissingPrefix)?;
    let bytes = STANDARD.decode(encoded)?;
    let image = image::load_from_memory_with_format(&bytes, ImageFormat::Jpeg)?;
    Ok(image.to_rgb8())
}
