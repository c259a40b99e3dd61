//! Raster frame encoding and decoding for the video relay.

pub mod frame;

pub use frame::{decode_frame, encode_frame, DecodeError, DATA_URL_PREFIX, JPEG_QUALITY};
