//! Local perception: camera frames in, landmark feature vectors out.
//!
//! The pose extractor itself is an external capability supplied by the
//! embedding application; this module owns the feature-vector layout, the
//! per-frame pipeline and the synchronous local-canvas paint.

pub mod extractor;
pub mod landmark;
pub mod pipeline;

pub use extractor::{CaptureError, HandPoseExtractor};
pub use landmark::{flatten_hands, DetectedHand, HandLandmarkIndex, LandmarkPoint, MAX_HANDS};
pub use pipeline::{LandmarkEvent, PerceptionPipeline};
