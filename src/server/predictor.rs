//! Sign prediction interface and sequence windowing.
//!
//! The model itself lives outside this crate; the endpoint only buffers a
//! sliding window of feature vectors and asks the injected predictor for a
//! label once the window is full.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::FeatureVector;

/// Frames per prediction window
pub const SEQUENCE_LENGTH: usize = 10;

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("prediction failed: {0}")]
    Inference(String),
}

/// One model output
#[derive(Debug, Clone, PartialEq)]
pub struct PredictorOutput {
    pub label: String,
    pub confidence: f64,
}

/// Sequence-to-label prediction capability.
///
/// `predict` receives the full current window and may return `None` when the
/// model has no confident label for it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SignPredictor: Send + Sync {
    async fn predict(
        &self,
        sequence: &[FeatureVector],
    ) -> Result<Option<PredictorOutput>, PredictError>;
}

/// Fixed-size sliding window of the most recent feature vectors.
#[derive(Debug, Default)]
pub struct SequenceBuffer {
    frames: Vec<FeatureVector>,
}

impl SequenceBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one vector, discarding the oldest once the window is full.
    pub fn push(&mut self, vector: FeatureVector) {
        self.frames.push(vector);
        if self.frames.len() > SEQUENCE_LENGTH {
            self.frames.remove(0);
        }
    }

    /// The full window, or `None` while it is still filling
    pub fn window(&self) -> Option<&[FeatureVector]> {
        if self.frames.len() == SEQUENCE_LENGTH {
            Some(&self.frames)
        } else {
            None
        }
    }

    pub fn reset(&mut self) {
        self.frames.clear();
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Baseline predictor that labels every full window with a fixed output.
///
/// Useful for exercising the endpoint without a trained model.
#[derive(Debug, Clone)]
pub struct ConstantPredictor {
    pub output: PredictorOutput,
}

impl ConstantPredictor {
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        Self {
            output: PredictorOutput {
                label: label.into(),
                confidence,
            },
        }
    }
}

#[async_trait]
impl SignPredictor for ConstantPredictor {
    async fn predict(
        &self,
        _sequence: &[FeatureVector],
    ) -> Result<Option<PredictorOutput>, PredictError> {
        Ok(Some(self.output.clone()))
    }
}
