//! The relay backend: pair-scoped chat and video relays plus the shared
//! sign-prediction endpoint.

pub mod handler;
pub mod predictor;
pub mod runner;
pub mod signal;
pub mod state;

pub use predictor::{
    ConstantPredictor, PredictError, PredictorOutput, SequenceBuffer, SignPredictor,
    SEQUENCE_LENGTH,
};
pub use runner::{router, run_server};
