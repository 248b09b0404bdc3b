//! Error types for the denoising harness.
//!
//! Configuration and shape problems are detected eagerly before any
//! training or inference work begins; numerical problems during training
//! are fatal so they can never corrupt best-checkpoint tracking.

use thiserror::Error;

/// Result type alias used throughout the crate
pub type Result<T> = std::result::Result<T, DenoiseError>;

/// All error conditions surfaced by the harness
#[derive(Debug, Error)]
pub enum DenoiseError {
    /// Missing or mismatched inputs, degenerate split fractions,
    /// unsupported model names
    #[error("configuration error: {0}")]
    Config(String),

    /// Degenerate preprocessing parameters (e.g. zero variance)
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Non-finite loss or metric during training; aborts the run
    #[error("numerical divergence: {0}")]
    NumericalDivergence(String),

    /// Unrecognized model output convention
    #[error("unsupported model type: {0}")]
    UnsupportedModelType(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Failure reading or writing a model weights artifact
    #[error("record error: {0}")]
    Record(String),
}
