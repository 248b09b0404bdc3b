//! # Gamma-Spectra Denoising
//!
//! A Rust library for training and applying convolutional noise-removal
//! models for one-dimensional gamma-ray energy spectra, built on the Burn
//! framework.
//!
//! ## Modules
//!
//! - `dataset`: spectra loading, deterministic splitting, standardization,
//!   and batching
//! - `model`: DnCNN network variants behind a common capability trait
//! - `training`: training loop, learning-rate adaptation, early stopping,
//!   and checkpoint persistence
//! - `inference`: checkpoint-driven denoising and quality reporting
//! - `utils`: logging, metrics, and error types
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use gamma_denoise::backend::TrainingBackend;
//! use gamma_denoise::dataset::load_spectra;
//! use gamma_denoise::model::{ModelConfig, ModelType};
//! use gamma_denoise::training::{run_training, TrainingConfig};
//!
//! let spectra = load_spectra("data/training.json".as_ref(), "HPGe")?;
//! let outcome = run_training::<TrainingBackend>(
//!     &spectra,
//!     &ModelConfig::default(),
//!     ModelType::GenSpectrum,
//!     &TrainingConfig::default(),
//! )?;
//! ```

pub mod backend;
pub mod dataset;
pub mod inference;
pub mod model;
pub mod training;
pub mod utils;

pub use dataset::loader::{load_spectra, save_spectra, DetectorSpectra};
pub use dataset::split::{split_indices, TrainValSplit};
pub use dataset::standardize::StandardizationParams;
pub use inference::runner::{run_denoise, DenoiseOptions, DenoiseReport};
pub use model::config::{ModelConfig, ModelKind, ModelType};
pub use model::dncnn::{Denoiser, DnCnn, DnCnnRes};
pub use training::checkpoint::{Checkpoint, CheckpointMeta, TrainingHistory};
pub use training::trainer::{run_training, TrainingOutcome};
pub use training::TrainingConfig;
pub use utils::error::{DenoiseError, Result};

/// Fixed PSNR data range; spectra are normalized to [0, 1] upstream
pub const DATA_RANGE: f64 = 1.0;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
