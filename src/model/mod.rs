//! Denoising network variants and their configuration.

pub mod config;
pub mod dncnn;

pub use config::{ModelConfig, ModelKind, ModelType};
pub use dncnn::{Denoiser, DnCnn, DnCnnRes};
