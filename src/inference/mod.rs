//! Checkpoint-driven inference and quality reporting.

pub mod runner;

pub use runner::{run_denoise, DenoiseOptions, DenoiseReport};
