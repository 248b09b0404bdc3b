//! Logging, metrics, and error types shared across the harness.

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{DenoiseError, Result};
