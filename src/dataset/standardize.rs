//! Standardization of noisy input spectra.
//!
//! Parameters are fit exactly once, from the training partition only, and
//! travel with the checkpoint from then on. Every later call site applies
//! the persisted parameters; nothing is ever refit from validation or
//! inference data.

use serde::{Deserialize, Serialize};

use crate::utils::error::{DenoiseError, Result};

/// Mean/std statistics used to standardize model inputs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StandardizationParams {
    /// Mean over all elements of the training noisy spectra
    pub mean: f32,
    /// Population standard deviation over the same elements
    pub std: f32,
}

impl StandardizationParams {
    /// Compute parameters from the training partition's noisy spectra.
    ///
    /// Only the training controller may call this; everyone else loads the
    /// parameters from checkpoint metadata.
    pub fn fit(train_noisy: &[Vec<f32>]) -> Result<Self> {
        let count: usize = train_noisy.iter().map(|row| row.len()).sum();
        if count == 0 {
            return Err(DenoiseError::InvalidParameter(
                "cannot fit standardization on an empty training set".to_string(),
            ));
        }

        let sum: f64 = train_noisy
            .iter()
            .flat_map(|row| row.iter())
            .map(|&x| x as f64)
            .sum();
        let mean = sum / count as f64;

        let var: f64 = train_noisy
            .iter()
            .flat_map(|row| row.iter())
            .map(|&x| {
                let d = x as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / count as f64;
        let std = var.sqrt();

        if std == 0.0 || !std.is_finite() {
            return Err(DenoiseError::InvalidParameter(format!(
                "degenerate standardization: std = {} over {} training values",
                std, count
            )));
        }

        Ok(Self {
            mean: mean as f32,
            std: std as f32,
        })
    }

    /// Standardize a single value: `(x - mean) / std`
    #[inline]
    pub fn apply(&self, x: f32) -> f32 {
        (x - self.mean) / self.std
    }

    /// Undo standardization: `x * std + mean`
    #[inline]
    pub fn invert(&self, x: f32) -> f32 {
        x * self.std + self.mean
    }
}
