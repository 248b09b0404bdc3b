//! Training loop, learning-rate adaptation, early stopping, and
//! checkpoint persistence.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::dataset::split::{DEFAULT_SEED, DEFAULT_VAL_FRACTION};
use crate::utils::error::{DenoiseError, Result};

pub mod checkpoint;
pub mod scheduler;
pub mod trainer;

pub use checkpoint::{Checkpoint, CheckpointMeta, EpochRecord, TrainingHistory};
pub use scheduler::ReduceOnPlateau;
pub use trainer::{run_training, EarlyStopping, TrainingOutcome};

/// Default number of training epochs
pub const DEFAULT_EPOCHS: usize = 1000;

/// Default batch size
pub const DEFAULT_BATCH_SIZE: usize = 16;

/// Default initial learning rate
pub const DEFAULT_LEARNING_RATE: f64 = 0.01;

/// Default early-stopping patience, in epochs without improvement
pub const DEFAULT_PATIENCE: usize = 20;

/// Hyperparameters of one training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Maximum number of epochs
    pub epochs: usize,
    /// Batch size for training and validation
    pub batch_size: usize,
    /// Initial learning rate
    pub learning_rate: f64,
    /// Epochs without improvement before early stopping
    pub patience: usize,
    /// Seed for splitting and training shuffle order
    pub seed: u64,
    /// Fraction of examples held out for validation
    pub val_fraction: f64,
    /// Directory receiving best/final checkpoints
    pub model_dir: PathBuf,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: DEFAULT_EPOCHS,
            batch_size: DEFAULT_BATCH_SIZE,
            learning_rate: DEFAULT_LEARNING_RATE,
            patience: DEFAULT_PATIENCE,
            seed: DEFAULT_SEED,
            val_fraction: DEFAULT_VAL_FRACTION,
            model_dir: PathBuf::from("models"),
        }
    }
}

impl TrainingConfig {
    /// Validate the configuration before any work begins
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(DenoiseError::Config(
                "epochs must be greater than 0".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(DenoiseError::Config(
                "batch_size must be greater than 0".to_string(),
            ));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(DenoiseError::Config(format!(
                "learning rate must be positive and finite, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(TrainingConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_batch_size_is_rejected() {
        let config = TrainingConfig {
            batch_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_finite_learning_rate_is_rejected() {
        let config = TrainingConfig {
            learning_rate: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
