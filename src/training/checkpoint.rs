//! Checkpoint persistence.
//!
//! A checkpoint couples the model weights with the metadata needed to
//! reuse them: architecture config, standardization parameters, split
//! seed, output convention, and training history. Weights (`<base>.mpk`)
//! and metadata (`<base>.json`) always travel as one unit; keeping them in
//! a single value type is what stops the two halves from drifting apart.

use std::path::{Path, PathBuf};

use burn::module::Module;
use burn::record::CompactRecorder;
use burn::tensor::backend::Backend;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dataset::standardize::StandardizationParams;
use crate::model::config::{ModelConfig, ModelType};
use crate::utils::error::{DenoiseError, Result};

/// Metrics of one completed training epoch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochRecord {
    pub train_loss: f64,
    pub val_loss: f64,
    pub val_psnr: f64,
}

/// Append-only per-epoch training record, one entry per completed epoch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub epochs: Vec<EpochRecord>,
}

impl TrainingHistory {
    pub fn push(&mut self, record: EpochRecord) {
        self.epochs.push(record);
    }

    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    pub fn last(&self) -> Option<&EpochRecord> {
        self.epochs.last()
    }
}

/// Everything needed to reuse a set of weights correctly.
///
/// The config, standardization, seed, and type fields are written once at
/// checkpoint creation and never change; only the history grows as epochs
/// complete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointMeta {
    pub model: ModelConfig,
    pub model_type: ModelType,
    pub standardization: StandardizationParams,
    pub split_seed: u64,
    pub val_fraction: f64,
    pub history: TrainingHistory,
}

/// A weights + metadata pair on disk, addressed by a common base path
/// (without extension).
#[derive(Debug, Clone)]
pub struct Checkpoint {
    base: PathBuf,
    meta: CheckpointMeta,
}

impl Checkpoint {
    /// Create a new checkpoint at `base`, persisting the metadata
    /// immediately. Weights follow with the first [`Checkpoint::save`].
    pub fn create(base: impl Into<PathBuf>, meta: CheckpointMeta) -> Result<Self> {
        let base = base.into();
        if let Some(parent) = base.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let checkpoint = Self { base, meta };
        checkpoint.write_meta()?;
        Ok(checkpoint)
    }

    /// Open an existing checkpoint, requiring both halves of the pair to
    /// be present.
    pub fn open(base: impl Into<PathBuf>) -> Result<Self> {
        let base = base.into();
        let meta_path = base.with_extension("json");
        let weights_path = base.with_extension("mpk");

        if !meta_path.exists() {
            return Err(DenoiseError::Config(format!(
                "cannot find checkpoint metadata {}",
                meta_path.display()
            )));
        }
        if !weights_path.exists() {
            return Err(DenoiseError::Config(format!(
                "cannot find checkpoint weights {} next to {}",
                weights_path.display(),
                meta_path.display()
            )));
        }

        let json = std::fs::read_to_string(&meta_path)?;
        let meta: CheckpointMeta = serde_json::from_str(&json)?;

        Ok(Self { base, meta })
    }

    pub fn meta(&self) -> &CheckpointMeta {
        &self.meta
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn weights_path(&self) -> PathBuf {
        self.base.with_extension("mpk")
    }

    pub fn meta_path(&self) -> PathBuf {
        self.base.with_extension("json")
    }

    /// Replace the recorded training history. The immutable metadata
    /// fields are untouched.
    pub fn set_history(&mut self, history: TrainingHistory) {
        self.meta.history = history;
    }

    /// Persist weights and metadata together.
    pub fn save<B: Backend, M: Module<B>>(&self, model: &M) -> Result<()> {
        model
            .clone()
            .save_file(self.base.clone(), &CompactRecorder::new())
            .map_err(|e| {
                DenoiseError::Record(format!(
                    "failed to save weights to {}: {:?}",
                    self.weights_path().display(),
                    e
                ))
            })?;
        self.write_meta()?;

        info!(
            "Checkpoint saved to {} ({} epochs recorded)",
            self.base.display(),
            self.meta.history.len()
        );
        Ok(())
    }

    /// Load the stored weights into a freshly constructed model.
    pub fn load_model<B: Backend, M: Module<B>>(&self, model: M, device: &B::Device) -> Result<M> {
        model
            .load_file(self.base.clone(), &CompactRecorder::new(), device)
            .map_err(|e| {
                DenoiseError::Record(format!(
                    "failed to load weights from {}: {:?}",
                    self.weights_path().display(),
                    e
                ))
            })
    }

    fn write_meta(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.meta)?;
        std::fs::write(self.meta_path(), json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DefaultBackend;
    use crate::dataset::split::split_indices;
    use crate::model::config::ModelKind;
    use crate::model::dncnn::DnCnn;

    fn sample_meta() -> CheckpointMeta {
        CheckpointMeta {
            model: ModelConfig {
                kind: ModelKind::DnCnn,
                num_channels: 1,
                num_layers: 3,
                kernel_size: 3,
                stride: 1,
                num_filters: 4,
            },
            model_type: ModelType::GenSpectrum,
            standardization: StandardizationParams {
                mean: 0.25,
                std: 0.5,
            },
            split_seed: 42,
            val_fraction: 0.1,
            history: TrainingHistory::default(),
        }
    }

    fn temp_base(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("gamma_denoise_{}_{}", name, std::process::id()))
            .join("model")
    }

    #[test]
    fn test_checkpoint_round_trip() {
        let base = temp_base("round_trip");
        let device = Default::default();
        let meta = sample_meta();

        let checkpoint = Checkpoint::create(&base, meta.clone()).unwrap();
        let model = DnCnn::<DefaultBackend>::new(&meta.model, &device);
        checkpoint.save::<DefaultBackend, _>(&model).unwrap();

        let reopened = Checkpoint::open(&base).unwrap();
        assert_eq!(reopened.meta(), &meta);

        let fresh = DnCnn::<DefaultBackend>::new(&meta.model, &device);
        let loaded = reopened
            .load_model::<DefaultBackend, _>(fresh, &device)
            .unwrap();
        drop(loaded);

        std::fs::remove_dir_all(base.parent().unwrap()).ok();
    }

    #[test]
    fn test_open_requires_both_halves() {
        let base = temp_base("missing_weights");
        let checkpoint = Checkpoint::create(&base, sample_meta()).unwrap();
        drop(checkpoint);

        // metadata exists but weights were never written
        let err = Checkpoint::open(&base).unwrap_err();
        assert!(err.to_string().contains("checkpoint weights"));

        std::fs::remove_dir_all(base.parent().unwrap()).ok();
    }

    #[test]
    fn test_stored_seed_reproduces_validation_subset() {
        let base = temp_base("seed_coupling");
        let device = Default::default();
        let meta = sample_meta();

        let run_split = split_indices(200, meta.split_seed, meta.val_fraction).unwrap();

        let checkpoint = Checkpoint::create(&base, meta.clone()).unwrap();
        let model = DnCnn::<DefaultBackend>::new(&meta.model, &device);
        checkpoint.save::<DefaultBackend, _>(&model).unwrap();

        let reopened = Checkpoint::open(&base).unwrap();
        let replayed = split_indices(
            200,
            reopened.meta().split_seed,
            reopened.meta().val_fraction,
        )
        .unwrap();

        assert_eq!(run_split.val, replayed.val);

        std::fs::remove_dir_all(base.parent().unwrap()).ok();
    }

    #[test]
    fn test_history_grows_without_touching_config() {
        let base = temp_base("history");
        let mut checkpoint = Checkpoint::create(&base, sample_meta()).unwrap();

        let mut history = TrainingHistory::default();
        history.push(EpochRecord {
            train_loss: 0.5,
            val_loss: 0.4,
            val_psnr: 18.0,
        });
        checkpoint.set_history(history);

        assert_eq!(checkpoint.meta().history.len(), 1);
        assert_eq!(checkpoint.meta().split_seed, 42);

        std::fs::remove_dir_all(base.parent().unwrap()).ok();
    }
}
