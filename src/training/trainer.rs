//! The training controller.
//!
//! Drives the full run: split, standardize, epoch loop with shuffled
//! training batches and deterministic validation batches, plateau-based
//! learning-rate adaptation, early stopping, and best/final checkpoint
//! persistence. A non-finite loss anywhere aborts the run so the best-loss
//! comparison is never polluted.

use std::path::PathBuf;

use burn::data::dataloader::batcher::Batcher;
use burn::module::AutodiffModule;
use burn::nn::loss::{MseLoss, Reduction};
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::tensor::backend::{AutodiffBackend, Backend};
use burn::tensor::{ElementConversion, Tensor};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::dataset::batch::{
    items_for_indices, tensor_to_vec, SpectrumBatch, SpectrumBatcher, SpectrumItem,
};
use crate::dataset::loader::DetectorSpectra;
use crate::dataset::split::split_indices;
use crate::dataset::standardize::StandardizationParams;
use crate::model::config::{ModelConfig, ModelKind, ModelType};
use crate::model::dncnn::{Denoiser, DnCnn, DnCnnRes};
use crate::training::checkpoint::{Checkpoint, CheckpointMeta, EpochRecord, TrainingHistory};
use crate::training::scheduler::ReduceOnPlateau;
use crate::training::TrainingConfig;
use crate::utils::error::{DenoiseError, Result};
use crate::utils::metrics::psnr_of_batch;

/// Early-stopping state: best validation loss seen and the number of
/// epochs since it last improved. Owned exclusively by the training
/// controller.
#[derive(Debug, Clone)]
pub struct EarlyStopping {
    best_val_loss: f64,
    epochs_since_improvement: usize,
    patience: usize,
}

impl EarlyStopping {
    pub fn new(patience: usize) -> Self {
        Self {
            best_val_loss: f64::INFINITY,
            epochs_since_improvement: 0,
            patience,
        }
    }

    /// Record an epoch's validation loss. Returns true when it improved
    /// on the best seen so far.
    pub fn observe(&mut self, val_loss: f64) -> bool {
        if val_loss < self.best_val_loss {
            self.best_val_loss = val_loss;
            self.epochs_since_improvement = 0;
            true
        } else {
            self.epochs_since_improvement += 1;
            false
        }
    }

    /// Whether training should halt. Stopping here is a success exit, not
    /// a failure.
    pub fn should_stop(&self) -> bool {
        self.epochs_since_improvement > self.patience
    }

    pub fn best_val_loss(&self) -> f64 {
        self.best_val_loss
    }

    pub fn epochs_since_improvement(&self) -> usize {
        self.epochs_since_improvement
    }
}

/// Summary of a finished training run
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    /// Per-epoch records, one per completed epoch
    pub history: TrainingHistory,
    /// Best validation loss reached
    pub best_val_loss: f64,
    /// Number of completed epochs
    pub epochs_run: usize,
    /// True when early stopping ended the run before `epochs`
    pub stopped_early: bool,
    /// Base path of the best checkpoint
    pub best_checkpoint: PathBuf,
    /// Base path of the final checkpoint
    pub final_checkpoint: PathBuf,
}

/// Train a denoising model on one detector's spectra.
///
/// Splits the dataset from the configured seed, fits standardization on
/// the training partition only, then dispatches to the configured network
/// variant.
pub fn run_training<B>(
    spectra: &DetectorSpectra,
    model_config: &ModelConfig,
    model_type: ModelType,
    config: &TrainingConfig,
) -> Result<TrainingOutcome>
where
    B: AutodiffBackend,
{
    spectra.validate()?;
    model_config.validate()?;
    config.validate()?;

    let split = split_indices(spectra.len(), config.seed, config.val_fraction)?;
    let train_items = items_for_indices(spectra, &split.train);
    let val_items = items_for_indices(spectra, &split.val);

    let train_noisy: Vec<Vec<f32>> = train_items.iter().map(|item| item.noisy.clone()).collect();
    let params = StandardizationParams::fit(&train_noisy)?;

    info!(
        "Training {} ({}) on {} examples, validating on {} (seed {})",
        model_config.kind,
        model_type,
        train_items.len(),
        val_items.len(),
        config.seed
    );
    info!(
        "Input shape to model forward will be ({}, {}, {})",
        config.batch_size,
        model_config.num_channels,
        spectra.signal_len()
    );

    let device = B::Device::default();
    match model_config.kind {
        ModelKind::DnCnn => fit::<B, DnCnn<B>>(
            DnCnn::new(model_config, &device),
            model_config,
            model_type,
            params,
            &train_items,
            &val_items,
            config,
            &device,
        ),
        ModelKind::DnCnnRes => fit::<B, DnCnnRes<B>>(
            DnCnnRes::new(model_config, &device),
            model_config,
            model_type,
            params,
            &train_items,
            &val_items,
            config,
            &device,
        ),
    }
}

/// The loss target for the model's raw output, per output convention
fn loss_target<B: Backend>(model_type: ModelType, batch: &SpectrumBatch<B>) -> Tensor<B, 3> {
    match model_type {
        ModelType::GenSpectrum => batch.clean.clone(),
        ModelType::ResidualSpectrum => batch.noisy.clone() - batch.clean.clone(),
    }
}

/// Sum-of-squared-error loss scaled by `1 / (2 * batch_size)`
fn batch_loss<B: Backend>(
    preds: Tensor<B, 3>,
    target: Tensor<B, 3>,
    batch_size: usize,
) -> Tensor<B, 1> {
    MseLoss::new()
        .forward(preds, target, Reduction::Sum)
        .div_scalar(2.0 * batch_size as f32)
}

#[allow(clippy::too_many_arguments)]
fn fit<B, M>(
    mut model: M,
    model_config: &ModelConfig,
    model_type: ModelType,
    params: StandardizationParams,
    train_items: &[SpectrumItem],
    val_items: &[SpectrumItem],
    config: &TrainingConfig,
    device: &B::Device,
) -> Result<TrainingOutcome>
where
    B: AutodiffBackend,
    M: Denoiser<B> + AutodiffModule<B>,
    M::InnerModule: Denoiser<B::InnerBackend>,
{
    let batcher = SpectrumBatcher::new(params);
    let signal_len = train_items
        .first()
        .map(|item| item.noisy.len())
        .unwrap_or(0);

    let mut optimizer = AdamConfig::new().init::<B, M>();
    let mut plateau = ReduceOnPlateau::new(config.learning_rate, 0.1, config.patience / 2, 0.0);
    let mut stopper = EarlyStopping::new(config.patience);
    let mut history = TrainingHistory::default();
    let mut lr = config.learning_rate;

    let meta = CheckpointMeta {
        model: model_config.clone(),
        model_type,
        standardization: params,
        split_seed: config.seed,
        val_fraction: config.val_fraction,
        history: history.clone(),
    };

    // Epoch-0 checkpoint: initial weights plus the immutable metadata.
    let mut best = Checkpoint::create(config.model_dir.join("best_model"), meta.clone())?;
    best.save::<B, M>(&model)?;

    // Training shuffle order derives from the split seed, never from an
    // independent entropy source.
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let inner_device = <B::InnerBackend as Backend>::Device::default();

    let mut epochs_run = 0;
    let mut stopped_early = false;

    for epoch in 0..config.epochs {
        debug!(
            "Starting epoch {}/{} with learning rate {}",
            epoch + 1,
            config.epochs,
            lr
        );

        let mut indices: Vec<usize> = (0..train_items.len()).collect();
        indices.shuffle(&mut rng);

        let mut train_loss_sum = 0.0;
        let mut num_batches = 0usize;

        for chunk in indices.chunks(config.batch_size) {
            let items: Vec<SpectrumItem> = chunk.iter().map(|&i| train_items[i].clone()).collect();
            let batch: SpectrumBatch<B> = batcher.batch(items, device);

            let preds = model.forward(batch.inputs.clone());
            let target = loss_target(model_type, &batch);
            let loss = batch_loss(preds, target, chunk.len());

            let loss_value: f64 = loss.clone().into_scalar().elem();
            if !loss_value.is_finite() {
                return Err(DenoiseError::NumericalDivergence(format!(
                    "non-finite training loss {} at epoch {} batch {}",
                    loss_value,
                    epoch + 1,
                    num_batches + 1
                )));
            }
            train_loss_sum += loss_value;
            num_batches += 1;

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optimizer.step(lr, model, grads);
        }

        let train_loss = train_loss_sum / num_batches.max(1) as f64;

        let model_valid = model.valid();
        let (val_loss, val_psnr) = validate_epoch::<B::InnerBackend, M::InnerModule>(
            &model_valid,
            &batcher,
            val_items,
            model_type,
            config.batch_size,
            signal_len,
            &inner_device,
            epoch,
        )?;

        lr = plateau.step(val_loss);
        history.push(EpochRecord {
            train_loss,
            val_loss,
            val_psnr,
        });
        epochs_run = epoch + 1;

        let improved = stopper.observe(val_loss);
        if improved {
            best.set_history(history.clone());
            best.save::<B, M>(&model)?;
        }

        info!(
            "Epoch {}: train loss {:.6} | val loss {:.6} | val PSNR {:.2} dB{}",
            epoch + 1,
            train_loss,
            val_loss,
            val_psnr,
            if improved { " (best)" } else { "" }
        );

        if stopper.should_stop() {
            info!(
                "Early stopping after {} epochs without improvement",
                stopper.epochs_since_improvement()
            );
            stopped_early = true;
            break;
        }
    }

    let mut final_checkpoint = Checkpoint::create(config.model_dir.join("final_model"), meta)?;
    final_checkpoint.set_history(history.clone());
    final_checkpoint.save::<B, M>(&model)?;

    Ok(TrainingOutcome {
        history,
        best_val_loss: stopper.best_val_loss(),
        epochs_run,
        stopped_early,
        best_checkpoint: best.base().to_path_buf(),
        final_checkpoint: final_checkpoint.base().to_path_buf(),
    })
}

/// Run the validation pass for one epoch: deterministic batch order, no
/// gradient tracking, loss plus PSNR of the reconstructed denoised signal.
#[allow(clippy::too_many_arguments)]
fn validate_epoch<B, M>(
    model: &M,
    batcher: &SpectrumBatcher,
    items: &[SpectrumItem],
    model_type: ModelType,
    batch_size: usize,
    signal_len: usize,
    device: &B::Device,
    epoch: usize,
) -> Result<(f64, f64)>
where
    B: Backend,
    M: Denoiser<B>,
{
    let mut loss_sum = 0.0;
    let mut psnr_sum = 0.0;
    let mut num_batches = 0usize;

    for chunk in items.chunks(batch_size) {
        let batch: SpectrumBatch<B> = batcher.batch(chunk.to_vec(), device);

        let preds = model.forward(batch.inputs.clone());
        let target = loss_target(model_type, &batch);
        let loss: f64 = batch_loss(preds.clone(), target, chunk.len())
            .into_scalar()
            .elem();

        if !loss.is_finite() {
            return Err(DenoiseError::NumericalDivergence(format!(
                "non-finite validation loss {} at epoch {}",
                loss,
                epoch + 1
            )));
        }

        let output = tensor_to_vec(preds);
        let noisy = tensor_to_vec(batch.noisy);
        let clean = tensor_to_vec(batch.clean);
        let denoised = model_type.reconstruct_batch(&noisy, &output, signal_len);

        loss_sum += loss;
        psnr_sum += psnr_of_batch(&clean, &denoised, signal_len);
        num_batches += 1;
    }

    let n = num_batches.max(1) as f64;
    Ok((loss_sum / n, psnr_sum / n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::TrainingBackend;

    #[test]
    fn test_early_stopping_halts_at_k_plus_patience_plus_one() {
        let patience = 3;
        let mut stopper = EarlyStopping::new(patience);

        // improves through epoch 2, flat afterwards
        let k = 2;
        let losses = [1.0, 0.8, 0.9, 0.9, 0.9, 0.9, 0.9, 0.9];

        let mut epochs_run = 0;
        for &loss in &losses {
            stopper.observe(loss);
            epochs_run += 1;
            if stopper.should_stop() {
                break;
            }
        }

        assert_eq!(epochs_run, k + patience + 1);
        assert_eq!(stopper.best_val_loss(), 0.8);
    }

    #[test]
    fn test_early_stopping_resets_on_improvement() {
        let mut stopper = EarlyStopping::new(2);

        stopper.observe(1.0);
        stopper.observe(1.1);
        stopper.observe(1.2);
        assert!(!stopper.should_stop());

        assert!(stopper.observe(0.9));
        assert_eq!(stopper.epochs_since_improvement(), 0);
    }

    #[test]
    fn test_loss_target_follows_model_type() {
        let params = StandardizationParams {
            mean: 0.0,
            std: 1.0,
        };
        let batcher = SpectrumBatcher::new(params);
        let device = Default::default();

        let items = vec![SpectrumItem {
            noisy: vec![1.0, 2.0, 3.0],
            clean: vec![0.5, 1.5, 2.5],
        }];
        let batch: SpectrumBatch<crate::backend::DefaultBackend> =
            batcher.batch(items, &device);

        let gen = tensor_to_vec(loss_target(ModelType::GenSpectrum, &batch));
        assert_eq!(gen, vec![0.5, 1.5, 2.5]);

        let residual = tensor_to_vec(loss_target(ModelType::ResidualSpectrum, &batch));
        assert_eq!(residual, vec![0.5, 0.5, 0.5]);
    }

    fn synthetic_spectra(n: usize, len: usize) -> DetectorSpectra {
        let clean: Vec<Vec<f32>> = (0..n)
            .map(|i| {
                (0..len)
                    .map(|j| ((i + j) as f32 * 0.1).sin().abs() * 0.5)
                    .collect()
            })
            .collect();
        let noisy: Vec<Vec<f32>> = clean
            .iter()
            .enumerate()
            .map(|(i, row)| {
                row.iter()
                    .enumerate()
                    .map(|(j, &x)| x + ((i * 37 + j * 13) % 7) as f32 * 0.01)
                    .collect()
            })
            .collect();

        DetectorSpectra {
            noisy_spectrum: noisy,
            spectrum: clean,
            kev: (0..len).map(|j| j as f32 * 10.0).collect(),
        }
    }

    #[test]
    fn test_training_run_writes_both_checkpoints() {
        let spectra = synthetic_spectra(12, 16);
        let model_config = ModelConfig {
            kind: ModelKind::DnCnn,
            num_channels: 1,
            num_layers: 3,
            kernel_size: 3,
            stride: 1,
            num_filters: 4,
        };
        let model_dir = std::env::temp_dir().join(format!(
            "gamma_denoise_trainer_test_{}",
            std::process::id()
        ));
        let config = TrainingConfig {
            epochs: 2,
            batch_size: 4,
            learning_rate: 0.001,
            patience: 4,
            seed: 42,
            val_fraction: 0.25,
            model_dir: model_dir.clone(),
        };

        let outcome = run_training::<TrainingBackend>(
            &spectra,
            &model_config,
            ModelType::GenSpectrum,
            &config,
        )
        .unwrap();

        assert_eq!(outcome.epochs_run, 2);
        assert_eq!(outcome.history.len(), 2);
        assert!(!outcome.stopped_early);
        assert!(model_dir.join("best_model.mpk").exists());
        assert!(model_dir.join("best_model.json").exists());
        assert!(model_dir.join("final_model.mpk").exists());
        assert!(model_dir.join("final_model.json").exists());

        let final_meta = Checkpoint::open(&outcome.final_checkpoint).unwrap();
        assert_eq!(final_meta.meta().split_seed, 42);
        assert_eq!(final_meta.meta().history.len(), 2);

        std::fs::remove_dir_all(&model_dir).ok();
    }
}
