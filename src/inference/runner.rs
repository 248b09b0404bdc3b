//! Inference over a persisted checkpoint.
//!
//! Rebuilds the training-time validation subset from the stored seed
//! (unless the whole dataset is requested), standardizes inputs with the
//! persisted parameters, runs the model without gradient tracking, undoes
//! the output convention, and reports per-batch and aggregate quality.

use std::path::Path;

use burn::data::dataloader::batcher::Batcher;
use burn::tensor::backend::Backend;
use tracing::info;

use crate::dataset::batch::{
    all_items, items_for_indices, tensor_to_vec, SpectrumBatch, SpectrumBatcher, SpectrumItem,
};
use crate::dataset::loader::DetectorSpectra;
use crate::dataset::split::split_indices;
use crate::model::config::ModelKind;
use crate::model::dncnn::{Denoiser, DnCnn, DnCnnRes};
use crate::training::checkpoint::Checkpoint;
use crate::utils::error::Result;
use crate::utils::metrics::psnr_of_batch;

/// Options for one denoising pass
#[derive(Debug, Clone)]
pub struct DenoiseOptions {
    /// Process every example instead of the reconstructed validation subset
    pub full_dataset: bool,
    /// Batch size for evaluation
    pub batch_size: usize,
    /// Override for the stored split seed
    pub seed: Option<u64>,
}

impl Default for DenoiseOptions {
    fn default() -> Self {
        Self {
            full_dataset: false,
            batch_size: 64,
            seed: None,
        }
    }
}

/// Aggregate results of a denoising pass
#[derive(Debug, Clone)]
pub struct DenoiseReport {
    /// Number of spectra processed
    pub examples: usize,
    /// Number of evaluation batches
    pub batches: usize,
    /// Mean per-batch PSNR of the raw noisy spectra vs. clean
    pub avg_psnr_noisy: f64,
    /// Mean per-batch PSNR of the denoised spectra vs. clean
    pub avg_psnr_denoised: f64,
    /// Denoised spectra in dataset order; present only for full-dataset
    /// passes, for the external dataset writer
    pub denoised: Option<Vec<Vec<f32>>>,
}

impl DenoiseReport {
    /// PSNR improvement over the noisy baseline
    pub fn improvement(&self) -> f64 {
        self.avg_psnr_denoised - self.avg_psnr_noisy
    }
}

/// Denoise spectra using a persisted checkpoint.
pub fn run_denoise<B: Backend>(
    checkpoint_base: &Path,
    spectra: &DetectorSpectra,
    options: &DenoiseOptions,
    device: &B::Device,
) -> Result<DenoiseReport> {
    spectra.validate()?;

    let checkpoint = Checkpoint::open(checkpoint_base)?;
    let meta = checkpoint.meta().clone();

    let items = if options.full_dataset {
        all_items(spectra)
    } else {
        let seed = options.seed.unwrap_or(meta.split_seed);
        let split = split_indices(spectra.len(), seed, meta.val_fraction)?;
        items_for_indices(spectra, &split.val)
    };

    info!(
        "Denoising {} spectra with {} ({}) from {}",
        items.len(),
        meta.model.kind,
        meta.model_type,
        checkpoint_base.display()
    );

    match meta.model.kind {
        ModelKind::DnCnn => {
            let model =
                checkpoint.load_model::<B, _>(DnCnn::new(&meta.model, device), device)?;
            denoise_with(&model, &checkpoint, &items, options, device)
        }
        ModelKind::DnCnnRes => {
            let model =
                checkpoint.load_model::<B, _>(DnCnnRes::new(&meta.model, device), device)?;
            denoise_with(&model, &checkpoint, &items, options, device)
        }
    }
}

fn denoise_with<B: Backend, M: Denoiser<B>>(
    model: &M,
    checkpoint: &Checkpoint,
    items: &[SpectrumItem],
    options: &DenoiseOptions,
    device: &B::Device,
) -> Result<DenoiseReport> {
    let meta = checkpoint.meta();
    let batcher = SpectrumBatcher::new(meta.standardization);
    let signal_len = items.first().map(|item| item.noisy.len()).unwrap_or(0);
    let num_batches = items.len().div_ceil(options.batch_size);

    let mut total_psnr_noisy = 0.0;
    let mut total_psnr_denoised = 0.0;
    let mut batches = 0usize;
    let mut denoised_rows: Vec<Vec<f32>> = Vec::new();

    for (num, chunk) in items.chunks(options.batch_size).enumerate() {
        let batch: SpectrumBatch<B> = batcher.batch(chunk.to_vec(), device);

        let preds = model.forward(batch.inputs.clone());
        let output = tensor_to_vec(preds);
        let noisy = tensor_to_vec(batch.noisy);
        let clean = tensor_to_vec(batch.clean);

        let denoised = meta.model_type.reconstruct_batch(&noisy, &output, signal_len);

        let psnr_noisy = psnr_of_batch(&clean, &noisy, signal_len);
        let psnr_denoised = psnr_of_batch(&clean, &denoised, signal_len);

        info!(
            "[{}/{}] PSNR {:.2} --> {:.2}, increase of {:.2}",
            num + 1,
            num_batches,
            psnr_noisy,
            psnr_denoised,
            psnr_denoised - psnr_noisy
        );

        total_psnr_noisy += psnr_noisy;
        total_psnr_denoised += psnr_denoised;
        batches += 1;

        if options.full_dataset {
            denoised_rows.extend(denoised.chunks_exact(signal_len).map(|row| row.to_vec()));
        }
    }

    let n = batches.max(1) as f64;
    Ok(DenoiseReport {
        examples: items.len(),
        batches,
        avg_psnr_noisy: total_psnr_noisy / n,
        avg_psnr_denoised: total_psnr_denoised / n,
        denoised: if options.full_dataset {
            Some(denoised_rows)
        } else {
            None
        },
    })
}
