//! Batching of spectrum pairs for Burn.
//!
//! The batcher owns the standardization parameters and applies them to the
//! noisy inputs while building each batch, the single place where
//! preprocessing touches tensors. Batches also carry the raw noisy and
//! clean spectra so loss targets and metric reconstruction can consult
//! them without undoing the standardization.

use burn::data::dataloader::batcher::Batcher;
use burn::prelude::*;

use crate::dataset::loader::DetectorSpectra;
use crate::dataset::standardize::StandardizationParams;

/// One (noisy, clean) spectrum pair
#[derive(Debug, Clone)]
pub struct SpectrumItem {
    /// Raw noisy spectrum
    pub noisy: Vec<f32>,
    /// Clean target spectrum
    pub clean: Vec<f32>,
}

/// A batch of spectrum pairs, shape `(batch, 1, length)` per tensor
#[derive(Debug, Clone)]
pub struct SpectrumBatch<B: Backend> {
    /// Standardized noisy spectra fed to the model
    pub inputs: Tensor<B, 3>,
    /// Raw noisy spectra (residual reconstruction, baseline metrics)
    pub noisy: Tensor<B, 3>,
    /// Clean target spectra
    pub clean: Tensor<B, 3>,
}

/// Builds `SpectrumBatch`es, standardizing inputs with persisted parameters
#[derive(Debug, Clone)]
pub struct SpectrumBatcher {
    params: StandardizationParams,
}

impl SpectrumBatcher {
    /// Create a batcher that standardizes with the given parameters
    pub fn new(params: StandardizationParams) -> Self {
        Self { params }
    }
}

impl<B: Backend> Batcher<B, SpectrumItem, SpectrumBatch<B>> for SpectrumBatcher {
    fn batch(&self, items: Vec<SpectrumItem>, device: &B::Device) -> SpectrumBatch<B> {
        let batch_size = items.len();
        let len = items.first().map(|item| item.noisy.len()).unwrap_or(0);

        let mut noisy_data = Vec::with_capacity(batch_size * len);
        let mut input_data = Vec::with_capacity(batch_size * len);
        let mut clean_data = Vec::with_capacity(batch_size * len);

        for item in &items {
            noisy_data.extend_from_slice(&item.noisy);
            input_data.extend(item.noisy.iter().map(|&x| self.params.apply(x)));
            clean_data.extend_from_slice(&item.clean);
        }

        let shape = [batch_size, 1, len];
        let inputs = Tensor::<B, 3>::from_floats(TensorData::new(input_data, shape), device);
        let noisy = Tensor::<B, 3>::from_floats(TensorData::new(noisy_data, shape), device);
        let clean = Tensor::<B, 3>::from_floats(TensorData::new(clean_data, shape), device);

        SpectrumBatch {
            inputs,
            noisy,
            clean,
        }
    }
}

/// Flatten a `(batch, channels, length)` tensor into host memory
pub fn tensor_to_vec<B: Backend>(tensor: Tensor<B, 3>) -> Vec<f32> {
    tensor
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .unwrap()
}

/// Build items for the given example indices of a detector dataset
pub fn items_for_indices(spectra: &DetectorSpectra, indices: &[usize]) -> Vec<SpectrumItem> {
    indices
        .iter()
        .map(|&i| SpectrumItem {
            noisy: spectra.noisy_spectrum[i].clone(),
            clean: spectra.spectrum[i].clone(),
        })
        .collect()
}

/// Build items for every example of a detector dataset, in order
pub fn all_items(spectra: &DetectorSpectra) -> Vec<SpectrumItem> {
    let indices: Vec<usize> = (0..spectra.len()).collect();
    items_for_indices(spectra, &indices)
}
