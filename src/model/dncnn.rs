//! DnCNN architectures for 1D spectra, built with Burn.
//!
//! Both variants expose the same contract: a tensor of shape
//! `(batch, channels, length)` in, the same shape out. The residual
//! variant adds an input skip connection internally; which convention the
//! output follows downstream is recorded separately as `ModelType`.

use burn::module::Module;
use burn::nn::conv::{Conv1d, Conv1dConfig};
use burn::nn::{BatchNorm, BatchNormConfig, PaddingConfig1d, Relu};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::model::config::ModelConfig;

/// Capability interface for interchangeable denoising networks.
///
/// The harness only ever calls `forward` and never special-cases a
/// variant; new architectures plug in by implementing this trait.
pub trait Denoiser<B: Backend>: Module<B> {
    /// Map a batch of standardized noisy spectra, shape
    /// `(batch, channels, length)`, to an output of identical shape.
    fn forward(&self, spectra: Tensor<B, 3>) -> Tensor<B, 3>;
}

/// A hidden DnCNN block: Conv1d, BatchNorm, ReLU
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    conv: Conv1d<B>,
    bn: BatchNorm<B, 1>,
    relu: Relu,
}

impl<B: Backend> ConvBlock<B> {
    fn new(config: &ModelConfig, device: &B::Device) -> Self {
        let conv = Conv1dConfig::new(config.num_filters, config.num_filters, config.kernel_size)
            .with_stride(config.stride)
            .with_padding(PaddingConfig1d::Same)
            .with_bias(false)
            .init(device);
        let bn = BatchNormConfig::new(config.num_filters).init(device);

        Self {
            conv,
            bn,
            relu: Relu::new(),
        }
    }

    fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let x = self.conv.forward(x);
        let x = self.bn.forward(x);
        self.relu.forward(x)
    }
}

/// Plain DnCNN: input conv + ReLU, hidden conv/BN/ReLU blocks, output conv.
#[derive(Module, Debug)]
pub struct DnCnn<B: Backend> {
    input: Conv1d<B>,
    hidden: Vec<ConvBlock<B>>,
    output: Conv1d<B>,
}

impl<B: Backend> DnCnn<B> {
    /// Construct the network from its configuration. Allocates learnable
    /// parameters; performs no I/O.
    pub fn new(config: &ModelConfig, device: &B::Device) -> Self {
        let input = Conv1dConfig::new(config.num_channels, config.num_filters, config.kernel_size)
            .with_stride(config.stride)
            .with_padding(PaddingConfig1d::Same)
            .init(device);

        let hidden = (0..config.num_layers.saturating_sub(2))
            .map(|_| ConvBlock::new(config, device))
            .collect();

        let output = Conv1dConfig::new(config.num_filters, config.num_channels, config.kernel_size)
            .with_stride(config.stride)
            .with_padding(PaddingConfig1d::Same)
            .init(device);

        Self {
            input,
            hidden,
            output,
        }
    }

    fn features(&self, spectra: Tensor<B, 3>) -> Tensor<B, 3> {
        let mut x = Relu::new().forward(self.input.forward(spectra));
        for block in &self.hidden {
            x = block.forward(x);
        }
        self.output.forward(x)
    }
}

impl<B: Backend> Denoiser<B> for DnCnn<B> {
    fn forward(&self, spectra: Tensor<B, 3>) -> Tensor<B, 3> {
        self.features(spectra)
    }
}

/// Residual-learning DnCNN: the convolutional stack predicts a correction
/// term that is added to an input skip connection.
#[derive(Module, Debug)]
pub struct DnCnnRes<B: Backend> {
    core: DnCnn<B>,
}

impl<B: Backend> DnCnnRes<B> {
    /// Construct the network from its configuration
    pub fn new(config: &ModelConfig, device: &B::Device) -> Self {
        Self {
            core: DnCnn::new(config, device),
        }
    }
}

impl<B: Backend> Denoiser<B> for DnCnnRes<B> {
    fn forward(&self, spectra: Tensor<B, 3>) -> Tensor<B, 3> {
        let correction = self.core.features(spectra.clone());
        spectra + correction
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DefaultBackend;
    use crate::model::config::ModelKind;

    fn small_config(kind: ModelKind) -> ModelConfig {
        ModelConfig {
            kind,
            num_channels: 1,
            num_layers: 4,
            kernel_size: 3,
            stride: 1,
            num_filters: 8,
        }
    }

    #[test]
    fn test_dncnn_preserves_shape() {
        let device = Default::default();
        let config = small_config(ModelKind::DnCnn);
        let model = DnCnn::<DefaultBackend>::new(&config, &device);

        let input = Tensor::<DefaultBackend, 3>::zeros([2, 1, 64], &device);
        let output = model.forward(input);

        assert_eq!(output.dims(), [2, 1, 64]);
    }

    #[test]
    fn test_residual_variant_preserves_shape() {
        let device = Default::default();
        let config = small_config(ModelKind::DnCnnRes);
        let model = DnCnnRes::<DefaultBackend>::new(&config, &device);

        let input = Tensor::<DefaultBackend, 3>::zeros([3, 1, 32], &device);
        let output = model.forward(input);

        assert_eq!(output.dims(), [3, 1, 32]);
    }

    #[test]
    fn test_hidden_layer_count_follows_config() {
        let device = Default::default();
        let mut config = small_config(ModelKind::DnCnn);
        config.num_layers = 7;
        let model = DnCnn::<DefaultBackend>::new(&config, &device);

        assert_eq!(model.hidden.len(), 5);
    }
}
