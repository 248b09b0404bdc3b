//! Model configuration and output conventions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::utils::error::{DenoiseError, Result};

/// Which network variant to construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelKind {
    /// Plain convolutional stack
    #[serde(rename = "DnCNN")]
    DnCnn,
    /// Residual-learning variant with an input skip connection
    #[serde(rename = "DnCNN-res")]
    DnCnnRes,
}

impl FromStr for ModelKind {
    type Err = DenoiseError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "DnCNN" => Ok(Self::DnCnn),
            "DnCNN-res" => Ok(Self::DnCnnRes),
            other => Err(DenoiseError::Config(format!(
                "unsupported model name: {} (expected DnCNN or DnCNN-res)",
                other
            ))),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DnCnn => write!(f, "DnCNN"),
            Self::DnCnnRes => write!(f, "DnCNN-res"),
        }
    }
}

/// How the raw model output is interpreted downstream.
///
/// Stored in checkpoint metadata and consulted identically wherever a loss
/// target is built or a denoised spectrum is reconstructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelType {
    /// The output *is* the denoised spectrum
    #[serde(rename = "Gen-spectrum")]
    GenSpectrum,
    /// The output is the noise component; denoised = noisy - output
    #[serde(rename = "Residual-spectrum")]
    ResidualSpectrum,
}

impl ModelType {
    /// Reconstruct the denoised spectrum from the raw noisy spectrum and
    /// the model's raw output, per the recorded convention.
    pub fn reconstruct(&self, noisy: &[f32], output: &[f32]) -> Vec<f32> {
        match self {
            Self::GenSpectrum => output.to_vec(),
            Self::ResidualSpectrum => noisy
                .iter()
                .zip(output.iter())
                .map(|(&n, &o)| n - o)
                .collect(),
        }
    }

    /// Reconstruct a flattened batch of `signal_len`-sample spectra
    pub fn reconstruct_batch(&self, noisy: &[f32], output: &[f32], signal_len: usize) -> Vec<f32> {
        noisy
            .chunks_exact(signal_len)
            .zip(output.chunks_exact(signal_len))
            .flat_map(|(n, o)| self.reconstruct(n, o))
            .collect()
    }
}

impl FromStr for ModelType {
    type Err = DenoiseError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Gen-spectrum" => Ok(Self::GenSpectrum),
            "Residual-spectrum" => Ok(Self::ResidualSpectrum),
            other => Err(DenoiseError::UnsupportedModelType(format!(
                "{} (expected Gen-spectrum or Residual-spectrum)",
                other
            ))),
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GenSpectrum => write!(f, "Gen-spectrum"),
            Self::ResidualSpectrum => write!(f, "Residual-spectrum"),
        }
    }
}

/// Architecture hyperparameters, immutable for the lifetime of a trained
/// model. Fully determines the shape contract of the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Network variant
    pub kind: ModelKind,
    /// Input/output channels (1 for spectra)
    pub num_channels: usize,
    /// Total convolutional layers, including input and output layers
    pub num_layers: usize,
    /// Filter size of every convolutional layer
    pub kernel_size: usize,
    /// Filter stride; must stay 1 to preserve the length contract
    pub stride: usize,
    /// Filters per hidden convolutional layer
    pub num_filters: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            kind: ModelKind::DnCnn,
            num_channels: 1,
            num_layers: 20,
            kernel_size: 3,
            stride: 1,
            num_filters: 64,
        }
    }
}

impl ModelConfig {
    /// Validate the configuration before any parameters are allocated
    pub fn validate(&self) -> Result<()> {
        if self.num_channels == 0 {
            return Err(DenoiseError::Config(
                "num_channels must be greater than 0".to_string(),
            ));
        }

        if self.num_layers < 2 {
            return Err(DenoiseError::Config(format!(
                "num_layers must be at least 2 (input and output layers), got {}",
                self.num_layers
            )));
        }

        if self.kernel_size == 0 || self.kernel_size % 2 == 0 {
            return Err(DenoiseError::Config(format!(
                "kernel_size must be a positive odd number, got {}",
                self.kernel_size
            )));
        }

        if self.stride != 1 {
            return Err(DenoiseError::Config(format!(
                "stride must be 1 to keep output length equal to input length, got {}",
                self.stride
            )));
        }

        if self.num_filters == 0 {
            return Err(DenoiseError::Config(
                "num_filters must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_kind_parsing() {
        assert_eq!("DnCNN".parse::<ModelKind>().unwrap(), ModelKind::DnCnn);
        assert_eq!(
            "DnCNN-res".parse::<ModelKind>().unwrap(),
            ModelKind::DnCnnRes
        );
        assert!("ResNet".parse::<ModelKind>().is_err());
    }

    #[test]
    fn test_model_type_parsing() {
        assert_eq!(
            "Gen-spectrum".parse::<ModelType>().unwrap(),
            ModelType::GenSpectrum
        );
        assert_eq!(
            "Residual-spectrum".parse::<ModelType>().unwrap(),
            ModelType::ResidualSpectrum
        );

        let err = "Wavelet".parse::<ModelType>().unwrap_err();
        assert!(matches!(err, DenoiseError::UnsupportedModelType(_)));
    }

    #[test]
    fn test_reconstruct_conventions() {
        let noisy = [1.0f32, 2.0, 3.0];
        let output = [0.1f32, 0.2, 0.3];

        assert_eq!(
            ModelType::GenSpectrum.reconstruct(&noisy, &output),
            vec![0.1, 0.2, 0.3]
        );
        assert_eq!(
            ModelType::ResidualSpectrum.reconstruct(&noisy, &output),
            vec![0.9, 1.8, 2.7]
        );
    }

    #[test]
    fn test_model_type_serde_uses_wire_names() {
        let json = serde_json::to_string(&ModelType::GenSpectrum).unwrap();
        assert_eq!(json, "\"Gen-spectrum\"");

        let back: ModelType = serde_json::from_str("\"Residual-spectrum\"").unwrap();
        assert_eq!(back, ModelType::ResidualSpectrum);
    }

    #[test]
    fn test_config_default_is_valid() {
        assert!(ModelConfig::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_rejects_degenerate_values() {
        let mut config = ModelConfig::default();
        config.num_layers = 1;
        assert!(config.validate().is_err());

        let mut config = ModelConfig::default();
        config.kernel_size = 4;
        assert!(config.validate().is_err());

        let mut config = ModelConfig::default();
        config.stride = 2;
        assert!(config.validate().is_err());
    }
}
