//! Backend selection for the denoising models.
//!
//! Device and environment configuration is isolated here and consulted once
//! at process start; the rest of the harness is generic over the Burn
//! backend and never touches global device state.

use burn::backend::ndarray::NdArrayDevice;
use burn::backend::{Autodiff, NdArray};

/// Default inference backend (portable CPU tensors)
pub type DefaultBackend = NdArray;

/// Autodiff backend used for training
pub type TrainingBackend = Autodiff<DefaultBackend>;

/// Get the default device for the selected backend
pub fn default_device() -> NdArrayDevice {
    NdArrayDevice::default()
}

/// Human-readable name for the current backend
pub fn backend_name() -> &'static str {
    "NdArray (CPU)"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_device_is_constructible() {
        let device = default_device();
        assert_eq!(device, NdArrayDevice::default());
    }
}
