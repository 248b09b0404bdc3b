//! Quality metrics for denoised spectra.
//!
//! PSNR is evaluated against a fixed data range of 1.0 because the spectra
//! produced by the dataset builder are normalized to [0, 1]. If that
//! guarantee ever changes, the fixed range here becomes wrong and has to be
//! revisited together with the dataset pipeline; it is deliberately not
//! inferred from the batch.

use crate::DATA_RANGE;

/// Peak signal-to-noise ratio between a reference and a candidate signal.
///
/// Returns `f64::INFINITY` when the two signals are identical (zero MSE).
pub fn psnr(reference: &[f32], candidate: &[f32], data_range: f64) -> f64 {
    debug_assert_eq!(reference.len(), candidate.len());

    let mse: f64 = reference
        .iter()
        .zip(candidate.iter())
        .map(|(&r, &c)| {
            let d = r as f64 - c as f64;
            d * d
        })
        .sum::<f64>()
        / reference.len() as f64;

    if mse == 0.0 {
        return f64::INFINITY;
    }

    10.0 * (data_range * data_range / mse).log10()
}

/// Mean PSNR over a batch of flattened signals.
///
/// `reference` and `candidate` hold `n` signals of `signal_len` samples
/// each, laid out contiguously.
pub fn psnr_of_batch(reference: &[f32], candidate: &[f32], signal_len: usize) -> f64 {
    debug_assert_eq!(reference.len(), candidate.len());
    debug_assert!(signal_len > 0 && reference.len() % signal_len == 0);

    let n = reference.len() / signal_len;
    let total: f64 = reference
        .chunks_exact(signal_len)
        .zip(candidate.chunks_exact(signal_len))
        .map(|(r, c)| psnr(r, c, DATA_RANGE))
        .sum();

    total / n as f64
}
