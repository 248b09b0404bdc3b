//! Spectra dataset reading and writing.
//!
//! Dataset files map a detector type (HPGE, NAI, CZT) to arrays of noisy
//! and clean spectra plus the shared keV energy axis. Shapes are validated
//! eagerly at load time so no training or inference work starts on
//! mismatched data.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::utils::error::{DenoiseError, Result};

/// Spectra for one detector type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorSpectra {
    /// Noisy measured spectra, shape (N, L)
    pub noisy_spectrum: Vec<Vec<f32>>,
    /// Clean target spectra, shape (N, L)
    pub spectrum: Vec<Vec<f32>>,
    /// Energy axis in keV shared by all spectra of this detector, shape (L,)
    #[serde(rename = "keV")]
    pub kev: Vec<f32>,
}

impl DetectorSpectra {
    /// Number of (noisy, clean) example pairs
    pub fn len(&self) -> usize {
        self.noisy_spectrum.len()
    }

    pub fn is_empty(&self) -> bool {
        self.noisy_spectrum.is_empty()
    }

    /// Number of samples per spectrum
    pub fn signal_len(&self) -> usize {
        self.kev.len()
    }

    /// Validate the shape invariants between noisy, clean, and the energy
    /// axis. Called once at load time and again by harness entry points.
    pub fn validate(&self) -> Result<()> {
        if self.noisy_spectrum.is_empty() {
            return Err(DenoiseError::Config(
                "dataset contains no spectra".to_string(),
            ));
        }

        let n = self.noisy_spectrum.len();
        let len = self.kev.len();

        if self.spectrum.len() != n {
            return Err(DenoiseError::Config(format!(
                "noisy/clean shape mismatch: ({},{}) vs ({},{})",
                n,
                len,
                self.spectrum.len(),
                len
            )));
        }

        for (i, (noisy, clean)) in self
            .noisy_spectrum
            .iter()
            .zip(self.spectrum.iter())
            .enumerate()
        {
            if noisy.len() != clean.len() {
                return Err(DenoiseError::Config(format!(
                    "noisy/clean shape mismatch at row {}: ({},{}) vs ({},{})",
                    i,
                    n,
                    noisy.len(),
                    n,
                    clean.len()
                )));
            }
            if noisy.len() != len {
                return Err(DenoiseError::Config(format!(
                    "spectrum/energy-axis length mismatch at row {}: {} vs {}",
                    i,
                    noisy.len(),
                    len
                )));
            }
        }

        Ok(())
    }

    /// Produce a copy with the noisy spectra replaced by denoised ones,
    /// keeping clean spectra and the energy axis. Used to build the
    /// inference output artifact.
    pub fn with_noisy_replaced(&self, denoised: Vec<Vec<f32>>) -> Result<Self> {
        if denoised.len() != self.len() {
            return Err(DenoiseError::Config(format!(
                "{} examples yet {} denoised",
                self.len(),
                denoised.len()
            )));
        }

        Ok(Self {
            noisy_spectrum: denoised,
            spectrum: self.spectrum.clone(),
            kev: self.kev.clone(),
        })
    }
}

/// A dataset file: detector type identifier to spectra
pub type SpectraFile = HashMap<String, DetectorSpectra>;

/// Load and validate the spectra for one detector type from a dataset file.
pub fn load_spectra(path: &Path, det_type: &str) -> Result<DetectorSpectra> {
    if !path.exists() {
        return Err(DenoiseError::Config(format!(
            "cannot find dataset file {}",
            path.display()
        )));
    }

    let json = std::fs::read_to_string(path)?;
    let file: SpectraFile = serde_json::from_str(&json)?;

    let key = det_type.to_uppercase();
    let spectra = file.get(&key).cloned().ok_or_else(|| {
        DenoiseError::Config(format!(
            "detector type {} not present in {}",
            key,
            path.display()
        ))
    })?;

    spectra.validate()?;
    info!(
        "Loaded {} spectra of {} samples for detector {}",
        spectra.len(),
        spectra.signal_len(),
        key
    );

    Ok(spectra)
}

/// Write the spectra for one detector type to a dataset file.
pub fn save_spectra(det_type: &str, spectra: &DetectorSpectra, path: &Path) -> Result<()> {
    spectra.validate()?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut file = SpectraFile::new();
    file.insert(det_type.to_uppercase(), spectra.clone());

    let json = serde_json::to_string(&file)?;
    std::fs::write(path, json)?;
    info!("Saved {} spectra to {}", spectra.len(), path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_spectra() -> DetectorSpectra {
        DetectorSpectra {
            noisy_spectrum: vec![vec![0.1, 0.2, 0.3], vec![0.4, 0.5, 0.6]],
            spectrum: vec![vec![0.0, 0.2, 0.2], vec![0.4, 0.4, 0.6]],
            kev: vec![10.0, 20.0, 30.0],
        }
    }

    #[test]
    fn test_valid_spectra_pass_validation() {
        assert!(sample_spectra().validate().is_ok());
    }

    #[test]
    fn test_shape_mismatch_names_both_shapes() {
        let mut spectra = sample_spectra();
        spectra.spectrum.pop();
        let err = spectra.validate().unwrap_err();
        assert!(err.to_string().contains("noisy/clean shape mismatch"));
        assert!(err.to_string().contains("(2,3) vs (1,3)"));
    }

    #[test]
    fn test_row_length_mismatch_is_rejected() {
        let mut spectra = sample_spectra();
        spectra.noisy_spectrum[1].push(0.7);
        assert!(spectra.validate().is_err());
    }

    #[test]
    fn test_energy_axis_mismatch_is_rejected() {
        let mut spectra = sample_spectra();
        spectra.kev.push(40.0);
        assert!(spectra.validate().is_err());
    }

    #[test]
    fn test_serde_round_trip() {
        let mut file = SpectraFile::new();
        file.insert("HPGE".to_string(), sample_spectra());

        let json = serde_json::to_string(&file).unwrap();
        assert!(json.contains("keV"));

        let back: SpectraFile = serde_json::from_str(&json).unwrap();
        let spectra = &back["HPGE"];
        assert_eq!(spectra.len(), 2);
        assert_eq!(spectra.kev, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_with_noisy_replaced_checks_count() {
        let spectra = sample_spectra();
        let denoised = vec![vec![0.0f32; 3]];
        let err = spectra.with_noisy_replaced(denoised).unwrap_err();
        assert!(err.to_string().contains("2 examples yet 1 denoised"));
    }
}
