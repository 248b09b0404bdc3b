//! Dataset loading, splitting, standardization, and batching.

pub mod batch;
pub mod loader;
pub mod split;
pub mod standardize;

pub use batch::{all_items, items_for_indices, SpectrumBatch, SpectrumBatcher, SpectrumItem};
pub use loader::{load_spectra, save_spectra, DetectorSpectra, SpectraFile};
pub use split::{split_indices, TrainValSplit, DEFAULT_SEED, DEFAULT_VAL_FRACTION};
pub use standardize::StandardizationParams;
