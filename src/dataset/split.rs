//! Deterministic train/validation splitting.
//!
//! The split depends only on the dataset size, the seed, and the validation
//! fraction — never on the data values. That property is what lets the
//! inference runner rebuild the exact validation subset months later from
//! nothing but the seed stored in a checkpoint.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::utils::error::{DenoiseError, Result};

/// Default random seed used when none is supplied
pub const DEFAULT_SEED: u64 = 42;

/// Default fraction of examples held out for validation
pub const DEFAULT_VAL_FRACTION: f64 = 0.1;

/// Index partition of a dataset into training and validation subsets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainValSplit {
    /// Indices of training examples
    pub train: Vec<usize>,
    /// Indices of validation examples
    pub val: Vec<usize>,
}

impl TrainValSplit {
    /// Total number of indices in both partitions
    pub fn len(&self) -> usize {
        self.train.len() + self.val.len()
    }

    pub fn is_empty(&self) -> bool {
        self.train.is_empty() && self.val.is_empty()
    }
}

/// Partition `0..len` into train and validation index sets.
///
/// The shuffle is driven by a `ChaCha8Rng` seeded from `seed`, so two calls
/// with the same `(len, seed, val_fraction)` always produce identical
/// partitions. The validation set takes `ceil(len * val_fraction)` indices.
pub fn split_indices(len: usize, seed: u64, val_fraction: f64) -> Result<TrainValSplit> {
    if !(0.0..1.0).contains(&val_fraction) {
        return Err(DenoiseError::Config(format!(
            "validation fraction must be in [0, 1), got {}",
            val_fraction
        )));
    }

    let n_val = (len as f64 * val_fraction).ceil() as usize;
    if n_val == 0 {
        return Err(DenoiseError::Config(format!(
            "validation split is empty: {} examples at fraction {}",
            len, val_fraction
        )));
    }
    if n_val >= len {
        return Err(DenoiseError::Config(format!(
            "training split is empty: {} examples at fraction {}",
            len, val_fraction
        )));
    }

    let mut indices: Vec<usize> = (0..len).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let val = indices[..n_val].to_vec();
    let train = indices[n_val..].to_vec();

    Ok(TrainValSplit { train, val })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_split_is_deterministic() {
        let a = split_indices(500, 42, 0.1).unwrap();
        let b = split_indices(500, 42, 0.1).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = split_indices(500, 42, 0.1).unwrap();
        let b = split_indices(500, 43, 0.1).unwrap();
        assert_ne!(a.val, b.val);
    }

    #[test]
    fn test_partitions_are_disjoint_and_complete() {
        let split = split_indices(101, 7, 0.25).unwrap();
        let train: HashSet<_> = split.train.iter().copied().collect();
        let val: HashSet<_> = split.val.iter().copied().collect();

        assert!(train.is_disjoint(&val));
        assert_eq!(train.len() + val.len(), 101);
        assert_eq!(split.val.len(), (101.0f64 * 0.25).ceil() as usize);
    }

    #[test]
    fn test_empty_validation_partition_is_rejected() {
        assert!(split_indices(10, 42, 0.0).is_err());
    }

    #[test]
    fn test_empty_training_partition_is_rejected() {
        assert!(split_indices(1, 42, 0.5).is_err());
        assert!(split_indices(10, 42, 0.95).is_err());
    }

    #[test]
    fn test_split_ignores_data_only_count_matters() {
        // Same length, same seed: identical partition regardless of what
        // the underlying data would be.
        let a = split_indices(64, 9, 0.1).unwrap();
        let b = split_indices(64, 9, 0.1).unwrap();
        assert_eq!(a.train, b.train);
        assert_eq!(a.val, b.val);
    }
}
