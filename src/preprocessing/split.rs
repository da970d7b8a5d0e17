//! Shuffled train/test split

use crate::error::{Result, ZinbError};
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Split settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Fraction of rows held out for testing
    pub test_size: f64,
    /// Seed of the shuffling stream
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            seed: 42,
        }
    }
}

impl SplitConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(ZinbError::InvalidParameter {
                name: "test_size".to_string(),
                value: self.test_size.to_string(),
                reason: "must lie strictly between 0 and 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Row indices of a single train/test split
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
}

impl TrainTestSplit {
    /// Gather the rows of `x` and `y` for both sides of the split
    pub fn apply(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
    ) -> (Array2<f64>, Array2<f64>, Array1<f64>, Array1<f64>) {
        (
            x.select(Axis(0), &self.train_indices),
            x.select(Axis(0), &self.test_indices),
            y.select(Axis(0), &self.train_indices),
            y.select(Axis(0), &self.test_indices),
        )
    }
}

/// Shuffle `0..n_samples` and hold out `ceil(n_samples * test_size)` rows.
///
/// Rows are split as given. When the caller has already stacked "before" and
/// "after" copies of the same segment, both copies are split independently,
/// so one segment can appear on both sides.
pub fn train_test_split(n_samples: usize, config: &SplitConfig) -> Result<TrainTestSplit> {
    config.validate()?;

    let n_test = (n_samples as f64 * config.test_size).ceil() as usize;
    if n_test == 0 || n_test >= n_samples {
        return Err(ZinbError::DataError(format!(
            "cannot split {} rows with test_size {}: both sides must be non-empty",
            n_samples, config.test_size
        )));
    }

    let mut indices: Vec<usize> = (0..n_samples).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    indices.shuffle(&mut rng);

    let train_indices = indices.split_off(n_test);
    Ok(TrainTestSplit {
        train_indices,
        test_indices: indices,
    })
}
