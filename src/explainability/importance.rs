//! Permutation feature importance on the ZINB loss

use crate::error::{Result, ZinbError};
use crate::model::{zinb_loss, ZinbNetwork};
use ndarray::{Array1, Array2};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Decimal places kept in reported scores
pub const IMPORTANCE_DECIMALS: i32 = 6;

/// Settings for the permutation probes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportanceConfig {
    /// Seed of the permutation generator; feature `i` uses ChaCha stream `i + 1`
    pub seed: u64,
    /// Probe features on the rayon pool
    pub parallel: bool,
}

impl Default for ImportanceConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            parallel: true,
        }
    }
}

/// Score of a single feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportanceRecord {
    pub feature: String,
    /// `permuted_loss - baseline_loss`, rounded
    pub importance: f64,
}

/// All features, most important first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportanceReport {
    pub baseline_loss: f64,
    pub records: Vec<ImportanceRecord>,
}

impl ImportanceReport {
    /// Score of a named feature
    pub fn importance_of(&self, feature: &str) -> Option<f64> {
        self.records
            .iter()
            .find(|r| r.feature == feature)
            .map(|r| r.importance)
    }

    /// 0-based rank of a named feature
    pub fn rank_of(&self, feature: &str) -> Option<usize> {
        self.records.iter().position(|r| r.feature == feature)
    }

    /// Get top k important features
    pub fn top_k(&self, k: usize) -> &[ImportanceRecord] {
        &self.records[..k.min(self.records.len())]
    }
}

fn round_score(value: f64) -> f64 {
    let factor = 10f64.powi(IMPORTANCE_DECIMALS);
    (value * factor).round() / factor
}

/// Loss increase caused by shuffling one feature at a time
pub struct PermutationImportance {
    config: ImportanceConfig,
}

impl PermutationImportance {
    pub fn new(config: ImportanceConfig) -> Self {
        Self { config }
    }

    /// Compute the baseline loss once, then probe every feature
    pub fn compute(
        &self,
        network: &ZinbNetwork,
        x: &Array2<f64>,
        y: &Array1<f64>,
        feature_names: &[String],
    ) -> Result<ImportanceReport> {
        let baseline = zinb_loss(y, &network.forward(x)?)?;
        self.compute_from_baseline(network, x, y, feature_names, baseline)
    }

    /// Probe every feature against an already known baseline loss
    pub fn compute_from_baseline(
        &self,
        network: &ZinbNetwork,
        x: &Array2<f64>,
        y: &Array1<f64>,
        feature_names: &[String],
        baseline_loss: f64,
    ) -> Result<ImportanceReport> {
        if feature_names.len() != x.ncols() {
            return Err(ZinbError::ShapeError {
                expected: format!("{} feature names", x.ncols()),
                actual: format!("{} feature names", feature_names.len()),
            });
        }
        if x.nrows() != y.len() {
            return Err(ZinbError::ShapeError {
                expected: format!("{} targets", x.nrows()),
                actual: format!("{} targets", y.len()),
            });
        }

        let probe = |feature_idx: usize| -> Result<ImportanceRecord> {
            let permuted_loss = self.permuted_loss(network, x, y, feature_idx)?;
            debug!(
                feature = %feature_names[feature_idx],
                permuted_loss,
                baseline_loss,
                "permutation probe"
            );
            Ok(ImportanceRecord {
                feature: feature_names[feature_idx].clone(),
                importance: round_score(permuted_loss - baseline_loss),
            })
        };

        let mut records: Vec<ImportanceRecord> = if self.config.parallel {
            (0..x.ncols()).into_par_iter().map(probe).collect::<Result<_>>()?
        } else {
            (0..x.ncols()).map(probe).collect::<Result<_>>()?
        };

        // Stable sort keeps column order among ties
        records.sort_by(|a, b| {
            b.importance
                .partial_cmp(&a.importance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(ImportanceReport {
            baseline_loss,
            records,
        })
    }

    /// Loss with column `feature_idx` replaced by a permutation of itself
    fn permuted_loss(
        &self,
        network: &ZinbNetwork,
        x: &Array2<f64>,
        y: &Array1<f64>,
        feature_idx: usize,
    ) -> Result<f64> {
        // Stream 0 of a seed is left to the train/test split
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        rng.set_stream(feature_idx as u64 + 1);
        let mut perm: Vec<usize> = (0..x.nrows()).collect();
        perm.shuffle(&mut rng);

        let original = x.column(feature_idx);
        let mut x_permuted = x.clone();
        for (row, &src) in perm.iter().enumerate() {
            x_permuted[[row, feature_idx]] = original[src];
        }

        zinb_loss(y, &network.forward(&x_permuted)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("f{}", i)).collect()
    }

    fn sample() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((30, 3), |(r, c)| ((r * (c + 1) * 7) % 13) as f64 / 6.0 - 1.0);
        let y = Array1::from_shape_fn(30, |r| (r % 4) as f64);
        (x, y)
    }

    #[test]
    fn test_ignored_feature_scores_zero() {
        let (x, y) = sample();
        let mut net = ZinbNetwork::new(3, 8).unwrap();
        // Disconnect feature 2 from the encoder
        net.layers_mut()[0].weights.row_mut(2).fill(0.0);

        let report = PermutationImportance::new(ImportanceConfig::default())
            .compute(&net, &x, &y, &names(3))
            .unwrap();
        assert_eq!(report.importance_of("f2"), Some(0.0));
        assert_eq!(report.records.len(), 3);
    }

    #[test]
    fn test_sorted_descending() {
        let (x, y) = sample();
        let net = ZinbNetwork::new(3, 2).unwrap();
        let report = PermutationImportance::new(ImportanceConfig::default())
            .compute(&net, &x, &y, &names(3))
            .unwrap();

        for pair in report.records.windows(2) {
            assert!(pair[0].importance >= pair[1].importance);
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let (x, y) = sample();
        let net = ZinbNetwork::new(3, 2).unwrap();
        let parallel = PermutationImportance::new(ImportanceConfig { seed: 5, parallel: true })
            .compute(&net, &x, &y, &names(3))
            .unwrap();
        let sequential = PermutationImportance::new(ImportanceConfig { seed: 5, parallel: false })
            .compute(&net, &x, &y, &names(3))
            .unwrap();
        assert_eq!(parallel.records, sequential.records);
    }

    #[test]
    fn test_input_is_not_modified() {
        let (x, y) = sample();
        let before = x.clone();
        let net = ZinbNetwork::new(3, 2).unwrap();
        PermutationImportance::new(ImportanceConfig::default())
            .compute(&net, &x, &y, &names(3))
            .unwrap();
        assert_eq!(x, before);
    }

    #[test]
    fn test_rounding_and_lookup() {
        assert_eq!(round_score(0.123456789), 0.123457);
        let report = ImportanceReport {
            baseline_loss: 1.0,
            records: vec![
                ImportanceRecord { feature: "a".into(), importance: 0.5 },
                ImportanceRecord { feature: "b".into(), importance: 0.1 },
            ],
        };
        assert_eq!(report.rank_of("b"), Some(1));
        assert_eq!(report.top_k(5).len(), 2);
        assert_eq!(report.importance_of("c"), None);
    }

    #[test]
    fn test_name_count_mismatch() {
        let (x, y) = sample();
        let net = ZinbNetwork::new(3, 2).unwrap();
        let result = PermutationImportance::new(ImportanceConfig::default()).compute(&net, &x, &y, &names(2));
        assert!(result.is_err());
    }
}
