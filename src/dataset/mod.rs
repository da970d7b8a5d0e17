//! Feature matrix and count targets
//!
//! [`build_before_after`] turns one road-segment table into a stacked
//! before/after dataset tagged by the `Is_After` indicator.

mod builder;

pub use builder::{
    build_before_after, target_columns, BeforeAfterDataset, EXCLUDED_COLUMNS, IS_AFTER_COLUMN,
};

use crate::error::{Result, ZinbError};
use ndarray::{Array1, Array2};

/// Named numeric columns, one row per observation
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    names: Vec<String>,
    values: Array2<f64>,
}

impl FeatureMatrix {
    pub fn new(names: Vec<String>, values: Array2<f64>) -> Result<Self> {
        if names.len() != values.ncols() {
            return Err(ZinbError::ShapeError {
                expected: format!("{} columns", names.len()),
                actual: format!("{} columns", values.ncols()),
            });
        }
        Ok(Self { names, values })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.values.ncols()
    }

    /// Position of a named column
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
}

/// Non-negative integer counts stored as `f64` for arithmetic
#[derive(Debug, Clone, PartialEq)]
pub struct TargetVector {
    values: Array1<f64>,
}

impl TargetVector {
    /// Validate that every value is a finite non-negative integer
    pub fn new(values: Array1<f64>) -> Result<Self> {
        if let Some((i, v)) = values
            .iter()
            .enumerate()
            .find(|(_, v)| !(v.is_finite() && **v >= 0.0 && v.fract() == 0.0))
        {
            return Err(ZinbError::DataError(format!(
                "target at row {} is {}, expected a non-negative integer count",
                i, v
            )));
        }
        Ok(Self { values })
    }

    pub fn values(&self) -> &Array1<f64> {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Share of zero counts
    pub fn zero_fraction(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().filter(|&&v| v == 0.0).count() as f64 / self.values.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_validation() {
        assert!(TargetVector::new(Array1::from(vec![0.0, 3.0, 12.0])).is_ok());
        assert!(TargetVector::new(Array1::from(vec![0.0, -1.0])).is_err());
        assert!(TargetVector::new(Array1::from(vec![1.5])).is_err());
        assert!(TargetVector::new(Array1::from(vec![f64::NAN])).is_err());
    }

    #[test]
    fn test_zero_fraction() {
        let t = TargetVector::new(Array1::from(vec![0.0, 0.0, 1.0, 4.0])).unwrap();
        assert!((t.zero_fraction() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_feature_matrix_shape_check() {
        let values = Array2::zeros((2, 3));
        assert!(FeatureMatrix::new(vec!["a".into(), "b".into()], values.clone()).is_err());
        let m = FeatureMatrix::new(vec!["a".into(), "b".into(), "c".into()], values).unwrap();
        assert_eq!(m.column_index("c"), Some(2));
    }
}
