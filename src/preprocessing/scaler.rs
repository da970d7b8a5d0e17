//! Standard (z-score) feature scaling

use crate::error::{Result, ZinbError};
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

/// Per-column statistics of a fitted scaler
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    /// Training mean
    pub center: f64,
    /// Training standard deviation, 1.0 for constant columns
    pub scale: f64,
}

/// Column-wise `(x - mean) / std` with statistics taken from the training split only
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StandardScaler {
    params: Vec<ScalerParams>,
    is_fitted: bool,
}

impl StandardScaler {
    /// Create a new, unfitted scaler
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit per-column mean and population standard deviation
    pub fn fit(&mut self, x: &Array2<f64>) -> Result<&mut Self> {
        if x.nrows() == 0 {
            return Err(ZinbError::InvalidInput("cannot fit scaler on zero rows".to_string()));
        }

        self.params = x
            .axis_iter(Axis(1))
            .map(|column| {
                let n = column.len() as f64;
                let mean = column.sum() / n;
                let var = column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
                let std = var.sqrt();
                ScalerParams {
                    center: mean,
                    scale: if std.is_finite() && std > f64::EPSILON { std } else { 1.0 },
                }
            })
            .collect();

        self.is_fitted = true;
        Ok(self)
    }

    /// Transform with the fitted statistics; never refits
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.check(x)?;
        let mut result = x.clone();
        for (mut column, params) in result.axis_iter_mut(Axis(1)).zip(self.params.iter()) {
            column.mapv_inplace(|v| (v - params.center) / params.scale);
        }
        Ok(result)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(x)?;
        self.transform(x)
    }

    /// Undo [`StandardScaler::transform`]
    pub fn inverse_transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.check(x)?;
        let mut result = x.clone();
        for (mut column, params) in result.axis_iter_mut(Axis(1)).zip(self.params.iter()) {
            column.mapv_inplace(|v| v * params.scale + params.center);
        }
        Ok(result)
    }

    pub fn params(&self) -> &[ScalerParams] {
        &self.params
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    fn check(&self, x: &Array2<f64>) -> Result<()> {
        if !self.is_fitted {
            return Err(ZinbError::ModelNotFitted);
        }
        if x.ncols() != self.params.len() {
            return Err(ZinbError::ShapeError {
                expected: format!("{} columns", self.params.len()),
                actual: format!("{} columns", x.ncols()),
            });
        }
        Ok(())
    }
}
