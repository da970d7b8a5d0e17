//! Held-out evaluation of a frozen network

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ZinbError};
use crate::model::{zinb_loss, ZinbNetwork};

/// Held-out metrics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Mean ZINB negative log-likelihood
    pub loss: f64,
    /// Mean squared error of `(1 - pi) * mu` against the observed counts
    pub mse: f64,
    /// Share of observed counts equal to zero
    pub zero_fraction: f64,
    pub n_samples: usize,
}

/// Forward pass without gradients, loss and MSE of the point prediction
pub fn evaluate(network: &ZinbNetwork, x: &Array2<f64>, y: &Array1<f64>) -> Result<Evaluation> {
    if x.nrows() != y.len() {
        return Err(ZinbError::ShapeError {
            expected: format!("{} targets", x.nrows()),
            actual: format!("{} targets", y.len()),
        });
    }

    let params = network.forward(x)?;
    let loss = zinb_loss(y, &params)?;
    let prediction = params.expected_count();
    let n = y.len() as f64;
    let mse = prediction
        .iter()
        .zip(y.iter())
        .map(|(p, t)| (p - t).powi(2))
        .sum::<f64>()
        / n;
    let zero_fraction = y.iter().filter(|&&v| v == 0.0).count() as f64 / n;

    Ok(Evaluation {
        loss,
        mse,
        zero_fraction,
        n_samples: y.len(),
    })
}
