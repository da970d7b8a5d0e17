//! Fully-connected layer and the activations used by the ZINB network

use ndarray::{Array1, Array2, Axis};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Dense (affine) layer: `z = x · W + b`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dense {
    pub(crate) weights: Array2<f64>,
    pub(crate) biases: Array1<f64>,
}

/// Gradients of a [`Dense`] layer's parameters
#[derive(Debug, Clone)]
pub struct DenseGrad {
    pub weights: Array2<f64>,
    pub biases: Array1<f64>,
}

impl Dense {
    /// Create a layer with weights and biases drawn from `U(-1/sqrt(n_in), 1/sqrt(n_in))`
    pub fn new<R: Rng>(n_in: usize, n_out: usize, rng: &mut R) -> Self {
        let bound = 1.0 / (n_in.max(1) as f64).sqrt();
        let weights = Array2::from_shape_fn((n_in, n_out), |_| rng.gen_range(-bound..bound));
        let biases = Array1::from_shape_fn(n_out, |_| rng.gen_range(-bound..bound));
        Self { weights, biases }
    }

    pub fn n_inputs(&self) -> usize {
        self.weights.nrows()
    }

    pub fn n_outputs(&self) -> usize {
        self.weights.ncols()
    }

    /// Number of learnable scalars
    pub fn n_params(&self) -> usize {
        self.weights.len() + self.biases.len()
    }

    pub fn forward(&self, x: &Array2<f64>) -> Array2<f64> {
        x.dot(&self.weights) + &self.biases
    }

    /// Backpropagate `delta = dL/dz` through the layer.
    ///
    /// Returns the parameter gradients and `dL/dx`.
    pub fn backward(&self, input: &Array2<f64>, delta: &Array2<f64>) -> (DenseGrad, Array2<f64>) {
        let grad = DenseGrad {
            weights: input.t().dot(delta),
            biases: delta.sum_axis(Axis(0)),
        };
        let d_input = delta.dot(&self.weights.t());
        (grad, d_input)
    }
}

pub fn relu(z: &Array2<f64>) -> Array2<f64> {
    z.mapv(|v| v.max(0.0))
}

pub fn relu_derivative(z: &Array2<f64>) -> Array2<f64> {
    z.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 })
}

/// Numerically stable logistic function
pub fn sigmoid(v: f64) -> f64 {
    if v >= 0.0 {
        1.0 / (1.0 + (-v).exp())
    } else {
        let e = v.exp();
        e / (1.0 + e)
    }
}

/// `ln(1 + e^v)` without overflow for large `v`
pub fn softplus(v: f64) -> f64 {
    v.max(0.0) + (-v.abs()).exp().ln_1p()
}
