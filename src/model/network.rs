//! Three-headed ZINB network
//!
//! A shared encoder (`D -> 64 -> 32`, ReLU) feeds three independent heads
//! (`32 -> 16 -> 1`, ReLU hidden stage):
//! - `pi` head: raw zero-inflation logit
//! - `mu` head: softplus + floor, the negative-binomial mean
//! - `theta` head: softplus + floor, the negative-binomial dispersion

use ndarray::{Array1, Array2, Axis};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::layers::{relu, relu_derivative, sigmoid, softplus, Dense, DenseGrad};
use crate::error::{Result, ZinbError};

/// Width of the first encoder stage
pub const ENCODER_HIDDEN: usize = 64;
/// Width of the shared representation
pub const ENCODER_OUTPUT: usize = 32;
/// Width of each head's hidden stage
pub const HEAD_HIDDEN: usize = 16;
/// Additive floor applied to `mu` and `theta`
pub const POSITIVE_FLOOR: f64 = 1e-6;

/// Per-row distribution parameters produced by the network
#[derive(Debug, Clone)]
pub struct DistributionParams {
    /// Zero-inflation logit; `pi = sigmoid(pi_logit)`
    pub pi_logit: Array1<f64>,
    /// Negative-binomial mean, strictly positive
    pub mu: Array1<f64>,
    /// Negative-binomial dispersion, strictly positive
    pub theta: Array1<f64>,
}

impl DistributionParams {
    pub fn len(&self) -> usize {
        self.mu.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mu.is_empty()
    }

    /// Structural-zero probability per row
    pub fn pi(&self) -> Array1<f64> {
        self.pi_logit.mapv(sigmoid)
    }

    /// Point prediction `(1 - pi) * mu`
    pub fn expected_count(&self) -> Array1<f64> {
        (1.0 - self.pi()) * &self.mu
    }
}

/// How a head maps its last pre-activation to a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeadOutput {
    /// Identity, used for the zero-inflation logit
    Logit,
    /// `softplus(z) + POSITIVE_FLOOR`
    Positive,
}

/// One parameter head: `32 -> 16 (ReLU) -> 1`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Head {
    hidden: Dense,
    output: Dense,
    kind: HeadOutput,
}

struct HeadCache {
    hidden_pre: Array2<f64>,
    hidden: Array2<f64>,
    output_pre: Array1<f64>,
}

impl Head {
    fn new(kind: HeadOutput, rng: &mut Xoshiro256PlusPlus) -> Self {
        Self {
            hidden: Dense::new(ENCODER_OUTPUT, HEAD_HIDDEN, rng),
            output: Dense::new(HEAD_HIDDEN, 1, rng),
            kind,
        }
    }

    fn activate(&self, z: f64) -> f64 {
        match self.kind {
            HeadOutput::Logit => z,
            HeadOutput::Positive => softplus(z) + POSITIVE_FLOOR,
        }
    }

    fn activate_derivative(&self, z: f64) -> f64 {
        match self.kind {
            HeadOutput::Logit => 1.0,
            HeadOutput::Positive => sigmoid(z),
        }
    }

    /// Inference path, nothing retained
    fn predict(&self, shared: &Array2<f64>) -> Array1<f64> {
        let hidden = relu(&self.hidden.forward(shared));
        self.output
            .forward(&hidden)
            .index_axis_move(Axis(1), 0)
            .mapv(|z| self.activate(z))
    }

    fn forward(&self, shared: &Array2<f64>) -> (Array1<f64>, HeadCache) {
        let hidden_pre = self.hidden.forward(shared);
        let hidden = relu(&hidden_pre);
        let output_pre = self.output.forward(&hidden).index_axis_move(Axis(1), 0);
        let value = output_pre.mapv(|z| self.activate(z));
        (
            value,
            HeadCache {
                hidden_pre,
                hidden,
                output_pre,
            },
        )
    }

    /// Returns `[hidden_grad, output_grad]` and `dL/dshared`
    fn backward(
        &self,
        shared: &Array2<f64>,
        cache: &HeadCache,
        d_value: &Array1<f64>,
    ) -> ([DenseGrad; 2], Array2<f64>) {
        let d_out: Array1<f64> = d_value
            .iter()
            .zip(cache.output_pre.iter())
            .map(|(&g, &z)| g * self.activate_derivative(z))
            .collect();
        let d_out = d_out.insert_axis(Axis(1));

        let (output_grad, d_hidden) = self.output.backward(&cache.hidden, &d_out);
        let d_hidden_pre = d_hidden * relu_derivative(&cache.hidden_pre);
        let (hidden_grad, d_shared) = self.hidden.backward(shared, &d_hidden_pre);

        ([hidden_grad, output_grad], d_shared)
    }
}

/// Intermediate values kept from a training forward pass
pub struct ForwardCache {
    input: Array2<f64>,
    enc1_pre: Array2<f64>,
    enc1: Array2<f64>,
    enc2_pre: Array2<f64>,
    shared: Array2<f64>,
    pi: HeadCache,
    mu: HeadCache,
    theta: HeadCache,
}

/// Gradients for every layer, in [`ZinbNetwork::layers_mut`] order
#[derive(Debug, Clone)]
pub struct NetworkGradients {
    pub layers: Vec<DenseGrad>,
}

/// Zero-inflated negative-binomial network
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZinbNetwork {
    n_features: usize,
    encoder: [Dense; 2],
    pi_head: Head,
    mu_head: Head,
    theta_head: Head,
}

impl ZinbNetwork {
    /// Build a freshly initialised network. The same seed always yields the same parameters.
    pub fn new(n_features: usize, seed: u64) -> Result<Self> {
        if n_features == 0 {
            return Err(ZinbError::InvalidParameter {
                name: "n_features".to_string(),
                value: "0".to_string(),
                reason: "network needs at least one input feature".to_string(),
            });
        }

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let encoder = [
            Dense::new(n_features, ENCODER_HIDDEN, &mut rng),
            Dense::new(ENCODER_HIDDEN, ENCODER_OUTPUT, &mut rng),
        ];
        let pi_head = Head::new(HeadOutput::Logit, &mut rng);
        let mu_head = Head::new(HeadOutput::Positive, &mut rng);
        let theta_head = Head::new(HeadOutput::Positive, &mut rng);

        Ok(Self {
            n_features,
            encoder,
            pi_head,
            mu_head,
            theta_head,
        })
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Total number of learnable scalars
    pub fn n_params(&self) -> usize {
        self.layers().iter().map(|l| l.n_params()).sum()
    }

    /// Inference-only forward pass; keeps no activations
    pub fn forward(&self, x: &Array2<f64>) -> Result<DistributionParams> {
        self.check_input(x)?;

        let hidden = relu(&self.encoder[0].forward(x));
        let shared = relu(&self.encoder[1].forward(&hidden));

        Ok(DistributionParams {
            pi_logit: self.pi_head.predict(&shared),
            mu: self.mu_head.predict(&shared),
            theta: self.theta_head.predict(&shared),
        })
    }

    /// Point predictions `(1 - pi) * mu`
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        Ok(self.forward(x)?.expected_count())
    }

    /// Forward pass that keeps the activations needed by [`ZinbNetwork::backward`]
    pub fn forward_with_cache(&self, x: &Array2<f64>) -> Result<(DistributionParams, ForwardCache)> {
        self.check_input(x)?;

        let enc1_pre = self.encoder[0].forward(x);
        let enc1 = relu(&enc1_pre);
        let enc2_pre = self.encoder[1].forward(&enc1);
        let shared = relu(&enc2_pre);

        let (pi_logit, pi) = self.pi_head.forward(&shared);
        let (mu, mu_cache) = self.mu_head.forward(&shared);
        let (theta, theta_cache) = self.theta_head.forward(&shared);

        let cache = ForwardCache {
            input: x.clone(),
            enc1_pre,
            enc1,
            enc2_pre,
            shared,
            pi,
            mu: mu_cache,
            theta: theta_cache,
        };

        Ok((DistributionParams { pi_logit, mu, theta }, cache))
    }

    /// Backpropagate the loss gradients w.r.t. `(pi_logit, mu, theta)` to every parameter
    pub fn backward(
        &self,
        cache: &ForwardCache,
        d_pi_logit: &Array1<f64>,
        d_mu: &Array1<f64>,
        d_theta: &Array1<f64>,
    ) -> NetworkGradients {
        let ([pi_h, pi_o], d_shared_pi) = self.pi_head.backward(&cache.shared, &cache.pi, d_pi_logit);
        let ([mu_h, mu_o], d_shared_mu) = self.mu_head.backward(&cache.shared, &cache.mu, d_mu);
        let ([theta_h, theta_o], d_shared_theta) =
            self.theta_head.backward(&cache.shared, &cache.theta, d_theta);

        let d_shared = d_shared_pi + d_shared_mu + d_shared_theta;
        let d_enc2_pre = d_shared * relu_derivative(&cache.enc2_pre);
        let (enc2_grad, d_enc1) = self.encoder[1].backward(&cache.enc1, &d_enc2_pre);
        let d_enc1_pre = d_enc1 * relu_derivative(&cache.enc1_pre);
        let (enc1_grad, _) = self.encoder[0].backward(&cache.input, &d_enc1_pre);

        NetworkGradients {
            layers: vec![enc1_grad, enc2_grad, pi_h, pi_o, mu_h, mu_o, theta_h, theta_o],
        }
    }

    fn layers(&self) -> [&Dense; 8] {
        [
            &self.encoder[0],
            &self.encoder[1],
            &self.pi_head.hidden,
            &self.pi_head.output,
            &self.mu_head.hidden,
            &self.mu_head.output,
            &self.theta_head.hidden,
            &self.theta_head.output,
        ]
    }

    /// Mutable access for the optimizer; order matches [`NetworkGradients::layers`]
    pub(crate) fn layers_mut(&mut self) -> [&mut Dense; 8] {
        let [enc1, enc2] = &mut self.encoder;
        [
            enc1,
            enc2,
            &mut self.pi_head.hidden,
            &mut self.pi_head.output,
            &mut self.mu_head.hidden,
            &mut self.mu_head.output,
            &mut self.theta_head.hidden,
            &mut self.theta_head.output,
        ]
    }

    fn check_input(&self, x: &Array2<f64>) -> Result<()> {
        if x.ncols() != self.n_features {
            return Err(ZinbError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }
        if x.nrows() == 0 {
            return Err(ZinbError::InvalidInput("empty feature matrix".to_string()));
        }
        Ok(())
    }

    /// Save the network to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a network saved with [`ZinbNetwork::save`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let network: Self = serde_json::from_str(&json)?;
        Ok(network)
    }
}
