//! Adam optimizer over the network's dense layers

use ndarray::{Array, Dimension, Zip};

use crate::model::{Dense, NetworkGradients, ZinbNetwork};
use crate::training::TrainingConfig;

struct Moments {
    m_weights: ndarray::Array2<f64>,
    v_weights: ndarray::Array2<f64>,
    m_biases: ndarray::Array1<f64>,
    v_biases: ndarray::Array1<f64>,
}

impl Moments {
    fn zeros_like(layer: &Dense) -> Self {
        Self {
            m_weights: ndarray::Array2::zeros(layer.weights.raw_dim()),
            v_weights: ndarray::Array2::zeros(layer.weights.raw_dim()),
            m_biases: ndarray::Array1::zeros(layer.biases.len()),
            v_biases: ndarray::Array1::zeros(layer.biases.len()),
        }
    }
}

/// Adam with bias-corrected first/second moment estimates
///
/// `p -= lr * m_hat / (sqrt(v_hat) + eps)`
pub struct Adam {
    lr: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    t: u64,
    moments: Vec<Moments>,
}

impl Adam {
    pub fn new(lr: f64, beta1: f64, beta2: f64, epsilon: f64) -> Self {
        Self {
            lr,
            beta1,
            beta2,
            epsilon,
            t: 0,
            moments: Vec::new(),
        }
    }

    pub fn from_config(config: &TrainingConfig) -> Self {
        Self::new(config.learning_rate, config.beta1, config.beta2, config.adam_epsilon)
    }

    /// Number of steps taken so far
    pub fn step_count(&self) -> u64 {
        self.t
    }

    /// Apply one update to every layer of `network`
    pub fn step(&mut self, network: &mut ZinbNetwork, grads: &NetworkGradients) {
        let mut layers = network.layers_mut();
        if self.moments.is_empty() {
            self.moments = layers.iter().map(|l| Moments::zeros_like(l)).collect();
        }
        self.t += 1;

        let bias1 = 1.0 - self.beta1.powi(self.t as i32);
        let bias2 = 1.0 - self.beta2.powi(self.t as i32);
        let hp = Hyper {
            lr: self.lr,
            beta1: self.beta1,
            beta2: self.beta2,
            epsilon: self.epsilon,
            bias1,
            bias2,
        };

        for ((layer, moments), grad) in layers
            .iter_mut()
            .zip(self.moments.iter_mut())
            .zip(grads.layers.iter())
        {
            update(&mut layer.weights, &mut moments.m_weights, &mut moments.v_weights, &grad.weights, &hp);
            update(&mut layer.biases, &mut moments.m_biases, &mut moments.v_biases, &grad.biases, &hp);
        }
    }
}

struct Hyper {
    lr: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    bias1: f64,
    bias2: f64,
}

fn update<D: Dimension>(
    param: &mut Array<f64, D>,
    m: &mut Array<f64, D>,
    v: &mut Array<f64, D>,
    grad: &Array<f64, D>,
    hp: &Hyper,
) {
    Zip::from(param)
        .and(m)
        .and(v)
        .and(grad)
        .for_each(|p, m, v, &g| {
            *m = hp.beta1 * *m + (1.0 - hp.beta1) * g;
            *v = hp.beta2 * *v + (1.0 - hp.beta2) * g * g;
            let m_hat = *m / hp.bias1;
            let v_hat = *v / hp.bias2;
            *p -= hp.lr * m_hat / (v_hat.sqrt() + hp.epsilon);
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;

    #[test]
    fn test_first_step_moves_by_learning_rate() {
        // With bias correction the first Adam step has magnitude ~lr in every coordinate
        let mut param = Array1::from(vec![1.0, -2.0, 0.5]);
        let mut m = Array1::zeros(3);
        let mut v = Array1::zeros(3);
        let grad = Array1::from(vec![0.3, -4.0, 1e-3]);
        let hp = Hyper {
            lr: 0.01,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            bias1: 0.1,
            bias2: 1.0 - 0.999,
        };
        update(&mut param, &mut m, &mut v, &grad, &hp);

        assert!((param[0] - 0.99).abs() < 1e-6);
        assert!((param[1] + 1.99).abs() < 1e-6);
        assert!((param[2] - 0.49).abs() < 1e-4);
    }

    #[test]
    fn test_step_counts() {
        let mut net = ZinbNetwork::new(2, 3).unwrap();
        let x = ndarray::Array2::from_shape_vec((3, 2), vec![0.1, 0.2, -0.3, 0.4, 0.5, -0.6]).unwrap();
        let y = Array1::from(vec![0.0, 1.0, 2.0]);
        let mut adam = Adam::new(1e-3, 0.9, 0.999, 1e-8);

        let (params, cache) = net.forward_with_cache(&x).unwrap();
        let (_, g) = crate::model::zinb_loss_with_grad(&y, &params).unwrap();
        let grads = net.backward(&cache, &g.pi_logit, &g.mu, &g.theta);
        adam.step(&mut net, &grads);
        adam.step(&mut net, &grads);
        assert_eq!(adam.step_count(), 2);
    }
}
