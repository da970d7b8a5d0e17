//! Zero-inflated negative-binomial negative log-likelihood
//!
//! With `pi = sigmoid(logit)`, for each row:
//!
//! ```text
//! P(y = 0) = pi + (1 - pi) * (theta / (theta + mu))^theta
//! y = 0:  loss = -ln(P(y = 0) + eps)
//! y > 0:  loss = -[ln(1 - pi + eps) + lgamma(y + theta) - lgamma(y + 1) - lgamma(theta)
//!                  + theta * ln(theta / (theta + mu)) + y * ln(mu / (theta + mu))]
//! ```
//!
//! Both branches are evaluated for every row and combined through a 0/1 mask,
//! and the batch loss is the mean of the row losses.

use ndarray::Array1;
use statrs::function::gamma::{digamma, ln_gamma};

use super::layers::sigmoid;
use super::network::DistributionParams;
use crate::error::{Result, ZinbError};

/// Guard added inside every logarithm
pub const LOG_EPS: f64 = 1e-8;

/// Gradient of the mean loss w.r.t. each per-row distribution parameter
#[derive(Debug, Clone)]
pub struct ParamGradients {
    pub pi_logit: Array1<f64>,
    pub mu: Array1<f64>,
    pub theta: Array1<f64>,
}

/// Terms of a single row, both branches included
struct RowTerms {
    zero_loss: f64,
    nonzero_loss: f64,
    zero_grad: [f64; 3],
    nonzero_grad: [f64; 3],
}

fn row_terms(y: f64, logit: f64, mu: f64, theta: f64) -> RowTerms {
    let pi = sigmoid(logit);
    let dpi_dlogit = pi * (1.0 - pi);
    let total = theta + mu;
    let log_ratio = theta.ln() - total.ln();

    // Zero branch
    let nb_zero = (theta * log_ratio).exp();
    let prob_zero = pi + (1.0 - pi) * nb_zero;
    let zero_loss = -(prob_zero + LOG_EPS).ln();
    let d_nb_zero_dmu = -nb_zero * theta / total;
    let d_nb_zero_dtheta = nb_zero * (log_ratio + mu / total);
    let inv = 1.0 / (prob_zero + LOG_EPS);
    let zero_grad = [
        -(1.0 - nb_zero) * dpi_dlogit * inv,
        -(1.0 - pi) * d_nb_zero_dmu * inv,
        -(1.0 - pi) * d_nb_zero_dtheta * inv,
    ];

    // Count branch
    let log_nb = ln_gamma(y + theta) - ln_gamma(y + 1.0) - ln_gamma(theta)
        + theta * log_ratio
        + y * (mu.ln() - total.ln());
    let nonzero_loss = -((1.0 - pi + LOG_EPS).ln() + log_nb);
    let d_log_nb_dmu = y / mu - (theta + y) / total;
    let d_log_nb_dtheta =
        digamma(y + theta) - digamma(theta) + log_ratio + 1.0 - (theta + y) / total;
    let nonzero_grad = [
        dpi_dlogit / (1.0 - pi + LOG_EPS),
        -d_log_nb_dmu,
        -d_log_nb_dtheta,
    ];

    RowTerms {
        zero_loss,
        nonzero_loss,
        zero_grad,
        nonzero_grad,
    }
}

fn check_lengths(y: &Array1<f64>, params: &DistributionParams) -> Result<()> {
    let n = y.len();
    if n == 0 {
        return Err(ZinbError::InvalidInput("cannot compute loss on empty targets".to_string()));
    }
    if params.pi_logit.len() != n || params.mu.len() != n || params.theta.len() != n {
        return Err(ZinbError::ShapeError {
            expected: format!("{} rows of distribution parameters", n),
            actual: format!(
                "pi_logit {}, mu {}, theta {}",
                params.pi_logit.len(),
                params.mu.len(),
                params.theta.len()
            ),
        });
    }
    Ok(())
}

/// Per-row negative log-likelihood
pub fn zinb_row_losses(y: &Array1<f64>, params: &DistributionParams) -> Result<Array1<f64>> {
    check_lengths(y, params)?;

    let losses = (0..y.len())
        .map(|i| {
            let terms = row_terms(y[i], params.pi_logit[i], params.mu[i], params.theta[i]);
            let mask = if y[i] == 0.0 { 1.0 } else { 0.0 };
            mask * terms.zero_loss + (1.0 - mask) * terms.nonzero_loss
        })
        .collect();
    Ok(losses)
}

/// Mean ZINB negative log-likelihood
pub fn zinb_loss(y: &Array1<f64>, params: &DistributionParams) -> Result<f64> {
    let losses = zinb_row_losses(y, params)?;
    Ok(losses.sum() / losses.len() as f64)
}

/// Mean loss together with its gradient w.r.t. `(pi_logit, mu, theta)`
pub fn zinb_loss_with_grad(
    y: &Array1<f64>,
    params: &DistributionParams,
) -> Result<(f64, ParamGradients)> {
    check_lengths(y, params)?;

    let n = y.len();
    let scale = 1.0 / n as f64;
    let mut loss = 0.0;
    let mut grads = ParamGradients {
        pi_logit: Array1::zeros(n),
        mu: Array1::zeros(n),
        theta: Array1::zeros(n),
    };

    for i in 0..n {
        let terms = row_terms(y[i], params.pi_logit[i], params.mu[i], params.theta[i]);
        let mask = if y[i] == 0.0 { 1.0 } else { 0.0 };
        loss += mask * terms.zero_loss + (1.0 - mask) * terms.nonzero_loss;

        let blend = |k: usize| (mask * terms.zero_grad[k] + (1.0 - mask) * terms.nonzero_grad[k]) * scale;
        grads.pi_logit[i] = blend(0);
        grads.mu[i] = blend(1);
        grads.theta[i] = blend(2);
    }

    Ok((loss * scale, grads))
}
