//! ZINB model: network architecture and likelihood
//!
//! - [`ZinbNetwork`] maps a feature row to `(pi_logit, mu, theta)`
//! - [`zinb_loss`] is the negative log-likelihood used for training and evaluation

pub mod layers;
pub mod loss;
pub mod network;

pub use layers::{Dense, DenseGrad};
pub use loss::{zinb_loss, zinb_loss_with_grad, zinb_row_losses, ParamGradients, LOG_EPS};
pub use network::{DistributionParams, ForwardCache, NetworkGradients, ZinbNetwork, POSITIVE_FLOOR};
