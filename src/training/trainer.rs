//! Full-batch trainer
//!
//! A [`Trainer`] starts `Initialized` with seeded parameters, moves to
//! `Training` on the first epoch, and [`Trainer::fit`] consumes it to produce a
//! [`TrainedModel`] whose network can no longer be mutated.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

use super::config::TrainingConfig;
use super::optimizer::Adam;
use crate::error::{Result, ZinbError};
use crate::model::{zinb_loss_with_grad, ZinbNetwork};

/// Observable trainer state; the terminal state is the [`TrainedModel`] returned by [`Trainer::fit`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainerState {
    /// Parameters drawn, no epoch run yet
    Initialized,
    /// At least one epoch completed
    Training { epochs_completed: usize },
}

pub struct Trainer {
    config: TrainingConfig,
    network: ZinbNetwork,
    optimizer: Adam,
    state: TrainerState,
    loss_history: Vec<f64>,
}

impl Trainer {
    /// Validate the config and draw the initial parameters
    pub fn new(config: TrainingConfig, n_features: usize) -> Result<Self> {
        config.validate()?;
        let network = ZinbNetwork::new(n_features, config.seed)?;
        let optimizer = Adam::from_config(&config);
        Ok(Self {
            config,
            network,
            optimizer,
            state: TrainerState::Initialized,
            loss_history: Vec::new(),
        })
    }

    pub fn state(&self) -> TrainerState {
        self.state
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn network(&self) -> &ZinbNetwork {
        &self.network
    }

    pub fn loss_history(&self) -> &[f64] {
        &self.loss_history
    }

    /// Run one full-batch epoch and return the loss before the update.
    ///
    /// Fails once the configured number of epochs has been reached.
    pub fn step(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64> {
        if x.nrows() != y.len() {
            return Err(ZinbError::ShapeError {
                expected: format!("{} targets", x.nrows()),
                actual: format!("{} targets", y.len()),
            });
        }

        let epoch = self.loss_history.len() + 1;
        if epoch > self.config.epochs {
            return Err(ZinbError::InvalidInput(format!(
                "all {} configured epochs have already run",
                self.config.epochs
            )));
        }
        let (params, cache) = self.network.forward_with_cache(x)?;
        let (loss, grads) = zinb_loss_with_grad(y, &params)?;
        if !loss.is_finite() {
            return Err(ZinbError::ComputationError(format!(
                "non-finite training loss at epoch {}",
                epoch
            )));
        }

        let layer_grads = self.network.backward(&cache, &grads.pi_logit, &grads.mu, &grads.theta);
        self.optimizer.step(&mut self.network, &layer_grads);

        self.loss_history.push(loss);
        self.state = TrainerState::Training {
            epochs_completed: epoch,
        };
        Ok(loss)
    }

    /// Run the remaining epochs up to the configured total and freeze the result
    pub fn fit(mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<TrainedModel> {
        let start = Instant::now();
        let epochs = self.config.epochs;
        debug!(
            rows = x.nrows(),
            features = x.ncols(),
            params = self.network.n_params(),
            epochs,
            "starting full-batch training"
        );

        // Epochs already run through `step` count towards the total
        for epoch in self.loss_history.len() + 1..=epochs {
            let loss = self.step(x, y)?;
            if self.config.log_every > 0 && epoch % self.config.log_every == 0 {
                info!("Epoch {}/{}, Loss: {:.4}", epoch, epochs, loss);
            }
        }

        Ok(TrainedModel {
            network: self.network,
            loss_history: self.loss_history,
            training_time_secs: start.elapsed().as_secs_f64(),
        })
    }
}

/// Frozen network plus its training trace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    network: ZinbNetwork,
    loss_history: Vec<f64>,
    training_time_secs: f64,
}

impl TrainedModel {
    pub fn network(&self) -> &ZinbNetwork {
        &self.network
    }

    pub fn loss_history(&self) -> &[f64] {
        &self.loss_history
    }

    pub fn epochs(&self) -> usize {
        self.loss_history.len()
    }

    /// Loss of the last epoch
    pub fn final_loss(&self) -> Option<f64> {
        self.loss_history.last().copied()
    }

    pub fn training_time_secs(&self) -> f64 {
        self.training_time_secs
    }

    pub fn into_network(self) -> ZinbNetwork {
        self.network
    }
}
