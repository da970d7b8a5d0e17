//! Training configuration

use serde::{Deserialize, Serialize};

use crate::error::{Result, ZinbError};

/// Full-batch Adam training recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Number of full-batch epochs
    pub epochs: usize,
    /// Adam step size
    pub learning_rate: f64,
    /// Adam first-moment decay
    pub beta1: f64,
    /// Adam second-moment decay
    pub beta2: f64,
    /// Adam denominator guard
    pub adam_epsilon: f64,
    /// Seed for parameter initialisation
    pub seed: u64,
    /// Log the training loss every this many epochs (0 disables)
    pub log_every: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 500,
            learning_rate: 1e-3,
            beta1: 0.9,
            beta2: 0.999,
            adam_epsilon: 1e-8,
            seed: 42,
            log_every: 100,
        }
    }
}

impl TrainingConfig {
    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_log_every(mut self, log_every: usize) -> Self {
        self.log_every = log_every;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(ZinbError::InvalidParameter {
                name: "epochs".to_string(),
                value: self.epochs.to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(ZinbError::InvalidParameter {
                name: "learning_rate".to_string(),
                value: self.learning_rate.to_string(),
                reason: "must be a positive finite number".to_string(),
            });
        }
        for (name, beta) in [("beta1", self.beta1), ("beta2", self.beta2)] {
            if !(0.0..1.0).contains(&beta) {
                return Err(ZinbError::InvalidParameter {
                    name: name.to_string(),
                    value: beta.to_string(),
                    reason: "must lie in [0, 1)".to_string(),
                });
            }
        }
        if !(self.adam_epsilon > 0.0) {
            return Err(ZinbError::InvalidParameter {
                name: "adam_epsilon".to_string(),
                value: self.adam_epsilon.to_string(),
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}
