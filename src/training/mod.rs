//! Model training module
//!
//! Provides the fixed ZINB training recipe:
//! - Full-batch Adam over the whole training split
//! - No mini-batching, shuffling or early stopping
//! - Held-out evaluation of the frozen network

mod config;
pub mod evaluator;
pub mod optimizer;
pub mod trainer;

pub use config::TrainingConfig;
pub use evaluator::{evaluate, Evaluation};
pub use optimizer::Adam;
pub use trainer::{TrainedModel, Trainer, TrainerState};
