//! accident-zinb - Zero-inflated negative binomial accident-count modelling
//!
//! This crate fits a small neural ZINB model to road-segment accident counts
//! observed before and after an installation, then ranks the segment
//! attributes by permutation importance on held-out data.
//!
//! # Modules
//!
//! ## Data
//! - [`dataset`] - Before/after feature and target builder
//! - [`preprocessing`] - Train/test split and standard scaling
//! - [`utils`] - Tabular file loading and CSV writing
//!
//! ## Model
//! - [`model`] - Three-headed network and the ZINB negative log-likelihood
//! - [`training`] - Full-batch Adam trainer and held-out evaluation
//! - [`explainability`] - Permutation feature importance
//!
//! ## Services
//! - [`pipeline`] - Per-version fit-and-explain workflow
//! - [`report`] - Ranked importance CSV output
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Data
pub mod dataset;
pub mod preprocessing;
pub mod utils;

// Model
pub mod model;
pub mod training;
pub mod explainability;

// Services
pub mod pipeline;
pub mod report;
pub mod cli;

pub use error::{Result, ZinbError};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{Result, ZinbError};

    // Data
    pub use crate::dataset::{build_before_after, BeforeAfterDataset, FeatureMatrix, TargetVector};
    pub use crate::preprocessing::{train_test_split, SplitConfig, StandardScaler};
    pub use crate::utils::{DataLoader, DataSaver};

    // Model
    pub use crate::model::{zinb_loss, DistributionParams, ZinbNetwork};
    pub use crate::training::{evaluate, Evaluation, TrainedModel, Trainer, TrainingConfig};
    pub use crate::explainability::{ImportanceConfig, ImportanceReport, PermutationImportance};

    // Pipeline
    pub use crate::pipeline::{run, run_version, PipelineConfig, RunOptions, VersionReport};
}
