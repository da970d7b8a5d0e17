//! Data preprocessing module
//!
//! - Shuffled train/test split
//! - Standard scaling fitted on the training split only

mod scaler;
pub mod split;

pub use scaler::{ScalerParams, StandardScaler};
pub use split::{train_test_split, SplitConfig, TrainTestSplit};
