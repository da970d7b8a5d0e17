//! Model explainability module
//!
//! Permutation feature importance measured as the increase of held-out ZINB
//! loss when one feature's column is shuffled.

mod importance;

pub use importance::{
    ImportanceConfig, ImportanceRecord, ImportanceReport, PermutationImportance, IMPORTANCE_DECIMALS,
};
