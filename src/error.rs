//! Error types for the accident ZINB pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, ZinbError>;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum ZinbError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Data file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Missing target columns for {version}: {}", .missing.join(", "))]
    SchemaError {
        version: String,
        missing: Vec<String>,
    },

    #[error("Data error: {0}")]
    DataError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Computation error: {0}")]
    ComputationError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<polars::error::PolarsError> for ZinbError {
    fn from(err: polars::error::PolarsError) -> Self {
        ZinbError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for ZinbError {
    fn from(err: serde_json::Error) -> Self {
        ZinbError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for ZinbError {
    fn from(err: ndarray::ShapeError) -> Self {
        ZinbError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
