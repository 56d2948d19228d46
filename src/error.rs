//! Error types for ferrite-val.

use thiserror::Error;

/// Everything that can go wrong during a validation pass.
#[derive(Debug, Error)]
pub enum ValError {
    #[error("dataset is empty")]
    EmptyDataset,

    #[error("shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    #[error("unknown layer: {0}")]
    UnknownLayer(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("non-finite value: {0}")]
    NonFinite(String),

    #[error("collective error: {0}")]
    Collective(String),

    #[error("missing log column: {0}")]
    MissingColumn(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl ValError {
    pub fn shape(expected: impl ToString, actual: impl ToString) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ValError>;
