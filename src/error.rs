//! Error types for tinygen.

use thiserror::Error;

/// Result type alias for tinygen operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for tinygen.
#[derive(Error, Debug)]
pub enum Error {
    /// Model loading failed.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Tokenization error.
    #[error("tokenization error: {0}")]
    Tokenization(String),

    /// Dataset loading or parsing failed.
    #[error("dataset error: {0}")]
    Dataset(String),

    /// Tensor operation error.
    #[error("tensor error: {0}")]
    Tensor(#[from] candle_core::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
