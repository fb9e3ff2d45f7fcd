//! Error types for SLP reading.

use cyclone_common::CycloneError;
use thiserror::Error;

/// Result type for reader operations.
pub type ReaderResult<T> = Result<T, ReaderError>;

/// Errors raised while reading a year of SLP.
#[derive(Error, Debug)]
pub enum ReaderError {
    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing required file, variable or attribute
    #[error("Missing required data: {0}")]
    MissingData(String),

    /// Malformed header or value block
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// NaN or infinite pressure value
    #[error("Non-finite SLP at step {step}, cell {index}")]
    NonFinite { step: usize, index: usize },

    /// Axis or calendar problem reported by the shared model
    #[error(transparent)]
    Model(#[from] CycloneError),
}

impl From<ReaderError> for CycloneError {
    fn from(err: ReaderError) -> Self {
        match err {
            ReaderError::Io(e) => CycloneError::Io(e),
            ReaderError::MissingData(msg) => CycloneError::config(msg),
            ReaderError::InvalidFormat(msg) => CycloneError::data(msg),
            e @ ReaderError::NonFinite { .. } => CycloneError::data(e.to_string()),
            ReaderError::Model(e) => e,
        }
    }
}

impl From<serde_json::Error> for ReaderError {
    fn from(err: serde_json::Error) -> Self {
        ReaderError::InvalidFormat(format!("header: {}", err))
    }
}
