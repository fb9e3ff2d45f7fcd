//! Error types for the cyclone tracker.

use thiserror::Error;

/// Result type alias using CycloneError.
pub type CycloneResult<T> = Result<T, CycloneError>;

/// Primary error type for tracker operations.
#[derive(Debug, Error)]
pub enum CycloneError {
    // === Configuration / input errors ===
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Inconsistent grid geometry: {0}")]
    Geometry(String),

    #[error("Failed to parse record: {0}")]
    Parse(String),

    // === Runtime errors ===
    #[error("Bad input data: {0}")]
    Data(String),

    #[error("Invariant violated at {stamp} (check {check}): {message}")]
    Invariant {
        stamp: String,
        check: u8,
        message: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cancelled before {0}")]
    Cancelled(String),
}

impl CycloneError {
    /// Create a Config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a Geometry error.
    pub fn geometry(msg: impl Into<String>) -> Self {
        Self::Geometry(msg.into())
    }

    /// Create a Data error.
    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data(msg.into())
    }

    /// Create a Parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create an Invariant error for a time stamp and fail-check number.
    pub fn invariant(stamp: impl Into<String>, check: u8, message: impl Into<String>) -> Self {
        Self::Invariant {
            stamp: stamp.into(),
            check,
            message: message.into(),
        }
    }

    /// Process exit code for this error.
    ///
    /// `1` for configuration or input problems, `2` for unrecoverable
    /// runtime failures.
    pub fn exit_code(&self) -> i32 {
        match self {
            CycloneError::Config(_) | CycloneError::Geometry(_) | CycloneError::Parse(_) => 1,

            CycloneError::Data(_)
            | CycloneError::Invariant { .. }
            | CycloneError::Io(_)
            | CycloneError::Cancelled(_) => 2,
        }
    }
}

impl From<serde_json::Error> for CycloneError {
    fn from(err: serde_json::Error) -> Self {
        CycloneError::Config(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for CycloneError {
    fn from(err: serde_yaml::Error) -> Self {
        CycloneError::Config(format!("YAML error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CycloneError::config("x").exit_code(), 1);
        assert_eq!(CycloneError::geometry("x").exit_code(), 1);
        assert_eq!(CycloneError::data("nan").exit_code(), 2);
        assert_eq!(CycloneError::invariant("1979010100", 5, "overlap").exit_code(), 2);
    }

    #[test]
    fn test_invariant_message_names_stamp_and_check() {
        let err = CycloneError::invariant("1979010106", 4, "slices not disjoint");
        let msg = err.to_string();
        assert!(msg.contains("1979010106"));
        assert!(msg.contains("check 4"));
    }
}
