//! Errors raised while reading or writing record files.

use cyclone_common::CycloneError;
use thiserror::Error;

pub type RecordResult<T> = Result<T, RecordError>;

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A field did not parse as its type
    #[error("invalid {name}: '{value}'")]
    Field { name: &'static str, value: String },

    /// The line ended before a required field
    #[error("missing {0}")]
    Missing(&'static str),

    /// Tokens left over after the last field
    #[error("{0} unexpected trailing fields")]
    Trailing(usize),

    /// Malformed `#` header
    #[error("invalid header: {0}")]
    Header(String),

    #[error(transparent)]
    Model(#[from] CycloneError),

    #[error("line {line}: {source}")]
    AtLine {
        line: usize,
        #[source]
        source: Box<RecordError>,
    },
}

impl RecordError {
    pub(crate) fn at_line(self, line: usize) -> Self {
        RecordError::AtLine {
            line,
            source: Box::new(self),
        }
    }
}

impl From<RecordError> for CycloneError {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::Io(e) => CycloneError::Io(e),
            RecordError::Model(e) => e,
            other => CycloneError::parse(other.to_string()),
        }
    }
}
