//! Error types for rollcall.

use thiserror::Error;

/// Result type alias using rollcall's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for rollcall operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Resource not found (unknown chart slot, missing file)
    #[error("Not found: {0}")]
    NotFound(String),

    /// A filter term could not be parsed
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Persisted chart configuration could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Record source fetch failed
    #[error("Record source error: {0}")]
    Source(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

/// Failure to parse one term of a filter expression.
///
/// Pipeline stages catch these locally; they never reach the caller of the
/// pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Clock window not of the form `H:MM-H:MM`
    #[error("invalid clock window '{0}', expected H:MM-H:MM")]
    ClockWindow(String),

    /// One side of a clock window is not `H:MM`
    #[error("invalid clock time '{0}', expected H:MM")]
    ClockTime(String),

    /// Date window not of the form `<epochMillis>-<epochMillis>`
    #[error("invalid date window '{0}', expected <epochMillis>-<epochMillis>")]
    DateWindow(String),

    /// Timestamp in none of the accepted encodings
    #[error("invalid timestamp '{0}'")]
    Timestamp(String),
}
