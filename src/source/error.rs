//! External source errors.

use thiserror::Error;

/// Result type for source operations.
pub type SourceResult<T> = Result<T, SourceError>;

#[derive(Error, Debug)]
pub enum SourceError {
    /// The file could not be read.
    #[error("failed to read {location}: {source}")]
    Read {
        location: String,
        #[source]
        source: std::io::Error,
    },

    /// The file could not be parsed as a table.
    #[error("failed to parse {location}: {message}")]
    Parse { location: String, message: String },

    /// The file has no header row.
    #[error("{0} has no header row")]
    MissingHeaders(String),

    #[error("loading {location} timed out after {secs} seconds")]
    Timeout { location: String, secs: u64 },
}
