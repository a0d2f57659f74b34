//! Model data provider errors.

use thiserror::Error;

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors returned by a [`ModelDataProvider`](super::ModelDataProvider).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// The backend does not offer this capability.
    #[error("operation not supported by this model: {0}")]
    Unsupported(&'static str),

    /// No model or no element hierarchy is loaded.
    #[error("model data unavailable: {0}")]
    Unavailable(String),

    /// The call did not resolve within its time budget.
    #[error("request timed out after {0} seconds")]
    Timeout(u64),

    /// The backend reported an error.
    #[error("model backend error: {message} (code: {code})")]
    Remote {
        /// Error code from the backend.
        code: String,
        /// Error message from the backend.
        message: String,
    },

    /// A model document could not be read.
    #[error("failed to load model: {0}")]
    Load(String),
}

impl ProviderError {
    pub fn remote(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Remote {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Whether the capability is simply missing rather than failing.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }
}

impl From<std::io::Error> for ProviderError {
    fn from(err: std::io::Error) -> Self {
        Self::Load(err.to_string())
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        Self::Load(err.to_string())
    }
}
