//! Fusion errors.

use thiserror::Error;

use crate::provider::ProviderError;

pub type FormulaResult<T> = Result<T, FormulaError>;

/// Why a calculated value came out null.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormulaError {
    /// The substituted expression holds something other than numbers,
    /// arithmetic operators, parentheses and whitespace.
    #[error("expression contains disallowed tokens: {0}")]
    DisallowedToken(String),

    #[error("invalid arithmetic expression: {0}")]
    Syntax(String),

    #[error("expression does not evaluate to a finite number")]
    NonFinite,
}

/// Pipeline-level build failures. Reported on the build outcome, never
/// raised.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    #[error("model hierarchy unavailable: {0}")]
    HierarchyUnavailable(String),

    #[error("model has no leaf elements")]
    NoElements,

    #[error("fetching model properties failed: {0}")]
    FetchFailed(String),

    #[error("fetching model data timed out after {0} seconds")]
    Timeout(u64),
}

impl From<ProviderError> for BuildError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Unavailable(msg) => BuildError::HierarchyUnavailable(msg),
            ProviderError::Timeout(secs) => BuildError::Timeout(secs),
            other => BuildError::FetchFailed(other.to_string()),
        }
    }
}
