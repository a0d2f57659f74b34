//! Discovery errors.
//!
//! None of these escape [`PropertyDiscoveryService::discover`](super::PropertyDiscoveryService::discover);
//! they are logged and the chain moves on to the next layer.

use thiserror::Error;

use crate::provider::ProviderError;

pub type DiscoveryResult<T> = Result<T, DiscoveryError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiscoveryError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("layer {layer} timed out after {secs} seconds")]
    Timeout { layer: &'static str, secs: u64 },
}

impl DiscoveryError {
    /// The backend lacks the capability the layer needs.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, DiscoveryError::Provider(e) if e.is_unsupported())
    }
}
