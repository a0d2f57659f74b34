//! Model data collaborator.
//!
//! The engine never talks to a model viewer directly; it goes through the
//! [`ModelDataProvider`] trait and uses whichever subset of capabilities
//! the backend offers.

mod error;
pub mod memory;
mod provider;

pub use error::{ProviderError, ProviderResult};
pub use memory::{Capability, InMemoryModel, ModelDocument, ModelElement};
pub use provider::{with_timeout, ModelDataProvider, PropertyDefinition, PropertyDefinitions};
