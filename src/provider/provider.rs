//! ModelDataProvider trait definition.
//!
//! The ModelDataProvider trait abstracts over the different backends a
//! building model can come from. Backends vary widely in what they can
//! answer, so the trait is capability-based: the two core calls are
//! required, the introspection calls have default implementations that
//! report [`ProviderError::Unsupported`].

use std::time::Duration;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::error::{ProviderError, ProviderResult};
use crate::model::{ElementId, ElementRecord};

/// A declared property as reported by a structured metadata query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
}

/// Response of a structured metadata query.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PropertyDefinitions {
    /// Properties declared on the model version itself.
    #[serde(default)]
    pub direct: Vec<PropertyDefinition>,
    /// Properties declared per element group (e.g. per category).
    #[serde(default)]
    pub by_group: IndexMap<String, Vec<PropertyDefinition>>,
}

impl PropertyDefinitions {
    /// Every declared name, direct ones first.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.direct
            .iter()
            .chain(self.by_group.values().flatten())
            .map(|d| d.name.as_str())
    }
}

/// Access to the attributes of a loaded building model.
///
/// # Example
///
/// ```ignore
/// use tessera::provider::ModelDataProvider;
///
/// async fn example(model: &dyn ModelDataProvider) -> ProviderResult<()> {
///     let leaves = model.leaf_ids(None).await?;
///     let records = model.bulk_properties(&leaves, None).await?;
///     let names: Vec<&str> = records[0].attributes.keys().map(String::as_str).collect();
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait ModelDataProvider: Send + Sync {
    // =========================================================================
    // Core capabilities
    // =========================================================================

    /// Leaf elements under `root` (the model root when `None`), in
    /// hierarchy order.
    ///
    /// Returns [`ProviderError::Unavailable`] when no hierarchy is loaded.
    async fn leaf_ids(&self, root: Option<ElementId>) -> ProviderResult<Vec<ElementId>>;

    /// Fetch attributes for a set of elements.
    ///
    /// With `attributes = None` every attribute is returned; otherwise only
    /// the named ones. Ids the model does not know are skipped. Backends may
    /// also skip elements holding none of the requested attributes.
    async fn bulk_properties(
        &self,
        ids: &[ElementId],
        attributes: Option<&[String]>,
    ) -> ProviderResult<Vec<ElementRecord>>;

    // =========================================================================
    // Optional introspection
    // =========================================================================

    /// Version identifier of the loaded model, if the backend has one.
    fn version_id(&self) -> Option<String> {
        None
    }

    /// Attribute names read straight from the local property store.
    async fn attribute_definitions(&self) -> ProviderResult<Vec<String>> {
        Err(ProviderError::Unsupported("attribute_definitions"))
    }

    /// Structured query for declared property definitions of a version.
    async fn query_property_definitions(
        &self,
        _version_id: &str,
    ) -> ProviderResult<PropertyDefinitions> {
        Err(ProviderError::Unsupported("query_property_definitions"))
    }
}

/// Await `fut`, mapping an elapsed timer to [`ProviderError::Timeout`].
///
/// The underlying call is not cancelled on the backend; its result is
/// simply dropped when it arrives late.
pub async fn with_timeout<T, F>(limit: Duration, fut: F) -> ProviderResult<T>
where
    F: std::future::Future<Output = ProviderResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout(limit.as_secs())),
    }
}
