//! In-memory model backend.
//!
//! Holds a fully materialised element tree. Used by the CLI (loaded from a
//! JSON model document) and by tests, where individual capabilities can be
//! switched off, slowed down or made to fail.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::{ProviderError, ProviderResult};
use super::provider::{ModelDataProvider, PropertyDefinitions};
use crate::model::{Attributes, ElementId, ElementRecord};

/// Provider capabilities that can be tuned on an [`InMemoryModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    LeafIds,
    BulkProperties,
    AttributeDefinitions,
    MetadataQuery,
}

/// One node of the element tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelElement {
    pub id: ElementId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub parent: Option<ElementId>,
    #[serde(default)]
    pub attributes: Attributes,
}

/// JSON model document accepted by [`InMemoryModel::load`].
///
/// ```json
/// {
///   "version_id": "urn:example:model?version=3",
///   "elements": [
///     { "id": 1, "name": "Level 1" },
///     { "id": 2, "name": "Wall 1", "parent": 1, "attributes": { "Category": "Wall" } }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelDocument {
    #[serde(default)]
    pub version_id: Option<String>,
    #[serde(default)]
    pub elements: Vec<ModelElement>,
    /// Raw attribute definitions from the local property store.
    #[serde(default)]
    pub definitions: Option<Vec<String>>,
    /// Declared property definitions answered by the metadata query.
    #[serde(default)]
    pub metadata: Option<PropertyDefinitions>,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryModel {
    version_id: Option<String>,
    elements: Vec<ModelElement>,
    index: HashMap<ElementId, usize>,
    has_hierarchy: bool,
    definitions: Option<Vec<String>>,
    metadata: Option<PropertyDefinitions>,
    latency: HashMap<Capability, Duration>,
    failures: HashMap<Capability, ProviderError>,
}

impl InMemoryModel {
    pub fn new(elements: Vec<ModelElement>) -> Self {
        let index = elements
            .iter()
            .enumerate()
            .map(|(pos, e)| (e.id, pos))
            .collect();

        Self {
            elements,
            index,
            has_hierarchy: true,
            ..Default::default()
        }
    }

    /// A flat model where every record is a leaf under the root.
    pub fn from_records(records: Vec<ElementRecord>) -> Self {
        Self::new(
            records
                .into_iter()
                .map(|r| ModelElement {
                    id: r.id,
                    name: r.name,
                    parent: None,
                    attributes: r.attributes,
                })
                .collect(),
        )
    }

    pub fn from_document(doc: ModelDocument) -> Self {
        let mut model = Self::new(doc.elements);
        model.version_id = doc.version_id;
        model.definitions = doc.definitions;
        model.metadata = doc.metadata;
        model
    }

    /// Read a JSON model document from disk.
    pub async fn load(path: impl AsRef<Path>) -> ProviderResult<Self> {
        let text = tokio::fs::read_to_string(path.as_ref()).await?;
        let doc: ModelDocument = serde_json::from_str(&text)?;
        Ok(Self::from_document(doc))
    }

    pub fn with_version_id(mut self, version_id: impl Into<String>) -> Self {
        self.version_id = Some(version_id.into());
        self
    }

    pub fn with_definitions<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.definitions = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_metadata(mut self, metadata: PropertyDefinitions) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Drop the element hierarchy; `leaf_ids` becomes unavailable.
    pub fn without_hierarchy(mut self) -> Self {
        self.has_hierarchy = false;
        self
    }

    /// Delay every answer of `capability` by `delay`.
    pub fn with_latency(mut self, capability: Capability, delay: Duration) -> Self {
        self.latency.insert(capability, delay);
        self
    }

    /// Make `capability` fail with `error`.
    pub fn with_failure(mut self, capability: Capability, error: ProviderError) -> Self {
        self.failures.insert(capability, error);
        self
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    async fn enter(&self, capability: Capability) -> ProviderResult<()> {
        if let Some(delay) = self.latency.get(&capability) {
            tokio::time::sleep(*delay).await;
        }
        match self.failures.get(&capability) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn is_descendant(&self, id: ElementId, root: ElementId) -> bool {
        let mut current = Some(id);
        let mut hops = 0;
        while let Some(cur) = current {
            if cur == root {
                return true;
            }
            // Guard against parent cycles in hand-written documents.
            hops += 1;
            if hops > self.elements.len() {
                return false;
            }
            current = self
                .index
                .get(&cur)
                .and_then(|pos| self.elements[*pos].parent);
        }
        false
    }
}

#[async_trait]
impl ModelDataProvider for InMemoryModel {
    async fn leaf_ids(&self, root: Option<ElementId>) -> ProviderResult<Vec<ElementId>> {
        self.enter(Capability::LeafIds).await?;

        if !self.has_hierarchy {
            return Err(ProviderError::Unavailable(
                "element hierarchy not loaded".to_string(),
            ));
        }

        let parents: HashSet<ElementId> = self.elements.iter().filter_map(|e| e.parent).collect();

        Ok(self
            .elements
            .iter()
            .filter(|e| !parents.contains(&e.id))
            .filter(|e| root.map_or(true, |r| self.is_descendant(e.id, r)))
            .map(|e| e.id)
            .collect())
    }

    async fn bulk_properties(
        &self,
        ids: &[ElementId],
        attributes: Option<&[String]>,
    ) -> ProviderResult<Vec<ElementRecord>> {
        self.enter(Capability::BulkProperties).await?;

        let records = ids
            .iter()
            .filter_map(|id| self.index.get(id))
            .map(|pos| {
                let element = &self.elements[*pos];
                let record = ElementRecord {
                    id: element.id,
                    name: element.name.clone(),
                    attributes: element.attributes.clone(),
                };
                match attributes {
                    Some(keys) => record.project(keys),
                    None => record,
                }
            })
            .collect();

        Ok(records)
    }

    fn version_id(&self) -> Option<String> {
        self.version_id.clone()
    }

    async fn attribute_definitions(&self) -> ProviderResult<Vec<String>> {
        self.enter(Capability::AttributeDefinitions).await?;
        self.definitions
            .clone()
            .ok_or(ProviderError::Unsupported("attribute_definitions"))
    }

    async fn query_property_definitions(
        &self,
        version_id: &str,
    ) -> ProviderResult<PropertyDefinitions> {
        self.enter(Capability::MetadataQuery).await?;

        if self.version_id.as_deref() != Some(version_id) {
            return Err(ProviderError::remote(
                "NOT_FOUND",
                format!("unknown version {}", version_id),
            ));
        }
        self.metadata
            .clone()
            .ok_or(ProviderError::Unsupported("query_property_definitions"))
    }
}
