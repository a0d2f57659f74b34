//! Element records.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::value::Value;

/// Numeric identifier of a model element.
pub type ElementId = u64;

/// Insertion-ordered attribute bag.
pub type Attributes = IndexMap<String, Value>;

/// One leaf element of the model with its attributes.
///
/// After a sync the same type carries the fused record: model attributes,
/// joined source fields and calculated columns, all passed through the
/// configured schema.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ElementRecord {
    pub id: ElementId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub attributes: Attributes,
}

impl ElementRecord {
    pub fn new(id: ElementId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            attributes: Attributes::new(),
        }
    }

    /// Builder-style attribute insertion.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Keep only the named attributes.
    pub fn project(&self, keys: &[String]) -> ElementRecord {
        let attributes = keys
            .iter()
            .filter_map(|k| self.attributes.get(k).map(|v| (k.clone(), v.clone())))
            .collect();

        ElementRecord {
            id: self.id,
            name: self.name.clone(),
            attributes,
        }
    }
}
