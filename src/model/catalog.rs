//! Property catalog: the sorted, deduplicated set of attribute names.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Sorted, deduplicated attribute names.
///
/// Blank names are never admitted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyCatalog {
    names: BTreeSet<String>,
}

impl PropertyCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from any collection of names.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut catalog = Self::new();
        catalog.extend(names);
        catalog
    }

    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if name.trim().is_empty() {
            return false;
        }
        self.names.insert(name)
    }

    pub fn extend<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            self.insert(name);
        }
    }

    /// Merge another catalog into this one.
    pub fn union(mut self, other: &PropertyCatalog) -> Self {
        self.names.extend(other.names.iter().cloned());
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.names.iter().cloned().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for PropertyCatalog {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::from_names(iter)
    }
}
