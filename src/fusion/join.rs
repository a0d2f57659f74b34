//! Join index over one external source.

use std::collections::HashMap;

use crate::model::{Attributes, ExternalSource, Value};

/// Normalised join key: trimmed, lowercased display string. Empty values
/// never join.
pub fn join_key(value: &Value) -> Option<String> {
    if value.is_empty() {
        return None;
    }
    Some(value.display_string().trim().to_lowercase())
}

/// Rows of a source keyed by their normalised `file_key` value.
///
/// When several rows share a key the last one wins.
#[derive(Debug)]
pub struct JoinIndex<'a> {
    rows: HashMap<String, &'a Attributes>,
}

impl<'a> JoinIndex<'a> {
    pub fn build(source: &'a ExternalSource) -> Self {
        let file_key = source.mapping.file_key.as_str();
        let mut rows = HashMap::with_capacity(source.rows.len());

        for row in &source.rows {
            if let Some(key) = row.get(file_key).and_then(join_key) {
                rows.insert(key, row);
            }
        }

        Self { rows }
    }

    /// Row matching a model attribute value, if any.
    pub fn lookup(&self, value: &Value) -> Option<&'a Attributes> {
        join_key(value).and_then(|k| self.rows.get(&k).copied())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
