//! Projection of fused records through the configured schema.

use super::coerce::coerce;
use crate::model::{Attributes, ElementRecord, SchemaEntry, Value};

/// Projects and coerces fused records according to a schema.
#[derive(Debug, Clone, Default)]
pub struct SchemaTransformer {
    entries: Vec<SchemaEntry>,
}

impl SchemaTransformer {
    pub fn new(entries: Vec<SchemaEntry>) -> Self {
        Self { entries }
    }

    /// Whether any entry is configured at all.
    pub fn is_configured(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn entries(&self) -> &[SchemaEntry] {
        &self.entries
    }

    /// Transform a whole record; id and name are carried over.
    pub fn transform(&self, record: &ElementRecord) -> ElementRecord {
        ElementRecord {
            id: record.id,
            name: record.name.clone(),
            attributes: apply(&record.attributes, &self.entries),
        }
    }
}

/// Apply `entries` to one raw attribute bag.
///
/// Only included entries are projected, under their alias when set. When
/// several entries share a destination, a non-empty value already written
/// is never replaced by an empty one.
pub fn apply(raw: &Attributes, entries: &[SchemaEntry]) -> Attributes {
    let mut out = Attributes::with_capacity(entries.len());

    for entry in entries.iter().filter(|e| e.include) {
        let incoming = raw
            .get(&entry.original_name)
            .map(|v| coerce(v, entry.field_type))
            .unwrap_or(Value::Null);

        let destination = entry.destination();
        let keep_existing = out
            .get(destination)
            .is_some_and(|existing| existing.is_truthy() && incoming.is_empty());

        if !keep_existing {
            out.insert(destination.to_string(), incoming);
        }
    }

    out
}
