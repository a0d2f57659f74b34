//! Schema entries: aliasing, type coercion and inclusion of fused columns.

use serde::{Deserialize, Serialize};

/// Declared type of a schema column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    Text,
    Number,
    Date,
    Boolean,
}

/// One configured column of the fused dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaEntry {
    /// Where the column comes from (`"Model"` or a source file name).
    #[serde(default)]
    pub source_name: String,
    /// Column name in the fused record.
    pub original_name: String,
    /// Output name; falls back to `original_name` when blank.
    #[serde(default)]
    pub alias: String,
    #[serde(default, rename = "type")]
    pub field_type: FieldType,
    #[serde(default = "default_include")]
    pub include: bool,
}

fn default_include() -> bool {
    true
}

impl SchemaEntry {
    pub fn new(
        source_name: impl Into<String>,
        original_name: impl Into<String>,
        field_type: FieldType,
    ) -> Self {
        Self {
            source_name: source_name.into(),
            original_name: original_name.into(),
            alias: String::new(),
            field_type,
            include: true,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    pub fn excluded(mut self) -> Self {
        self.include = false;
        self
    }

    /// Key the value is written under.
    pub fn destination(&self) -> &str {
        if self.alias.trim().is_empty() {
            &self.original_name
        } else {
            &self.alias
        }
    }
}
