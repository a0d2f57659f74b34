//! User-defined computed columns.

use serde::{Deserialize, Serialize};

/// A computed column. The formula references other columns as
/// `[ColumnName]` tokens, e.g. `[Cost] * [Quantity]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calculation {
    pub name: String,
    pub formula: String,
}

impl Calculation {
    pub fn new(name: impl Into<String>, formula: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            formula: formula.into(),
        }
    }
}
