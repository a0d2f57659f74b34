//! Filter conditions applied during aggregation.

use serde::{Deserialize, Serialize};

/// Comparison performed by a [`FilterCondition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    /// Exact match after stringification.
    Equals,
    /// Case-insensitive substring.
    Contains,
    NotEquals,
}

impl std::str::FromStr for FilterOperator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "equals" | "eq" | "==" => Ok(FilterOperator::Equals),
            "contains" | "like" => Ok(FilterOperator::Contains),
            "not_equals" | "ne" | "!=" => Ok(FilterOperator::NotEquals),
            other => Err(format!("unknown filter operator: {}", other)),
        }
    }
}

/// How several conditions combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOperator {
    #[default]
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCondition {
    pub attribute: String,
    pub operator: FilterOperator,
    pub value: String,
}

impl FilterCondition {
    pub fn new(
        attribute: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<String>,
    ) -> Self {
        Self {
            attribute: attribute.into(),
            operator,
            value: value.into(),
        }
    }

    pub fn equals(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(attribute, FilterOperator::Equals, value)
    }

    pub fn contains(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(attribute, FilterOperator::Contains, value)
    }

    pub fn not_equals(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(attribute, FilterOperator::NotEquals, value)
    }
}
