//! Aggregation requests.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{ElementId, FilterCondition, LogicalOperator};

/// What to aggregate and how.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregationQuery {
    /// One attribute for value grouping, several for tuple grouping.
    pub group_by: Vec<String>,
    #[serde(default)]
    pub filters: Vec<FilterCondition>,
    #[serde(default)]
    pub logic: LogicalOperator,
    #[serde(default)]
    pub sum_attribute: Option<String>,
    /// Restrict to these element ids.
    #[serde(default)]
    pub scope: Option<Vec<ElementId>>,
}

impl AggregationQuery {
    pub fn group_by(attribute: impl Into<String>) -> Self {
        Self {
            group_by: vec![attribute.into()],
            ..Default::default()
        }
    }

    pub fn group_by_all<I, S>(attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            group_by: attributes.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn filter(mut self, condition: FilterCondition) -> Self {
        self.filters.push(condition);
        self
    }

    pub fn logic(mut self, logic: LogicalOperator) -> Self {
        self.logic = logic;
        self
    }

    pub fn sum(mut self, attribute: impl Into<String>) -> Self {
        self.sum_attribute = Some(attribute.into());
        self
    }

    pub fn scope(mut self, ids: impl IntoIterator<Item = ElementId>) -> Self {
        self.scope = Some(ids.into_iter().collect());
        self
    }

    pub fn is_multi(&self) -> bool {
        self.group_by.len() > 1
    }

    /// Attributes the live path has to fetch: group, filter and sum
    /// attributes plus the presence attribute, without duplicates.
    pub fn required_attributes(&self, presence_attribute: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        self.group_by
            .iter()
            .chain(self.filters.iter().map(|f| &f.attribute))
            .chain(self.sum_attribute.iter())
            .map(String::as_str)
            .chain(std::iter::once(presence_attribute))
            .filter(|a| !a.is_empty() && seen.insert(*a))
            .map(str::to_string)
            .collect()
    }
}

/// Keep rows whose `attribute` holds a date on or before `reference`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateCutoff {
    pub attribute: String,
    pub reference: DateTime<Utc>,
}

impl DateCutoff {
    pub fn new(attribute: impl Into<String>, reference: DateTime<Utc>) -> Self {
        Self {
            attribute: attribute.into(),
            reference,
        }
    }
}

/// Row filters applied on the cached path before grouping.
///
/// The date cutoff backs timeline playback, the id scope backs
/// cross-filtering between dashboard widgets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CachedPrefilter {
    pub date_cutoff: Option<DateCutoff>,
    pub scope: Option<Vec<ElementId>>,
}

impl CachedPrefilter {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_date_cutoff(mut self, cutoff: DateCutoff) -> Self {
        self.date_cutoff = Some(cutoff);
        self
    }

    pub fn with_scope(mut self, ids: impl IntoIterator<Item = ElementId>) -> Self {
        self.scope = Some(ids.into_iter().collect());
        self
    }
}
