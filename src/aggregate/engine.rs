//! Live and cached aggregation paths.

use std::collections::HashSet;
use std::time::Duration;

use tracing::{debug, warn};

use super::group::aggregate_records;
use super::query::{AggregationQuery, CachedPrefilter, DateCutoff};
use crate::config::{AggregationSettings, SettingsError};
use crate::model::{AggregationResult, ElementId, ElementRecord, MasterDataset, Value};
use crate::provider::{with_timeout, ModelDataProvider};
use crate::schema::coerce_date;

/// Aggregates model elements, either straight from the model (live) or
/// from a built [`MasterDataset`] (cached).
///
/// Both paths filter and group through the same core, so equivalent
/// inputs give identical `group -> count` maps.
#[derive(Debug, Clone)]
pub struct AggregationEngine {
    presence_attribute: String,
    fetch_timeout: Duration,
}

impl Default for AggregationEngine {
    fn default() -> Self {
        Self::new("Name", Duration::from_secs(60))
    }
}

impl AggregationEngine {
    pub fn new(presence_attribute: impl Into<String>, fetch_timeout: Duration) -> Self {
        Self {
            presence_attribute: presence_attribute.into(),
            fetch_timeout,
        }
    }

    pub fn from_settings(settings: &AggregationSettings) -> Result<Self, SettingsError> {
        Ok(Self::new(
            settings.presence_attribute.clone(),
            settings.fetch_timeout()?,
        ))
    }

    /// Live path: fetch only the attributes the query needs for the leaves
    /// in scope (or every leaf) and aggregate them.
    ///
    /// Model failures degrade to an empty result.
    pub async fn aggregate_live(
        &self,
        model: &dyn ModelDataProvider,
        query: &AggregationQuery,
    ) -> AggregationResult {
        if query.group_by.is_empty() {
            return AggregationResult::default();
        }

        if query.scope.as_ref().is_some_and(|scope| scope.is_empty()) {
            return AggregationResult::default();
        }

        let leaves = match with_timeout(self.fetch_timeout, model.leaf_ids(None)).await {
            Ok(ids) => ids,
            Err(err) => {
                warn!(error = %err, "live aggregation could not list elements");
                return AggregationResult::default();
            }
        };

        // Only leaves are aggregated, matching the synced dataset.
        let ids = match &query.scope {
            Some(scope) => {
                let leaves = to_set(&leaves);
                scope
                    .iter()
                    .copied()
                    .filter(|id| leaves.contains(id))
                    .collect()
            }
            None => leaves,
        };
        let ids = dedupe(ids);
        if ids.is_empty() {
            return AggregationResult::default();
        }

        let attributes = query.required_attributes(&self.presence_attribute);
        let records = match with_timeout(
            self.fetch_timeout,
            model.bulk_properties(&ids, Some(&attributes)),
        )
        .await
        {
            Ok(records) => records,
            Err(err) => {
                warn!(error = %err, "live aggregation fetch failed");
                return AggregationResult::default();
            }
        };

        debug!(
            elements = records.len(),
            attributes = attributes.len(),
            "aggregating live"
        );
        aggregate_records(&records, query)
    }

    /// Cached path: apply the date cutoff, the prefilter scope and the query
    /// scope to the dataset, then aggregate.
    pub fn aggregate_cached(
        &self,
        dataset: &MasterDataset,
        query: &AggregationQuery,
        prefilter: &CachedPrefilter,
    ) -> AggregationResult {
        let query_scope = query.scope.as_ref().map(|ids| to_set(ids));
        let cross_scope = prefilter.scope.as_ref().map(|ids| to_set(ids));

        let rows = dataset
            .iter()
            .filter(|r| in_scope(r.id, query_scope.as_ref()))
            .filter(|r| in_scope(r.id, cross_scope.as_ref()))
            .filter(|r| {
                prefilter
                    .date_cutoff
                    .as_ref()
                    .map_or(true, |cutoff| before_cutoff(r, cutoff))
            });

        aggregate_records(rows, query)
    }
}

fn dedupe(ids: Vec<ElementId>) -> Vec<ElementId> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

fn to_set(ids: &[ElementId]) -> HashSet<ElementId> {
    ids.iter().copied().collect()
}

fn in_scope(id: ElementId, scope: Option<&HashSet<ElementId>>) -> bool {
    scope.map_or(true, |s| s.contains(&id))
}

/// Rows without a readable date fall outside any cutoff.
fn before_cutoff(record: &ElementRecord, cutoff: &DateCutoff) -> bool {
    match record.get(&cutoff.attribute).map(coerce_date) {
        Some(Value::Date(date)) => date <= cutoff.reference,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn dataset() -> MasterDataset {
        MasterDataset::new(vec![
            ElementRecord::new(1, "a")
                .with_attribute("Category", "Wall")
                .with_attribute("Installed", "2023-01-10"),
            ElementRecord::new(2, "b")
                .with_attribute("Category", "Wall")
                .with_attribute("Installed", "2023-06-01"),
            ElementRecord::new(3, "c").with_attribute("Category", "Door"),
        ])
    }

    #[test]
    fn test_date_cutoff_keeps_earlier_rows() {
        let engine = AggregationEngine::default();
        let cutoff = DateCutoff::new(
            "Installed",
            Utc.with_ymd_and_hms(2023, 3, 1, 0, 0, 0).unwrap(),
        );
        let result = engine.aggregate_cached(
            &dataset(),
            &AggregationQuery::group_by("Category"),
            &CachedPrefilter::none().with_date_cutoff(cutoff),
        );

        assert_eq!(result.get("Wall").map(|b| b.ids.clone()), Some(vec![1]));
        assert!(result.get("Door").is_none());
        assert_eq!(result.total_in_scope, 1);
    }

    #[test]
    fn test_scopes_intersect() {
        let engine = AggregationEngine::default();
        let query = AggregationQuery::group_by("Category").scope([1, 2]);
        let prefilter = CachedPrefilter::none().with_scope([2, 3]);
        let result = engine.aggregate_cached(&dataset(), &query, &prefilter);

        assert_eq!(result.get("Wall").map(|b| b.ids.clone()), Some(vec![2]));
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_empty_scope_is_empty() {
        let engine = AggregationEngine::default();
        let query = AggregationQuery::group_by("Category").scope([]);
        let result = engine.aggregate_cached(&dataset(), &query, &CachedPrefilter::none());

        assert!(result.is_empty());
        assert_eq!(result.total_in_scope, 0);
    }
}
