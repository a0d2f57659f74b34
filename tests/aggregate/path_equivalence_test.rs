use std::time::Duration;

use tessera::aggregate::{AggregationEngine, AggregationQuery, CachedPrefilter};
use tessera::fusion::MasterDataBuilder;
use tessera::model::{ElementRecord, FilterCondition, LogicalOperator, MasterDataset, Value};
use tessera::provider::{Capability, InMemoryModel, ModelElement, ProviderError};

fn model() -> InMemoryModel {
    let categories = ["Wall", "Door", "Window", "Wall", "Floor"];
    let materials = ["Concrete", "Oak", "Glass", "Steel Stud", "Concrete"];
    let levels = ["L1", "L2"];

    let records = (1..=40u64)
        .map(|id| {
            let i = id as usize;
            let mut record = ElementRecord::new(id, format!("Element {}", id))
                .with_attribute("Name", format!("Element {}", id))
                .with_attribute("Category", categories[i % categories.len()])
                .with_attribute("Level", levels[i % levels.len()])
                .with_attribute("Cost", (i * 10) as f64);
            if i % 7 != 0 {
                record.set("Material", materials[i % materials.len()]);
            } else {
                record.set("Material", Value::Null);
            }
            record
        })
        .collect();

    InMemoryModel::from_records(records)
}

async fn cached_dataset(model: &InMemoryModel) -> MasterDataset {
    let outcome = MasterDataBuilder::new(Duration::from_secs(60))
        .build(model, &[], &[])
        .await;
    assert!(outcome.is_ok());
    outcome.dataset
}

async fn assert_equivalent(query: AggregationQuery) {
    let model = model();
    let dataset = cached_dataset(&model).await;
    let engine = AggregationEngine::default();

    let live = engine.aggregate_live(&model, &query).await;
    let cached = engine.aggregate_cached(&dataset, &query, &CachedPrefilter::none());

    assert_eq!(live.counts(), cached.counts(), "query: {:?}", query);
    assert_eq!(live.total_in_scope, cached.total_in_scope);
    for (key, bucket) in &live.groups {
        let other = cached.get_key(key).unwrap();
        assert_eq!(bucket.ids, other.ids);
        assert_eq!(bucket.sum, other.sum);
    }
}

#[tokio::test]
async fn test_single_attribute() {
    assert_equivalent(AggregationQuery::group_by("Category").sum("Cost")).await;
}

#[tokio::test]
async fn test_tuple_grouping() {
    assert_equivalent(AggregationQuery::group_by_all(["Category", "Level"])).await;
}

#[tokio::test]
async fn test_missing_values() {
    assert_equivalent(AggregationQuery::group_by("Material")).await;
}

#[tokio::test]
async fn test_and_filters() {
    let query = AggregationQuery::group_by("Level")
        .filter(FilterCondition::equals("Category", "Wall"))
        .filter(FilterCondition::contains("Material", "steel"));
    assert_equivalent(query).await;
}

#[tokio::test]
async fn test_or_filters_with_undefined() {
    let query = AggregationQuery::group_by("Category")
        .filter(FilterCondition::equals("Material", "Undefined"))
        .filter(FilterCondition::not_equals("Level", "L1"))
        .logic(LogicalOperator::Or)
        .sum("Cost");
    assert_equivalent(query).await;
}

#[tokio::test]
async fn test_scoped() {
    assert_equivalent(AggregationQuery::group_by("Category").scope([2, 3, 5, 8, 13, 21, 99])).await;
}

#[tokio::test]
async fn test_live_path_fetches_only_needed_attributes() {
    let model = model();
    let query = AggregationQuery::group_by("Category").sum("Cost");
    let result = AggregationEngine::default().aggregate_live(&model, &query).await;

    assert_eq!(result.total_in_scope, 40);
    assert_eq!(
        query.required_attributes("Name"),
        vec!["Category", "Cost", "Name"]
    );
}

#[tokio::test]
async fn test_live_path_degrades_to_empty() {
    let model = model().with_failure(
        Capability::BulkProperties,
        ProviderError::Unavailable("viewer closed".into()),
    );
    let result = AggregationEngine::default()
        .aggregate_live(&model, &AggregationQuery::group_by("Category"))
        .await;

    assert!(result.is_empty());
}

#[tokio::test]
async fn test_empty_scope_on_both_paths() {
    let model = model();
    let dataset = cached_dataset(&model).await;
    let engine = AggregationEngine::default();
    let query = AggregationQuery::group_by("Category").scope([]);

    assert!(engine.aggregate_live(&model, &query).await.is_empty());
    assert!(engine
        .aggregate_cached(&dataset, &query, &CachedPrefilter::none())
        .is_empty());
}

#[tokio::test]
async fn test_scope_with_container_counts_only_leaves() {
    let element = |id: u64, parent: Option<u64>, category: &str| ModelElement {
        id,
        name: category.to_string(),
        parent,
        attributes: [("Category".to_string(), category.into())]
            .into_iter()
            .collect(),
    };
    let model = InMemoryModel::new(vec![
        element(1, None, "Level"),
        element(2, Some(1), "Wall"),
        element(3, Some(1), "Door"),
    ]);
    let dataset = cached_dataset(&model).await;
    let engine = AggregationEngine::default();
    let query = AggregationQuery::group_by("Category").scope([1, 2]);

    let live = engine.aggregate_live(&model, &query).await;
    let cached = engine.aggregate_cached(&dataset, &query, &CachedPrefilter::none());

    assert_eq!(live.counts(), cached.counts());
    assert!(live.get("Level").is_none());
    assert_eq!(live.get("Wall").map(|b| b.ids.clone()), Some(vec![2]));
    assert_eq!(live.total_in_scope, 1);
}
