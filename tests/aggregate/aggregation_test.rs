use tessera::aggregate::{AggregationEngine, AggregationQuery, CachedPrefilter};
use tessera::chart::{AggregationKind, ChartDataAdapter};
use tessera::model::{ElementRecord, FilterCondition, LogicalOperator, MasterDataset};

fn scenario() -> MasterDataset {
    MasterDataset::new(vec![
        ElementRecord::new(1, "Wall 1")
            .with_attribute("Category", "Wall")
            .with_attribute("Cost", 100.0),
        ElementRecord::new(2, "Wall 2")
            .with_attribute("Category", "Wall")
            .with_attribute("Cost", 200.0),
        ElementRecord::new(3, "Door 1")
            .with_attribute("Category", "Door")
            .with_attribute("Cost", 50.0),
    ])
}

fn materials() -> MasterDataset {
    MasterDataset::new(vec![
        ElementRecord::new(1, "a")
            .with_attribute("Category", "Wall")
            .with_attribute("Material", "Structural Steel"),
        ElementRecord::new(2, "b")
            .with_attribute("Category", "Wall")
            .with_attribute("Material", "Concrete"),
        ElementRecord::new(3, "c")
            .with_attribute("Category", "Beam")
            .with_attribute("Material", "Steel S355"),
        ElementRecord::new(4, "d")
            .with_attribute("Category", "Door")
            .with_attribute("Material", "Oak"),
    ])
}

fn cached(dataset: &MasterDataset, query: &AggregationQuery) -> tessera::model::AggregationResult {
    AggregationEngine::default().aggregate_cached(dataset, query, &CachedPrefilter::none())
}

#[test]
fn test_group_by_category_with_sum() {
    let result = cached(&scenario(), &AggregationQuery::group_by("Category").sum("Cost"));

    assert_eq!(result.len(), 2);

    let wall = result.get("Wall").unwrap();
    assert_eq!(wall.ids, vec![1, 2]);
    assert_eq!(wall.count, 2);
    assert_eq!(wall.sum, Some(300.0));

    let door = result.get("Door").unwrap();
    assert_eq!(door.ids, vec![3]);
    assert_eq!(door.count, 1);
    assert_eq!(door.sum, Some(50.0));
}

#[test]
fn test_scope_restricts_groups() {
    let query = AggregationQuery::group_by("Category").scope([3]);
    let result = cached(&scenario(), &query);

    assert!(result.get("Door").is_some());
    assert!(result.get("Wall").is_none());
}

#[test]
fn test_and_filters_require_both() {
    let query = AggregationQuery::group_by("Category")
        .filter(FilterCondition::equals("Category", "Wall"))
        .filter(FilterCondition::contains("Material", "steel"));
    let result = cached(&materials(), &query);

    assert_eq!(result.len(), 1);
    assert_eq!(result.get("Wall").unwrap().ids, vec![1]);
}

#[test]
fn test_or_filters_accept_either() {
    let query = AggregationQuery::group_by("Category")
        .filter(FilterCondition::equals("Category", "Wall"))
        .filter(FilterCondition::contains("Material", "steel"))
        .logic(LogicalOperator::Or);
    let result = cached(&materials(), &query);

    assert_eq!(result.get("Wall").unwrap().ids, vec![1, 2]);
    assert_eq!(result.get("Beam").unwrap().ids, vec![3]);
    assert!(result.get("Door").is_none());
}

#[test]
fn test_undefined_filter_matches_missing_values() {
    let mut records: Vec<ElementRecord> = materials().records().to_vec();
    records.push(ElementRecord::new(5, "e").with_attribute("Category", "Wall"));
    let dataset = MasterDataset::new(records);

    let query = AggregationQuery::group_by("Category")
        .filter(FilterCondition::equals("Material", "Undefined"));
    let result = cached(&dataset, &query);

    assert_eq!(result.get("Wall").unwrap().ids, vec![5]);
    assert_eq!(result.len(), 1);
}

#[test]
fn test_table_projection() {
    let rows = cached(&scenario(), &AggregationQuery::group_by("Category")).to_table();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].values, vec!["Wall"]);
    assert_eq!(rows[0].count, 2);
    assert_eq!(rows[0].percentage, 66.7);
    assert_eq!(rows[0].ids, vec![1, 2]);
    assert_eq!(rows[1].percentage, 33.3);
}

#[test]
fn test_multi_attribute_table_rows() {
    let query = AggregationQuery::group_by_all(["Category", "Material"]);
    let rows = cached(&materials(), &query).to_table();

    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0].values, vec!["Wall", "Structural Steel"]);
    assert_eq!(rows[0].percentage, 25.0);
    assert_eq!(rows[0].sum, None);
}

#[test]
fn test_table_rows_carry_group_sum() {
    let query = AggregationQuery::group_by("Category").sum("Cost");
    let rows = cached(&scenario(), &query).to_table();

    assert_eq!(rows[0].sum, Some(300.0));
    assert_eq!(rows[1].sum, Some(50.0));
}

#[test]
fn test_chart_series_from_result() {
    let result = cached(&scenario(), &AggregationQuery::group_by("Category").sum("Cost"));
    let chart = ChartDataAdapter::new().adapt(&result, AggregationKind::Sum);

    assert_eq!(chart.labels, vec!["Wall", "Door"]);
    assert_eq!(chart.values, vec![300.0, 50.0]);
    assert_eq!(chart.ids_for("Wall"), Some(&[1, 2][..]));
}

#[test]
fn test_result_json_snapshot() {
    let result = cached(&scenario(), &AggregationQuery::group_by("Category").sum("Cost"));
    let json = serde_json::to_string(&result).unwrap();
    insta::assert_snapshot!(json, @r#"{"groups":{"Wall":{"ids":[1,2],"count":2,"sum":300.0},"Door":{"ids":[3],"count":1,"sum":50.0}},"total_in_scope":3}"#);
}
