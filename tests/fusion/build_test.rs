use std::time::Duration;

use tessera::fusion::{BuildError, MasterDataBuilder};
use tessera::model::{
    Attributes, Calculation, ElementRecord, ExternalSource, FieldType, JoinMapping, SchemaEntry,
    SyncStatus, TabularData, Value,
};
use tessera::provider::{InMemoryModel, ModelElement};

fn builder() -> MasterDataBuilder {
    MasterDataBuilder::new(Duration::from_secs(120))
}

fn walls() -> InMemoryModel {
    InMemoryModel::from_records(vec![
        ElementRecord::new(1, "Wall 1").with_attribute("Mark", "W-01"),
        ElementRecord::new(2, "Wall 2").with_attribute("Mark", " w-02 "),
        ElementRecord::new(3, "Wall 3").with_attribute("Mark", "W-03"),
        ElementRecord::new(4, "Wall 4"),
    ])
}

fn row(pairs: &[(&str, &str)]) -> Attributes {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), Value::text(*v)))
        .collect()
}

fn cost_source() -> ExternalSource {
    ExternalSource::from_data(
        "costs.csv",
        TabularData {
            headers: vec!["Tag".into(), "Unit Cost".into(), "Supplier".into()],
            rows: vec![
                row(&[("Tag", "W-01"), ("Unit Cost", "120"), ("Supplier", "Acme")]),
                row(&[("Tag", "W-02"), ("Unit Cost", "80"), ("Supplier", "Birch")]),
                row(&[("Tag", "X-99"), ("Unit Cost", "5"), ("Supplier", "Nobody")]),
            ],
        },
        JoinMapping::new("Mark", "Tag"),
    )
}

#[tokio::test]
async fn test_join_matches_case_and_whitespace_insensitively() {
    let outcome = builder().build(&walls(), &[cost_source()], &[]).await;

    assert!(outcome.is_ok());
    assert_eq!(outcome.stats.len(), 1);
    assert_eq!(outcome.stats[0].match_count, 2);
    assert_eq!(outcome.stats[0].total_rows, 3);

    let dataset = &outcome.dataset;
    let wall1 = dataset.get(1).unwrap();
    assert_eq!(wall1.get("Unit Cost"), Some(&Value::text("120")));
    assert_eq!(wall1.get("Supplier"), Some(&Value::text("Acme")));
    assert_eq!(wall1.get("Tag"), Some(&Value::text("W-01")));

    let wall2 = dataset.get(2).unwrap();
    assert_eq!(wall2.get("Supplier"), Some(&Value::text("Birch")));

    assert!(dataset.get(3).unwrap().get("Supplier").is_none());
    assert!(dataset.get(4).unwrap().get("Supplier").is_none());
}

#[tokio::test]
async fn test_zero_matches_classify_as_warning() {
    let source = ExternalSource::from_data(
        "other.csv",
        TabularData {
            headers: vec!["Tag".into()],
            rows: vec![row(&[("Tag", "Z-1")])],
        },
        JoinMapping::new("Mark", "Tag"),
    );
    let outcome = builder().build(&walls(), &[source], &[]).await;

    assert_eq!(outcome.stats[0].match_count, 0);
    assert!(matches!(outcome.stats[0].classify(), SyncStatus::Warning(_)));
}

#[tokio::test]
async fn test_later_sources_overwrite_earlier_fields() {
    let override_source = ExternalSource::from_data(
        "override.csv",
        TabularData {
            headers: vec!["Tag".into(), "Supplier".into()],
            rows: vec![row(&[("Tag", "W-01"), ("Supplier", "Cedar")])],
        },
        JoinMapping::new("Mark", "Tag"),
    );
    let outcome = builder()
        .build(&walls(), &[cost_source(), override_source], &[])
        .await;

    let wall1 = outcome.dataset.get(1).unwrap();
    assert_eq!(wall1.get("Supplier"), Some(&Value::text("Cedar")));
    assert_eq!(wall1.get("Unit Cost"), Some(&Value::text("120")));
}

#[tokio::test]
async fn test_calculations_run_in_order() {
    let model = InMemoryModel::from_records(vec![ElementRecord::new(1, "a")
        .with_attribute("A", 10.0)
        .with_attribute("B", 5.0)]);
    let calcs = vec![
        Calculation::new("C", "[A] * 2 + [B]"),
        Calculation::new("D", "[C] / 2"),
    ];

    let outcome = builder().build(&model, &[], &calcs).await;
    let record = outcome.dataset.get(1).unwrap();

    assert_eq!(record.get("C"), Some(&Value::Number(25.0)));
    assert_eq!(record.get("D"), Some(&Value::Number(12.5)));
}

#[tokio::test]
async fn test_invalid_formula_nulls_only_that_column() {
    let model = InMemoryModel::from_records(vec![ElementRecord::new(1, "a").with_attribute("A", 3.0)]);
    let calcs = vec![
        Calculation::new("Bad", "[A] + require('fs')"),
        Calculation::new("Good", "[A] * 3"),
    ];

    let outcome = builder().build(&model, &[], &calcs).await;
    let record = outcome.dataset.get(1).unwrap();

    assert!(outcome.is_ok());
    assert_eq!(record.get("Bad"), Some(&Value::Null));
    assert_eq!(record.get("Good"), Some(&Value::Number(9.0)));
}

#[tokio::test]
async fn test_calculation_over_joined_fields() {
    let calcs = vec![Calculation::new("Doubled", "[Unit Cost] * 2")];
    let outcome = builder().build(&walls(), &[cost_source()], &calcs).await;

    assert_eq!(
        outcome.dataset.get(2).unwrap().get("Doubled"),
        Some(&Value::Number(160.0))
    );
    assert_eq!(
        outcome.dataset.get(4).unwrap().get("Doubled"),
        Some(&Value::Number(0.0))
    );
}

#[tokio::test]
async fn test_schema_projection_applies_last() {
    let schema = vec![
        SchemaEntry::new("model", "Mark", FieldType::Text),
        SchemaEntry::new("costs.csv", "Unit Cost", FieldType::Number).with_alias("Cost"),
    ];
    let outcome = builder()
        .with_schema(schema)
        .build(&walls(), &[cost_source()], &[])
        .await;

    let wall1 = outcome.dataset.get(1).unwrap();
    assert_eq!(wall1.attributes.len(), 2);
    assert_eq!(wall1.get("Cost"), Some(&Value::Number(120.0)));
    assert!(wall1.get("Supplier").is_none());
    assert_eq!(outcome.dataset.get(4).unwrap().get("Cost"), Some(&Value::Null));
}

#[tokio::test]
async fn test_only_leaves_are_built() {
    let model = InMemoryModel::new(vec![
        ModelElement {
            id: 10,
            name: "Level 1".into(),
            parent: None,
            attributes: Attributes::new(),
        },
        ModelElement {
            id: 11,
            name: "Wall".into(),
            parent: Some(10),
            attributes: Attributes::new(),
        },
    ]);

    let outcome = builder().build(&model, &[], &[]).await;
    assert_eq!(outcome.dataset.ids(), vec![11]);
}

#[tokio::test]
async fn test_missing_hierarchy_is_a_build_error() {
    let model = walls().without_hierarchy();
    let outcome = builder().build(&model, &[cost_source()], &[]).await;

    assert!(matches!(outcome.error, Some(BuildError::HierarchyUnavailable(_))));
    assert!(outcome
        .error_message()
        .unwrap()
        .contains("hierarchy unavailable"));
    assert!(outcome.dataset.is_empty());
}

#[tokio::test]
async fn test_empty_model_is_a_build_error() {
    let outcome = builder().build(&InMemoryModel::new(Vec::new()), &[], &[]).await;
    assert_eq!(outcome.error, Some(BuildError::NoElements));
}
