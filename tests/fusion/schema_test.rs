use chrono::{Datelike, TimeZone, Utc};
use tessera::model::{Attributes, ElementRecord, FieldType, SchemaEntry, Value};
use tessera::schema::{apply, coerce, coerce_date, SchemaTransformer};

fn attrs(pairs: &[(&str, Value)]) -> Attributes {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[test]
fn test_alias_collision_keeps_non_empty_value() {
    let raw = attrs(&[
        ("Unit Cost", Value::Number(120.0)),
        ("Cost (EUR)", Value::Null),
    ]);
    let entries = vec![
        SchemaEntry::new("a.csv", "Unit Cost", FieldType::Number).with_alias("Cost"),
        SchemaEntry::new("b.csv", "Cost (EUR)", FieldType::Number).with_alias("Cost"),
    ];

    let out = apply(&raw, &entries);
    assert_eq!(out.get("Cost"), Some(&Value::Number(120.0)));
    assert_eq!(out.len(), 1);
}

#[test]
fn test_alias_collision_later_non_empty_value_wins() {
    let raw = attrs(&[
        ("Unit Cost", Value::Number(120.0)),
        ("Cost (EUR)", Value::text("95")),
    ]);
    let entries = vec![
        SchemaEntry::new("a.csv", "Unit Cost", FieldType::Number).with_alias("Cost"),
        SchemaEntry::new("b.csv", "Cost (EUR)", FieldType::Number).with_alias("Cost"),
    ];

    assert_eq!(apply(&raw, &entries).get("Cost"), Some(&Value::Number(95.0)));
}

#[test]
fn test_excluded_entries_are_dropped() {
    let raw = attrs(&[("Mark", Value::text("W1")), ("Comments", Value::text("x"))]);
    let entries = vec![
        SchemaEntry::new("model", "Mark", FieldType::Text),
        SchemaEntry::new("model", "Comments", FieldType::Text).excluded(),
    ];

    let out = apply(&raw, &entries);
    assert_eq!(out.keys().collect::<Vec<_>>(), vec!["Mark"]);
}

#[test]
fn test_type_coercion() {
    assert_eq!(coerce(&Value::text("12.5 m"), FieldType::Number), Value::Number(12.5));
    assert_eq!(coerce(&Value::text("n/a"), FieldType::Number), Value::Number(0.0));
    assert_eq!(coerce(&Value::text("YES"), FieldType::Boolean), Value::Bool(true));
    assert_eq!(coerce(&Value::text("no"), FieldType::Boolean), Value::Bool(false));
    assert_eq!(coerce(&Value::Number(300.0), FieldType::Text), Value::text("300"));
    assert_eq!(coerce(&Value::text("  "), FieldType::Number), Value::Null);
    assert_eq!(coerce(&Value::Null, FieldType::Boolean), Value::Null);
}

#[test]
fn test_serial_date_coercion() {
    let Value::Date(date) = coerce_date(&Value::Number(45000.0)) else {
        panic!("expected a date");
    };
    assert_eq!(date.year(), 2023);
    assert_eq!((date.month(), date.day()), (3, 15));
}

#[test]
fn test_literal_zero_text_is_preserved() {
    assert_eq!(coerce(&Value::text("0"), FieldType::Date), Value::text("0"));
}

#[test]
fn test_small_numbers_are_not_dates() {
    assert_eq!(coerce_date(&Value::Number(250.0)), Value::Number(250.0));
    assert_eq!(coerce_date(&Value::text("Phase 2")), Value::text("Phase 2"));
}

#[test]
fn test_text_dates() {
    let expected = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    assert_eq!(coerce_date(&Value::text("2024-06-01")), Value::Date(expected));
    assert_eq!(coerce_date(&Value::text("06/01/2024")), Value::Date(expected));
}

#[test]
fn test_transformer_keeps_identity() {
    let transformer = SchemaTransformer::new(vec![SchemaEntry::new(
        "model",
        "Area",
        FieldType::Number,
    )]);
    let record = ElementRecord::new(7, "Slab").with_attribute("Area", "42.5");

    let out = transformer.transform(&record);
    assert_eq!(out.id, 7);
    assert_eq!(out.name, "Slab");
    assert_eq!(out.get("Area"), Some(&Value::Number(42.5)));
}
