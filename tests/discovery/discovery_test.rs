use std::time::Duration;

use tessera::config::DiscoverySettings;
use tessera::discovery::{AttemptOutcome, DiscoveryError, PropertyDiscoveryService};
use tessera::model::{Calculation, ElementRecord, ExternalSource, JoinMapping, TabularData};
use tessera::provider::{
    Capability, InMemoryModel, ModelElement, PropertyDefinition, PropertyDefinitions,
};

const ENTERPRISE_VERSION: &str = "urn:adsk.wipprod:fs.file:vf.Qx7Lm2?version=4";

fn service() -> PropertyDiscoveryService {
    PropertyDiscoveryService::from_settings(&DiscoverySettings::default()).unwrap()
}

fn leaf_model() -> InMemoryModel {
    InMemoryModel::from_records(vec![
        ElementRecord::new(1, "Wall 1")
            .with_attribute("Category", "Wall")
            .with_attribute("Material", "Concrete"),
        ElementRecord::new(2, "Door 1")
            .with_attribute("Category", "Door")
            .with_attribute("Fire Rating", "EI30"),
    ])
}

fn definitions(names: &[&str]) -> PropertyDefinitions {
    let mut defs = PropertyDefinitions::default();
    defs.by_group.insert(
        "Walls".to_string(),
        names
            .iter()
            .map(|n| PropertyDefinition {
                name: n.to_string(),
                category: Some("Identity Data".to_string()),
            })
            .collect(),
    );
    defs
}

#[test]
fn test_standard_chain_order() {
    assert_eq!(
        service().layer_names(),
        vec!["metadata_query", "property_db", "sample_scan", "id_probe"]
    );
}

#[tokio::test]
async fn test_metadata_query_wins_for_enterprise_versions() {
    let model = leaf_model()
        .with_version_id(ENTERPRISE_VERSION)
        .with_metadata(definitions(&["Assembly Code", "Mark"]));

    let discovery = service().discover_detailed(&model).await;

    assert_eq!(discovery.layer, Some("metadata_query"));
    assert_eq!(discovery.catalog.to_vec(), vec!["Assembly Code", "Mark"]);
    assert_eq!(discovery.attempts.len(), 1);
}

#[tokio::test]
async fn test_non_enterprise_version_skips_metadata_query() {
    let model = leaf_model()
        .with_version_id("local-model-3")
        .with_metadata(definitions(&["Assembly Code"]))
        .with_definitions(["Area", "Volume"]);

    let discovery = service().discover_detailed(&model).await;

    assert_eq!(discovery.layer, Some("property_db"));
    assert_eq!(discovery.attempts[0].outcome, AttemptOutcome::Empty);
    assert_eq!(discovery.catalog.to_vec(), vec!["Area", "Volume"]);
}

#[tokio::test]
async fn test_falls_back_to_sample_scan() {
    let discovery = service().discover_detailed(&leaf_model()).await;

    assert_eq!(discovery.layer, Some("sample_scan"));
    assert_eq!(
        discovery.catalog.to_vec(),
        vec!["Category", "Fire Rating", "Material"]
    );
    assert!(matches!(
        discovery.attempts[1].outcome,
        AttemptOutcome::Failed(ref e) if e.is_unsupported()
    ));
}

#[tokio::test(start_paused = true)]
async fn test_property_db_timeout_resolves_empty() {
    let model = leaf_model()
        .with_definitions(["Never Seen"])
        .with_latency(Capability::AttributeDefinitions, Duration::from_secs(120));

    let discovery = service().discover_detailed(&model).await;

    assert_eq!(discovery.layer, Some("sample_scan"));
    assert_eq!(
        discovery.attempts[1].outcome,
        AttemptOutcome::Failed(DiscoveryError::Timeout {
            layer: "property_db",
            secs: 45,
        })
    );
    assert!(!discovery.catalog.contains("Never Seen"));
}

#[tokio::test]
async fn test_id_probe_when_hierarchy_missing() {
    let model = InMemoryModel::new(vec![
        ModelElement {
            id: 5,
            name: "Column".into(),
            parent: None,
            attributes: [("Structural Usage".to_string(), "Column".into())]
                .into_iter()
                .collect(),
        },
        ModelElement {
            id: 7,
            name: "Beam".into(),
            parent: None,
            attributes: [("Span".to_string(), 6.0.into())].into_iter().collect(),
        },
    ])
    .without_hierarchy();

    let discovery = service().discover_detailed(&model).await;

    // Only probe id 5 is in the model; 7 is not a probe id.
    assert_eq!(discovery.layer, Some("id_probe"));
    assert_eq!(discovery.catalog.to_vec(), vec!["Structural Usage"]);
}

#[tokio::test]
async fn test_no_layer_yields_empty_catalog() {
    let model = InMemoryModel::new(Vec::new()).without_hierarchy();
    let discovery = service().discover_detailed(&model).await;

    assert!(discovery.catalog.is_empty());
    assert_eq!(discovery.layer, None);
    assert_eq!(discovery.attempts.len(), 4);
}

#[tokio::test]
async fn test_discovery_is_idempotent() {
    let model = leaf_model();
    let service = service();

    let first = service.discover(&model).await;
    let second = service.discover(&model).await;

    assert_eq!(first, second);
    let names = first.to_vec();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
}

#[test]
fn test_full_catalog_unions_sources_and_calculations() {
    let model_catalog = tessera::model::PropertyCatalog::from_names(["Category", "Mark"]);
    let source = ExternalSource::from_data(
        "costs.csv",
        TabularData {
            headers: vec!["Mark".into(), "Unit Cost".into()],
            rows: vec![],
        },
        JoinMapping::new("Mark", "Mark"),
    );
    let calcs = vec![Calculation::new("Total Cost", "[Unit Cost] * 2")];

    let catalog = PropertyDiscoveryService::full_catalog(&model_catalog, &[source], &calcs);

    assert_eq!(
        catalog.to_vec(),
        vec!["Category", "Mark", "Total Cost", "Unit Cost"]
    );
}
