//! The discovery layer contract and the four standard layers.

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use super::error::DiscoveryResult;
use crate::model::{ElementId, ElementRecord};
use crate::provider::ModelDataProvider;

/// One layer of the discovery chain.
///
/// A layer either yields attribute names (possibly none) or an error; the
/// driver treats both an empty answer and an error as "try the next layer".
#[async_trait]
pub trait DiscoveryStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Budget for [`attempt`](Self::attempt). The driver stops waiting
    /// once it elapses and treats the layer as empty.
    fn timeout(&self) -> Duration;

    async fn attempt(&self, model: &dyn ModelDataProvider) -> DiscoveryResult<Vec<String>>;
}

fn attribute_names(records: &[ElementRecord]) -> Vec<String> {
    let names: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.attributes.keys().map(String::as_str))
        .collect();
    names.into_iter().map(str::to_string).collect()
}

// =============================================================================
// Layer 1: structured metadata query
// =============================================================================

/// Queries declared property definitions for enterprise-hosted models.
///
/// Only applies when the model's version id matches one of the configured
/// patterns; other models yield nothing.
pub struct MetadataQueryStrategy {
    patterns: Vec<Regex>,
    timeout: Duration,
}

impl MetadataQueryStrategy {
    pub fn new(patterns: Vec<Regex>, timeout: Duration) -> Self {
        Self { patterns, timeout }
    }

    pub fn matches(&self, version_id: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(version_id))
    }
}

#[async_trait]
impl DiscoveryStrategy for MetadataQueryStrategy {
    fn name(&self) -> &'static str {
        "metadata_query"
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn attempt(&self, model: &dyn ModelDataProvider) -> DiscoveryResult<Vec<String>> {
        let Some(version_id) = model.version_id() else {
            return Ok(Vec::new());
        };
        if !self.matches(&version_id) {
            debug!(version_id = %version_id, "version is not enterprise-hosted, skipping metadata query");
            return Ok(Vec::new());
        }

        let definitions = model.query_property_definitions(&version_id).await?;
        Ok(definitions.names().map(str::to_string).collect())
    }
}

// =============================================================================
// Layer 2: local property database
// =============================================================================

/// Reads attribute definitions straight from the model's property store.
pub struct PropertyDbStrategy {
    timeout: Duration,
}

impl PropertyDbStrategy {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl DiscoveryStrategy for PropertyDbStrategy {
    fn name(&self) -> &'static str {
        "property_db"
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn attempt(&self, model: &dyn ModelDataProvider) -> DiscoveryResult<Vec<String>> {
        Ok(model.attribute_definitions().await?)
    }
}

// =============================================================================
// Layer 3: deep sample scan
// =============================================================================

/// Fetches every attribute of the first `sample_size` leaves.
pub struct SampleScanStrategy {
    sample_size: usize,
    timeout: Duration,
}

impl SampleScanStrategy {
    pub fn new(sample_size: usize, timeout: Duration) -> Self {
        Self {
            sample_size,
            timeout,
        }
    }
}

#[async_trait]
impl DiscoveryStrategy for SampleScanStrategy {
    fn name(&self) -> &'static str {
        "sample_scan"
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn attempt(&self, model: &dyn ModelDataProvider) -> DiscoveryResult<Vec<String>> {
        let mut leaves = model.leaf_ids(None).await?;
        leaves.truncate(self.sample_size);
        if leaves.is_empty() {
            return Ok(Vec::new());
        }

        let records = model.bulk_properties(&leaves, None).await?;
        Ok(attribute_names(&records))
    }
}

// =============================================================================
// Layer 4: direct id probing
// =============================================================================

/// Probes a fixed set of element ids. Works without any hierarchy.
pub struct IdProbeStrategy {
    ids: Vec<ElementId>,
    timeout: Duration,
}

impl IdProbeStrategy {
    pub fn new(ids: Vec<ElementId>, timeout: Duration) -> Self {
        Self { ids, timeout }
    }
}

#[async_trait]
impl DiscoveryStrategy for IdProbeStrategy {
    fn name(&self) -> &'static str {
        "id_probe"
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn attempt(&self, model: &dyn ModelDataProvider) -> DiscoveryResult<Vec<String>> {
        let records = model.bulk_properties(&self.ids, None).await?;
        Ok(attribute_names(&records))
    }
}
