//! The discovery driver.

use regex::Regex;
use tracing::{debug, info, warn};

use super::error::DiscoveryError;
use super::strategy::{
    DiscoveryStrategy, IdProbeStrategy, MetadataQueryStrategy, PropertyDbStrategy,
    SampleScanStrategy,
};
use crate::config::{DiscoverySettings, SettingsError};
use crate::model::{Calculation, ExternalSource, PropertyCatalog};
use crate::provider::ModelDataProvider;

/// How one layer of the chain fared.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    Found(usize),
    Empty,
    Failed(DiscoveryError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayerAttempt {
    pub layer: &'static str,
    pub outcome: AttemptOutcome,
}

/// Result of a discovery run with the per-layer trail.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Discovery {
    pub catalog: PropertyCatalog,
    /// Layer that produced the catalog, if any did.
    pub layer: Option<&'static str>,
    pub attempts: Vec<LayerAttempt>,
}

/// Resolves the attribute catalog of a model through an ordered chain of
/// [`DiscoveryStrategy`] layers.
///
/// Layers run one at a time, each under its own timeout, and the first
/// layer that yields at least one name wins. Worst-case latency is the sum
/// of the per-layer budgets.
pub struct PropertyDiscoveryService {
    strategies: Vec<Box<dyn DiscoveryStrategy>>,
}

impl PropertyDiscoveryService {
    pub fn new(strategies: Vec<Box<dyn DiscoveryStrategy>>) -> Self {
        Self { strategies }
    }

    /// The standard four-layer chain configured from settings.
    pub fn from_settings(settings: &DiscoverySettings) -> Result<Self, SettingsError> {
        let patterns = settings
            .enterprise_version_patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| {
                    SettingsError::InvalidConfig(format!("bad version pattern '{}': {}", p, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let sample_timeout = settings.sample_timeout()?;

        Ok(Self::new(vec![
            Box::new(MetadataQueryStrategy::new(
                patterns,
                settings.metadata_timeout()?,
            )),
            Box::new(PropertyDbStrategy::new(settings.property_db_timeout()?)),
            Box::new(SampleScanStrategy::new(settings.sample_size, sample_timeout)),
            Box::new(IdProbeStrategy::new(settings.probe_ids.clone(), sample_timeout)),
        ]))
    }

    pub fn layer_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Discover the model's attribute catalog.
    ///
    /// Never fails: when no layer produces anything the catalog is empty.
    pub async fn discover(&self, model: &dyn ModelDataProvider) -> PropertyCatalog {
        self.discover_detailed(model).await.catalog
    }

    /// Like [`discover`](Self::discover), also reporting each layer's outcome.
    pub async fn discover_detailed(&self, model: &dyn ModelDataProvider) -> Discovery {
        let mut discovery = Discovery::default();

        for strategy in &self.strategies {
            let layer = strategy.name();
            let limit = strategy.timeout();

            let result = match tokio::time::timeout(limit, strategy.attempt(model)).await {
                Ok(result) => result,
                Err(_) => Err(DiscoveryError::Timeout {
                    layer,
                    secs: limit.as_secs(),
                }),
            };

            let outcome = match result {
                Ok(names) => {
                    let catalog = PropertyCatalog::from_names(names);
                    if catalog.is_empty() {
                        debug!(layer, "discovery layer yielded nothing");
                        AttemptOutcome::Empty
                    } else {
                        info!(layer, count = catalog.len(), "discovered properties");
                        let found = catalog.len();
                        discovery.catalog = catalog;
                        discovery.layer = Some(layer);
                        discovery.attempts.push(LayerAttempt {
                            layer,
                            outcome: AttemptOutcome::Found(found),
                        });
                        return discovery;
                    }
                }
                Err(err) if err.is_unsupported() => {
                    debug!(layer, error = %err, "discovery layer not supported by model");
                    AttemptOutcome::Failed(err)
                }
                Err(err) => {
                    warn!(layer, error = %err, "discovery layer failed");
                    AttemptOutcome::Failed(err)
                }
            };

            discovery.attempts.push(LayerAttempt { layer, outcome });
        }

        warn!("no discovery layer produced any properties");
        discovery
    }

    /// Union of the model catalog, every source's headers and every
    /// calculation name.
    pub fn full_catalog(
        model_catalog: &PropertyCatalog,
        sources: &[ExternalSource],
        calculations: &[Calculation],
    ) -> PropertyCatalog {
        let mut catalog = model_catalog.clone();
        for source in sources {
            catalog.extend(source.headers.iter().cloned());
        }
        catalog.extend(calculations.iter().map(|c| c.name.clone()));
        catalog
    }
}
