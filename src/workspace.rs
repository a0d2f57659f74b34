//! The dashboard workspace.
//!
//! A [`Workspace`] owns the injected collaborators (model provider and
//! source loader) together with everything a user configures on top of a
//! model: external sources, calculations and the output schema. It runs
//! discovery, the explicit sync action, and serves aggregations from
//! whichever dataset is current.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::aggregate::{AggregationEngine, AggregationQuery, CachedPrefilter};
use crate::cache::CatalogCache;
use crate::chart::{AggregationKind, ChartData, ChartDataAdapter};
use crate::config::{Settings, SettingsError};
use crate::discovery::PropertyDiscoveryService;
use crate::fusion::MasterDataBuilder;
use crate::model::{
    AggregationResult, Calculation, DatasetStore, ExternalSource, JoinMapping, MasterDataset,
    PropertyCatalog, SchemaEntry, SourceStats, SyncStatus, TableRow,
};
use crate::provider::ModelDataProvider;
use crate::source::{refresh_sources, RefreshSummary, SourceLoader};

/// What a sync did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    pub refresh: RefreshSummary,
    pub stats: Vec<SourceStats>,
    /// Pipeline-level failure; the previous dataset stays published.
    pub error: Option<String>,
    pub record_count: usize,
}

impl SyncReport {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

pub struct Workspace {
    model: Arc<dyn ModelDataProvider>,
    loader: Arc<dyn SourceLoader>,
    discovery: PropertyDiscoveryService,
    engine: AggregationEngine,
    charts: ChartDataAdapter,
    cache: Option<Mutex<CatalogCache>>,
    store: DatasetStore,
    fetch_timeout: Duration,
    source_timeout: Duration,
    model_catalog: PropertyCatalog,
    sources: Vec<ExternalSource>,
    calculations: Vec<Calculation>,
    schema: Vec<SchemaEntry>,
}

impl Workspace {
    /// Create a workspace with the sources, calculations and schema the
    /// settings declare.
    pub fn new(
        model: Arc<dyn ModelDataProvider>,
        loader: Arc<dyn SourceLoader>,
        settings: &Settings,
    ) -> Result<Self, SettingsError> {
        Ok(Self {
            model,
            loader,
            discovery: PropertyDiscoveryService::from_settings(&settings.discovery)?,
            engine: AggregationEngine::from_settings(&settings.aggregation)?,
            charts: ChartDataAdapter::default(),
            cache: None,
            store: DatasetStore::new(),
            fetch_timeout: settings.build.fetch_timeout()?,
            source_timeout: settings.build.source_timeout()?,
            model_catalog: PropertyCatalog::new(),
            sources: settings.external_sources()?,
            calculations: settings.calculations.clone(),
            schema: settings.schema.clone(),
        })
    }

    /// Persist discovered catalogs of versioned models in `cache`.
    pub fn with_cache(mut self, cache: CatalogCache) -> Self {
        self.cache = Some(Mutex::new(cache));
        self
    }

    pub fn with_discovery(mut self, discovery: PropertyDiscoveryService) -> Self {
        self.discovery = discovery;
        self
    }

    pub fn with_chart_adapter(mut self, charts: ChartDataAdapter) -> Self {
        self.charts = charts;
        self
    }

    pub fn model(&self) -> &dyn ModelDataProvider {
        self.model.as_ref()
    }

    // -- catalog ------------------------------------------------------------

    /// Rediscover the model's attribute names.
    ///
    /// Versioned models are looked up in the catalog cache first; a fresh,
    /// non-empty discovery is written back.
    pub async fn refresh_catalog(&mut self) -> &PropertyCatalog {
        let version = self.model.version_id();

        if let Some(catalog) = version.as_deref().and_then(|v| self.cached_catalog(v)) {
            debug!(count = catalog.len(), "catalog served from cache");
            self.model_catalog = catalog;
            return &self.model_catalog;
        }

        let catalog = self.discovery.discover(self.model.as_ref()).await;

        if let (Some(version), false) = (version.as_deref(), catalog.is_empty()) {
            self.store_catalog(version, &catalog);
        }

        self.model_catalog = catalog;
        &self.model_catalog
    }

    fn cached_catalog(&self, version: &str) -> Option<PropertyCatalog> {
        let Ok(cache) = self.cache.as_ref()?.lock() else {
            warn!("catalog cache lock poisoned");
            return None;
        };
        let found = cache.catalog(version);
        match found {
            Ok(found) => found.filter(|c| !c.is_empty()),
            Err(err) => {
                warn!(error = %err, "catalog cache lookup failed");
                None
            }
        }
    }

    fn store_catalog(&self, version: &str, catalog: &PropertyCatalog) {
        let Some(cache) = self.cache.as_ref() else {
            return;
        };
        match cache.lock() {
            Ok(cache) => {
                if let Err(err) = cache.store_catalog(version, catalog) {
                    warn!(error = %err, "catalog cache write failed");
                }
            }
            Err(_) => warn!("catalog cache lock poisoned"),
        }
    }

    /// Model attributes from the last discovery.
    pub fn model_catalog(&self) -> &PropertyCatalog {
        &self.model_catalog
    }

    /// Everything a widget can select: model attributes, source headers and
    /// calculation names.
    pub fn catalog(&self) -> PropertyCatalog {
        PropertyDiscoveryService::full_catalog(
            &self.model_catalog,
            &self.sources,
            &self.calculations,
        )
    }

    // -- configuration ------------------------------------------------------

    pub fn sources(&self) -> &[ExternalSource] {
        &self.sources
    }

    pub fn source(&self, source_id: Uuid) -> Option<&ExternalSource> {
        self.sources.iter().find(|s| s.source_id == source_id)
    }

    pub fn add_source(&mut self, source: ExternalSource) -> Uuid {
        let id = source.source_id;
        self.sources.push(source);
        id
    }

    pub fn remove_source(&mut self, source_id: Uuid) -> bool {
        let before = self.sources.len();
        self.sources.retain(|s| s.source_id != source_id);
        self.sources.len() != before
    }

    /// Change a source's join mapping. Returns false for unknown ids.
    pub fn set_mapping(&mut self, source_id: Uuid, mapping: JoinMapping) -> bool {
        match self.sources.iter_mut().find(|s| s.source_id == source_id) {
            Some(source) => {
                source.set_mapping(mapping);
                true
            }
            None => false,
        }
    }

    pub fn calculations(&self) -> &[Calculation] {
        &self.calculations
    }

    pub fn set_calculations(&mut self, calculations: Vec<Calculation>) {
        self.calculations = calculations;
    }

    pub fn schema(&self) -> &[SchemaEntry] {
        &self.schema
    }

    pub fn set_schema(&mut self, schema: Vec<SchemaEntry>) {
        self.schema = schema;
    }

    // -- sync ---------------------------------------------------------------

    /// Refresh dirty sources, rebuild the master dataset and publish it.
    ///
    /// The new dataset replaces the old one only when the build succeeded.
    /// Every source ends up with a status: refresh errors are kept, sources
    /// without a complete mapping get a warning, the rest are classified by
    /// their match count.
    pub async fn sync(&mut self) -> SyncReport {
        let refresh =
            refresh_sources(self.loader.as_ref(), &mut self.sources, self.source_timeout).await;

        let builder = MasterDataBuilder::new(self.fetch_timeout).with_schema(self.schema.clone());
        let outcome = builder
            .build(self.model.as_ref(), &self.sources, &self.calculations)
            .await;

        let mut report = SyncReport {
            refresh,
            error: outcome.error_message(),
            ..Default::default()
        };

        if let Some(err) = &report.error {
            warn!(error = %err, "sync failed, keeping previous dataset");
            return report;
        }

        for source in &mut self.sources {
            if source.sync_status.is_error() {
                continue;
            }
            source.sync_status = match outcome.stats_for(source.source_id) {
                Some(stats) => stats.classify(),
                None => SyncStatus::Warning(format!(
                    "join mapping for {} is incomplete",
                    source.file_name
                )),
            };
        }

        report.stats = outcome.stats;
        report.record_count = outcome.dataset.len();
        self.store.publish(outcome.dataset);

        info!(records = report.record_count, "sync complete");
        report
    }

    /// The current dataset snapshot.
    pub fn dataset(&self) -> Arc<MasterDataset> {
        self.store.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<MasterDataset>> {
        self.store.subscribe()
    }

    // -- aggregation --------------------------------------------------------

    /// Aggregate over the synced dataset, or live against the model before
    /// the first successful sync. Prefilters only apply once synced.
    pub async fn aggregate(
        &self,
        query: &AggregationQuery,
        prefilter: &CachedPrefilter,
    ) -> AggregationResult {
        let dataset = self.dataset();
        if dataset.is_synced() {
            return self.engine.aggregate_cached(&dataset, query, prefilter);
        }

        if *prefilter != CachedPrefilter::none() {
            debug!("prefilters ignored until the first sync");
        }
        self.engine.aggregate_live(self.model.as_ref(), query).await
    }

    pub async fn table(
        &self,
        query: &AggregationQuery,
        prefilter: &CachedPrefilter,
    ) -> Vec<TableRow> {
        self.aggregate(query, prefilter).await.to_table()
    }

    pub async fn chart(&self, query: &AggregationQuery, kind: AggregationKind) -> ChartData {
        let result = self.aggregate(query, &CachedPrefilter::none()).await;
        self.charts.adapt(&result, kind)
    }
}
