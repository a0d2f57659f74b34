//! # Tessera
//!
//! Property discovery and data fusion for building-model dashboards.
//!
//! ## Architecture
//!
//! Tessera joins the elements of a building model with external tables,
//! derives calculated columns and aggregates the result for charts and
//! tables:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │            Model (ModelDataProvider)                     │
//! │   leaf ids, bulk properties, definitions, metadata       │
//! └─────────────────────────────────────────────────────────┘
//!            │                                 │
//!            ▼ [discovery]                     ▼ [fusion]
//! ┌──────────────────────┐   ┌──────────────────────────────┐
//! │   PropertyCatalog    │   │  join sources (SourceLoader)  │
//! │   (cached per model  │   │  + calculations               │
//! │    version)          │   │  + schema projection          │
//! └──────────────────────┘   └──────────────────────────────┘
//!                                          │
//!                                          ▼ [publish]
//! ┌─────────────────────────────────────────────────────────┐
//! │             MasterDataset snapshot (DatasetStore)        │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [aggregate]
//! ┌─────────────────────────────────────────────────────────┐
//! │     AggregationResult ─► table rows / chart series       │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Before the first sync, aggregations run live against the model.

pub mod aggregate;
pub mod cache;
pub mod chart;
pub mod config;
pub mod discovery;
pub mod fusion;
pub mod model;
pub mod provider;
pub mod schema;
pub mod source;
pub mod workspace;

pub use workspace::{SyncReport, Workspace};

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::aggregate::{AggregationEngine, AggregationQuery, CachedPrefilter, DateCutoff};
    pub use crate::chart::{AggregationKind, ChartData, ChartDataAdapter};
    pub use crate::config::Settings;
    pub use crate::discovery::PropertyDiscoveryService;
    pub use crate::fusion::{BuildOutcome, MasterDataBuilder};
    pub use crate::model::{
        AggregationResult, Calculation, ElementId, ElementRecord, ExternalSource, FieldType,
        FilterCondition, FilterOperator, JoinMapping, LogicalOperator, MasterDataset,
        PropertyCatalog, SchemaEntry, SyncStatus, Value,
    };
    pub use crate::provider::{InMemoryModel, ModelDataProvider};
    pub use crate::source::{CsvSourceLoader, SourceLoader};
    pub use crate::workspace::{SyncReport, Workspace};
}
