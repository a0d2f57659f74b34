//! Core data model shared by discovery, fusion and aggregation.

pub mod aggregation;
pub mod calculation;
pub mod catalog;
pub mod dataset;
pub mod filter;
pub mod record;
pub mod schema;
pub mod source;
pub mod value;

pub use aggregation::{AggregationResult, GroupBucket, GroupKey, TableRow};
pub use calculation::Calculation;
pub use catalog::PropertyCatalog;
pub use dataset::{DatasetStore, MasterDataset};
pub use filter::{FilterCondition, FilterOperator, LogicalOperator};
pub use record::{Attributes, ElementId, ElementRecord};
pub use schema::{FieldType, SchemaEntry};
pub use source::{ExternalSource, JoinMapping, SourceStats, SyncStatus, TabularData};
pub use value::Value;
