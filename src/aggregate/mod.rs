//! Aggregation engine.
//!
//! Two entry points over one grouping core:
//!
//! - [`AggregationEngine::aggregate_live`] fetches the attributes a query
//!   needs straight from the model.
//! - [`AggregationEngine::aggregate_cached`] works on a built
//!   [`MasterDataset`](crate::model::MasterDataset) and additionally
//!   supports date-cutoff and id-scope prefilters.
//!
//! Results convert to table rows via
//! [`AggregationResult::to_table`](crate::model::AggregationResult::to_table).

mod engine;
pub mod filter;
mod group;
mod query;

pub use engine::AggregationEngine;
pub use filter::{passes, UNDEFINED};
pub use group::aggregate_records;
pub use query::{AggregationQuery, CachedPrefilter, DateCutoff};
