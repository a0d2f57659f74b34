//! Property discovery.
//!
//! No single introspection call works on every model backend: cloud-hosted
//! models answer structured metadata queries, locally derived ones only
//! expose their property store, and some expose little more than bulk
//! property fetches. Discovery therefore runs a chain of layers:
//!
//! ```text
//! metadata_query ──empty/err──▶ property_db ──empty/err──▶ sample_scan ──empty/err──▶ id_probe
//!      (30s)                        (45s)                     (≤100 leaves)            (fixed ids)
//! ```
//!
//! The first layer to yield names wins. The result is sorted and
//! deduplicated; an empty catalog is a valid answer.

mod error;
mod service;
mod strategy;

pub use error::{DiscoveryError, DiscoveryResult};
pub use service::{AttemptOutcome, Discovery, LayerAttempt, PropertyDiscoveryService};
pub use strategy::{
    DiscoveryStrategy, IdProbeStrategy, MetadataQueryStrategy, PropertyDbStrategy,
    SampleScanStrategy,
};
