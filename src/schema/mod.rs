//! Schema application: aliasing, type coercion and column inclusion.

pub mod coerce;
mod transform;

pub use coerce::{coerce, coerce_date};
pub use transform::{apply, SchemaTransformer};
