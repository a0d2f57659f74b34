//! External tabular sources.
//!
//! Sources are fetched through a [`SourceLoader`] and refreshed only when
//! dirty. Each source is refreshed in isolation: one unreadable file never
//! blocks the others.

mod error;
mod loader;
mod refresh;

pub use error::{SourceError, SourceResult};
pub use loader::{CsvSourceLoader, SourceLoader};
pub use refresh::{refresh_sources, RefreshSummary};
