//! SQLite-backed catalog cache.
//!
//! Discovering the attribute catalog of a large model can take the full
//! budget of several discovery layers. Catalogs of versioned models are
//! persisted in `~/.tessera/cache.db` and reused until the model version
//! changes.
//!
//! ```text
//! catalogs
//!   version_hash  TEXT PRIMARY KEY   -- sha256 of the model version id
//!   names         TEXT               -- JSON array, sorted
//!   stored_at     TEXT               -- RFC 3339
//! ```
//!
//! The schema version lives in SQLite's `user_version`; a mismatch drops
//! every stored catalog.

mod catalog;
mod hash;

pub use catalog::{CacheStats, CatalogCache};
pub use hash::version_hash;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to determine cache directory")]
    NoCacheDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CacheResult<T> = Result<T, CacheError>;
