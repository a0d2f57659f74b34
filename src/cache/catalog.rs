use std::path::PathBuf;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::hash::version_hash;
use super::{CacheError, CacheResult};
use crate::model::PropertyCatalog;

/// Bump when the table layout changes.
const SCHEMA_VERSION: i32 = 2;

/// Persisted property catalogs, one per model version.
pub struct CatalogCache {
    conn: Connection,
}

/// Summary of what the cache holds.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CacheStats {
    pub catalogs: usize,
    pub property_names: usize,
    pub oldest: Option<DateTime<Utc>>,
}

impl CatalogCache {
    /// Open or create `~/.tessera/cache.db`.
    pub fn open() -> CacheResult<Self> {
        let path = Self::cache_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(&path)?)
    }

    pub fn open_in_memory() -> CacheResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    pub fn cache_path() -> CacheResult<PathBuf> {
        let home = dirs::home_dir().ok_or(CacheError::NoCacheDir)?;
        Ok(home.join(".tessera").join("cache.db"))
    }

    fn init(conn: Connection) -> CacheResult<Self> {
        let stored: i32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
        if stored != SCHEMA_VERSION {
            conn.execute_batch("DROP TABLE IF EXISTS catalogs; DROP TABLE IF EXISTS cache;")?;
            conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        }

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS catalogs (
                version_hash TEXT PRIMARY KEY,
                names TEXT NOT NULL,
                stored_at TEXT NOT NULL
            );",
        )?;

        Ok(Self { conn })
    }

    /// Catalog stored for `version_id`, if any.
    pub fn catalog(&self, version_id: &str) -> CacheResult<Option<PropertyCatalog>> {
        let names: Option<String> = self
            .conn
            .query_row(
                "SELECT names FROM catalogs WHERE version_hash = ?1",
                params![version_hash(version_id)],
                |row| row.get(0),
            )
            .optional()?;

        names
            .map(|json| serde_json::from_str(&json).map_err(CacheError::from))
            .transpose()
    }

    /// Store or replace the catalog of `version_id`.
    pub fn store_catalog(&self, version_id: &str, catalog: &PropertyCatalog) -> CacheResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO catalogs (version_hash, names, stored_at) VALUES (?1, ?2, ?3)",
            params![
                version_hash(version_id),
                serde_json::to_string(catalog)?,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Forget the catalog of `version_id`. Returns whether one was stored.
    pub fn invalidate_catalog(&self, version_id: &str) -> CacheResult<bool> {
        let removed = self.conn.execute(
            "DELETE FROM catalogs WHERE version_hash = ?1",
            params![version_hash(version_id)],
        )?;
        Ok(removed > 0)
    }

    pub fn clear(&self) -> CacheResult<()> {
        self.conn.execute("DELETE FROM catalogs", [])?;
        Ok(())
    }

    pub fn stats(&self) -> CacheResult<CacheStats> {
        let mut stmt = self.conn.prepare("SELECT names, stored_at FROM catalogs")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut stats = CacheStats::default();
        for row in rows {
            let (names, stored_at) = row?;
            let catalog: PropertyCatalog = serde_json::from_str(&names)?;

            stats.catalogs += 1;
            stats.property_names += catalog.len();

            if let Ok(at) = DateTime::parse_from_rfc3339(&stored_at) {
                let at = at.with_timezone(&Utc);
                stats.oldest = Some(stats.oldest.map_or(at, |o| o.min(at)));
            }
        }

        Ok(stats)
    }
}
