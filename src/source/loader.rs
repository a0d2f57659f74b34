//! Source loaders.

use std::path::Path;

use async_trait::async_trait;

use super::error::{SourceError, SourceResult};
use crate::model::{Attributes, TabularData, Value};

/// Fetches the rows of an external source.
#[async_trait]
pub trait SourceLoader: Send + Sync {
    /// Load headers and rows from `location`.
    async fn load(&self, location: &str) -> SourceResult<TabularData>;
}

/// Loads comma-separated files from the local filesystem.
///
/// The first record is the header row. Every cell becomes a text value;
/// blank cells become null.
#[derive(Debug, Clone)]
pub struct CsvSourceLoader {
    delimiter: u8,
}

impl CsvSourceLoader {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn with_delimiter(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// Parse CSV text that has already been read.
    pub fn parse(&self, location: &str, bytes: &[u8]) -> SourceResult<TabularData> {
        let parse_err = |e: csv::Error| SourceError::Parse {
            location: location.to_string(),
            message: e.to_string(),
        };

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(bytes);

        let headers: Vec<String> = reader
            .headers()
            .map_err(parse_err)?
            .iter()
            .map(str::to_string)
            .collect();

        if headers.iter().all(|h| h.is_empty()) {
            return Err(SourceError::MissingHeaders(location.to_string()));
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(parse_err)?;
            let row: Attributes = headers
                .iter()
                .enumerate()
                .map(|(i, header)| {
                    let value = match record.get(i) {
                        Some(cell) if !cell.trim().is_empty() => Value::text(cell),
                        _ => Value::Null,
                    };
                    (header.clone(), value)
                })
                .collect();
            rows.push(row);
        }

        Ok(TabularData { headers, rows })
    }
}

impl Default for CsvSourceLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceLoader for CsvSourceLoader {
    async fn load(&self, location: &str) -> SourceResult<TabularData> {
        let bytes = tokio::fs::read(Path::new(location))
            .await
            .map_err(|source| SourceError::Read {
                location: location.to_string(),
                source,
            })?;

        self.parse(location, &bytes)
    }
}
