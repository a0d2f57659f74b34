//! External tabular sources joined onto model elements.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::record::Attributes;

/// Pair of column names used to join a source row to a model element.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct JoinMapping {
    /// Attribute on the model element.
    pub model_key: String,
    /// Column in the source file.
    pub file_key: String,
}

impl JoinMapping {
    pub fn new(model_key: impl Into<String>, file_key: impl Into<String>) -> Self {
        Self {
            model_key: model_key.into(),
            file_key: file_key.into(),
        }
    }

    /// Both keys populated.
    pub fn is_complete(&self) -> bool {
        !self.model_key.trim().is_empty() && !self.file_key.trim().is_empty()
    }
}

/// Outcome of the last sync for one source.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "lowercase")]
pub enum SyncStatus {
    #[default]
    Pending,
    Success { matches: usize },
    Warning(String),
    Error(String),
}

impl SyncStatus {
    pub fn is_error(&self) -> bool {
        matches!(self, SyncStatus::Error(_))
    }
}

/// Headers and rows as loaded from a file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TabularData {
    pub headers: Vec<String>,
    pub rows: Vec<Attributes>,
}

/// A tabular file joined onto the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalSource {
    pub source_id: Uuid,
    pub file_name: String,
    /// Where the loader fetches the file from.
    pub location: String,
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Attributes>,
    #[serde(default)]
    pub mapping: JoinMapping,
    #[serde(default)]
    pub is_dirty: bool,
    #[serde(default)]
    pub sync_status: SyncStatus,
}

impl ExternalSource {
    /// Create a source that has not been fetched yet.
    pub fn new(location: impl Into<String>, mapping: JoinMapping) -> Self {
        let location = location.into();
        let file_name = std::path::Path::new(&location)
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| location.clone());

        Self {
            source_id: Uuid::new_v4(),
            file_name,
            location,
            headers: Vec::new(),
            rows: Vec::new(),
            mapping,
            is_dirty: true,
            sync_status: SyncStatus::Pending,
        }
    }

    /// Create a source from rows already in memory.
    pub fn from_data(file_name: impl Into<String>, data: TabularData, mapping: JoinMapping) -> Self {
        let file_name = file_name.into();
        Self {
            source_id: Uuid::new_v4(),
            location: file_name.clone(),
            file_name,
            headers: data.headers,
            rows: data.rows,
            mapping,
            is_dirty: false,
            sync_status: SyncStatus::Pending,
        }
    }

    /// Replace the join mapping. Any edit marks the source dirty.
    pub fn set_mapping(&mut self, mapping: JoinMapping) {
        self.mapping = mapping;
        self.is_dirty = true;
    }

    pub fn set_location(&mut self, location: impl Into<String>) {
        self.location = location.into();
        self.is_dirty = true;
    }

    /// Install freshly fetched data and clear the dirty flag.
    pub fn apply_fetch(&mut self, data: TabularData) {
        self.headers = data.headers;
        self.rows = data.rows;
        self.is_dirty = false;
    }

    pub fn is_joinable(&self) -> bool {
        self.mapping.is_complete()
    }
}

/// Per-source join statistics emitted by a build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceStats {
    pub source_id: Uuid,
    pub file_name: String,
    pub match_count: usize,
    pub total_rows: usize,
}

impl SourceStats {
    /// Success when at least one element matched, warning otherwise.
    pub fn classify(&self) -> SyncStatus {
        if self.match_count > 0 {
            SyncStatus::Success {
                matches: self.match_count,
            }
        } else {
            SyncStatus::Warning(format!(
                "no model elements matched any of {} rows in {}",
                self.total_rows, self.file_name
            ))
        }
    }
}
