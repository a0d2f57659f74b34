//! The fused master dataset and its snapshot store.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use super::record::{ElementId, ElementRecord};

/// Ordered fused records produced by one sync.
///
/// Element ids are unique; [`MasterDataset::new`] keeps the first record
/// for a repeated id.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MasterDataset {
    records: Vec<ElementRecord>,
    /// When the dataset was built; `None` for the initial empty snapshot.
    built_at: Option<DateTime<Utc>>,
}

impl MasterDataset {
    pub fn new(records: Vec<ElementRecord>) -> Self {
        let mut seen = HashSet::with_capacity(records.len());
        let records = records
            .into_iter()
            .filter(|r| seen.insert(r.id))
            .collect();

        Self {
            records,
            built_at: Some(Utc::now()),
        }
    }

    /// The placeholder snapshot readers see before the first sync.
    pub fn unsynced() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[ElementRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &ElementRecord> {
        self.records.iter()
    }

    pub fn get(&self, id: ElementId) -> Option<&ElementRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn ids(&self) -> Vec<ElementId> {
        self.records.iter().map(|r| r.id).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn built_at(&self) -> Option<DateTime<Utc>> {
        self.built_at
    }

    /// Whether this snapshot came out of a sync.
    pub fn is_synced(&self) -> bool {
        self.built_at.is_some()
    }
}

/// Single-writer publication point for dataset snapshots.
///
/// A published dataset replaces the previous one in a single step. Readers
/// hold an `Arc` to whatever snapshot was current when they asked and never
/// see a partially built one.
#[derive(Debug)]
pub struct DatasetStore {
    tx: watch::Sender<Arc<MasterDataset>>,
}

impl DatasetStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Arc::new(MasterDataset::unsynced()));
        Self { tx }
    }

    /// Replace the current snapshot.
    pub fn publish(&self, dataset: MasterDataset) -> Arc<MasterDataset> {
        let dataset = Arc::new(dataset);
        self.tx.send_replace(dataset.clone());
        dataset
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<MasterDataset> {
        self.tx.borrow().clone()
    }

    /// Receiver notified on each publish.
    pub fn subscribe(&self) -> watch::Receiver<Arc<MasterDataset>> {
        self.tx.subscribe()
    }
}

impl Default for DatasetStore {
    fn default() -> Self {
        Self::new()
    }
}
