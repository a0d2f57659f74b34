//! Refreshing dirty sources.

use std::time::Duration;

use tracing::{debug, info, warn};

use super::error::SourceError;
use super::loader::SourceLoader;
use crate::model::{ExternalSource, SyncStatus};

/// Summary of a refresh pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub refreshed: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Refetch every dirty source, one after another.
///
/// Each source gets its own timeout. A failure marks that source with
/// [`SyncStatus::Error`] and leaves it dirty; the remaining sources are
/// still refreshed.
pub async fn refresh_sources(
    loader: &dyn SourceLoader,
    sources: &mut [ExternalSource],
    timeout: Duration,
) -> RefreshSummary {
    let mut summary = RefreshSummary::default();

    for source in sources.iter_mut() {
        if !source.is_dirty {
            summary.skipped += 1;
            continue;
        }

        debug!(file = %source.file_name, location = %source.location, "refreshing source");

        let result = match tokio::time::timeout(timeout, loader.load(&source.location)).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::Timeout {
                location: source.location.clone(),
                secs: timeout.as_secs(),
            }),
        };

        match result {
            Ok(data) => {
                info!(file = %source.file_name, rows = data.rows.len(), "source refreshed");
                source.apply_fetch(data);
                source.sync_status = SyncStatus::Pending;
                summary.refreshed += 1;
            }
            Err(err) => {
                warn!(file = %source.file_name, error = %err, "source refresh failed");
                source.sync_status = SyncStatus::Error(err.to_string());
                summary.failed += 1;
            }
        }
    }

    summary
}
