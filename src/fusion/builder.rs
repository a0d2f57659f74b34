//! Master dataset builder.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::error::BuildError;
use super::formula;
use super::join::JoinIndex;
use crate::model::{
    Calculation, ElementId, ElementRecord, ExternalSource, MasterDataset, SchemaEntry,
    SourceStats, Value,
};
use crate::provider::{with_timeout, ModelDataProvider};
use crate::schema::SchemaTransformer;

/// Result of one build.
///
/// A failed build carries an empty dataset and the error; it is never
/// published.
#[derive(Debug)]
pub struct BuildOutcome {
    pub dataset: MasterDataset,
    pub stats: Vec<SourceStats>,
    pub error: Option<BuildError>,
}

impl BuildOutcome {
    fn failed(error: BuildError) -> Self {
        Self {
            dataset: MasterDataset::unsynced(),
            stats: Vec::new(),
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }

    /// Stats for one source, by id.
    pub fn stats_for(&self, source_id: uuid::Uuid) -> Option<&SourceStats> {
        self.stats.iter().find(|s| s.source_id == source_id)
    }
}

/// Fuses model elements, external sources and calculated columns into a
/// [`MasterDataset`].
#[derive(Debug, Clone)]
pub struct MasterDataBuilder {
    fetch_timeout: Duration,
    schema: SchemaTransformer,
}

impl MasterDataBuilder {
    pub fn new(fetch_timeout: Duration) -> Self {
        Self {
            fetch_timeout,
            schema: SchemaTransformer::default(),
        }
    }

    pub fn with_schema(mut self, entries: Vec<SchemaEntry>) -> Self {
        self.schema = SchemaTransformer::new(entries);
        self
    }

    pub fn schema(&self) -> &SchemaTransformer {
        &self.schema
    }

    /// Build the dataset.
    ///
    /// 1. Collect and de-duplicate the model's leaf ids.
    /// 2. Fetch all of their properties in one bulk call.
    /// 3. Left-join every source with a complete mapping, in order.
    /// 4. Evaluate calculations in order, so later ones see earlier results.
    /// 5. Project through the schema when one is configured.
    pub async fn build(
        &self,
        model: &dyn ModelDataProvider,
        sources: &[ExternalSource],
        calculations: &[Calculation],
    ) -> BuildOutcome {
        let started = Instant::now();

        let ids = match self.leaf_ids(model).await {
            Ok(ids) => ids,
            Err(err) => {
                warn!(error = %err, "build aborted");
                return BuildOutcome::failed(err);
            }
        };

        let mut records =
            match with_timeout(self.fetch_timeout, model.bulk_properties(&ids, None)).await {
                Ok(records) => records,
                Err(err) => {
                    let err = match BuildError::from(err) {
                        BuildError::HierarchyUnavailable(msg) => BuildError::FetchFailed(msg),
                        other => other,
                    };
                    warn!(error = %err, "build aborted");
                    return BuildOutcome::failed(err);
                }
            };
        debug!(elements = records.len(), "fetched model properties");

        let stats = sources
            .iter()
            .filter(|s| s.is_joinable())
            .map(|source| join_source(&mut records, source))
            .collect();

        for calc in calculations {
            apply_calculation(&mut records, calc);
        }

        if self.schema.is_configured() {
            records = records.iter().map(|r| self.schema.transform(r)).collect();
        }

        let dataset = MasterDataset::new(records);
        info!(
            records = dataset.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "built master dataset"
        );

        BuildOutcome {
            dataset,
            stats,
            error: None,
        }
    }

    async fn leaf_ids(&self, model: &dyn ModelDataProvider) -> Result<Vec<ElementId>, BuildError> {
        let ids = with_timeout(self.fetch_timeout, model.leaf_ids(None)).await?;

        let mut seen = HashSet::with_capacity(ids.len());
        let ids: Vec<ElementId> = ids.into_iter().filter(|id| seen.insert(*id)).collect();

        if ids.is_empty() {
            return Err(BuildError::NoElements);
        }
        Ok(ids)
    }
}

/// Merge matching rows of `source` into `records`; later sources overwrite
/// fields of earlier ones.
fn join_source(records: &mut [ElementRecord], source: &ExternalSource) -> SourceStats {
    let index = JoinIndex::build(source);
    let model_key = source.mapping.model_key.as_str();
    let mut match_count = 0;

    for record in records.iter_mut() {
        let Some(row) = record.get(model_key).and_then(|v| index.lookup(v)) else {
            continue;
        };
        match_count += 1;
        for (field, value) in row {
            record.attributes.insert(field.clone(), value.clone());
        }
    }

    debug!(
        source = %source.file_name,
        matches = match_count,
        rows = source.rows.len(),
        "joined source"
    );

    SourceStats {
        source_id: source.source_id,
        file_name: source.file_name.clone(),
        match_count,
        total_rows: source.rows.len(),
    }
}

fn apply_calculation(records: &mut [ElementRecord], calc: &Calculation) {
    let mut invalid = 0usize;

    for record in records.iter_mut() {
        let value = formula::calculate(&calc.formula, &record.attributes);
        if value == Value::Null {
            invalid += 1;
        }
        record.set(calc.name.clone(), value);
    }

    if invalid > 0 {
        warn!(
            calculation = %calc.name,
            invalid,
            "formula produced no value for some records"
        );
    }
}
