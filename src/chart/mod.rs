//! Chart series for dashboard widgets.

use serde::{Deserialize, Serialize};

use crate::model::{AggregationResult, ElementId};

/// Category10 palette; groups take colors by index and wrap around.
pub const PALETTE: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

/// Which measure a series plots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationKind {
    #[default]
    Count,
    Sum,
}

impl std::str::FromStr for AggregationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "count" => Ok(AggregationKind::Count),
            "sum" => Ok(AggregationKind::Sum),
            other => Err(format!("unknown aggregation kind: {}", other)),
        }
    }
}

/// Parallel label/value/color/id arrays, one entry per group.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub colors: Vec<String>,
    /// Element ids behind each label, for selection callbacks.
    pub ids: Vec<Vec<ElementId>>,
}

impl ChartData {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Ids behind the clicked label.
    pub fn ids_for(&self, label: &str) -> Option<&[ElementId]> {
        self.labels
            .iter()
            .position(|l| l == label)
            .map(|i| self.ids[i].as_slice())
    }
}

#[derive(Debug, Clone)]
pub struct ChartDataAdapter {
    palette: Vec<String>,
}

impl Default for ChartDataAdapter {
    fn default() -> Self {
        Self::with_palette(PALETTE.iter().map(|c| c.to_string()).collect())
    }
}

impl ChartDataAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom palette. An empty palette falls back to the default.
    pub fn with_palette(palette: Vec<String>) -> Self {
        if palette.is_empty() {
            return Self::default();
        }
        Self { palette }
    }

    pub fn color(&self, index: usize) -> &str {
        &self.palette[index % self.palette.len()]
    }

    pub fn adapt(&self, result: &AggregationResult, kind: AggregationKind) -> ChartData {
        let mut data = ChartData::default();

        for (index, (key, bucket)) in result.groups.iter().enumerate() {
            let value = match kind {
                AggregationKind::Count => bucket.count as f64,
                AggregationKind::Sum => bucket.sum.unwrap_or(0.0),
            };
            data.labels.push(key.label());
            data.values.push(value);
            data.colors.push(self.color(index).to_string());
            data.ids.push(bucket.ids.clone());
        }

        data
    }
}
