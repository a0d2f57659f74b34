//! Aggregation results and their table projection.

use std::fmt;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};

use super::record::ElementId;

/// Value a group buckets its elements by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupKey {
    Single(String),
    /// One part per grouping attribute, in query order.
    Tuple(Vec<String>),
}

impl GroupKey {
    /// Stable text encoding. Tuples encode as a JSON array so parts that
    /// contain separators cannot collide.
    pub fn encode(&self) -> String {
        match self {
            GroupKey::Single(s) => s.clone(),
            GroupKey::Tuple(parts) => {
                serde_json::to_string(parts).unwrap_or_else(|_| parts.join("\u{1f}"))
            }
        }
    }

    /// The constituent attribute values.
    pub fn parts(&self) -> Vec<String> {
        match self {
            GroupKey::Single(s) => vec![s.clone()],
            GroupKey::Tuple(parts) => parts.clone(),
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> String {
        match self {
            GroupKey::Single(s) => s.clone(),
            GroupKey::Tuple(parts) => parts.join(" / "),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl Serialize for GroupKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

/// Elements that fell into one group.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct GroupBucket {
    pub ids: Vec<ElementId>,
    pub count: usize,
    /// Present for single-attribute aggregation only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sum: Option<f64>,
}

/// Groups in first-seen order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AggregationResult {
    pub groups: IndexMap<GroupKey, GroupBucket>,
    /// Elements considered before filtering.
    pub total_in_scope: usize,
}

impl AggregationResult {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Look up a single-attribute group.
    pub fn get(&self, key: &str) -> Option<&GroupBucket> {
        self.groups.get(&GroupKey::Single(key.to_string()))
    }

    pub fn get_key(&self, key: &GroupKey) -> Option<&GroupBucket> {
        self.groups.get(key)
    }

    /// `group -> count`, keyed by the encoded group key.
    pub fn counts(&self) -> IndexMap<String, usize> {
        self.groups
            .iter()
            .map(|(k, b)| (k.encode(), b.count))
            .collect()
    }

    /// Project into table rows.
    pub fn to_table(&self) -> Vec<TableRow> {
        self.groups
            .iter()
            .map(|(key, bucket)| TableRow {
                values: key.parts(),
                count: bucket.count,
                percentage: percentage(bucket.count, self.total_in_scope),
                sum: bucket.sum,
                ids: bucket.ids.clone(),
            })
            .collect()
    }
}

/// One row of the table projection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    /// Group attribute values, one per grouping attribute.
    pub values: Vec<String>,
    pub count: usize,
    /// Share of the elements in scope, in percent with one decimal.
    pub percentage: f64,
    /// Group sum; only present for single-attribute grouping.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sum: Option<f64>,
    /// Kept for selection round-trips.
    pub ids: Vec<ElementId>,
}

fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let pct = count as f64 / total as f64 * 100.0;
    (pct * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tuple_encoding_is_unambiguous() {
        let a = GroupKey::Tuple(vec!["a,b".into(), "c".into()]);
        let b = GroupKey::Tuple(vec!["a".into(), "b,c".into()]);
        assert_ne!(a.encode(), b.encode());
        assert_eq!(a.encode(), r#"["a,b","c"]"#);
    }

    #[test]
    fn test_table_percentages() {
        let mut result = AggregationResult {
            total_in_scope: 3,
            ..Default::default()
        };
        result.groups.insert(
            GroupKey::Single("Wall".into()),
            GroupBucket {
                ids: vec![1, 2],
                count: 2,
                sum: Some(300.0),
            },
        );
        result.groups.insert(
            GroupKey::Single("Door".into()),
            GroupBucket {
                ids: vec![3],
                count: 1,
                sum: Some(50.0),
            },
        );

        let table = result.to_table();
        assert_eq!(table[0].values, vec!["Wall"]);
        assert_eq!(table[0].percentage, 66.7);
        assert_eq!(table[1].percentage, 33.3);
        assert_eq!(table[1].ids, vec![3]);
        assert_eq!(table[0].sum, Some(300.0));
    }

    #[test]
    fn test_empty_scope_percentage() {
        assert_eq!(percentage(0, 0), 0.0);
    }
}
