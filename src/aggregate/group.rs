//! Grouping core shared by both aggregation paths.

use super::filter::{attribute_text, passes};
use super::query::AggregationQuery;
use crate::model::{AggregationResult, ElementRecord, GroupBucket, GroupKey};

/// Filter and group `records`.
///
/// Every record handed in counts towards `total_in_scope`. Sums are kept
/// for single-attribute grouping only; values without a numeric prefix
/// contribute zero.
pub fn aggregate_records<'a, I>(records: I, query: &AggregationQuery) -> AggregationResult
where
    I: IntoIterator<Item = &'a ElementRecord>,
{
    let mut result = AggregationResult::default();
    if query.group_by.is_empty() {
        return result;
    }

    for record in records {
        result.total_in_scope += 1;

        if !passes(record, &query.filters, query.logic) {
            continue;
        }

        let key = group_key(record, &query.group_by);
        let single = matches!(key, GroupKey::Single(_));
        let bucket = result.groups.entry(key).or_insert_with(|| GroupBucket {
            sum: single.then_some(0.0),
            ..Default::default()
        });

        bucket.ids.push(record.id);
        bucket.count += 1;

        if let (Some(sum), Some(attribute)) = (bucket.sum.as_mut(), &query.sum_attribute) {
            *sum += record
                .get(attribute)
                .and_then(|v| v.parse_float())
                .filter(|n| n.is_finite())
                .unwrap_or(0.0);
        }
    }

    result
}

fn group_key(record: &ElementRecord, attributes: &[String]) -> GroupKey {
    match attributes {
        [single] => GroupKey::Single(attribute_text(record, single)),
        many => GroupKey::Tuple(many.iter().map(|a| attribute_text(record, a)).collect()),
    }
}
