//! Filter evaluation.

use crate::model::{ElementRecord, FilterCondition, FilterOperator, LogicalOperator};

/// Text a missing attribute compares and groups as.
pub const UNDEFINED: &str = "Undefined";

/// Stringified attribute value; missing and null values read as
/// [`UNDEFINED`].
pub fn attribute_text(record: &ElementRecord, attribute: &str) -> String {
    match record.get(attribute) {
        Some(value) if !value.is_null() => value.display_string(),
        _ => UNDEFINED.to_string(),
    }
}

pub fn condition_matches(record: &ElementRecord, condition: &FilterCondition) -> bool {
    let actual = attribute_text(record, &condition.attribute);
    match condition.operator {
        FilterOperator::Equals => actual == condition.value,
        FilterOperator::Contains => actual
            .to_lowercase()
            .contains(&condition.value.to_lowercase()),
        FilterOperator::NotEquals => actual != condition.value,
    }
}

/// Whether `record` passes all (AND) or any (OR) of `filters`. No filters
/// always passes.
pub fn passes(record: &ElementRecord, filters: &[FilterCondition], logic: LogicalOperator) -> bool {
    if filters.is_empty() {
        return true;
    }
    match logic {
        LogicalOperator::And => filters.iter().all(|c| condition_matches(record, c)),
        LogicalOperator::Or => filters.iter().any(|c| condition_matches(record, c)),
    }
}
