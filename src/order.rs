//! Orderings for category and group labels.

use crate::config::SortDirection;
use std::cmp::Ordering;

/// Field names that carry defect priority levels
pub const PRIORITY_FIELDS: &[&str] = &["priority", "优先级"];

/// Known priority levels, most urgent first
const PRIORITY_LEVELS: &[&str] = &["P0", "P1", "P2", "P3"];

pub fn is_priority_field(field: &str) -> bool {
    PRIORITY_FIELDS
        .iter()
        .any(|name| name.to_lowercase() == field.trim().to_lowercase())
}

/// Rank of a priority label, `None` when unrecognized
pub fn priority_rank(label: &str) -> Option<usize> {
    let upper = label.trim().to_uppercase();
    PRIORITY_LEVELS.iter().position(|level| *level == upper)
}

fn first_char(label: &str) -> Option<char> {
    label.chars().next()
}

/// Sort group names in place.
///
/// Priority fields order by level with unrecognized labels last in either
/// direction. Other fields order by their first character; equal first
/// characters keep their incoming order.
pub fn sort_groups(groups: &mut [String], field: &str, direction: SortDirection) {
    let directed = |ord: Ordering| match direction {
        SortDirection::Asc => ord,
        SortDirection::Desc => ord.reverse(),
    };

    if is_priority_field(field) {
        groups.sort_by(|a, b| match (priority_rank(a), priority_rank(b)) {
            (Some(ra), Some(rb)) => directed(ra.cmp(&rb)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
    } else {
        groups.sort_by(|a, b| directed(first_char(a).cmp(&first_char(b))));
    }
}

/// Sort category labels in place by byte-wise string order
pub fn sort_labels(labels: &mut [String], direction: SortDirection) {
    match direction {
        SortDirection::Asc => labels.sort(),
        SortDirection::Desc => labels.sort_by(|a, b| b.cmp(a)),
    }
}

/// Sort categories by their totals, ties broken by label
pub fn sort_by_totals(labels: &mut [(String, f64)], direction: SortDirection) {
    labels.sort_by(|(la, ta), (lb, tb)| {
        let ord = ta.total_cmp(tb).then_with(|| la.cmp(lb));
        match direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
}
