use std::collections::HashMap;
use crate::config::{AggregateFn, ChartConfig, MetricKind, SortTarget};
use crate::data::{Record, UNCATEGORIZED, UNGROUPED};
use crate::ir::{AggregateResult, Series};
use crate::order;

/// Main entry point: reshape flat records into per-group series.
///
/// Stateless; the same records and config always give the same result.
pub fn aggregate(records: &[Record], config: &ChartConfig) -> AggregateResult {
    let group_field = config.grouping();
    let value_field = config.numeric_field();
    if config.metric == MetricKind::Value && value_field.is_none() {
        tracing::debug!("Value metric without a value field, counting records");
    }

    // 1. Bucket records into (category, group) cells
    let mut categories = Distinct::default();
    let mut groups = Distinct::default();
    let mut cells: HashMap<(usize, usize), Cell> = HashMap::new();

    for record in records {
        let x = categories.intern(record.label(&config.x_field, UNCATEGORIZED));
        let g = match group_field {
            Some(field) => groups.intern(record.label(field, UNGROUPED)),
            None => 0,
        };

        let cell = cells.entry((x, g)).or_default();
        cell.count += 1;
        if let Some(field) = value_field {
            cell.values.push(record.number(field));
        }
    }

    // 2. Reduce each cell to a single value
    let value_at = |x: usize, g: usize| -> f64 {
        match cells.get(&(x, g)) {
            Some(cell) => match value_field {
                Some(_) => round2(apply_aggregate(&cell.values, config.aggregate)),
                None => cell.count as f64,
            },
            None => 0.0,
        }
    };

    // 3. Order groups
    let group_names = match group_field {
        Some(field) => {
            let mut names = groups.labels.clone();
            order::sort_groups(&mut names, field, config.group_order);
            names
        }
        None => Vec::new(),
    };
    let group_indices: Vec<usize> = if group_field.is_some() {
        group_names.iter().map(|name| groups.index[name]).collect()
    } else {
        vec![0]
    };

    // 4. Order categories
    let category_names = match config.sort_by {
        SortTarget::Label => {
            let mut names = categories.labels.clone();
            order::sort_labels(&mut names, config.sort_order);
            names
        }
        SortTarget::Value => {
            let mut totals: Vec<(String, f64)> = categories
                .labels
                .iter()
                .enumerate()
                .map(|(x, label)| {
                    let total: f64 = group_indices.iter().map(|&g| value_at(x, g)).sum();
                    (label.clone(), total)
                })
                .collect();
            order::sort_by_totals(&mut totals, config.sort_order);
            totals.into_iter().map(|(label, _)| label).collect()
        }
    };
    let category_indices: Vec<usize> = category_names
        .iter()
        .map(|name| categories.index[name])
        .collect();

    // 5. Emit one series per group
    let series = if group_field.is_some() {
        group_names
            .iter()
            .zip(&group_indices)
            .map(|(name, &g)| Series {
                name: Some(name.clone()),
                values: category_indices.iter().map(|&x| value_at(x, g)).collect(),
            })
            .collect()
    } else {
        vec![Series {
            name: None,
            values: category_indices.iter().map(|&x| value_at(x, 0)).collect(),
        }]
    };

    tracing::debug!(
        records = records.len(),
        categories = category_names.len(),
        groups = group_names.len(),
        metric = %config.metric_label(),
        "Aggregated records"
    );

    AggregateResult {
        categories: category_names,
        group_names,
        series,
    }
}

/// Apply an aggregation function to numeric readings of one cell.
///
/// `None` marks a non-numeric reading: it adds zero to a sum and is skipped
/// by average, max and min. Empty inputs give 0. Older dashboards treated
/// non-numeric readings as zero for every function, so their averages differ.
pub fn apply_aggregate(values: &[Option<f64>], function: AggregateFn) -> f64 {
    let numeric = || values.iter().flatten().copied();
    match function {
        AggregateFn::Sum => values.iter().map(|v| v.unwrap_or(0.0)).sum(),
        AggregateFn::Average => {
            let (sum, n) = numeric().fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
            if n == 0 { 0.0 } else { sum / n as f64 }
        }
        AggregateFn::Max => numeric().reduce(f64::max).unwrap_or(0.0),
        AggregateFn::Min => numeric().reduce(f64::min).unwrap_or(0.0),
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Default)]
struct Cell {
    count: usize,
    values: Vec<Option<f64>>,
}

/// Distinct labels in first-seen order
#[derive(Debug, Default)]
struct Distinct {
    labels: Vec<String>,
    index: HashMap<String, usize>,
}

impl Distinct {
    fn intern(&mut self, label: String) -> usize {
        if let Some(&i) = self.index.get(&label) {
            return i;
        }
        let i = self.labels.len();
        self.index.insert(label.clone(), i);
        self.labels.push(label);
        i
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SortDirection;
    use crate::data::FieldValue;

    fn text(s: &str) -> FieldValue {
        FieldValue::Text(s.to_string())
    }

    fn num(n: f64) -> FieldValue {
        FieldValue::Number(n)
    }

    fn hours_data() -> Vec<Record> {
        vec![
            Record::new().with("t", text("A")).with("p", text("P0")).with("h", num(2.0)),
            Record::new().with("t", text("A")).with("p", text("P1")).with("h", num(3.0)),
            Record::new().with("t", text("B")).with("p", text("P0")).with("h", num(1.0)),
        ]
    }

    fn sum_config() -> ChartConfig {
        ChartConfig {
            x_field: "t".to_string(),
            group_field: Some("p".to_string()),
            metric: MetricKind::Value,
            value_field: Some("h".to_string()),
            aggregate: AggregateFn::Sum,
            ..Default::default()
        }
    }

    #[test]
    fn test_count_aggregation() {
        let records = vec![
            Record::new().with("type", text("A")),
            Record::new().with("type", text("A")),
            Record::new().with("type", text("B")),
        ];
        let result = aggregate(&records, &ChartConfig::default());

        assert_eq!(result.categories, vec!["A", "B"]);
        assert!(result.group_names.is_empty());
        assert_eq!(result.series.len(), 1);
        assert_eq!(result.series[0].name, None);
        assert_eq!(result.series[0].values, vec![2.0, 1.0]);
        assert_eq!(result.series[0].values.iter().sum::<f64>(), 3.0);
    }

    #[test]
    fn test_sum_with_grouping() {
        let result = aggregate(&hours_data(), &sum_config());

        assert_eq!(result.categories, vec!["A", "B"]);
        assert_eq!(result.group_names, vec!["P0", "P1"]);
        let p0 = &result.series[0];
        let p1 = &result.series[1];
        assert_eq!(p0.name.as_deref(), Some("P0"));
        assert_eq!(p0.values, vec![2.0, 1.0]);
        assert_eq!(p1.values, vec![3.0, 0.0]);
    }

    #[test]
    fn test_label_sort_descending_moves_values() {
        let config = ChartConfig {
            sort_by: SortTarget::Label,
            sort_order: SortDirection::Desc,
            ..sum_config()
        };
        let result = aggregate(&hours_data(), &config);

        assert_eq!(result.categories, vec!["B", "A"]);
        assert_eq!(result.series[0].values, vec![1.0, 2.0]);
        assert_eq!(result.series[1].values, vec![0.0, 3.0]);
    }

    #[test]
    fn test_missing_values_use_sentinels() {
        let records = vec![
            Record::new().with("type", FieldValue::Missing).with("p", text("P1")),
            Record::new().with("type", text("")),
            Record::new().with("type", text("A")),
        ];
        let config = ChartConfig {
            group_field: Some("p".to_string()),
            ..Default::default()
        };
        let result = aggregate(&records, &config);

        assert_eq!(result.categories, vec!["A", UNCATEGORIZED]);
        assert_eq!(result.group_names, vec!["P1", UNGROUPED]);
        // uncategorized: one P1, one ungrouped
        assert_eq!(result.series[0].values, vec![0.0, 1.0]);
        assert_eq!(result.series[1].values, vec![1.0, 1.0]);
    }

    #[test]
    fn test_categories_are_distinct() {
        let records: Vec<Record> = ["x", "y", "x", "z", "y", "x"]
            .iter()
            .map(|v| Record::new().with("type", text(v)))
            .collect();
        let result = aggregate(&records, &ChartConfig::default());

        let mut sorted = result.categories.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), result.categories.len());
        assert_eq!(result.categories, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_aggregate_functions() {
        let values = [Some(4.0), None, Some(0.0), Some(2.0)];
        assert_eq!(apply_aggregate(&values, AggregateFn::Sum), 6.0);
        assert_eq!(apply_aggregate(&values, AggregateFn::Average), 2.0);
        assert_eq!(apply_aggregate(&values, AggregateFn::Max), 4.0);
        assert_eq!(apply_aggregate(&values, AggregateFn::Min), 0.0);
    }

    #[test]
    fn test_empty_aggregates_are_zero() {
        for function in [AggregateFn::Sum, AggregateFn::Average, AggregateFn::Max, AggregateFn::Min] {
            assert_eq!(apply_aggregate(&[], function), 0.0);
            assert_eq!(apply_aggregate(&[None, None], function), 0.0);
        }
    }

    #[test]
    fn test_average_rounds_to_two_decimals() {
        let records = vec![
            Record::new().with("type", text("A")).with("h", num(1.0)),
            Record::new().with("type", text("A")).with("h", num(2.0)),
            Record::new().with("type", text("A")).with("h", text("2")),
            Record::new().with("type", text("A")).with("h", text("n/a")),
        ];
        let config = ChartConfig {
            metric: MetricKind::Value,
            value_field: Some("h".to_string()),
            aggregate: AggregateFn::Average,
            ..Default::default()
        };
        let result = aggregate(&records, &config);
        assert_eq!(result.series[0].values, vec![1.67]);
    }

    #[test]
    fn test_value_metric_without_field_counts() {
        let config = ChartConfig {
            x_field: "t".to_string(),
            metric: MetricKind::Value,
            value_field: None,
            ..Default::default()
        };
        let result = aggregate(&hours_data(), &config);
        assert_eq!(result.series[0].values, vec![2.0, 1.0]);
    }

    #[test]
    fn test_sort_by_value_desc() {
        let mut records = Vec::new();
        for (label, n) in [("low", 1), ("high", 5), ("mid", 3), ("tie", 3)] {
            for _ in 0..n {
                records.push(Record::new().with("type", text(label)));
            }
        }
        let config = ChartConfig {
            sort_by: SortTarget::Value,
            sort_order: SortDirection::Desc,
            ..Default::default()
        };
        let result = aggregate(&records, &config);

        assert_eq!(result.categories, vec!["high", "tie", "mid", "low"]);
        let totals: Vec<f64> = (0..result.categories.len())
            .map(|i| result.category_total(i))
            .collect();
        assert!(totals.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_sort_by_value_uses_group_totals() {
        let config = ChartConfig {
            sort_by: SortTarget::Value,
            sort_order: SortDirection::Asc,
            ..sum_config()
        };
        let result = aggregate(&hours_data(), &config);
        assert_eq!(result.categories, vec!["B", "A"]);
        assert_eq!(result.series[0].values, vec![1.0, 2.0]);
        assert_eq!(result.series[1].values, vec![0.0, 3.0]);
    }

    #[test]
    fn test_priority_groups_sorted() {
        let records: Vec<Record> = ["P2", "p0", "P3", "P1"]
            .iter()
            .map(|p| Record::new().with("type", text("A")).with("priority", text(p)))
            .collect();
        let config = ChartConfig {
            group_field: Some("priority".to_string()),
            ..Default::default()
        };
        let result = aggregate(&records, &config);
        assert_eq!(result.group_names, vec!["p0", "P1", "P2", "P3"]);
    }

    #[test]
    fn test_recompute_is_identical() {
        let config = sum_config();
        let first = serde_json::to_string(&aggregate(&hours_data(), &config)).unwrap();
        let second = serde_json::to_string(&aggregate(&hours_data(), &config)).unwrap();
        assert_eq!(first, second);
    }
}
