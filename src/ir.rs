use serde::Serialize;

// =============================================================================
// Phase 1: Aggregation
// =============================================================================

/// Output of one aggregation pass.
/// `series[i].values[j]` is the value of series `i` at `categories[j]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult {
    pub categories: Vec<String>,
    pub group_names: Vec<String>,
    pub series: Vec<Series>,
}

impl AggregateResult {
    pub fn is_grouped(&self) -> bool {
        !self.group_names.is_empty()
    }

    /// Sum of every series at one category
    pub fn category_total(&self, index: usize) -> f64 {
        self.series
            .iter()
            .filter_map(|s| s.values.get(index))
            .sum()
    }

    pub fn max_value(&self) -> f64 {
        self.series
            .iter()
            .flat_map(|s| s.values.iter().copied())
            .fold(0.0, f64::max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    /// Group name, `None` for the single ungrouped series
    pub name: Option<String>,
    pub values: Vec<f64>,
}

// =============================================================================
// Phase 2: Chart specification
// =============================================================================

/// Declarative chart options handed to the renderer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSpec {
    pub title: String,
    pub x_axis: Axis,
    pub y_axis: Axis,
    pub tooltip: Tooltip,
    pub legend: Legend,
    pub series: Vec<SeriesSpec>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisKind {
    Category,
    Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    #[serde(rename = "type")]
    pub kind: AxisKind,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tooltip {
    pub trigger: String,
    /// Preformatted text per category, index-aligned with the category axis
    pub entries: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub show: bool,
    pub data: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesKind {
    Bar,
    Line,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SeriesKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    pub color: String,
    pub data: Vec<f64>,
}
