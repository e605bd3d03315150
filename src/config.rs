use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Dimension selected when nothing else is configured
pub const DEFAULT_X_FIELD: &str = "type";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ChartVariant {
    #[default]
    Bar,
    StackedBar,
    ClusteredBar,
    Line,
    HorizontalBar,
    HorizontalStackedBar,
}

impl ChartVariant {
    pub fn is_stacked(self) -> bool {
        matches!(self, ChartVariant::StackedBar | ChartVariant::HorizontalStackedBar)
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, ChartVariant::HorizontalBar | ChartVariant::HorizontalStackedBar)
    }

    pub fn is_line(self) -> bool {
        matches!(self, ChartVariant::Line)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum MetricKind {
    /// Number of records per cell
    #[default]
    Count,
    /// Aggregate over a numeric field
    Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum AggregateFn {
    #[default]
    Sum,
    Max,
    Min,
    Average,
}

impl AggregateFn {
    pub fn label(self) -> &'static str {
        match self {
            AggregateFn::Sum => "sum",
            AggregateFn::Max => "max",
            AggregateFn::Min => "min",
            AggregateFn::Average => "average",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SortTarget {
    /// Category label
    #[default]
    Label,
    /// Aggregated total of the category
    Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Everything the panel lets the user pick for one chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChartConfig {
    pub variant: ChartVariant,
    pub x_field: String,
    pub group_field: Option<String>,
    pub metric: MetricKind,
    pub value_field: Option<String>,
    pub aggregate: AggregateFn,
    pub sort_by: SortTarget,
    pub sort_order: SortDirection,
    pub group_order: SortDirection,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            variant: ChartVariant::Bar,
            x_field: DEFAULT_X_FIELD.to_string(),
            group_field: None,
            metric: MetricKind::Count,
            value_field: None,
            aggregate: AggregateFn::Sum,
            sort_by: SortTarget::Label,
            sort_order: SortDirection::Asc,
            group_order: SortDirection::Asc,
        }
    }
}

impl ChartConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Invalid {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Active grouping field; a blank name means no grouping
    pub fn grouping(&self) -> Option<&str> {
        self.group_field.as_deref().filter(|g| !g.trim().is_empty())
    }

    /// Value field when the metric actually aggregates one
    pub fn numeric_field(&self) -> Option<&str> {
        match self.metric {
            MetricKind::Count => None,
            MetricKind::Value => self.value_field.as_deref().filter(|v| !v.trim().is_empty()),
        }
    }

    /// Axis label for the computed values
    pub fn metric_label(&self) -> String {
        match self.numeric_field() {
            Some(field) => format!("{} of {}", self.aggregate.label(), field),
            None => "count".to_string(),
        }
    }

    pub fn title(&self) -> String {
        format!("{} by {}", self.metric_label(), self.x_field)
    }

    /// Replace a default x-field that the dataset does not know with its
    /// first field.
    pub fn fit_to_fields(&mut self, fields: &[String]) {
        if self.x_field == DEFAULT_X_FIELD && !fields.iter().any(|f| f == &self.x_field) {
            if let Some(first) = fields.first() {
                tracing::debug!(x_field = %first, "Default x-field absent, using first field");
                self.x_field = first.clone();
            }
        }
    }

    pub fn validate(&self, fields: &[String]) -> Result<(), ConfigError> {
        let known = |name: &str| fields.iter().any(|f| f == name);

        if !known(&self.x_field) {
            return Err(ConfigError::UnknownField {
                field: self.x_field.clone(),
            });
        }
        if let Some(group) = self.grouping() {
            if !known(group) {
                return Err(ConfigError::UnknownField {
                    field: group.to_string(),
                });
            }
        }
        if self.metric == MetricKind::Value {
            let value = self.numeric_field().ok_or(ConfigError::ValueFieldRequired)?;
            if !known(value) {
                return Err(ConfigError::UnknownField {
                    field: value.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn apply(&mut self, edit: ConfigEdit) {
        match edit {
            ConfigEdit::Variant(v) => self.variant = v,
            ConfigEdit::XField(f) => self.x_field = f,
            ConfigEdit::GroupField(f) => self.group_field = f,
            ConfigEdit::Metric(m) => self.metric = m,
            ConfigEdit::ValueField(f) => self.value_field = f,
            ConfigEdit::Aggregate(a) => self.aggregate = a,
            ConfigEdit::SortBy(t) => self.sort_by = t,
            ConfigEdit::SortOrder(d) => self.sort_order = d,
            ConfigEdit::GroupOrder(d) => self.group_order = d,
        }
    }
}

/// A single form-control change
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigEdit {
    Variant(ChartVariant),
    XField(String),
    GroupField(Option<String>),
    Metric(MetricKind),
    ValueField(Option<String>),
    Aggregate(AggregateFn),
    SortBy(SortTarget),
    SortOrder(SortDirection),
    GroupOrder(SortDirection),
}
