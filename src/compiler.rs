use crate::config::{ChartConfig, ChartVariant};
use crate::ir::{AggregateResult, Axis, AxisKind, ChartSpec, Legend, SeriesKind, SeriesSpec, Tooltip};
use crate::palette::ColorPalette;

/// Stack key shared by all series of a stacked variant
pub const STACK_KEY: &str = "total";

/// Build the declarative chart options for one aggregation result
pub fn compile_chart(result: &AggregateResult, config: &ChartConfig) -> ChartSpec {
    compile_chart_with_palette(result, config, &ColorPalette::standard())
}

pub fn compile_chart_with_palette(
    result: &AggregateResult,
    config: &ChartConfig,
    palette: &ColorPalette,
) -> ChartSpec {
    let variant = config.variant;
    let metric_label = config.metric_label();

    // Category axis carries the labels, value axis the metric
    let category_axis = Axis {
        kind: AxisKind::Category,
        name: config.x_field.clone(),
        data: Some(result.categories.clone()),
    };
    let value_axis = Axis {
        kind: AxisKind::Value,
        name: metric_label.clone(),
        data: None,
    };
    let (x_axis, y_axis) = if variant.is_horizontal() {
        (value_axis, category_axis)
    } else {
        (category_axis, value_axis)
    };

    let kind = if variant.is_line() { SeriesKind::Line } else { SeriesKind::Bar };
    let stack = variant.is_stacked().then(|| STACK_KEY.to_string());

    let series = result
        .series
        .iter()
        .enumerate()
        .map(|(i, s)| SeriesSpec {
            name: s.name.clone().unwrap_or_else(|| metric_label.clone()),
            kind,
            stack: stack.clone(),
            color: palette.color_at(i).to_string(),
            data: s.values.clone(),
        })
        .collect();

    let tooltip = Tooltip {
        trigger: "axis".to_string(),
        entries: (0..result.categories.len())
            .map(|i| format_tooltip(result, i, variant, &metric_label))
            .collect(),
    };

    let legend = Legend {
        show: result.is_grouped(),
        data: result.group_names.clone(),
    };

    ChartSpec {
        title: config.title(),
        x_axis,
        y_axis,
        tooltip,
        legend,
        series,
    }
}

/// Tooltip text for one category: its name, then each series' value with two
/// decimals. Stacked variants leave out zero-valued series.
pub fn format_tooltip(
    result: &AggregateResult,
    category_index: usize,
    variant: ChartVariant,
    metric_label: &str,
) -> String {
    let Some(category) = result.categories.get(category_index) else {
        return String::new();
    };

    let mut lines = vec![category.clone()];
    for series in &result.series {
        let value = series.values.get(category_index).copied().unwrap_or(0.0);
        if variant.is_stacked() && value == 0.0 {
            continue;
        }
        let name = series.name.as_deref().unwrap_or(metric_label);
        lines.push(format!("{}: {:.2}", name, value));
    }
    lines.join("<br/>")
}
