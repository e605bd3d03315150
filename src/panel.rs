//! Headless model of the chart configuration panel.
//!
//! The panel owns the loaded data and the configuration being edited. Every
//! event that can change what is shown recomputes the chart from scratch.

use crate::compiler::compile_chart;
use crate::config::{ChartConfig, ConfigEdit};
use crate::ir::ChartSpec;
use crate::loader::{DataSource, DataStore};
use crate::transform::aggregate;

/// What the caller receives when the panel closes
#[derive(Debug, Clone, PartialEq)]
pub enum PanelOutcome {
    Confirmed(ChartConfig),
    Cancelled,
}

/// What the panel currently displays
#[derive(Debug, PartialEq)]
pub enum PanelView<'a> {
    Hidden,
    /// Load failure shown in place of the chart
    Error(&'a str),
    /// Visible, nothing to plot
    Empty,
    Chart(&'a ChartSpec),
}

#[derive(Debug)]
pub struct ConfigPanel {
    store: DataStore,
    config: ChartConfig,
    chart: Option<ChartSpec>,
    visible: bool,
    viewport: (u32, u32),
}

impl ConfigPanel {
    pub fn new(config: ChartConfig) -> Self {
        Self {
            store: DataStore::new(),
            config,
            chart: None,
            visible: false,
            viewport: (800, 600),
        }
    }

    /// Showing the panel reloads the data; hiding it tears the chart down
    pub fn set_visible(&mut self, visible: bool, source: &dyn DataSource) {
        if visible == self.visible {
            return;
        }
        self.visible = visible;

        if visible {
            tracing::debug!(location = %source.location(), "Panel shown, loading data");
            if self.store.reload(source) {
                self.config.fit_to_fields(self.store.fields());
            }
            self.recompute();
        } else {
            tracing::debug!("Panel hidden");
            self.chart = None;
        }
    }

    pub fn apply(&mut self, edit: ConfigEdit) {
        tracing::debug!(?edit, "Configuration edited");
        self.config.apply(edit);
        if self.visible {
            self.recompute();
        }
    }

    /// The chart is re-emitted as is; only the viewport changes
    pub fn resize(&mut self, width: u32, height: u32) -> Option<&ChartSpec> {
        self.viewport = (width, height);
        self.chart.as_ref()
    }

    pub fn confirm(&self) -> PanelOutcome {
        PanelOutcome::Confirmed(self.config.clone())
    }

    pub fn cancel(&self) -> PanelOutcome {
        PanelOutcome::Cancelled
    }

    pub fn view(&self) -> PanelView<'_> {
        if !self.visible {
            return PanelView::Hidden;
        }
        if let Some(err) = self.store.error() {
            return PanelView::Error(err);
        }
        match &self.chart {
            Some(chart) if !chart_is_blank(chart) => PanelView::Chart(chart),
            _ => PanelView::Empty,
        }
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    pub fn fields(&self) -> &[String] {
        self.store.fields()
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    fn recompute(&mut self) {
        let dataset = self.store.dataset();
        if dataset.is_empty() {
            self.chart = None;
            return;
        }
        let result = aggregate(&dataset.records, &self.config);
        self.chart = Some(compile_chart(&result, &self.config));
    }
}

fn chart_is_blank(chart: &ChartSpec) -> bool {
    chart.series.iter().all(|s| s.data.is_empty())
}
