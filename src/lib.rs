// Library exports for bugchart

pub mod config;
pub mod data;
pub mod error;
pub mod graph;
pub mod loader;
pub mod order;
pub mod palette;
pub mod panel;

// Pipeline: aggregate -> compile
pub mod ir;
pub mod transform;
pub mod compiler;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Declarative chart options as JSON
    #[default]
    Json,
    /// Static preview image
    Png,
}

#[derive(Debug, Clone)]
pub struct ChartOptions {
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            format: OutputFormat::Json,
        }
    }
}

/// Aggregate, compile and serialize in one go
pub fn render_chart(
    dataset: &data::Dataset,
    config: &config::ChartConfig,
    options: &ChartOptions,
) -> anyhow::Result<Vec<u8>> {
    use anyhow::Context;

    let result = transform::aggregate(&dataset.records, config);
    match options.format {
        OutputFormat::Json => {
            let spec = compiler::compile_chart(&result, config);
            serde_json::to_vec_pretty(&spec).context("Failed to serialize chart")
        }
        OutputFormat::Png => {
            let mut canvas = graph::Canvas::new(options.width, options.height, config.title())?;
            canvas.draw(&result, config.variant, &palette::ColorPalette::standard())?;
            canvas.render()
        }
    }
}
