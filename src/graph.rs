use anyhow::{Context, Result};
use image::ImageEncoder;
use plotters::prelude::*;

use crate::config::ChartVariant;
use crate::ir::AggregateResult;
use crate::palette::ColorPalette;

/// Share of a category slot covered by its bars
const BAR_SPAN: f64 = 0.8;

/// Largest RGB buffer a preview may allocate
const MAX_BUFFER_BYTES: usize = 256 * 1024 * 1024;

/// One bar in (category axis, value axis) coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct BarRect {
    pub series: usize,
    pub category: (f64, f64),
    pub value: (f64, f64),
}

/// Bitmap canvas for a static chart preview
pub struct Canvas {
    buffer: Vec<u8>,
    width: u32,
    height: u32,
    title: String,
}

impl Canvas {
    pub fn new(width: u32, height: u32, title: impl Into<String>) -> Result<Self> {
        if width == 0 || height == 0 {
            anyhow::bail!("Canvas size must be non-zero (got {}x{})", width, height);
        }
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(3))
            .filter(|&n| n <= MAX_BUFFER_BYTES)
            .with_context(|| format!("Canvas size {}x{} is too large", width, height))?;
        Ok(Canvas {
            buffer: vec![0u8; len],
            width,
            height,
            title: title.into(),
        })
    }

    /// Draw every series of `result` in the layout of `variant`
    pub fn draw(
        &mut self,
        result: &AggregateResult,
        variant: ChartVariant,
        palette: &ColorPalette,
    ) -> Result<()> {
        if result.categories.is_empty() || result.series.is_empty() {
            anyhow::bail!("Cannot draw a chart with no data");
        }

        let root = BitMapBackend::with_buffer(&mut self.buffer, (self.width, self.height))
            .into_drawing_area();
        root.fill(&WHITE).context("Failed to fill background")?;

        let num_categories = result.categories.len();
        let category_range = 0.0..(num_categories as f64);
        let value_range = 0.0..value_extent(result, variant);
        let categories = result.categories.clone();
        let label_at = move |pos: f64| -> String {
            let idx = pos as usize;
            categories.get(idx).cloned().unwrap_or_default()
        };

        if variant.is_horizontal() {
            let mut chart = ChartBuilder::on(&root)
                .margin(10)
                .caption(&self.title, ("sans-serif", 20))
                .x_label_area_size(40)
                .y_label_area_size(80)
                .build_cartesian_2d(value_range, category_range)
                .context("Failed to build chart")?;

            chart
                .configure_mesh()
                .y_labels(num_categories)
                .y_label_formatter(&|y| label_at(*y))
                .draw()
                .context("Failed to draw mesh")?;

            for rect in bar_rects(result, variant) {
                let color = palette.rgb_at(rect.series);
                chart
                    .draw_series(std::iter::once(Rectangle::new(
                        [(rect.value.0, rect.category.0), (rect.value.1, rect.category.1)],
                        color.filled(),
                    )))
                    .context("Failed to draw bar")?;
            }
        } else {
            let mut chart = ChartBuilder::on(&root)
                .margin(10)
                .caption(&self.title, ("sans-serif", 20))
                .x_label_area_size(40)
                .y_label_area_size(50)
                .build_cartesian_2d(category_range, value_range)
                .context("Failed to build chart")?;

            chart
                .configure_mesh()
                .x_labels(num_categories)
                .x_label_formatter(&|x| label_at(*x))
                .draw()
                .context("Failed to draw mesh")?;

            if variant.is_line() {
                for (series_idx, series) in result.series.iter().enumerate() {
                    let color = palette.rgb_at(series_idx);
                    let points: Vec<(f64, f64)> = series
                        .values
                        .iter()
                        .enumerate()
                        .map(|(i, &v)| (i as f64 + 0.5, v))
                        .collect();

                    chart
                        .draw_series(LineSeries::new(points.clone(), color.stroke_width(2)))
                        .context("Failed to draw line series")?;
                    chart
                        .draw_series(points.iter().map(|&p| Circle::new(p, 3, color.filled())))
                        .context("Failed to draw line points")?;
                }
            } else {
                for rect in bar_rects(result, variant) {
                    let color = palette.rgb_at(rect.series);
                    chart
                        .draw_series(std::iter::once(Rectangle::new(
                            [(rect.category.0, rect.value.0), (rect.category.1, rect.value.1)],
                            color.filled(),
                        )))
                        .context("Failed to draw bar")?;
                }
            }
        }

        root.present().context("Failed to present drawing")?;

        Ok(())
    }

    /// Finalize and encode the canvas as PNG
    pub fn render(self) -> Result<Vec<u8>> {
        let mut png_bytes = Vec::new();
        {
            let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
            encoder
                .write_image(&self.buffer, self.width, self.height, image::ColorType::Rgb8)
                .context("Failed to encode PNG")?;
        }

        Ok(png_bytes)
    }
}

/// Upper bound of the value axis with some headroom
fn value_extent(result: &AggregateResult, variant: ChartVariant) -> f64 {
    let max = if variant.is_stacked() {
        (0..result.categories.len())
            .map(|i| result.category_total(i))
            .fold(0.0, f64::max)
    } else {
        result.max_value()
    };
    if max <= 0.0 { 1.0 } else { max * 1.1 }
}

/// Bar geometry: stacked variants pile series on each other, the others
/// place them side by side within the category slot.
pub fn bar_rects(result: &AggregateResult, variant: ChartVariant) -> Vec<BarRect> {
    let num_series = result.series.len();
    let mut rects = Vec::new();

    for cat_idx in 0..result.categories.len() {
        let center = cat_idx as f64 + 0.5;

        if variant.is_stacked() {
            let mut cumulative = 0.0;
            for (series_idx, series) in result.series.iter().enumerate() {
                let v = series.values.get(cat_idx).copied().unwrap_or(0.0);
                rects.push(BarRect {
                    series: series_idx,
                    category: (center - BAR_SPAN / 2.0, center + BAR_SPAN / 2.0),
                    value: (cumulative, cumulative + v),
                });
                cumulative += v;
            }
        } else {
            let bar_width = BAR_SPAN / num_series as f64;
            for (series_idx, series) in result.series.iter().enumerate() {
                let v = series.values.get(cat_idx).copied().unwrap_or(0.0);
                let offset = (series_idx as f64 - (num_series as f64 - 1.0) / 2.0) * bar_width;
                let x = center + offset;
                rects.push(BarRect {
                    series: series_idx,
                    category: (x - bar_width / 2.0, x + bar_width / 2.0),
                    value: (0.0, v),
                });
            }
        }
    }

    rects
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Series;

    fn result() -> AggregateResult {
        AggregateResult {
            categories: vec!["A".to_string(), "B".to_string()],
            group_names: vec!["P0".to_string(), "P1".to_string()],
            series: vec![
                Series { name: Some("P0".to_string()), values: vec![2.0, 1.0] },
                Series { name: Some("P1".to_string()), values: vec![3.0, 0.0] },
            ],
        }
    }

    #[test]
    fn test_stacked_rects() {
        let rects = bar_rects(&result(), ChartVariant::StackedBar);
        assert_eq!(rects.len(), 4);
        assert_eq!(rects[0].value, (0.0, 2.0));
        assert_eq!(rects[1].value, (2.0, 5.0));
        assert_eq!(rects[0].category, rects[1].category);
    }

    #[test]
    fn test_dodged_rects() {
        let rects = bar_rects(&result(), ChartVariant::ClusteredBar);
        assert_eq!(rects[0].value, (0.0, 2.0));
        assert_eq!(rects[1].value, (0.0, 3.0));
        assert!(rects[0].category.1 <= rects[1].category.0 + 1e-9);
        assert!((rects[0].category.0 - 0.1).abs() < 1e-9);
        assert!((rects[1].category.1 - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_value_extent() {
        assert!((value_extent(&result(), ChartVariant::StackedBar) - 5.5).abs() < 1e-9);
        assert!((value_extent(&result(), ChartVariant::Bar) - 3.3).abs() < 1e-9);
    }

    #[test]
    fn test_empty_draw_fails() {
        let empty = AggregateResult {
            categories: Vec::new(),
            group_names: Vec::new(),
            series: Vec::new(),
        };
        let mut canvas = Canvas::new(10, 10, "empty").unwrap();
        assert!(canvas.draw(&empty, ChartVariant::Bar, &ColorPalette::standard()).is_err());
        assert!(Canvas::new(0, 10, "zero").is_err());
    }

    #[test]
    fn test_oversized_canvas_rejected() {
        let err = Canvas::new(40000, 40000, "huge").err().unwrap();
        assert!(err.to_string().contains("40000x40000 is too large"));
        assert!(Canvas::new(u32::MAX, u32::MAX, "huge").is_err());
    }
}
