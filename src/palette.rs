use plotters::style::RGBColor;

/// Ordered list of series colors, reused cyclically
#[derive(Debug, Clone)]
pub struct ColorPalette {
    colors: Vec<String>,
}

impl ColorPalette {
    /// The browser chart library's default series colors
    pub fn standard() -> Self {
        Self::new(&[
            "#5470c6", "#91cc75", "#fac858", "#ee6666", "#73c0de", "#3ba272", "#fc8452",
            "#9a60b4", "#ea7ccc",
        ])
    }

    pub fn new(colors: &[&str]) -> Self {
        Self {
            colors: colors.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Color for the series at `index`, wrapping around the palette
    pub fn color_at(&self, index: usize) -> &str {
        if self.colors.is_empty() {
            return "#000000";
        }
        &self.colors[index % self.colors.len()]
    }

    pub fn rgb_at(&self, index: usize) -> RGBColor {
        parse_hex(self.color_at(index)).unwrap_or(RGBColor(0, 0, 0))
    }
}

/// Parse `#rrggbb`
pub fn parse_hex(hex: &str) -> Option<RGBColor> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok();
    Some(RGBColor(channel(0)?, channel(2)?, channel(4)?))
}
