use unicode_segmentation::UnicodeSegmentation;

use crate::types::{FontWeight, TextAlign, TextBaseline, TextStyle};

/// Core trait for text measurement functionality
pub trait TextMeasurer {
    /// Measures the bounding dimensions for a text string with given configuration
    fn measure_text_bounds(&self, config: &TextMeasurementConfig) -> TextBounds;

    fn measure(&self, text: &str, style: &TextStyle) -> TextBounds {
        self.measure_text_bounds(&TextMeasurementConfig { text, style })
    }
}

/// Configuration needed for text measurement
#[derive(Debug, Clone)]
pub struct TextMeasurementConfig<'a> {
    /// The text string to measure
    pub text: &'a str,
    pub style: &'a TextStyle,
}

/// Results from text measurement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextBounds {
    /// Total width of the text
    pub width: f64,
    /// Total height from top to bottom
    pub height: f64,
    /// Distance from top to baseline
    pub ascent: f64,
    /// Distance from bottom to baseline
    pub descent: f64,
    /// Distance from top to where the top of the next line would be
    pub line_height: f64,
}

impl TextBounds {
    /// Top-left corner of a box anchored at `(x, y)`.
    ///
    /// `align` places the anchor on the box's left edge, center or right edge; `baseline`
    /// does the same vertically, where `Alphabetic` puts the anchor `ascent` below the top.
    pub fn top_left(
        &self,
        (x, y): (f64, f64),
        align: TextAlign,
        baseline: TextBaseline,
    ) -> (f64, f64) {
        let left = match align {
            TextAlign::Left => x,
            TextAlign::Center => x - self.width / 2.0,
            TextAlign::Right => x - self.width,
        };
        let top = match baseline {
            TextBaseline::Top => y,
            TextBaseline::Alphabetic => y - self.ascent,
            TextBaseline::Middle => y - self.height / 2.0,
            TextBaseline::Bottom => y - self.height,
        };
        (left, top)
    }

    pub fn empty(font_size: f64) -> Self {
        TextBounds {
            width: 0.0,
            height: font_size,
            ascent: font_size * 0.8,
            descent: font_size * 0.2,
            line_height: font_size * 1.2,
        }
    }
}

/// Deterministic measurer that gives every grapheme the same advance.
///
/// Used when no font backend is available and by tests, where exact label extents
/// need to be predictable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedAdvanceMeasurer {
    /// Advance per grapheme as a fraction of the font size
    pub advance_ratio: f64,
    /// Extra advance ratio applied to bold text
    pub bold_ratio: f64,
}

impl Default for FixedAdvanceMeasurer {
    fn default() -> Self {
        Self {
            advance_ratio: 0.5,
            bold_ratio: 0.05,
        }
    }
}

impl FixedAdvanceMeasurer {
    pub fn new(advance_ratio: f64) -> Self {
        Self {
            advance_ratio,
            ..Default::default()
        }
    }
}

impl TextMeasurer for FixedAdvanceMeasurer {
    fn measure_text_bounds(&self, config: &TextMeasurementConfig) -> TextBounds {
        let font_size = config.style.font_size;
        let ratio = match config.style.font_weight {
            FontWeight::Normal => self.advance_ratio,
            FontWeight::Bold => self.advance_ratio + self.bold_ratio,
        };
        let graphemes = config.text.graphemes(true).count() as f64;
        TextBounds {
            width: graphemes * font_size * ratio,
            ..TextBounds::empty(font_size)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn test_top_left() {
        let measurer = FixedAdvanceMeasurer::default();
        // 30x12 at 12px
        let bounds = measurer.measure("1,000", &TextStyle::default());

        // Centered below an anchor, as under a bottom axis tick
        let origin = bounds.top_left((100.0, 50.0), TextAlign::Center, TextBaseline::Top);
        assert_eq!(origin, (85.0, 50.0));

        // Right of the anchor's left side, vertically centered, as beside a left axis
        let origin = bounds.top_left((100.0, 50.0), TextAlign::Right, TextBaseline::Middle);
        assert_eq!(origin, (70.0, 44.0));

        let origin = bounds.top_left((100.0, 50.0), TextAlign::Left, TextBaseline::Bottom);
        assert_eq!(origin, (100.0, 38.0));

        let origin = bounds.top_left((100.0, 50.0), TextAlign::Left, TextBaseline::Alphabetic);
        assert_approx_eq!(f64, origin.1, 50.0 - 9.6);
    }

    #[test]
    fn test_fixed_advance() {
        let measurer = FixedAdvanceMeasurer::new(0.5);
        let style = TextStyle::default().with_font_size(14.0);
        let bounds = measurer.measure("2000", &style);
        assert_approx_eq!(f64, bounds.width, 28.0);
        assert_approx_eq!(f64, bounds.height, 14.0);

        // Graphemes, not bytes
        let bounds = measurer.measure("µs", &style);
        assert_approx_eq!(f64, bounds.width, 14.0);

        let bold = measurer.measure("2000", &style.clone().bold());
        assert!(bold.width > 28.0);
    }
}
