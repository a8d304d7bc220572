//! Decoration suppliers: choose ticks, gridlines and labels for a calibrated mapper.

pub mod linear;
pub mod power;
pub mod time;

use trellis_common::types::{AxisDecoration, Decorations, Orientation};
use trellis_text::measurement::TextMeasurer;
use trellis_text::types::TextStyle;

use crate::format::NumberFormat;
use crate::mapper::Mapper;
use time::TimeUnit;

/// Minor gridlines closer together than this are dropped.
pub const MIN_MINOR_SPACING: f64 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub struct DecorationConfig {
    /// Minimum on-screen distance between adjacent major gridlines
    pub min_spacing: f64,
    /// Minimum empty space between adjacent labels
    pub min_label_distance: f64,
    /// Direction the axis runs; horizontal axes space labels by width, vertical by height
    pub orientation: Orientation,
    /// Requested number of major gridlines, used as the initial step hint
    pub gridline_count: Option<usize>,
    /// Minor gridlines between adjacent majors. Time axes pick their own when unset;
    /// `Some(0)` disables them everywhere.
    pub minor_gridline_count: Option<usize>,
    pub format: Option<NumberFormat>,
    pub text_style: TextStyle,
    /// Time strategies finer than this unit are skipped
    pub granularity: Option<TimeUnit>,
}

impl Default for DecorationConfig {
    fn default() -> Self {
        Self {
            min_spacing: 40.0,
            min_label_distance: 10.0,
            orientation: Orientation::Horizontal,
            gridline_count: None,
            minor_gridline_count: None,
            format: None,
            text_style: TextStyle::default(),
            granularity: None,
        }
    }
}

impl DecorationConfig {
    pub fn with_min_spacing(mut self, min_spacing: f64) -> Self {
        self.min_spacing = min_spacing;
        self
    }

    pub fn with_min_label_distance(mut self, min_label_distance: f64) -> Self {
        self.min_label_distance = min_label_distance;
        self
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_gridline_count(mut self, count: Option<usize>) -> Self {
        self.gridline_count = count;
        self
    }

    pub fn with_minor_gridline_count(mut self, count: Option<usize>) -> Self {
        self.minor_gridline_count = count;
        self
    }

    pub fn with_format(mut self, format: Option<NumberFormat>) -> Self {
        self.format = format;
        self
    }

    pub fn with_text_style(mut self, text_style: TextStyle) -> Self {
        self.text_style = text_style;
        self
    }

    pub fn with_granularity(mut self, granularity: Option<TimeUnit>) -> Self {
        self.granularity = granularity;
        self
    }

    /// On-screen distance adjacent labels need: the largest label extent along the axis
    /// plus `min_label_distance`, and never less than `min_spacing`.
    pub(crate) fn label_spacing<I, S>(&self, labels: I, measurer: &dyn TextMeasurer) -> f64
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extent = labels
            .into_iter()
            .map(|label| {
                let bounds = measurer.measure(label.as_ref(), &self.text_style);
                match self.orientation {
                    Orientation::Horizontal => bounds.width,
                    Orientation::Vertical => bounds.height,
                }
            })
            .fold(0.0, f64::max);
        self.min_spacing.max(extent + self.min_label_distance)
    }

    /// Label formatter for ticks spaced `step` apart.
    pub(crate) fn number_format(&self, step: f64) -> NumberFormat {
        match &self.format {
            Some(format) => format.clone().with_precision_for_step(step),
            None => NumberFormat::for_step(step),
        }
    }
}

/// Runs the supplier family that matches the mapper variant.
pub fn supply_decorations(
    mapper: &Mapper,
    config: &DecorationConfig,
    measurer: &dyn TextMeasurer,
) -> Decorations {
    match mapper {
        Mapper::Linear(m) => linear::LinearSupplier::new(config, measurer).supply(m),
        Mapper::Power(m) => power::PowerSupplier::new(config, measurer).supply(m),
        Mapper::Time(m) => time::TimeSupplier::new(config, measurer).supply(m),
    }
}

/// The single decoration emitted for a zero-span range.
pub(crate) fn single_decoration(value: f64, position: f64, label: String) -> Decorations {
    Decorations::new(vec![AxisDecoration::labeled_line(value, position, label)])
        .with_bounds(value, value)
}

/// Smallest absolute distance between consecutive positions.
pub(crate) fn min_gap(positions: &[f64]) -> f64 {
    positions
        .windows(2)
        .map(|w| (w[1] - w[0]).abs())
        .fold(f64::INFINITY, f64::min)
}

pub(crate) fn with_bounds_from_majors(decorations: Decorations) -> Decorations {
    let first = decorations.major_gridlines.first().map(|d| d.value());
    let last = decorations.major_gridlines.last().map(|d| d.value());
    match (first, last) {
        (Some(first), Some(last)) => decorations.with_bounds(first, last),
        _ => decorations,
    }
}
