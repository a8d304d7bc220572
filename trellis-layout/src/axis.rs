//! Axis definers.
//!
//! A continuous axis is built in two phases. [`AxisDefiner`] accumulates the data range
//! while series are discovered; [`AxisDefiner::resolve`] consumes it, fixes the view
//! window and the mapper, and returns a [`ResolvedAxis`] that can position values and
//! compute decorations. Discrete domains use [`CategoryAxis`] instead.

use serde::Serialize;
use strum::{EnumString, VariantNames};
use trellis_common::options::Options;
use trellis_common::types::{AxisDecoration, Decorations, LabelAlignment, Orientation, Rect};
use trellis_scales::decorations::linear::choose_step;
use trellis_scales::decorations::time::TimeUnit;
use trellis_scales::decorations::{supply_decorations, DecorationConfig};
use trellis_scales::format::NumberFormat;
use trellis_scales::mapper::linear::LinearMapper;
use trellis_scales::mapper::power::{PowerFunction, PowerMapper};
use trellis_scales::mapper::time::{parse_timezone, TimeMapper};
use trellis_scales::mapper::Mapper;
use trellis_scales::ticks::nice_bounds;
use trellis_text::measurement::TextMeasurer;
use trellis_text::types::{TextAlign, TextBaseline, TextStyle};

use crate::error::LayoutError;

/// Gap between the chart area edge and axis labels.
pub const LABEL_GAP: f64 = 4.0;

const DAY_MILLIS: f64 = 86_400_000.0;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, EnumString, VariantNames)]
#[strum(serialize_all = "lowercase")]
pub enum ViewWindowMode {
    /// Expand to the nearest nice step boundaries
    #[default]
    Pretty,
    /// Fit the data exactly
    Maximized,
    /// Use `viewWindow.min` / `viewWindow.max`
    Explicit,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, EnumString, VariantNames)]
#[strum(serialize_all = "camelCase")]
pub enum ScaleType {
    #[default]
    Linear,
    Log,
    MirrorLog,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisKind {
    Numeric,
    Time,
}

/// Which edge of the chart area an axis is drawn along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisSide {
    Bottom,
    Left,
    Right,
    Top,
}

/// Axis configuration read once from the options tree.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisOptions {
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub view_window_min: Option<f64>,
    pub view_window_max: Option<f64>,
    pub view_window_mode: ViewWindowMode,
    pub reversed: bool,
    pub baseline: Option<f64>,
    pub scale_type: ScaleType,
    pub log_base: f64,
    pub log_epsilon: Option<f64>,
    pub format: Option<String>,
    pub gridline_count: Option<usize>,
    pub minor_gridline_count: Option<usize>,
    pub min_spacing: f64,
    pub min_label_distance: f64,
    pub show_text_every: Option<usize>,
    pub text_style: TextStyle,
    pub timezone: String,
    pub title: Option<String>,
}

impl Default for AxisOptions {
    fn default() -> Self {
        Self::from_options::<&str>(&Options::empty(), &[])
    }
}

impl AxisOptions {
    /// Reads `<prefix>.<key>` for every prefix in order, e.g. `["vAxes.1", "vAxis"]`.
    pub fn from_options<P: AsRef<str>>(options: &Options, prefixes: &[P]) -> Self {
        let paths = |key: &str| -> Vec<String> {
            prefixes
                .iter()
                .map(|p| format!("{}.{}", p.as_ref(), key))
                .collect()
        };
        let view_window_min = options.infer_opt_f64(&paths("viewWindow.min"));
        let view_window_max = options.infer_opt_f64(&paths("viewWindow.max"));
        let default_mode = if view_window_min.is_some() || view_window_max.is_some() {
            ViewWindowMode::Explicit
        } else {
            ViewWindowMode::Pretty
        };
        let font_size = options.infer_f64(&paths("textStyle.fontSize"), 12.0);
        let font_name = options.infer_str(&paths("textStyle.fontName"), "Arial");
        // gridlines.count of -1 means automatic
        let count = |key: &str| {
            options
                .infer_opt_f64(&paths(key))
                .filter(|c| *c >= 0.0)
                .map(|c| c as usize)
        };

        Self {
            min_value: options.infer_opt_f64(&paths("minValue")),
            max_value: options.infer_opt_f64(&paths("maxValue")),
            view_window_min,
            view_window_max,
            view_window_mode: options.infer_enum(&paths("viewWindowMode"), default_mode),
            reversed: options.infer_f64(&paths("direction"), 1.0) < 0.0,
            baseline: options.infer_opt_f64(&paths("baseline")),
            scale_type: options.infer_enum(&paths("scaleType"), ScaleType::Linear),
            log_base: options.infer_f64(&paths("logBase"), 10.0),
            log_epsilon: options.infer_opt_f64(&paths("logEpsilon")),
            format: options.infer_opt_str(&paths("format")),
            gridline_count: count("gridlines.count"),
            minor_gridline_count: count("minorGridlines.count"),
            min_spacing: options.infer_f64(&paths("gridlines.minSpacing"), 40.0),
            min_label_distance: options.infer_f64(&paths("minTextSpacing"), 10.0),
            show_text_every: options
                .infer_opt_f64(&paths("showTextEvery"))
                .filter(|n| *n >= 1.0)
                .map(|n| n as usize),
            text_style: TextStyle {
                font_name,
                ..TextStyle::default().with_font_size(font_size)
            },
            timezone: options.infer_str(&paths("timezone"), "UTC"),
            title: options.infer_opt_str(&paths("title")),
        }
    }

    fn number_format(&self) -> Result<Option<NumberFormat>, LayoutError> {
        Ok(match &self.format {
            Some(pattern) => Some(NumberFormat::parse(pattern)?),
            None => None,
        })
    }

    /// Decoration settings for an axis running in `orientation`.
    fn decoration_config(&self, orientation: Orientation) -> Result<DecorationConfig, LayoutError> {
        Ok(DecorationConfig::default()
            .with_min_spacing(self.min_spacing)
            .with_min_label_distance(self.min_label_distance)
            .with_orientation(orientation)
            .with_gridline_count(self.gridline_count)
            .with_minor_gridline_count(self.minor_gridline_count)
            .with_format(self.number_format()?)
            .with_text_style(self.text_style.clone()))
    }
}

/// Accumulating phase of a continuous axis.
#[derive(Debug, Clone)]
pub struct AxisDefiner {
    orientation: Orientation,
    kind: AxisKind,
    options: AxisOptions,
    granularity: Option<TimeUnit>,
    data_range: Option<(f64, f64)>,
}

impl AxisDefiner {
    pub fn new(orientation: Orientation, kind: AxisKind, options: AxisOptions) -> Self {
        Self {
            orientation,
            kind,
            options,
            granularity: None,
            data_range: None,
        }
    }

    /// Finest calendar unit worth labeling (dates have day granularity).
    pub fn with_granularity(mut self, granularity: Option<TimeUnit>) -> Self {
        self.granularity = granularity;
        self
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn kind(&self) -> AxisKind {
        self.kind
    }

    pub fn options(&self) -> &AxisOptions {
        &self.options
    }

    pub fn data_range(&self) -> Option<(f64, f64)> {
        self.data_range
    }

    /// Grows the data range outward; non-finite values are ignored.
    pub fn extend_range_to_include_number(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }
        self.data_range = Some(match self.data_range {
            Some((min, max)) => (min.min(value), max.max(value)),
            None => (value, value),
        });
    }

    pub fn extend_range_to_include(&mut self, values: impl IntoIterator<Item = f64>) {
        for value in values {
            self.extend_range_to_include_number(value);
        }
    }

    /// Freezes the view window and builds the mapper onto `screen` (the pixel
    /// positions of the low and high ends before `direction` is applied).
    ///
    /// Pretty windows are rounded to the step the axis will be labeled with, so labels
    /// are measured here as well.
    #[tracing::instrument(skip_all)]
    pub fn resolve(
        self,
        (start, end): (f64, f64),
        measurer: &dyn TextMeasurer,
    ) -> Result<ResolvedAxis, LayoutError> {
        let options = &self.options;
        let mut range = self.data_range.unwrap_or(match self.kind {
            AxisKind::Numeric => (0.0, 1.0),
            AxisKind::Time => (0.0, DAY_MILLIS),
        });
        if let Some(min) = options.min_value {
            range.0 = range.0.min(min);
        }
        if let Some(max) = options.max_value {
            range.1 = range.1.max(max);
        }

        let screen = if options.reversed {
            (end, start)
        } else {
            (start, end)
        };
        let (mut min, mut max) = match options.view_window_mode {
            ViewWindowMode::Pretty => {
                self.pretty_range(range, (screen.1 - screen.0).abs(), measurer)?
            }
            ViewWindowMode::Maximized | ViewWindowMode::Explicit => range,
        };
        if let Some(view_min) = options.view_window_min {
            min = view_min;
        }
        if let Some(view_max) = options.view_window_max {
            max = view_max;
        }
        if min > max {
            tracing::warn!("view window [{min}, {max}] is inverted, swapping its bounds");
            std::mem::swap(&mut min, &mut max);
        }
        tracing::debug!(
            "resolved {:?} axis view window [{min}, {max}] from data {range:?}",
            self.orientation
        );

        let mapper = self.build_mapper((min, max), screen)?;
        let baseline = options.baseline.or(match (self.kind, options.scale_type) {
            (AxisKind::Numeric, ScaleType::Linear | ScaleType::MirrorLog) => Some(0.0),
            _ => None,
        });

        Ok(ResolvedAxis {
            orientation: self.orientation,
            kind: self.kind,
            granularity: self.granularity,
            baseline,
            mapper,
            options: self.options,
        })
    }

    fn pretty_range(
        &self,
        (min, max): (f64, f64),
        length: f64,
        measurer: &dyn TextMeasurer,
    ) -> Result<(f64, f64), LayoutError> {
        if self.kind == AxisKind::Time || !(max > min) {
            return Ok((min, max));
        }
        let config = self.options.decoration_config(self.orientation)?;

        if self.options.scale_type != ScaleType::Linear {
            if let Ok(function) = PowerFunction::new(self.options.log_base, self.epsilon(min)) {
                let (t0, t1) = (function.transform(min), function.transform(max));
                if t1 - t0 >= 2.0 {
                    return Ok((
                        function.untransform(t0.floor()),
                        function.untransform(t1.ceil()),
                    ));
                }
            }
        }

        // The expanded range can need a coarser step, so iterate to a fixed point
        let mut bounds = (min, max);
        for _ in 0..3 {
            let Some(step) = choose_step(bounds.0, bounds.1, length, &config, measurer) else {
                break;
            };
            let next = nice_bounds(min, max, step);
            if next == bounds {
                break;
            }
            bounds = next;
        }
        Ok(bounds)
    }

    fn epsilon(&self, min: f64) -> f64 {
        self.options.log_epsilon.unwrap_or(match self.options.scale_type {
            ScaleType::Log if min > 0.0 => 10f64.powf(min.log10().floor()),
            _ => 1.0,
        })
    }

    fn build_mapper(&self, data: (f64, f64), screen: (f64, f64)) -> Result<Mapper, LayoutError> {
        Ok(match (self.kind, self.options.scale_type) {
            (AxisKind::Time, _) => {
                let tz = parse_timezone(&self.options.timezone)
                    .map_err(|_| LayoutError::InvalidTimezone(self.options.timezone.clone()))?;
                TimeMapper::with_timezone(data, screen, tz).into()
            }
            (AxisKind::Numeric, ScaleType::Linear) => LinearMapper::new(data, screen).into(),
            (AxisKind::Numeric, ScaleType::Log | ScaleType::MirrorLog) => PowerMapper::try_new(
                data,
                screen,
                self.options.log_base,
                self.epsilon(data.0.min(data.1)),
            )?
            .into(),
        })
    }
}

/// A continuous axis with a frozen view window.
#[derive(Debug, Clone)]
pub struct ResolvedAxis {
    orientation: Orientation,
    kind: AxisKind,
    options: AxisOptions,
    granularity: Option<TimeUnit>,
    baseline: Option<f64>,
    mapper: Mapper,
}

impl ResolvedAxis {
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn kind(&self) -> AxisKind {
        self.kind
    }

    pub fn options(&self) -> &AxisOptions {
        &self.options
    }

    pub fn mapper(&self) -> &Mapper {
        &self.mapper
    }

    /// `(min, max)` of the view window.
    pub fn view_window(&self) -> (f64, f64) {
        let (a, b) = (self.mapper.data_min(), self.mapper.data_max());
        (a.min(b), a.max(b))
    }

    pub fn baseline(&self) -> Option<f64> {
        self.baseline
    }

    /// Value bars grow from: the baseline clamped into the view window.
    pub fn base_value(&self) -> f64 {
        let (min, max) = self.view_window();
        self.baseline.unwrap_or(0.0).clamp(min, max)
    }

    pub fn calc_position_for_numeric_value(&self, value: f64) -> f64 {
        self.mapper.to_screen(value)
    }

    pub fn calc_pos_for_num_or_error(&self, value: f64) -> Result<f64, LayoutError> {
        if !value.is_finite() {
            return Err(LayoutError::NonFiniteValue(value));
        }
        Ok(self.mapper.to_screen(value))
    }

    pub fn value_at_position(&self, position: f64) -> f64 {
        self.mapper.to_data(position)
    }

    pub fn decoration_config(&self) -> Result<DecorationConfig, LayoutError> {
        Ok(self
            .options
            .decoration_config(self.orientation)?
            .with_granularity(self.granularity))
    }

    #[tracing::instrument(skip_all)]
    pub fn compute_decorations(
        &self,
        measurer: &dyn TextMeasurer,
        side: AxisSide,
    ) -> Result<AxisLayout, LayoutError> {
        let mut decorations =
            supply_decorations(&self.mapper, &self.decoration_config()?, measurer);
        // Majors whose label is skipped keep their line and tick
        if let Some(every) = self.options.show_text_every.filter(|n| *n > 1) {
            for (i, decoration) in decorations.major_gridlines.iter_mut().enumerate() {
                if i % every != 0 && decoration.label().is_some() {
                    *decoration =
                        AxisDecoration::line_and_tick(decoration.value(), decoration.position());
                }
            }
        }
        let (min, max) = self.view_window();
        let baseline = self
            .baseline
            .filter(|b| *b >= min && *b <= max)
            .map(|b| AxisDecoration::heavy_line(b, self.mapper.to_screen(b)));
        Ok(AxisLayout {
            side,
            orientation: self.orientation,
            decorations,
            baseline,
            title: self.options.title.clone(),
            text_style: self.options.text_style.clone(),
            collision_filtered: false,
        })
    }
}

/// Discrete axis with one slot per category.
#[derive(Debug, Clone)]
pub struct CategoryAxis {
    orientation: Orientation,
    labels: Vec<String>,
    mapper: LinearMapper,
    options: AxisOptions,
}

impl CategoryAxis {
    pub fn new(
        orientation: Orientation,
        labels: Vec<String>,
        (start, end): (f64, f64),
        options: AxisOptions,
    ) -> Self {
        let screen = if options.reversed {
            (end, start)
        } else {
            (start, end)
        };
        // Slot i is centered on index i
        let count = labels.len().max(1) as f64;
        let mapper = LinearMapper::new((-0.5, count - 0.5), screen);
        Self {
            orientation,
            labels,
            mapper,
            options,
        }
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn position(&self, index: f64) -> f64 {
        self.mapper.to_screen(index)
    }

    pub fn slot_width(&self) -> f64 {
        (self.mapper.to_screen(1.0) - self.mapper.to_screen(0.0)).abs()
    }

    /// Show every n-th label so that neighbors never overlap.
    pub fn label_step(&self, measurer: &dyn TextMeasurer) -> usize {
        if let Some(every) = self.options.show_text_every {
            return every;
        }
        let slot = self.slot_width();
        if slot <= 0.0 {
            return self.labels.len().max(1);
        }
        let extent = self
            .labels
            .iter()
            .map(|label| {
                let bounds = measurer.measure(label, &self.options.text_style);
                match self.orientation {
                    Orientation::Horizontal => bounds.width,
                    Orientation::Vertical => bounds.line_height,
                }
            })
            .fold(0.0, f64::max);
        (((extent + self.options.min_label_distance) / slot).ceil() as usize).max(1)
    }

    pub fn compute_decorations(&self, measurer: &dyn TextMeasurer, side: AxisSide) -> AxisLayout {
        let step = self.label_step(measurer);
        let majors = self
            .labels
            .iter()
            .enumerate()
            .map(|(i, label)| {
                let position = self.position(i as f64);
                if i % step == 0 {
                    AxisDecoration::labeled_tick(i as f64, position, label.clone())
                } else {
                    AxisDecoration::tick_only(i as f64, position)
                }
            })
            .collect();
        AxisLayout {
            side,
            orientation: self.orientation,
            decorations: Decorations::new(majors),
            baseline: None,
            title: self.options.title.clone(),
            text_style: self.options.text_style.clone(),
            collision_filtered: false,
        }
    }
}

/// The axis along which categories or continuous domain values run.
#[derive(Debug, Clone)]
pub enum DomainAxis {
    Discrete(CategoryAxis),
    Continuous(ResolvedAxis),
}

impl DomainAxis {
    pub fn orientation(&self) -> Orientation {
        match self {
            DomainAxis::Discrete(axis) => axis.orientation(),
            DomainAxis::Continuous(axis) => axis.orientation(),
        }
    }

    /// Screen position of a category index or a continuous domain value.
    pub fn position(&self, value: f64) -> f64 {
        match self {
            DomainAxis::Discrete(axis) => axis.position(value),
            DomainAxis::Continuous(axis) => axis.calc_position_for_numeric_value(value),
        }
    }

    pub fn compute_decorations(
        &self,
        measurer: &dyn TextMeasurer,
        side: AxisSide,
    ) -> Result<AxisLayout, LayoutError> {
        match self {
            DomainAxis::Discrete(axis) => Ok(axis.compute_decorations(measurer, side)),
            DomainAxis::Continuous(axis) => axis.compute_decorations(measurer, side),
        }
    }
}

/// Decorations of one axis as placed on the chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisLayout {
    pub side: AxisSide,
    pub orientation: Orientation,
    pub decorations: Decorations,
    pub baseline: Option<AxisDecoration>,
    pub title: Option<String>,
    pub text_style: TextStyle,
    /// Set once the collision resolver has run over this axis
    pub collision_filtered: bool,
}

impl AxisLayout {
    /// Screen box of a decoration's label, placed outside `chart_area` on this axis' side.
    pub fn label_box(
        &self,
        decoration: &AxisDecoration,
        measurer: &dyn TextMeasurer,
        chart_area: &Rect,
    ) -> Option<Rect> {
        let label = decoration.label()?;
        let bounds = measurer.measure(label, &self.text_style);
        let position = decoration.position();
        // Alignment runs along the axis; across it labels sit outside the chart area
        let along_x = match decoration.label_alignment() {
            LabelAlignment::Left => TextAlign::Left,
            LabelAlignment::Center => TextAlign::Center,
            LabelAlignment::Right => TextAlign::Right,
        };
        let along_y = match decoration.label_alignment() {
            LabelAlignment::Left => TextBaseline::Top,
            LabelAlignment::Center => TextBaseline::Middle,
            LabelAlignment::Right => TextBaseline::Bottom,
        };
        let (left, top) = match self.side {
            AxisSide::Bottom => bounds.top_left(
                (position, chart_area.bottom() + LABEL_GAP),
                along_x,
                TextBaseline::Top,
            ),
            AxisSide::Top => bounds.top_left(
                (position, chart_area.top - LABEL_GAP),
                along_x,
                TextBaseline::Bottom,
            ),
            AxisSide::Left => bounds.top_left(
                (chart_area.left - LABEL_GAP, position),
                TextAlign::Right,
                along_y,
            ),
            AxisSide::Right => bounds.top_left(
                (chart_area.right() + LABEL_GAP, position),
                TextAlign::Left,
                along_y,
            ),
        };
        Some(Rect::new(left, top, bounds.width, bounds.height))
    }

    /// `(index into major_gridlines, label box)` for every labeled major decoration.
    pub fn label_boxes(
        &self,
        measurer: &dyn TextMeasurer,
        chart_area: &Rect,
    ) -> Vec<(usize, Rect)> {
        self.decorations
            .major_gridlines
            .iter()
            .enumerate()
            .filter_map(|(i, d)| self.label_box(d, measurer, chart_area).map(|r| (i, r)))
            .collect()
    }

    /// Label boxes of the first and last labeled decorations.
    pub fn end_label_boxes(&self, measurer: &dyn TextMeasurer, chart_area: &Rect) -> Vec<Rect> {
        let boxes = self.label_boxes(measurer, chart_area);
        match (boxes.first(), boxes.last()) {
            (Some(first), Some(last)) if first.0 != last.0 => vec![first.1, last.1],
            (Some(first), _) => vec![first.1],
            _ => vec![],
        }
    }
}
