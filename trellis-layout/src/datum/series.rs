//! Series kinds and their pixel scaling.

use serde::Serialize;
use strum::{Display, EnumString, VariantNames};
use trellis_common::options::Options;
use trellis_common::types::{Orientation, Point, Rect, Segment};

use super::intervals::IntervalStyle;
use super::{IntervalShape, NonScaledDatum, ScaledDatum, ScaledMark};
use crate::axis::{DomainAxis, ResolvedAxis};
use crate::division::DivisionDefinition;

/// Width of interval bars and boxes drawn on series without a bar to size them by.
pub const POINT_INTERVAL_WIDTH: f64 = 8.0;

#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Display,
    EnumString,
    VariantNames,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum SeriesType {
    Bars,
    #[default]
    Line,
    Area,
    SteppedArea,
    Scatter,
    Bubble,
    Candlesticks,
    Boxplot,
}

impl SeriesType {
    /// Data columns consumed by one series of this type.
    pub fn data_columns(&self) -> usize {
        match self {
            SeriesType::Candlesticks => 4,
            SeriesType::Boxplot => 5,
            // x and y, color and size are optional
            SeriesType::Bubble => 2,
            _ => 1,
        }
    }

    /// Occupies a subdivision of the domain slot.
    pub fn is_bar_like(&self) -> bool {
        matches!(
            self,
            SeriesType::Bars | SeriesType::Candlesticks | SeriesType::Boxplot
        )
    }

    pub fn is_stackable(&self) -> bool {
        matches!(
            self,
            SeriesType::Bars | SeriesType::Area | SeriesType::SteppedArea
        )
    }

    /// Grows from the target axis baseline, so the baseline is kept in range.
    pub fn grows_from_baseline(&self) -> bool {
        self.is_stackable()
    }

    /// Plots two continuous values; such series have no domain categories.
    pub fn is_xy(&self) -> bool {
        matches!(self, SeriesType::Scatter | SeriesType::Bubble)
    }
}

/// Linear map from the bubble size column to a radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BubbleSizing {
    pub min_radius: f64,
    pub max_radius: f64,
    pub min_size: f64,
    pub max_size: f64,
}

impl Default for BubbleSizing {
    fn default() -> Self {
        Self {
            min_radius: 5.0,
            max_radius: 30.0,
            min_size: 0.0,
            max_size: 0.0,
        }
    }
}

impl BubbleSizing {
    pub fn from_options(options: &Options) -> Self {
        let defaults = Self::default();
        let min_paths = ["sizeAxis.minSize", "bubble.minRadius"];
        let max_paths = ["sizeAxis.maxSize", "bubble.maxRadius"];
        Self {
            min_radius: options.infer_f64(&min_paths, defaults.min_radius),
            max_radius: options.infer_f64(&max_paths, defaults.max_radius),
            ..defaults
        }
    }

    pub fn with_size_range(mut self, sizes: impl IntoIterator<Item = f64>) -> Self {
        let (min, max) = sizes
            .into_iter()
            .filter(|s| s.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
                (lo.min(s), hi.max(s))
            });
        if min <= max {
            self.min_size = min;
            self.max_size = max;
        }
        self
    }

    /// Bubbles without a size, or with all sizes equal, get the middle radius.
    pub fn radius(&self, size: Option<f64>) -> f64 {
        let span = self.max_size - self.min_size;
        match size {
            Some(size) if span > 0.0 => {
                let t = ((size - self.min_size) / span).clamp(0.0, 1.0);
                self.min_radius + t * (self.max_radius - self.min_radius)
            }
            _ => (self.min_radius + self.max_radius) / 2.0,
        }
    }
}

/// Calibrated axes and bar geometry a series is scaled against.
#[derive(Debug, Clone, Copy)]
pub struct ScaleContext<'a> {
    pub orientation: Orientation,
    pub domain: &'a DomainAxis,
    pub target: &'a ResolvedAxis,
    pub division: Option<&'a DivisionDefinition>,
    pub subdivision: usize,
}

impl ScaleContext<'_> {
    fn domain_px(&self, value: f64) -> f64 {
        self.domain.position(value)
    }

    fn target_px(&self, value: f64) -> f64 {
        self.target.calc_position_for_numeric_value(value)
    }

    fn point(&self, domain_px: f64, value: f64) -> Point {
        self.orientation.to_xy(domain_px, self.target_px(value))
    }

    fn rect(&self, (d0, d1): (f64, f64), v0: f64, v1: f64) -> Rect {
        self.orientation
            .rect(d0, d1, self.target_px(v0), self.target_px(v1))
    }

    fn segment(&self, d0: f64, v0: f64, d1: f64, v1: f64) -> Segment {
        self.orientation
            .segment(d0, self.target_px(v0), d1, self.target_px(v1))
    }

    fn bar_extent(&self, domain_px: f64) -> (f64, f64) {
        match self.division {
            Some(division) => division.subdivision_extent(domain_px, self.subdivision),
            None => point_extent(domain_px),
        }
    }

    fn slot_extent(&self, domain_px: f64) -> (f64, f64) {
        match self.division {
            Some(division) => {
                let half = division.slot_width() / 2.0;
                (domain_px - half, domain_px + half)
            }
            None => point_extent(domain_px),
        }
    }

    /// Value a mark grows from: the bottom of its stack span or the axis baseline.
    fn base_of(&self, datum: &NonScaledDatum) -> f64 {
        datum
            .stack
            .map(|s| s.from)
            .unwrap_or_else(|| self.target.base_value())
    }
}

fn point_extent(domain_px: f64) -> (f64, f64) {
    (
        domain_px - POINT_INTERVAL_WIDTH / 2.0,
        domain_px + POINT_INTERVAL_WIDTH / 2.0,
    )
}

/// A series kind bound to the context it scales against.
#[derive(Debug, Clone, Copy)]
pub enum SeriesLayout<'a> {
    Bars(ScaleContext<'a>),
    SteppedArea(ScaleContext<'a>),
    Line(ScaleContext<'a>),
    Area(ScaleContext<'a>),
    Scatter(ScaleContext<'a>),
    Bubble(ScaleContext<'a>, BubbleSizing),
    Candlestick(ScaleContext<'a>),
    Boxplot(ScaleContext<'a>),
}

impl<'a> SeriesLayout<'a> {
    pub fn new(series_type: SeriesType, context: ScaleContext<'a>, sizing: BubbleSizing) -> Self {
        match series_type {
            SeriesType::Bars => SeriesLayout::Bars(context),
            SeriesType::SteppedArea => SeriesLayout::SteppedArea(context),
            SeriesType::Line => SeriesLayout::Line(context),
            SeriesType::Area => SeriesLayout::Area(context),
            SeriesType::Scatter => SeriesLayout::Scatter(context),
            SeriesType::Bubble => SeriesLayout::Bubble(context, sizing),
            SeriesType::Candlesticks => SeriesLayout::Candlestick(context),
            SeriesType::Boxplot => SeriesLayout::Boxplot(context),
        }
    }

    pub fn context(&self) -> &ScaleContext<'a> {
        match self {
            SeriesLayout::Bars(c)
            | SeriesLayout::SteppedArea(c)
            | SeriesLayout::Line(c)
            | SeriesLayout::Area(c)
            | SeriesLayout::Scatter(c)
            | SeriesLayout::Bubble(c, _)
            | SeriesLayout::Candlestick(c)
            | SeriesLayout::Boxplot(c) => c,
        }
    }

    /// Pixel geometry of one row, `None` when a value the mark needs is missing.
    pub fn scale(&self, datum: &NonScaledDatum) -> Option<ScaledDatum> {
        let ctx = self.context();
        let d = ctx.domain_px(datum.domain);
        let mark = match self {
            SeriesLayout::Bars(_) => {
                let end = datum.end_value()?;
                ScaledMark::Bar {
                    rect: ctx.rect(ctx.bar_extent(d), ctx.base_of(datum), end),
                }
            }
            SeriesLayout::SteppedArea(_) => {
                let end = datum.end_value()?;
                ScaledMark::Bar {
                    rect: ctx.rect(ctx.slot_extent(d), ctx.base_of(datum), end),
                }
            }
            SeriesLayout::Line(_) | SeriesLayout::Scatter(_) => ScaledMark::Point {
                center: ctx.point(d, datum.end_value()?),
                control_points: None,
            },
            SeriesLayout::Area(_) => ScaledMark::Area {
                top: ctx.point(d, datum.end_value()?),
                base: ctx.point(d, ctx.base_of(datum)),
            },
            SeriesLayout::Bubble(_, sizing) => ScaledMark::Bubble {
                center: ctx.point(d, datum.target()?),
                radius: sizing.radius(datum.values.get(2).copied().flatten()),
            },
            SeriesLayout::Candlestick(_) => {
                let [low, open, close, high] = required(datum)?;
                let extent = ctx.bar_extent(d);
                let center = (extent.0 + extent.1) / 2.0;
                ScaledMark::Candlestick {
                    body: ctx.rect(extent, open, close),
                    wick: ctx.segment(center, low, center, high),
                    rising: close >= open,
                }
            }
            SeriesLayout::Boxplot(_) => {
                let [min, q1, median, q3, max] = required(datum)?;
                let extent = ctx.bar_extent(d);
                let center = (extent.0 + extent.1) / 2.0;
                ScaledMark::Boxplot {
                    box_rect: ctx.rect(extent, q1, q3),
                    median: ctx.segment(extent.0, median, extent.1, median),
                    whiskers: [
                        ctx.segment(center, min, center, q1),
                        ctx.segment(center, q3, center, max),
                    ],
                }
            }
        };

        let extent = match self {
            SeriesLayout::Bars(_) | SeriesLayout::Candlestick(_) | SeriesLayout::Boxplot(_) => {
                ctx.bar_extent(d)
            }
            _ => point_extent(d),
        };
        Some(ScaledDatum {
            row: datum.row,
            mark,
            intervals: scale_intervals(ctx, datum, extent),
        })
    }
}

/// The first `N` values of a datum, all present.
fn required<const N: usize>(datum: &NonScaledDatum) -> Option<[f64; N]> {
    let mut out = [0.0; N];
    for (slot, value) in out.iter_mut().zip(datum.values.iter()) {
        *slot = (*value)?;
    }
    (datum.values.len() >= N).then_some(out)
}

fn scale_intervals(
    ctx: &ScaleContext,
    datum: &NonScaledDatum,
    (d0, d1): (f64, f64),
) -> Vec<IntervalShape> {
    let center = (d0 + d1) / 2.0;
    datum
        .intervals
        .iter()
        .map(|mark| {
            let half = (d1 - d0) / 2.0 * mark.span_fraction;
            let span = (center - half, center + half);
            let column_index = mark.column_index;
            match mark.style {
                IntervalStyle::Bars => IntervalShape::Bar {
                    rect: ctx.rect(span, mark.low_value, mark.high_value),
                    column_index,
                },
                IntervalStyle::Boxes => IntervalShape::Box {
                    rect: ctx.rect(span, mark.low_value, mark.high_value),
                    column_index,
                },
                IntervalStyle::Sticks => IntervalShape::Stick {
                    segment: ctx.segment(center, mark.low_value, center, mark.high_value),
                    column_index,
                },
                IntervalStyle::Points => IntervalShape::Point {
                    center: ctx.point(center, mark.low_value),
                    column_index,
                },
                IntervalStyle::Line => IntervalShape::Line {
                    point: ctx.point(center, mark.low_value),
                    column_index,
                },
                IntervalStyle::Area => IntervalShape::Band {
                    low: ctx.point(center, mark.low_value),
                    high: ctx.point(center, mark.high_value),
                    column_index,
                },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::{AxisDefiner, AxisKind, AxisOptions, CategoryAxis, ViewWindowMode};
    use crate::datum::intervals::IntervalMark;
    use crate::datum::stacking::StackRange;
    use crate::division::DivisionOptions;
    use float_cmp::assert_approx_eq;
    use trellis_text::measurement::FixedAdvanceMeasurer;

    fn axes() -> (DomainAxis, ResolvedAxis) {
        let labels = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let domain = DomainAxis::Discrete(CategoryAxis::new(
            Orientation::Horizontal,
            labels,
            (0.0, 300.0),
            AxisOptions::default(),
        ));
        let mut definer = AxisDefiner::new(
            Orientation::Vertical,
            AxisKind::Numeric,
            AxisOptions {
                view_window_mode: ViewWindowMode::Maximized,
                ..Default::default()
            },
        );
        definer.extend_range_to_include([0.0, 100.0]);
        (
            domain,
            definer
                .resolve((200.0, 0.0), &FixedAdvanceMeasurer::default())
                .unwrap(),
        )
    }

    #[test]
    fn test_bar_from_baseline() {
        let (domain, target) = axes();
        let division = DivisionDefinition::calculate(100.0, 2, &DivisionOptions::default());
        let ctx = ScaleContext {
            orientation: Orientation::Horizontal,
            domain: &domain,
            target: &target,
            division: Some(&division),
            subdivision: 1,
        };
        let layout = SeriesLayout::new(SeriesType::Bars, ctx, BubbleSizing::default());
        let scaled = layout
            .scale(&NonScaledDatum::new(0, 1.0, vec![Some(50.0)]))
            .unwrap();
        let ScaledMark::Bar { rect } = scaled.mark else {
            panic!("expected a bar");
        };
        // Second bar of the group starts at the slot center
        assert_approx_eq!(f64, rect.left, 150.0);
        assert_approx_eq!(f64, rect.top, 100.0);
        assert_approx_eq!(f64, rect.bottom(), 200.0);

        assert!(layout
            .scale(&NonScaledDatum::new(1, 1.0, vec![None]))
            .is_none());
    }

    #[test]
    fn test_stacked_area_and_intervals() {
        let (domain, target) = axes();
        let ctx = ScaleContext {
            orientation: Orientation::Horizontal,
            domain: &domain,
            target: &target,
            division: None,
            subdivision: 0,
        };
        let datum = NonScaledDatum::new(0, 0.0, vec![Some(20.0)])
            .with_stack(Some(StackRange { from: 30.0, to: 50.0 }))
            .with_intervals(vec![IntervalMark {
                style: IntervalStyle::Sticks,
                low_value: 40.0,
                high_value: 60.0,
                span_fraction: 1.0,
                column_index: 2,
            }]);
        let scaled = SeriesLayout::Area(ctx).scale(&datum).unwrap();
        assert_eq!(
            scaled.mark,
            ScaledMark::Area {
                top: Point::new(50.0, 100.0),
                base: Point::new(50.0, 140.0),
            }
        );
        assert_eq!(
            scaled.intervals,
            vec![IntervalShape::Stick {
                segment: Segment::new(Point::new(50.0, 120.0), Point::new(50.0, 80.0)),
                column_index: 2,
            }]
        );
    }

    #[test]
    fn test_line_intervals_stay_lines() {
        let (domain, target) = axes();
        let ctx = ScaleContext {
            orientation: Orientation::Horizontal,
            domain: &domain,
            target: &target,
            division: None,
            subdivision: 0,
        };
        let mark = |style, value, column_index| IntervalMark {
            style,
            low_value: value,
            high_value: value,
            span_fraction: 1.0,
            column_index,
        };
        let datum = NonScaledDatum::new(0, 1.0, vec![Some(50.0)]).with_intervals(vec![
            mark(IntervalStyle::Line, 30.0, 2),
            mark(IntervalStyle::Points, 70.0, 3),
        ]);
        let scaled = SeriesLayout::Line(ctx).scale(&datum).unwrap();
        assert_eq!(
            scaled.intervals,
            vec![
                IntervalShape::Line {
                    point: Point::new(150.0, 140.0),
                    column_index: 2,
                },
                IntervalShape::Point {
                    center: Point::new(150.0, 60.0),
                    column_index: 3,
                },
            ]
        );
    }

    #[test]
    fn test_candlestick_and_boxplot() {
        let (domain, target) = axes();
        let ctx = ScaleContext {
            orientation: Orientation::Horizontal,
            domain: &domain,
            target: &target,
            division: None,
            subdivision: 0,
        };
        let values = vec![Some(10.0), Some(60.0), Some(40.0), Some(90.0)];
        let candle = NonScaledDatum::new(0, 2.0, values);
        let scaled = SeriesLayout::Candlestick(ctx).scale(&candle).unwrap();
        let ScaledMark::Candlestick { body, wick, rising } = scaled.mark else {
            panic!("expected a candlestick");
        };
        assert!(!rising);
        assert_approx_eq!(f64, body.top, 80.0);
        assert_approx_eq!(f64, body.height, 40.0);
        assert_eq!(wick.from, Point::new(250.0, 180.0));

        let short = NonScaledDatum::new(0, 2.0, vec![Some(10.0), Some(20.0), Some(30.0)]);
        assert!(SeriesLayout::Boxplot(ctx).scale(&short).is_none());
    }

    #[test]
    fn test_bubble_radius() {
        let sizing = BubbleSizing::default().with_size_range([10.0, 20.0, 30.0]);
        assert_approx_eq!(f64, sizing.radius(Some(10.0)), 5.0);
        assert_approx_eq!(f64, sizing.radius(Some(30.0)), 30.0);
        assert_approx_eq!(f64, sizing.radius(Some(20.0)), 17.5);
        assert_approx_eq!(f64, sizing.radius(None), 17.5);
    }
}
