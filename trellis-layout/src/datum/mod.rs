//! Per-point layout: value-space records and their pixel geometry.
//!
//! Layout runs in two passes. Accumulation builds a [`NonScaledDatum`] for every row of
//! every series (stacking spans and interval marks included) while the axes still grow;
//! once the axes are resolved each datum is scaled into a [`ScaledDatum`].

pub mod curve;
pub mod intervals;
pub mod series;
pub mod stacking;

use serde::Serialize;
use trellis_common::types::{Point, Rect, Segment};

use curve::{catmull_rom_control_points, ControlPoints};
use intervals::IntervalMark;
use stacking::StackRange;

/// A row of a series in data space.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NonScaledDatum {
    pub row: usize,
    /// Category index on a discrete domain axis, otherwise the domain value
    pub domain: f64,
    /// Values of the series' data columns, in column order
    pub values: Vec<Option<f64>>,
    pub stack: Option<StackRange>,
    pub intervals: Vec<IntervalMark>,
}

impl NonScaledDatum {
    pub fn new(row: usize, domain: f64, values: Vec<Option<f64>>) -> Self {
        Self {
            row,
            domain,
            values,
            stack: None,
            intervals: vec![],
        }
    }

    pub fn with_stack(mut self, stack: Option<StackRange>) -> Self {
        self.stack = stack;
        self
    }

    pub fn with_intervals(mut self, intervals: Vec<IntervalMark>) -> Self {
        self.intervals = intervals;
        self
    }

    /// The primary value, `None` for missing data.
    pub fn target(&self) -> Option<f64> {
        self.values.first().copied().flatten()
    }

    /// Value the mark ends at: the top of its stack span, or the value itself.
    pub fn end_value(&self) -> Option<f64> {
        match self.stack {
            Some(stack) => self.target().map(|_| stack.to),
            None => self.target(),
        }
    }

    /// Every value that must be visible on the target axis. A stacked datum occupies
    /// its stack span instead of its raw value.
    pub fn target_extent(&self) -> Vec<f64> {
        let mut values: Vec<f64> = match self.stack {
            Some(stack) => vec![stack.from, stack.to],
            None => self.values.iter().flatten().copied().collect(),
        };
        values.extend(
            self.intervals
                .iter()
                .flat_map(|m| [m.low_value, m.high_value]),
        );
        values
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScaledMark {
    Point {
        center: Point,
        control_points: Option<ControlPoints>,
    },
    /// One vertex of an area: its top edge and the matching point on the base
    Area { top: Point, base: Point },
    Bar { rect: Rect },
    Bubble { center: Point, radius: f64 },
    Candlestick {
        body: Rect,
        wick: Segment,
        rising: bool,
    },
    Boxplot {
        box_rect: Rect,
        median: Segment,
        whiskers: [Segment; 2],
    },
}

impl ScaledMark {
    /// Point annotations and lines attach to.
    pub fn anchor(&self) -> Point {
        match self {
            ScaledMark::Point { center, .. } | ScaledMark::Bubble { center, .. } => *center,
            ScaledMark::Area { top, .. } => *top,
            ScaledMark::Bar { rect } => rect.center(),
            ScaledMark::Candlestick { body, .. } => body.center(),
            ScaledMark::Boxplot { box_rect, .. } => box_rect.center(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IntervalShape {
    Bar { rect: Rect, column_index: usize },
    Box { rect: Rect, column_index: usize },
    Stick { segment: Segment, column_index: usize },
    Point { center: Point, column_index: usize },
    /// One vertex of an interval line, joined across datums
    Line { point: Point, column_index: usize },
    /// Low and high vertex of a band, joined across datums
    Band { low: Point, high: Point, column_index: usize },
}

/// A row of a series in pixel space.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaledDatum {
    pub row: usize,
    pub mark: ScaledMark,
    pub intervals: Vec<IntervalShape>,
}

/// Scaled rows of one series; `None` marks missing data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaledSeries {
    pub datums: Vec<Option<ScaledDatum>>,
    pub interpolate_nulls: bool,
}

impl ScaledSeries {
    pub fn new(datums: Vec<Option<ScaledDatum>>, interpolate_nulls: bool) -> Self {
        Self {
            datums,
            interpolate_nulls,
        }
    }

    /// Runs of consecutive datums to connect. Nulls split runs unless
    /// `interpolate_nulls` is set, in which case they are skipped.
    pub fn segments(&self) -> Vec<Vec<&ScaledDatum>> {
        let mut segments = vec![];
        let mut current = vec![];
        for datum in &self.datums {
            match datum {
                Some(datum) => current.push(datum),
                None if self.interpolate_nulls => {}
                None => {
                    if !current.is_empty() {
                        segments.push(std::mem::take(&mut current));
                    }
                }
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }
        segments
    }

    /// Fills the Catmull-Rom handles of point marks, one connected run at a time.
    pub fn apply_curve(&mut self) {
        let runs: Vec<Vec<usize>> = {
            let mut runs = vec![];
            let mut current = vec![];
            for (i, datum) in self.datums.iter().enumerate() {
                match datum {
                    Some(_) => current.push(i),
                    None if self.interpolate_nulls => {}
                    None => runs.push(std::mem::take(&mut current)),
                }
            }
            runs.push(current);
            runs
        };

        for run in runs.into_iter().filter(|r| r.len() > 1) {
            let points: Vec<Point> = run
                .iter()
                .filter_map(|i| self.datums[*i].as_ref().map(|d| d.mark.anchor()))
                .collect();
            let handles = catmull_rom_control_points(&points);
            for (i, handle) in run.into_iter().zip(handles) {
                if let Some(ScaledDatum {
                    mark: ScaledMark::Point { control_points, .. },
                    ..
                }) = self.datums[i].as_mut()
                {
                    *control_points = Some(handle);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::intervals::IntervalStyle;

    fn point(row: usize, x: f64, y: f64) -> Option<ScaledDatum> {
        Some(ScaledDatum {
            row,
            mark: ScaledMark::Point {
                center: Point::new(x, y),
                control_points: None,
            },
            intervals: vec![],
        })
    }

    #[test]
    fn test_nulls_split_segments() {
        let series = ScaledSeries::new(
            vec![point(0, 0.0, 0.0), point(1, 1.0, 1.0), None, point(3, 3.0, 3.0)],
            false,
        );
        let lengths: Vec<usize> = series.segments().iter().map(|s| s.len()).collect();
        assert_eq!(lengths, vec![2, 1]);

        let series = ScaledSeries::new(series.datums, true);
        let segments = series.segments();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0][2].row, 3);
    }

    #[test]
    fn test_curve_skips_single_points() {
        let mut series = ScaledSeries::new(
            vec![point(0, 0.0, 0.0), None, point(2, 6.0, 6.0), point(3, 12.0, 12.0)],
            false,
        );
        series.apply_curve();
        let handles: Vec<bool> = series
            .datums
            .iter()
            .map(|d| {
                matches!(
                    d,
                    Some(ScaledDatum {
                        mark: ScaledMark::Point {
                            control_points: Some(_),
                            ..
                        },
                        ..
                    })
                )
            })
            .collect();
        assert_eq!(handles, vec![false, false, true, true]);
    }

    #[test]
    fn test_target_extent_includes_stack_and_intervals() {
        let datum = NonScaledDatum::new(0, 1.0, vec![Some(4.0)])
            .with_stack(Some(StackRange { from: 3.0, to: 7.0 }))
            .with_intervals(vec![IntervalMark {
                style: IntervalStyle::Sticks,
                low_value: 2.0,
                high_value: 9.0,
                span_fraction: 1.0,
                column_index: 2,
            }]);
        assert_eq!(datum.end_value(), Some(7.0));
        assert_eq!(datum.target_extent(), vec![3.0, 7.0, 2.0, 9.0]);
    }
}
