//! Interval marks: error bars, boxes, bands and the like attached to a data column.

use itertools::Itertools;
use serde::Serialize;
use strum::{EnumString, VariantNames};
use trellis_common::options::Options;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, EnumString, VariantNames)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "lowercase")]
pub enum IntervalStyle {
    Bars,
    Boxes,
    Area,
    #[default]
    Sticks,
    Points,
    Line,
}

impl IntervalStyle {
    /// Styles drawn between a pair of columns rather than at each column.
    pub fn is_paired(&self) -> bool {
        matches!(
            self,
            IntervalStyle::Bars | IntervalStyle::Boxes | IntervalStyle::Area
        )
    }

    /// `interval.<label>.style`, falling back to `intervals.style`.
    pub fn for_column(options: &Options, label: &str) -> Self {
        let per_column = format!("interval.{label}.style");
        options.infer_enum(&[per_column.as_str(), "intervals.style"], Self::default())
    }
}

/// A value-space interval: a `[low, high]` span, or a single value when both are equal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IntervalMark {
    pub style: IntervalStyle,
    pub low_value: f64,
    pub high_value: f64,
    /// Width of the mark relative to the full bar width, 1 for the outermost pair
    pub span_fraction: f64,
    /// Table column of the outermost value the mark was built from
    pub column_index: usize,
}

/// An interval column of a series: its table index and style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IntervalColumn {
    pub index: usize,
    pub style: IntervalStyle,
}

/// Builds the interval marks of one row from `(column, value)` pairs in column order.
///
/// Paired styles match the outermost columns first and move inward, so nested pairs
/// narrow. A bars group with more than one mark also gets a stick across the whole
/// range unless the series already has a sticks column. Every other style gives each
/// column its own mark; a stick runs from the row's `value` to the column value and is
/// skipped when the row has no value.
pub fn build_interval_marks(
    value: Option<f64>,
    values: &[(IntervalColumn, Option<f64>)],
) -> Vec<IntervalMark> {
    let has_sticks = values
        .iter()
        .any(|(c, _)| c.style == IntervalStyle::Sticks);
    let mut marks = vec![];

    let groups = values.iter().into_group_map_by(|(c, _)| c.style);
    for style in groups.keys().copied().sorted_by_key(|s| *s as u8) {
        let present: Vec<(usize, f64)> = groups[&style]
            .iter()
            .filter_map(|(c, v)| v.map(|v| (c.index, v)))
            .collect();
        if present.is_empty() {
            continue;
        }

        if style.is_paired() {
            let pairs = present.len().div_ceil(2);
            for i in 0..pairs {
                let (low_col, low) = present[i];
                let (_, high) = present[present.len() - 1 - i];
                marks.push(IntervalMark {
                    style,
                    low_value: low.min(high),
                    high_value: low.max(high),
                    span_fraction: (pairs - i) as f64 / pairs as f64,
                    column_index: low_col,
                });
            }
            if style == IntervalStyle::Bars && pairs > 1 && !has_sticks {
                let (column_index, first) = present[0];
                let (_, last) = present[present.len() - 1];
                marks.push(IntervalMark {
                    style: IntervalStyle::Sticks,
                    low_value: first.min(last),
                    high_value: first.max(last),
                    span_fraction: 1.0,
                    column_index,
                });
            }
        } else if style == IntervalStyle::Sticks {
            let Some(value) = value else {
                continue;
            };
            marks.extend(present.into_iter().map(|(column_index, v)| IntervalMark {
                style,
                low_value: value.min(v),
                high_value: value.max(v),
                span_fraction: 1.0,
                column_index,
            }));
        } else {
            marks.extend(present.into_iter().map(|(column_index, v)| IntervalMark {
                style,
                low_value: v,
                high_value: v,
                span_fraction: 1.0,
                column_index,
            }));
        }
    }
    marks
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn column(index: usize, style: IntervalStyle) -> IntervalColumn {
        IntervalColumn { index, style }
    }

    #[test]
    fn test_bars_pair_outermost_first() {
        let values = [
            (column(2, IntervalStyle::Bars), Some(80.0)),
            (column(3, IntervalStyle::Bars), Some(90.0)),
            (column(4, IntervalStyle::Bars), Some(110.0)),
            (column(5, IntervalStyle::Bars), Some(120.0)),
        ];
        let marks = build_interval_marks(Some(100.0), &values);
        assert_eq!(marks.len(), 3);
        assert_eq!((marks[0].low_value, marks[0].high_value), (80.0, 120.0));
        assert_eq!(marks[0].span_fraction, 1.0);
        assert_eq!((marks[1].low_value, marks[1].high_value), (90.0, 110.0));
        assert_eq!(marks[1].span_fraction, 0.5);
        // Automatic stick across the outer pair
        assert_eq!(marks[2].style, IntervalStyle::Sticks);
        assert_eq!((marks[2].low_value, marks[2].high_value), (80.0, 120.0));
    }

    #[test]
    fn test_explicit_sticks_suppress_auto_stick() {
        let values = [
            (column(2, IntervalStyle::Bars), Some(80.0)),
            (column(3, IntervalStyle::Bars), Some(90.0)),
            (column(4, IntervalStyle::Bars), Some(110.0)),
            (column(5, IntervalStyle::Bars), Some(120.0)),
            (column(6, IntervalStyle::Sticks), Some(70.0)),
            (column(7, IntervalStyle::Sticks), Some(130.0)),
        ];
        let marks = build_interval_marks(Some(100.0), &values);
        let sticks: Vec<_> = marks
            .iter()
            .filter(|m| m.style == IntervalStyle::Sticks)
            .collect();
        assert_eq!(sticks.len(), 2);
        assert_eq!((sticks[0].low_value, sticks[0].high_value), (70.0, 100.0));
        assert_eq!((sticks[1].low_value, sticks[1].high_value), (100.0, 130.0));
        assert_eq!(sticks[1].column_index, 7);
    }

    #[test]
    fn test_sticks_need_a_value() {
        let values = [
            (column(2, IntervalStyle::Sticks), Some(5.0)),
            (column(3, IntervalStyle::Sticks), Some(9.0)),
        ];
        assert!(build_interval_marks(None, &values).is_empty());
        let marks = build_interval_marks(Some(7.0), &values);
        assert_eq!(marks.len(), 2);
        assert_eq!((marks[0].low_value, marks[0].high_value), (5.0, 7.0));
        assert_eq!(marks[0].column_index, 2);
        assert_eq!((marks[1].low_value, marks[1].high_value), (7.0, 9.0));
    }

    #[test]
    fn test_points_are_independent() {
        let values = [
            (column(2, IntervalStyle::Points), Some(5.0)),
            (column(3, IntervalStyle::Points), None),
            (column(4, IntervalStyle::Points), Some(7.0)),
        ];
        let marks = build_interval_marks(Some(100.0), &values);
        assert_eq!(marks.len(), 2);
        assert!(marks.iter().all(|m| m.low_value == m.high_value));
        assert_eq!(marks[1].column_index, 4);
    }

    #[test]
    fn test_style_from_options() {
        let options = Options::new(json!({
            "intervals": {"style": "bars"},
            "interval": {"i1": {"style": "area"}}
        }));
        assert_eq!(IntervalStyle::for_column(&options, "i1"), IntervalStyle::Area);
        assert_eq!(IntervalStyle::for_column(&options, "i2"), IntervalStyle::Bars);
        assert_eq!(
            IntervalStyle::for_column(&Options::empty(), "i2"),
            IntervalStyle::Sticks
        );
    }
}
