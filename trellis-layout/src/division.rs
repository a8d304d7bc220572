//! Bar group geometry inside a domain slot.
//!
//! A slot is the distance between adjacent domain positions. Each slot holds one
//! *division* (the group of bars drawn for a category) and the division is cut into
//! `num_subdivisions` bars separated by `subdivision_gap`.

use ordered_float::OrderedFloat;
use serde::Serialize;
use trellis_common::options::{Options, SizeSpec};

/// Smallest width a bar is ever drawn at.
pub const MIN_SUBDIVISION_WIDTH: f64 = 1.0;

/// Default `bar.groupWidth`: the golden ratio of the slot.
pub const DEFAULT_GROUP_WIDTH: SizeSpec = SizeSpec::Percent(61.8);

/// Pixel snapping shared by every edge of a division.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingFunction {
    /// Snap to pixel centers so thin even-width bars render crisp
    HalfPixel,
    WholePixel,
}

impl RoundingFunction {
    pub fn apply(&self, value: f64) -> f64 {
        match self {
            RoundingFunction::HalfPixel => value.floor() + 0.5,
            RoundingFunction::WholePixel => value.round(),
        }
    }

    fn for_sizes(width: f64, gap: f64) -> Self {
        let small_even = |v: f64| v > 0.0 && v < 7.0 && v.fract() == 0.0 && (v as i64) % 2 == 0;
        if small_even(width) || small_even(gap) {
            RoundingFunction::HalfPixel
        } else {
            RoundingFunction::WholePixel
        }
    }
}

/// `bar.*` sizing options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DivisionOptions {
    pub group_width: Option<SizeSpec>,
    pub group_gap: Option<SizeSpec>,
    pub bar_width: Option<SizeSpec>,
    pub bar_gap: Option<SizeSpec>,
}

impl DivisionOptions {
    pub fn from_options(options: &Options) -> Self {
        Self {
            group_width: options.infer_size(&["bar.groupWidth"]),
            group_gap: options.infer_size(&["bar.groupGap"]),
            bar_width: options.infer_size(&["bar.width"]),
            bar_gap: options.infer_size(&["bar.gap"]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DivisionDefinition {
    pub num_subdivisions: usize,
    pub division_width: f64,
    pub division_gap: f64,
    /// Signed distance from the domain position to the leading edge of the division
    pub division_offset_from_tick: f64,
    pub subdivision_width: f64,
    pub subdivision_gap: f64,
    pub rounding: RoundingFunction,
}

impl DivisionDefinition {
    /// Lays out `num_subdivisions` bars in a slot `slot_width` pixels wide.
    pub fn calculate(slot_width: f64, num_subdivisions: usize, options: &DivisionOptions) -> Self {
        let slot_width = slot_width.max(0.0);
        let count = num_subdivisions.max(1);

        let (division_width, division_gap) = split(
            slot_width,
            options.group_width,
            options.group_gap,
            DEFAULT_GROUP_WIDTH,
        );

        let (subdivision_width, subdivision_gap) = if count == 1 {
            (division_width, 0.0)
        } else {
            let gap = options
                .bar_gap
                .map(|g| g.resolve(division_width))
                .or_else(|| {
                    options.bar_width.map(|w| {
                        let width = w.resolve(division_width);
                        (division_width - width * count as f64) / (count - 1) as f64
                    })
                })
                .unwrap_or(0.0)
                .max(0.0);
            ((division_width - gap * (count - 1) as f64) / count as f64, gap)
        };
        let subdivision_width = subdivision_width.max(MIN_SUBDIVISION_WIDTH);

        // Bars that no longer fit widen the division
        let division_width = division_width
            .max(subdivision_width * count as f64 + subdivision_gap * (count - 1) as f64);

        Self {
            num_subdivisions: count,
            division_width,
            division_gap,
            division_offset_from_tick: -division_width / 2.0,
            subdivision_width,
            subdivision_gap,
            rounding: RoundingFunction::for_sizes(subdivision_width, subdivision_gap),
        }
    }

    pub fn slot_width(&self) -> f64 {
        self.division_width + self.division_gap
    }

    /// Pixel extent `(start, end)` of subdivision `index` around `domain_position`.
    pub fn subdivision_extent(&self, domain_position: f64, index: usize) -> (f64, f64) {
        let start = domain_position
            + self.division_offset_from_tick
            + index as f64 * (self.subdivision_width + self.subdivision_gap);
        let start = self.rounding.apply(start);
        let end = self.rounding.apply(start + self.subdivision_width);
        // Rounding never collapses a bar
        (start, end.max(start + MIN_SUBDIVISION_WIDTH))
    }
}

/// Splits `total` into `(width, gap)`. A gap wins over a width when both are set.
fn split(
    total: f64,
    width: Option<SizeSpec>,
    gap: Option<SizeSpec>,
    default_width: SizeSpec,
) -> (f64, f64) {
    let width = match (width, gap) {
        (_, Some(gap)) => total - gap.resolve(total),
        (Some(width), None) => width.resolve(total),
        (None, None) => default_width.resolve(total),
    };
    let width = width.clamp(0.0, total);
    (width, total - width)
}

/// Slot width of a continuous domain axis: the smallest pixel distance between
/// distinct domain positions, or `fallback` when there are fewer than two.
pub fn continuous_slot_width(positions: impl IntoIterator<Item = f64>, fallback: f64) -> f64 {
    let mut distinct: Vec<OrderedFloat<f64>> = positions
        .into_iter()
        .filter(|p| p.is_finite())
        .map(OrderedFloat)
        .collect();
    distinct.sort();
    distinct.dedup();
    distinct
        .windows(2)
        .map(|w| w[1].0 - w[0].0)
        .filter(|gap| *gap > 0.0)
        .reduce(f64::min)
        .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn test_default_group_width() {
        let division = DivisionDefinition::calculate(100.0, 1, &DivisionOptions::default());
        assert_approx_eq!(f64, division.division_width, 61.8);
        assert_approx_eq!(f64, division.division_gap, 38.2);
        assert_approx_eq!(f64, division.subdivision_width, 61.8);
        assert_approx_eq!(f64, division.division_offset_from_tick, -30.9);
        assert_eq!(division.rounding, RoundingFunction::WholePixel);
    }

    #[test]
    fn test_gap_wins_over_width() {
        let options = DivisionOptions::from_options(&Options::new(json!({
            "bar": {"groupWidth": 50, "groupGap": "20%", "gap": 2}
        })));
        let division = DivisionDefinition::calculate(100.0, 3, &options);
        assert_approx_eq!(f64, division.division_width, 80.0);
        assert_approx_eq!(f64, division.subdivision_gap, 2.0);
        assert_approx_eq!(f64, division.subdivision_width, 76.0 / 3.0);
        // 2px gap is a small even integer
        assert_eq!(division.rounding, RoundingFunction::HalfPixel);
    }

    #[test]
    fn test_bar_width_sets_gap() {
        let options = DivisionOptions {
            group_width: Some(SizeSpec::Absolute(60.0)),
            bar_width: Some(SizeSpec::Absolute(15.0)),
            ..Default::default()
        };
        let division = DivisionDefinition::calculate(100.0, 3, &options);
        assert_approx_eq!(f64, division.subdivision_width, 15.0);
        assert_approx_eq!(f64, division.subdivision_gap, 7.5);
        assert_eq!(division.subdivision_extent(50.0, 0), (20.0, 35.0));
        assert_eq!(division.subdivision_extent(50.0, 2), (65.0, 80.0));
    }

    #[rstest]
    #[case(0.0, 1)]
    #[case(0.5, 4)]
    #[case(3.0, 12)]
    #[case(40.0, 7)]
    #[case(1000.0, 1)]
    fn test_subdivision_width_at_least_one(#[case] slot: f64, #[case] count: usize) {
        let options = DivisionOptions {
            bar_gap: Some(SizeSpec::Absolute(3.0)),
            ..Default::default()
        };
        let division = DivisionDefinition::calculate(slot, count, &options);
        assert!(division.subdivision_width >= MIN_SUBDIVISION_WIDTH);
        let (start, end) = division.subdivision_extent(10.0, count - 1);
        assert!(end - start >= MIN_SUBDIVISION_WIDTH);
    }

    #[test]
    fn test_continuous_slot_width() {
        assert_eq!(
            continuous_slot_width([10.0, 50.0, 30.0, 30.0, 35.0], 100.0),
            5.0
        );
        assert_eq!(continuous_slot_width([10.0], 100.0), 100.0);
    }
}
