//! Value-space stacking.
//!
//! Positive and negative values stack independently away from zero, so a category with
//! `[3, -2, 4]` reaches `7` above and `-2` below. Accumulators are keyed by target axis
//! and domain value and threaded explicitly through the accumulation pass.

use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use serde::Serialize;
use strum::{EnumString, VariantNames};
use trellis_common::options::Options;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, EnumString, VariantNames)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "lowercase")]
pub enum StackingMode {
    #[default]
    #[strum(serialize = "none", serialize = "false")]
    None,
    #[strum(serialize = "absolute", serialize = "true")]
    Absolute,
    Relative,
    Percent,
}

impl StackingMode {
    /// Reads `isStacked`, which accepts booleans as well as mode names.
    pub fn from_options(options: &Options) -> Self {
        options.infer_enum(&["isStacked"], StackingMode::None)
    }

    pub fn is_stacked(&self) -> bool {
        *self != StackingMode::None
    }

    /// Multiplier applied to a relative share.
    fn scale(&self) -> f64 {
        match self {
            StackingMode::Percent => 100.0,
            _ => 1.0,
        }
    }
}

/// Running totals of one stack.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct StackAccumulator {
    pub positive: f64,
    pub negative: f64,
}

impl StackAccumulator {
    /// Adds `value` to the side matching its sign and returns the `(from, to)` span it
    /// occupies.
    pub fn push(&mut self, value: f64) -> (f64, f64) {
        if value >= 0.0 {
            let from = self.positive;
            self.positive += value;
            (from, self.positive)
        } else {
            let from = self.negative;
            self.negative += value;
            (from, self.negative)
        }
    }

    pub fn absolute_total(&self) -> f64 {
        self.positive - self.negative
    }
}

/// Identifies one stack: a target axis and a domain value.
pub type StackKey = (usize, OrderedFloat<f64>);

/// Value-space span of a stacked datum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StackRange {
    pub from: f64,
    pub to: f64,
}

#[derive(Debug, Clone, Default)]
pub struct StackingState {
    mode: StackingMode,
    totals: IndexMap<StackKey, StackAccumulator>,
    accumulators: IndexMap<StackKey, StackAccumulator>,
}

impl StackingState {
    pub fn new(mode: StackingMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn mode(&self) -> StackingMode {
        self.mode
    }

    /// First pass for relative and percent stacking: record the per-category totals.
    pub fn add_to_total(&mut self, axis: usize, domain: f64, value: f64) {
        self.totals
            .entry((axis, OrderedFloat(domain)))
            .or_default()
            .push(value);
    }

    /// Stacks `value` and returns its span, normalized by the category's absolute
    /// total for relative and percent modes.
    pub fn stack(&mut self, axis: usize, domain: f64, value: f64) -> StackRange {
        let key = (axis, OrderedFloat(domain));
        let (from, to) = self.accumulators.entry(key).or_default().push(value);
        match self.mode {
            StackingMode::Relative | StackingMode::Percent => {
                let total = self
                    .totals
                    .get(&key)
                    .map(|t| t.absolute_total())
                    .unwrap_or(0.0);
                if total > 0.0 {
                    let factor = self.mode.scale() / total;
                    StackRange {
                        from: from * factor,
                        to: to * factor,
                    }
                } else {
                    StackRange { from: 0.0, to: 0.0 }
                }
            }
            _ => StackRange { from, to },
        }
    }

    pub fn accumulator(&self, axis: usize, domain: f64) -> Option<&StackAccumulator> {
        self.accumulators.get(&(axis, OrderedFloat(domain)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;
    use serde_json::json;

    #[test]
    fn test_positive_stack_tops() {
        let mut acc = StackAccumulator::default();
        let tops: Vec<f64> = [3.0, 4.0, 5.0].iter().map(|v| acc.push(*v).1).collect();
        assert_eq!(tops, vec![3.0, 7.0, 12.0]);
    }

    #[test]
    fn test_signs_stack_independently() {
        let mut acc = StackAccumulator::default();
        assert_eq!(acc.push(3.0), (0.0, 3.0));
        assert_eq!(acc.push(-2.0), (0.0, -2.0));
        assert_eq!(acc.push(4.0), (3.0, 7.0));
        assert_eq!(acc.positive, 7.0);
        assert_eq!(acc.negative, -2.0);
        assert_eq!(acc.absolute_total(), 9.0);
    }

    #[test]
    fn test_percent_stacking() {
        let mut state = StackingState::new(StackingMode::Percent);
        for v in [1.0, 3.0] {
            state.add_to_total(0, 5.0, v);
        }
        let first = state.stack(0, 5.0, 1.0);
        let second = state.stack(0, 5.0, 3.0);
        assert_approx_eq!(f64, first.to, 25.0);
        assert_approx_eq!(f64, second.from, 25.0);
        assert_approx_eq!(f64, second.to, 100.0);
        // Other axes and categories are separate stacks
        assert_eq!(state.stack(1, 5.0, 2.0), StackRange { from: 0.0, to: 0.0 });
        assert!(state.accumulator(0, 6.0).is_none());
    }

    #[test]
    fn test_mode_from_options() {
        let mode = |v: serde_json::Value| {
            StackingMode::from_options(&Options::new(json!({ "isStacked": v })))
        };
        assert_eq!(mode(json!(true)), StackingMode::Absolute);
        assert_eq!(mode(json!(false)), StackingMode::None);
        assert_eq!(mode(json!("relative")), StackingMode::Relative);
        assert_eq!(mode(json!("percent")), StackingMode::Percent);
        assert_eq!(StackingMode::from_options(&Options::empty()), StackingMode::None);
    }
}
