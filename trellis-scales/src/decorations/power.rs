use trellis_common::types::{AxisDecoration, Decorations};
use trellis_text::measurement::TextMeasurer;

use super::linear::{grow_step, initial_step, ordered};
use super::{min_gap, single_decoration, with_bounds_from_majors, DecorationConfig};
use crate::format::NumberFormat;
use crate::mapper::power::PowerMapper;
use crate::ticks::{next_nice_step, ticks_for_step, MAX_ITERATIONS, STEP_EPSILON};

/// Sub-decade multipliers tried before whole-decade steps.
const SUB_DECADE: [f64; 3] = [1.0, 2.0, 5.0];

/// Supplier for log-like axes.
///
/// Narrow ranges (less than two transformed units) are ticked on the linear ladder in
/// value space. Wider ranges try sub-decade ticks first, then whole-decade steps of 1, 2,
/// 5, 10, ... transformed units; the first candidate whose adjacent ticks are at least
/// `min_spacing` apart on screen, and far enough apart for their measured labels, wins.
pub struct PowerSupplier<'a> {
    config: &'a DecorationConfig,
    measurer: &'a dyn TextMeasurer,
}

impl<'a> PowerSupplier<'a> {
    pub fn new(config: &'a DecorationConfig, measurer: &'a dyn TextMeasurer) -> Self {
        Self { config, measurer }
    }

    pub fn supply(&self, mapper: &PowerMapper) -> Decorations {
        let (min, max) = ordered(mapper.data_min(), mapper.data_max());
        if mapper.is_degenerate() || max - min <= 0.0 {
            let format = self.config.format.clone().unwrap_or_default();
            let midpoint = (mapper.screen_start() + mapper.screen_end()) / 2.0;
            return single_decoration(min, midpoint, format.format(min));
        }

        let (t0, t1) = ordered(mapper.transformed_range().0, mapper.transformed_range().1);
        let values = if t1 - t0 < 2.0 {
            self.value_space_ticks(mapper, min, max)
        } else {
            self.transformed_space_ticks(mapper, t0, t1)
        };

        let Some((values, format)) = values else {
            tracing::warn!("power ticks did not converge for [{min}, {max}], using endpoints");
            let format = self.config.format.clone().unwrap_or_default();
            return self.decorate(mapper, vec![min, max], &format);
        };
        self.decorate(mapper, values, &format)
    }

    fn decorate(
        &self,
        mapper: &PowerMapper,
        values: Vec<f64>,
        format: &NumberFormat,
    ) -> Decorations {
        with_bounds_from_majors(Decorations::new(
            values
                .into_iter()
                .map(|v| AxisDecoration::labeled_line(v, mapper.to_screen(v), format.format(v)))
                .collect(),
        ))
    }

    fn fits(&self, mapper: &PowerMapper, values: &[f64], format: &NumberFormat) -> bool {
        if values.len() < 2 {
            return false;
        }
        let positions: Vec<f64> = values.iter().map(|v| mapper.to_screen(*v)).collect();
        let labels = values.iter().map(|v| format.format(*v));
        min_gap(&positions) >= self.config.label_spacing(labels, self.measurer) * (1.0 - 1e-9)
    }

    /// Linear ladder in value space, validated by the smallest pixel gap.
    fn value_space_ticks(
        &self,
        mapper: &PowerMapper,
        min: f64,
        max: f64,
    ) -> Option<(Vec<f64>, NumberFormat)> {
        let length = (mapper.screen_end() - mapper.screen_start()).abs();
        let initial = initial_step(max - min, length, self.config);
        let step = grow_step(initial, |step| {
            let format = self.config.number_format(step);
            self.fits(mapper, &ticks_for_step(min, max, step), &format)
        })?;
        tracing::trace!("power axis uses value-space step {step}");
        Some((ticks_for_step(min, max, step), self.config.number_format(step)))
    }

    fn transformed_space_ticks(
        &self,
        mapper: &PowerMapper,
        t0: f64,
        t1: f64,
    ) -> Option<(Vec<f64>, NumberFormat)> {
        let function = mapper.function();
        let format = self.config.format.clone().unwrap_or_default();

        if function.base() == 10.0 {
            let sub_decade = sub_decade_values(mapper, t0, t1);
            if self.fits(mapper, &sub_decade, &format) {
                tracing::trace!("power axis uses sub-decade ticks");
                return Some((sub_decade, format));
            }
        }

        // One iteration was spent on the sub-decade candidate
        let mut units = 1.0;
        for _ in 1..MAX_ITERATIONS {
            let values: Vec<f64> = ticks_for_step(t0, t1, units)
                .into_iter()
                .map(|t| clean_value(function.untransform(t)))
                .collect();
            if values.len() < 2 {
                return None;
            }
            if self.fits(mapper, &values, &format) {
                tracing::trace!("power axis uses {units} decade steps");
                return Some((values, format));
            }
            units = next_nice_step(units);
        }
        None
    }
}

/// 1, 2 and 5 times every decade inside the transformed range, plus zero.
fn sub_decade_values(mapper: &PowerMapper, t0: f64, t1: f64) -> Vec<f64> {
    let function = mapper.function();
    let tolerance = STEP_EPSILON * (t1 - t0).max(1.0);
    let within = |v: f64| {
        let t = function.transform(v);
        t >= t0 - tolerance && t <= t1 + tolerance
    };

    let first_decade = if t0 <= 0.0 && t1 >= 0.0 {
        1
    } else {
        (t0.abs().min(t1.abs()).floor() as i64).max(1)
    };
    let last_decade = t0.abs().max(t1.abs()).ceil() as i64;

    let mut values = vec![];
    for decade in first_decade..=last_decade {
        let base = function.untransform(decade as f64);
        for multiplier in SUB_DECADE {
            let v = clean_value(base * multiplier);
            if within(v) {
                values.push(v);
            }
            if within(-v) {
                values.push(-v);
            }
        }
    }
    if within(0.0) {
        values.push(0.0);
    }
    values.sort_by(|a, b| a.total_cmp(b));
    values.dedup();
    values
}

/// Rounds away representation noise from `epsilon * base^k` (999.9999.. -> 1000).
fn clean_value(v: f64) -> f64 {
    if v == 0.0 || !v.is_finite() {
        return 0.0;
    }
    let magnitude = 10f64.powi(v.abs().log10().floor() as i32 - 12);
    (v / magnitude).round() * magnitude
}
