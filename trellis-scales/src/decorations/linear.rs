use trellis_common::types::{AxisDecoration, Decorations};
use trellis_text::measurement::TextMeasurer;

use super::{
    min_gap, single_decoration, with_bounds_from_majors, DecorationConfig, MIN_MINOR_SPACING,
};
use crate::mapper::linear::LinearMapper;
use crate::ticks::{
    nice_step_at_least, next_nice_step, ticks_for_step, MAX_ITERATIONS, STEP_EPSILON,
};

/// "Nice number" supplier for linear axes.
pub struct LinearSupplier<'a> {
    config: &'a DecorationConfig,
    measurer: &'a dyn TextMeasurer,
}

impl<'a> LinearSupplier<'a> {
    pub fn new(config: &'a DecorationConfig, measurer: &'a dyn TextMeasurer) -> Self {
        Self { config, measurer }
    }

    pub fn supply(&self, mapper: &LinearMapper) -> Decorations {
        let (min, max) = ordered(mapper.data_min(), mapper.data_max());
        if mapper.is_degenerate() || max - min <= 0.0 {
            let format = self.config.format.clone().unwrap_or_default();
            return single_decoration(min, mapper.screen_midpoint(), format.format(min));
        }

        let length = (mapper.screen_end() - mapper.screen_start()).abs();
        let Some(step) = choose_step(min, max, length, self.config, self.measurer) else {
            tracing::warn!(
                "linear ladder did not converge for [{min}, {max}] over {length}px, using endpoints"
            );
            return self.endpoints(mapper, min, max);
        };
        tracing::trace!("linear step {step} for [{min}, {max}] over {length}px");

        let format = self.config.number_format(step);
        let majors: Vec<_> = ticks_for_step(min, max, step)
            .into_iter()
            .map(|v| AxisDecoration::labeled_line(v, mapper.to_screen(v), format.format(v)))
            .collect();

        let mut decorations = Decorations::new(majors);
        if let Some(minors) = self.minor_gridlines(min, max, step, |v| mapper.to_screen(v)) {
            decorations = decorations.with_minor_gridlines(minors);
        }
        with_bounds_from_majors(decorations)
    }

    /// Evenly spaced minor lines between majors, when requested and wide enough apart.
    pub(crate) fn minor_gridlines(
        &self,
        min: f64,
        max: f64,
        step: f64,
        to_screen: impl Fn(f64) -> f64,
    ) -> Option<Vec<AxisDecoration>> {
        let count = self.config.minor_gridline_count.filter(|c| *c > 0)?;
        let minor_step = step / (count + 1) as f64;
        let values: Vec<f64> = ticks_for_step(min, max, minor_step)
            .into_iter()
            .filter(|v| {
                let k = v / step;
                (k - k.round()).abs() > STEP_EPSILON * (count + 1) as f64
            })
            .collect();
        let positions: Vec<f64> = values.iter().map(|v| to_screen(*v)).collect();
        if values.len() > 1 && min_gap(&positions) < MIN_MINOR_SPACING {
            return None;
        }
        Some(
            values
                .into_iter()
                .zip(positions)
                .map(|(v, p)| AxisDecoration::line_only(v, p))
                .collect(),
        )
    }

    /// One step spanning the whole range.
    fn endpoints(&self, mapper: &LinearMapper, min: f64, max: f64) -> Decorations {
        let format = self.config.number_format(max - min);
        with_bounds_from_majors(Decorations::new(
            [min, max]
                .into_iter()
                .map(|v| AxisDecoration::labeled_line(v, mapper.to_screen(v), format.format(v)))
                .collect(),
        ))
    }
}

/// Step the linear supplier uses for `[min, max]` drawn over `length` pixels, or `None`
/// when the ladder does not converge.
///
/// A step fits when adjacent ticks are at least `min_spacing` apart and far enough apart
/// that the widest formatted label keeps `min_label_distance` to its neighbors.
pub fn choose_step(
    min: f64,
    max: f64,
    length: f64,
    config: &DecorationConfig,
    measurer: &dyn TextMeasurer,
) -> Option<f64> {
    let span = (max - min).abs();
    if !(span > 0.0) || !span.is_finite() {
        return None;
    }
    let initial = initial_step(span, length, config);
    grow_step(initial, |step| {
        let spacing = step * length / span;
        if spacing < config.min_spacing * (1.0 - 1e-9) {
            return false;
        }
        let format = config.number_format(step);
        let labels = ticks_for_step(min, max, step)
            .into_iter()
            .map(|v| format.format(v));
        spacing >= config.label_spacing(labels, measurer) * (1.0 - 1e-9)
    })
}

pub(crate) fn ordered(a: f64, b: f64) -> (f64, f64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Ladder value for as many steps as fit at the minimum spacing, or for the requested
/// gridline count when that is coarser.
pub(crate) fn initial_step(span: f64, length: f64, config: &DecorationConfig) -> f64 {
    let max_steps = (length / config.min_spacing.max(1.0)).floor().max(1.0);
    let by_spacing = nice_step_at_least(span / max_steps);
    match config.gridline_count.filter(|c| *c >= 2) {
        Some(count) => by_spacing.max(nice_step_at_least(span / (count - 1) as f64)),
        None => by_spacing,
    }
}

/// Walks up the ladder from `initial` until `fits` holds, giving up after
/// [`MAX_ITERATIONS`] steps.
pub(crate) fn grow_step(initial: f64, fits: impl Fn(f64) -> bool) -> Option<f64> {
    let mut step = initial;
    for _ in 0..MAX_ITERATIONS {
        if fits(step) {
            return Some(step);
        }
        step = next_nice_step(step);
    }
    None
}
