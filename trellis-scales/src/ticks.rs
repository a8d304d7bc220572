//! The "nice number" ladder: steps of 1, 2 and 5 times a power of ten.

/// Iteration cap shared by the step-growing loops of the numeric suppliers.
pub const MAX_ITERATIONS: usize = 64;

/// Relative tolerance, in units of the step, for near-duplicate comparisons.
pub const STEP_EPSILON: f64 = 1e-9;

const LADDER: [f64; 3] = [1.0, 2.0, 5.0];

/// Smallest ladder value greater than or equal to `raw`.
pub fn nice_step_at_least(raw: f64) -> f64 {
    if !(raw > 0.0) || !raw.is_finite() {
        return 1.0;
    }
    let power = raw.log10().floor();
    let magnitude = 10f64.powf(power);
    let mantissa = raw / magnitude;
    // Tolerate float noise in the mantissa
    let factor = LADDER
        .iter()
        .copied()
        .find(|f| mantissa <= f * (1.0 + STEP_EPSILON))
        .unwrap_or(10.0);
    clean(factor * magnitude)
}

/// The ladder value after `step`.
pub fn next_nice_step(step: f64) -> f64 {
    nice_step_at_least(step * (1.0 + 1e-6) + f64::MIN_POSITIVE)
}

/// Number of fractional digits needed to print every multiple of `step` exactly.
pub fn decimals_for_step(step: f64) -> usize {
    if !(step > 0.0) || !step.is_finite() {
        return 0;
    }
    let power = step.log10().floor() as i32;
    let mut digits = (-power).max(0) as usize;
    // 0.25 style steps need more digits than their magnitude
    while digits < 15 {
        let scaled = step * 10f64.powi(digits as i32);
        if (scaled - scaled.round()).abs() <= 1e-6 * scaled {
            break;
        }
        digits += 1;
    }
    digits
}

/// All integer multiples of `step` inside `[min, max]`, ascending.
///
/// Values are computed from the integer index so they stay on the lattice anchored at
/// zero, and negative zero is normalized.
pub fn ticks_for_step(min: f64, max: f64, step: f64) -> Vec<f64> {
    let (min, max) = if min <= max { (min, max) } else { (max, min) };
    if !(step > 0.0) || !min.is_finite() || !max.is_finite() {
        return vec![];
    }
    let first = (min / step - STEP_EPSILON).ceil() as i64;
    let last = (max / step + STEP_EPSILON).floor() as i64;
    if last < first {
        return vec![];
    }
    (first..=last).map(|k| lattice_value(k, step)).collect()
}

/// Expands `[min, max]` outward to the nearest multiples of `step`.
pub fn nice_bounds(min: f64, max: f64, step: f64) -> (f64, f64) {
    if !(step > 0.0) {
        return (min, max);
    }
    let lo = (min / step + STEP_EPSILON).floor() as i64;
    let hi = (max / step - STEP_EPSILON).ceil() as i64;
    (lattice_value(lo, step), lattice_value(hi, step))
}

fn lattice_value(k: i64, step: f64) -> f64 {
    // Dividing by the inverse keeps 0.1-style steps exact (3 / 10 rather than 3 * 0.1)
    let value = if step < 1.0 {
        let inverse = (1.0 / step).round();
        if ((1.0 / inverse) - step).abs() <= STEP_EPSILON * step {
            k as f64 / inverse
        } else {
            k as f64 * step
        }
    } else {
        k as f64 * step
    };
    clean(value)
}

fn clean(value: f64) -> f64 {
    if value == 0.0 {
        0.0
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[rstest]
    #[case(0.7, 1.0)]
    #[case(1.0, 1.0)]
    #[case(1.43, 2.0)]
    #[case(3.0, 5.0)]
    #[case(7.0, 10.0)]
    #[case(1000.0, 1000.0)]
    #[case(0.03, 0.05)]
    fn test_nice_step_at_least(#[case] raw: f64, #[case] expected: f64) {
        assert_approx_eq!(f64, nice_step_at_least(raw), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_ladder_walk() {
        let mut step = 0.1;
        let mut seen = vec![];
        for _ in 0..6 {
            seen.push(step);
            step = next_nice_step(step);
        }
        let expected = [0.1, 0.2, 0.5, 1.0, 2.0, 5.0];
        for (a, b) in seen.iter().zip(expected) {
            assert_approx_eq!(f64, *a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_ticks_on_lattice() {
        assert_eq!(ticks_for_step(-3.0, 7.5, 2.0), vec![-2.0, 0.0, 2.0, 4.0, 6.0]);
        assert_eq!(ticks_for_step(0.0, 0.5, 0.1), vec![0.0, 0.1, 0.2, 0.3, 0.4, 0.5]);
        // Endpoint within the epsilon counts as on the lattice
        assert_eq!(ticks_for_step(0.0, 9.999999999999, 5.0), vec![0.0, 5.0, 10.0]);
        assert!(ticks_for_step(0.1, 0.2, 1.0).is_empty());
        let ticks = ticks_for_step(-1.0, 0.0, 1.0);
        assert!(ticks[1].is_sign_positive());
    }

    #[test]
    fn test_nice_bounds_and_decimals() {
        assert_eq!(nice_bounds(3.0, 97.0, 20.0), (0.0, 100.0));
        assert_eq!(nice_bounds(-13.0, 40.0, 10.0), (-20.0, 40.0));
        assert_eq!(decimals_for_step(0.5), 1);
        assert_eq!(decimals_for_step(0.25), 2);
        assert_eq!(decimals_for_step(20.0), 0);
        assert_eq!(decimals_for_step(0.01), 2);
    }
}
