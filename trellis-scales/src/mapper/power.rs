use serde::Serialize;

use super::linear::LinearMapper;
use crate::error::ScaleError;

/// Sign-preserving logarithmic transform with a linear zone around zero.
///
/// For `|v| >= epsilon` the transformed value is `sign(v) * (log_base(|v| / epsilon) + 1)`,
/// inside `(-epsilon, epsilon)` it is `v / epsilon`. Both pieces meet at `±1`, so the
/// transform is continuous and strictly increasing over the reals.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PowerFunction {
    base: f64,
    epsilon: f64,
}

impl PowerFunction {
    pub fn new(base: f64, epsilon: f64) -> Result<Self, ScaleError> {
        if !(base.is_finite() && base > 1.0) {
            return Err(ScaleError::InvalidBase(base));
        }
        if !(epsilon.is_finite() && epsilon > 0.0) {
            return Err(ScaleError::InvalidEpsilon(epsilon));
        }
        Ok(Self { base, epsilon })
    }

    pub fn base(&self) -> f64 {
        self.base
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn transform(&self, value: f64) -> f64 {
        let abs = value.abs();
        if abs < self.epsilon {
            value / self.epsilon
        } else {
            value.signum() * ((abs / self.epsilon).log(self.base) + 1.0)
        }
    }

    pub fn untransform(&self, t: f64) -> f64 {
        let abs = t.abs();
        if abs < 1.0 {
            t * self.epsilon
        } else {
            t.signum() * self.epsilon * self.base.powf(abs - 1.0)
        }
    }
}

impl Default for PowerFunction {
    fn default() -> Self {
        Self {
            base: 10.0,
            epsilon: 1.0,
        }
    }
}

/// Log-like mapper: linear interpolation in [`PowerFunction`] space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PowerMapper {
    function: PowerFunction,
    data_min: f64,
    data_max: f64,
    transformed: LinearMapper,
}

impl PowerMapper {
    /// Base 10, epsilon 1.
    pub fn new(data: (f64, f64), screen: (f64, f64)) -> Self {
        Self::with_function(data, screen, PowerFunction::default())
    }

    pub fn try_new(
        data: (f64, f64),
        screen: (f64, f64),
        base: f64,
        epsilon: f64,
    ) -> Result<Self, ScaleError> {
        Ok(Self::with_function(
            data,
            screen,
            PowerFunction::new(base, epsilon)?,
        ))
    }

    pub fn with_function(
        (mut data_min, mut data_max): (f64, f64),
        screen: (f64, f64),
        function: PowerFunction,
    ) -> Self {
        // The near-zero zone is anchored at zero
        if data_min < data_max {
            if data_min > 0.0 && data_min < function.epsilon {
                data_min = 0.0;
            }
            if data_max < 0.0 && data_max > -function.epsilon {
                data_max = 0.0;
            }
        }
        let transformed = LinearMapper::new(
            (function.transform(data_min), function.transform(data_max)),
            screen,
        );
        Self {
            function,
            data_min,
            data_max,
            transformed,
        }
    }

    pub fn function(&self) -> &PowerFunction {
        &self.function
    }

    pub fn data_min(&self) -> f64 {
        self.data_min
    }

    pub fn data_max(&self) -> f64 {
        self.data_max
    }

    pub fn screen_start(&self) -> f64 {
        self.transformed.screen_start()
    }

    pub fn screen_end(&self) -> f64 {
        self.transformed.screen_end()
    }

    pub fn is_degenerate(&self) -> bool {
        self.data_min == self.data_max
    }

    /// Transformed bounds `(t(data_min), t(data_max))`.
    pub fn transformed_range(&self) -> (f64, f64) {
        (self.transformed.data_min(), self.transformed.data_max())
    }

    pub fn to_screen(&self, value: f64) -> f64 {
        self.transformed.to_screen(self.function.transform(value))
    }

    pub fn to_data(&self, position: f64) -> f64 {
        if self.is_degenerate() {
            return self.data_min;
        }
        self.function.untransform(self.transformed.to_data(position))
    }

    /// Screen position of a value already in transformed space.
    pub fn transformed_to_screen(&self, t: f64) -> f64 {
        self.transformed.to_screen(t)
    }
}
